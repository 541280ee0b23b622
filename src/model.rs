//! Core data model shared across the pipeline stages.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single per-city air quality observation, immutable once extracted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub city: String,
    /// PM2.5 concentration in µg/m³.
    pub pm25: f64,
    /// PM10 concentration in µg/m³.
    pub pm10: f64,
    /// US EPA air quality index.
    pub aqi_us: u32,
    pub timestamp: DateTime<Utc>,
}

/// Region-level summary produced by the aggregator. Never emitted with an
/// empty `cities` list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionAggregate {
    pub region: String,
    pub country: String,
    /// Contributing cities, sorted by name.
    pub cities: Vec<String>,
    pub cities_count: usize,
    pub mean_pm25: f64,
    pub mean_pm10: f64,
    pub mean_aqi_us: f64,
}

/// National CO2 concentration reading, one per pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Co2Reading {
    /// Parts per million.
    pub ppm: f64,
    pub timestamp: DateTime<Utc>,
}

/// The unit of persistence: one record per successful pipeline cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsolidatedRecord {
    pub timestamp: DateTime<Utc>,
    pub regions: Vec<RegionAggregate>,
    pub co2: Co2Reading,
}

impl ConsolidatedRecord {
    pub fn region(&self, name: &str) -> Option<&RegionAggregate> {
        self.regions.iter().find(|r| r.region == name)
    }
}
