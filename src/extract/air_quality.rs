//! Per-city air quality collection.
//!
//! One nearest-city request per collection target, paced to stay inside the
//! provider's rate limit, with a single retry after an HTTP 429. A city that
//! fails to fetch or parse is logged and skipped; the stage only fails when
//! no city at all yields a measurement.

use crate::error::PipelineError;
use crate::fetch::{self, HttpClient};
use crate::geo::CityCoords;
use crate::model::Measurement;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_BASE_URL: &str = "https://api.airvisual.com";

/// Wait applied once after a rate-limit response before retrying.
const RATE_LIMIT_WAIT: Duration = Duration::from_secs(60);

#[derive(Debug, Deserialize)]
struct NearestCityResponse {
    status: String,
    data: Option<CityData>,
}

#[derive(Debug, Deserialize)]
struct CityData {
    current: CurrentConditions,
}

#[derive(Debug, Deserialize)]
struct CurrentConditions {
    pollution: Pollution,
}

#[derive(Debug, Deserialize)]
struct Pollution {
    ts: DateTime<Utc>,
    aqius: u32,
    #[serde(default)]
    p2: Option<Pollutant>,
    #[serde(default)]
    p1: Option<Pollutant>,
}

#[derive(Debug, Deserialize)]
struct Pollutant {
    conc: f64,
}

pub struct AirQualityApi<C> {
    client: C,
    base_url: String,
    targets: Vec<CityCoords>,
    request_delay: Duration,
}

impl<C: HttpClient> AirQualityApi<C> {
    pub fn new(client: C, targets: Vec<CityCoords>, request_delay: Duration) -> Self {
        Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
            targets,
            request_delay,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Fetches a measurement for every collection target.
    pub async fn fetch_all(&self) -> Result<Vec<Measurement>, PipelineError> {
        let mut measurements = Vec::with_capacity(self.targets.len());

        for (i, target) in self.targets.iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(self.request_delay).await;
            }

            match self.fetch_city(target).await {
                Ok(m) => {
                    debug!(city = %m.city, aqi_us = m.aqi_us, "Measurement fetched");
                    measurements.push(m);
                }
                Err(e) => {
                    warn!(city = %target.city, error = %e, "Skipping city, fetch failed");
                }
            }
        }

        if measurements.is_empty() {
            return Err(PipelineError::TransientFetch(
                "no city produced a measurement".to_string(),
            ));
        }

        Ok(measurements)
    }

    async fn fetch_city(&self, target: &CityCoords) -> anyhow::Result<Measurement> {
        let url = format!(
            "{}/v2/nearest_city?lat={}&lon={}",
            self.base_url, target.latitude, target.longitude
        );

        let mut resp = fetch::get(&self.client, &url).await?;

        if resp.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            warn!(city = %target.city, "Rate limit hit, waiting before retry");
            tokio::time::sleep(RATE_LIMIT_WAIT).await;
            resp = fetch::get(&self.client, &url).await?;
        }

        let status = resp.status();
        if !status.is_success() {
            anyhow::bail!("provider returned status {status}");
        }

        let body: NearestCityResponse = resp.json().await?;
        if body.status != "success" {
            anyhow::bail!("provider returned status field {:?}", body.status);
        }

        let data = body
            .data
            .ok_or_else(|| anyhow::anyhow!("response had no data payload"))?;
        let pollution = data.current.pollution;

        Ok(Measurement {
            city: target.city.clone(),
            // Concentrations are absent on some provider plans; the AQI is
            // always present.
            pm25: pollution.p2.map(|p| p.conc).unwrap_or(0.0),
            pm10: pollution.p1.map(|p| p.conc).unwrap_or(0.0),
            aqi_us: pollution.aqius,
            timestamp: pollution.ts,
        })
    }
}
