//! Static geography reference tables.
//!
//! Maps a city to its region (CSV reference table, loaded once at startup)
//! and a region to its country (in-crate table). Northern Ireland is excluded
//! from collection entirely; cities resolving there are dropped before
//! aggregation.

use crate::error::PipelineError;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;

pub const EXCLUDED_COUNTRY: &str = "Northern Ireland";

/// Region name → country. Covers every region appearing in the city table.
static REGION_COUNTRIES: &[(&str, &str)] = &[
    ("North Scotland", "Scotland"),
    ("South Scotland", "Scotland"),
    ("Highlands", "Scotland"),
    ("North West England", "England"),
    ("North East England", "England"),
    ("Yorkshire", "England"),
    ("East Midlands", "England"),
    ("West Midlands", "England"),
    ("East England", "England"),
    ("South West England", "England"),
    ("South England", "England"),
    ("South East England", "England"),
    ("London", "England"),
    ("North Wales", "Wales"),
    ("South Wales", "Wales"),
    ("County Antrim", "Northern Ireland"),
    ("County Down", "Northern Ireland"),
    ("County Londonderry", "Northern Ireland"),
];

const DEFAULT_CITY_TABLE: &str = include_str!("../data/uk_cities.csv");

#[derive(Debug, Deserialize)]
struct CityRow {
    city: String,
    region: String,
    latitude: f64,
    longitude: f64,
}

#[derive(Debug, Clone)]
struct CityEntry {
    region: String,
    latitude: f64,
    longitude: f64,
}

/// A city's query coordinates, as handed to the extractor.
#[derive(Debug, Clone, PartialEq)]
pub struct CityCoords {
    pub city: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// Immutable city→region→country lookup, built once at process start.
pub struct GeoMapper {
    cities: HashMap<String, CityEntry>,
    countries: HashMap<&'static str, &'static str>,
}

impl GeoMapper {
    /// Loads the city table from a CSV file (`city,region,latitude,longitude`).
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading city table {path}"))?;
        Self::from_csv(&content)
    }

    /// Builds the mapper from the city table compiled into the binary.
    pub fn embedded() -> Self {
        Self::from_csv(DEFAULT_CITY_TABLE).expect("embedded city table is valid")
    }

    pub fn from_csv(content: &str) -> Result<Self> {
        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut cities = HashMap::new();

        for result in rdr.deserialize() {
            let row: CityRow = result.context("parsing city table row")?;
            cities.insert(
                row.city,
                CityEntry {
                    region: row.region,
                    latitude: row.latitude,
                    longitude: row.longitude,
                },
            );
        }

        Ok(Self {
            cities,
            countries: REGION_COUNTRIES.iter().copied().collect(),
        })
    }

    /// Resolves a city to its `(region, country)` pair.
    pub fn resolve(&self, city: &str) -> Result<(&str, &str), PipelineError> {
        let entry = self
            .cities
            .get(city)
            .ok_or_else(|| PipelineError::UnmappedCity {
                city: city.to_string(),
            })?;

        let country =
            self.countries
                .get(entry.region.as_str())
                .ok_or_else(|| PipelineError::UnmappedCity {
                    city: city.to_string(),
                })?;

        Ok((entry.region.as_str(), country))
    }

    pub fn is_excluded_country(&self, country: &str) -> bool {
        country == EXCLUDED_COUNTRY
    }

    /// All cities to query, excluding those in the excluded country. Sorted
    /// by name so the extractor's request order is stable.
    pub fn collection_targets(&self) -> Vec<CityCoords> {
        let mut targets: Vec<CityCoords> = self
            .cities
            .iter()
            .filter(|(city, _)| {
                // A city only lands in the table with a known region, but the
                // excluded-country filter happens here as well so NI rows in
                // a user-supplied table are never queried.
                match self.resolve(city) {
                    Ok((_, country)) => !self.is_excluded_country(country),
                    Err(_) => false,
                }
            })
            .map(|(city, entry)| CityCoords {
                city: city.clone(),
                latitude: entry.latitude,
                longitude: entry.longitude,
            })
            .collect();

        targets.sort_by(|a, b| a.city.cmp(&b.city));
        targets
    }

    pub fn len(&self) -> usize {
        self.cities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cities.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &str = "\
city,region,latitude,longitude
Leeds,Yorkshire,53.8008,-1.5491
York,Yorkshire,53.9599,-1.0873
Inverness,Highlands,57.4778,-4.2247
Belfast,County Antrim,54.5973,-5.9301
";

    #[test]
    fn test_resolve_known_city() {
        let mapper = GeoMapper::from_csv(TABLE).unwrap();
        assert_eq!(mapper.resolve("Leeds").unwrap(), ("Yorkshire", "England"));
        assert_eq!(
            mapper.resolve("Inverness").unwrap(),
            ("Highlands", "Scotland")
        );
    }

    #[test]
    fn test_resolve_unknown_city_is_typed_error() {
        let mapper = GeoMapper::from_csv(TABLE).unwrap();
        match mapper.resolve("Atlantis") {
            Err(PipelineError::UnmappedCity { city }) => assert_eq!(city, "Atlantis"),
            other => panic!("expected UnmappedCity, got {other:?}"),
        }
    }

    #[test]
    fn test_excluded_country() {
        let mapper = GeoMapper::from_csv(TABLE).unwrap();
        let (_, country) = mapper.resolve("Belfast").unwrap();
        assert!(mapper.is_excluded_country(country));
        assert!(!mapper.is_excluded_country("Scotland"));
    }

    #[test]
    fn test_collection_targets_skip_excluded_and_sort() {
        let mapper = GeoMapper::from_csv(TABLE).unwrap();
        let targets = mapper.collection_targets();
        let names: Vec<_> = targets.iter().map(|t| t.city.as_str()).collect();
        assert_eq!(names, vec!["Inverness", "Leeds", "York"]);
    }

    #[test]
    fn test_embedded_table_loads() {
        let mapper = GeoMapper::embedded();
        assert!(!mapper.is_empty());
        // Every embedded city must resolve to a known country.
        for target in mapper.collection_targets() {
            mapper.resolve(&target.city).unwrap();
        }
    }
}
