//! Region-level aggregation of per-city measurements.

use crate::geo::GeoMapper;
use crate::model::{Measurement, RegionAggregate};
use std::collections::BTreeMap;
use tracing::warn;

/// Groups measurements by region and computes per-region means.
///
/// Unmapped cities and cities in the excluded country are logged and skipped,
/// never aborting the run. Each region bucket is sorted by city name before
/// the means are computed, so the output is identical under any permutation
/// of the input. Regions with no contributing city are never emitted; output
/// is ordered by region name.
pub fn aggregate_by_region(
    measurements: &[Measurement],
    mapper: &GeoMapper,
) -> Vec<RegionAggregate> {
    let mut buckets: BTreeMap<String, (String, Vec<&Measurement>)> = BTreeMap::new();

    for m in measurements {
        let (region, country) = match mapper.resolve(&m.city) {
            Ok(resolved) => resolved,
            Err(e) => {
                warn!(city = %m.city, error = %e, "Skipping measurement, city unmapped");
                continue;
            }
        };

        if mapper.is_excluded_country(country) {
            warn!(city = %m.city, country, "Skipping measurement, country excluded");
            continue;
        }

        buckets
            .entry(region.to_string())
            .or_insert_with(|| (country.to_string(), Vec::new()))
            .1
            .push(m);
    }

    buckets
        .into_iter()
        .map(|(region, (country, mut members))| {
            members.sort_by(|a, b| a.city.cmp(&b.city));

            let pm25: Vec<f64> = members.iter().map(|m| m.pm25).collect();
            let pm10: Vec<f64> = members.iter().map(|m| m.pm10).collect();
            let aqi: Vec<f64> = members.iter().map(|m| m.aqi_us as f64).collect();

            RegionAggregate {
                region,
                country,
                cities: members.iter().map(|m| m.city.clone()).collect(),
                cities_count: members.len(),
                mean_pm25: mean(&pm25),
                mean_pm10: mean(&pm10),
                mean_aqi_us: mean(&aqi),
            }
        })
        .collect()
}

/// Arithmetic mean; 0.0 for empty input.
fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}
