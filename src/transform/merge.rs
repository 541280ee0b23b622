//! Consolidation of the aggregated regions with the CO2 reading.

use crate::error::PipelineError;
use crate::model::{Co2Reading, ConsolidatedRecord, RegionAggregate};
use chrono::{DateTime, Utc};

/// Builds the single [`ConsolidatedRecord`] for this run.
///
/// Fails with [`PipelineError::IncompleteData`] when no region survived
/// aggregation; the orchestrator records that as a failed run and carries on.
pub fn merge_run(
    regions: Vec<RegionAggregate>,
    co2: Co2Reading,
    timestamp: DateTime<Utc>,
) -> Result<ConsolidatedRecord, PipelineError> {
    if regions.is_empty() {
        return Err(PipelineError::IncompleteData(
            "no region aggregates to consolidate",
        ));
    }

    Ok(ConsolidatedRecord {
        timestamp,
        regions,
        co2,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region(name: &str, country: &str) -> RegionAggregate {
        RegionAggregate {
            region: name.to_string(),
            country: country.to_string(),
            cities: vec!["Somewhere".to_string()],
            cities_count: 1,
            mean_pm25: 5.0,
            mean_pm10: 10.0,
            mean_aqi_us: 21.0,
        }
    }

    #[test]
    fn test_merge_combines_regions_and_co2() {
        let now = Utc::now();
        let co2 = Co2Reading {
            ppm: 415.0,
            timestamp: now,
        };

        let record = merge_run(
            vec![region("Yorkshire", "England"), region("Highlands", "Scotland")],
            co2,
            now,
        )
        .unwrap();

        assert_eq!(record.timestamp, now);
        assert_eq!(record.regions.len(), 2);
        assert_eq!(record.co2.ppm, 415.0);
    }

    #[test]
    fn test_merge_rejects_empty_regions() {
        let now = Utc::now();
        let co2 = Co2Reading {
            ppm: 415.0,
            timestamp: now,
        };

        match merge_run(vec![], co2, now) {
            Err(PipelineError::IncompleteData(_)) => {}
            other => panic!("expected IncompleteData, got {other:?}"),
        }
    }
}
