//! National CO2 reading from the carbon data provider.

use crate::error::PipelineError;
use crate::fetch::{self, HttpClient};
use crate::model::Co2Reading;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use tracing::debug;

pub const DEFAULT_URL: &str = "https://api.carbonintensity.org.uk/intensity";

#[derive(Debug, Deserialize)]
struct IntensityResponse {
    data: Vec<IntensityPeriod>,
}

#[derive(Debug, Deserialize)]
struct IntensityPeriod {
    from: Option<String>,
    intensity: Intensity,
}

#[derive(Debug, Deserialize)]
struct Intensity {
    actual: Option<f64>,
    forecast: Option<f64>,
}

pub struct CarbonIntensityApi<C> {
    client: C,
    url: String,
}

impl<C: HttpClient> CarbonIntensityApi<C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            url: DEFAULT_URL.to_string(),
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Fetches the current reading, preferring the measured value over the
    /// forecast.
    pub async fn fetch(&self) -> Result<Co2Reading, PipelineError> {
        let resp: IntensityResponse = fetch::get_json(&self.client, &self.url)
            .await
            .map_err(PipelineError::transient)?;

        let period = resp.data.into_iter().next().ok_or_else(|| {
            PipelineError::TransientFetch("carbon data response was empty".to_string())
        })?;

        let ppm = period.intensity.actual.or(period.intensity.forecast).ok_or_else(|| {
            PipelineError::TransientFetch(
                "carbon period had neither actual nor forecast value".to_string(),
            )
        })?;

        let timestamp = period
            .from
            .as_deref()
            .and_then(parse_period_timestamp)
            .unwrap_or_else(Utc::now);

        debug!(ppm, %timestamp, "CO2 reading fetched");

        Ok(Co2Reading { ppm, timestamp })
    }
}

/// The provider stamps periods as `2026-08-29T10:30Z` (no seconds), which is
/// not RFC 3339; fall back to that shape after the standard parse.
fn parse_period_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%MZ")
        .ok()
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn test_intensity_response_parses() {
        let json = r#"{
            "data": [{
                "from": "2026-08-29T10:00Z",
                "to": "2026-08-29T10:30Z",
                "intensity": {"forecast": 266, "actual": 263, "index": "moderate"}
            }]
        }"#;

        let resp: IntensityResponse = serde_json::from_str(json).unwrap();
        let period = &resp.data[0];
        assert_eq!(period.intensity.actual, Some(263.0));
        assert_eq!(period.intensity.forecast, Some(266.0));
    }

    #[test]
    fn test_parse_provider_timestamp_format() {
        let dt = parse_period_timestamp("2026-08-29T10:30Z").unwrap();
        assert_eq!(dt.hour(), 10);
        assert_eq!(dt.minute(), 30);
    }

    #[test]
    fn test_parse_rfc3339_timestamp() {
        assert!(parse_period_timestamp("2026-08-29T10:30:00Z").is_some());
        assert!(parse_period_timestamp("not a timestamp").is_none());
    }
}
