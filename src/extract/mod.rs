//! Extraction stage: per-city air quality plus the national CO2 reading.
//!
//! [`Extractor`] is the seam the orchestrator depends on; [`HttpExtractor`]
//! is the production implementation backed by the two HTTP providers.

mod air_quality;
mod co2;

pub use air_quality::AirQualityApi;
pub use co2::CarbonIntensityApi;

use crate::error::PipelineError;
use crate::fetch::HttpClient;
use crate::model::{Co2Reading, Measurement};

/// Boundary to the upstream data providers. Any failure is transient from
/// the pipeline's point of view.
#[async_trait::async_trait]
pub trait Extractor: Send + Sync {
    async fn fetch_measurements(&self) -> Result<Vec<Measurement>, PipelineError>;
    async fn fetch_co2(&self) -> Result<Co2Reading, PipelineError>;
}

/// Production extractor: air quality per city, carbon data nationally.
pub struct HttpExtractor<A, B> {
    air: AirQualityApi<A>,
    co2: CarbonIntensityApi<B>,
}

impl<A: HttpClient, B: HttpClient> HttpExtractor<A, B> {
    pub fn new(air: AirQualityApi<A>, co2: CarbonIntensityApi<B>) -> Self {
        Self { air, co2 }
    }
}

#[async_trait::async_trait]
impl<A: HttpClient, B: HttpClient> Extractor for HttpExtractor<A, B> {
    async fn fetch_measurements(&self) -> Result<Vec<Measurement>, PipelineError> {
        self.air.fetch_all().await
    }

    async fn fetch_co2(&self) -> Result<Co2Reading, PipelineError> {
        self.co2.fetch().await
    }
}
