//! Durable remote copy of each consolidated record.

mod s3;

pub use s3::S3Sink;

use crate::error::PipelineError;
use crate::model::ConsolidatedRecord;

/// Boundary to the remote store. A failure here degrades the run but never
/// fails it; the local append is not rolled back.
#[async_trait::async_trait]
pub trait RemoteSink: Send + Sync {
    async fn write(&self, record: &ConsolidatedRecord) -> Result<(), PipelineError>;
}
