use super::RemoteSink;
use crate::error::PipelineError;
use crate::model::ConsolidatedRecord;
use serde::Serialize;
use tracing::info;

/// Remote sink writing each record as JSON to an S3 bucket.
///
/// Every record lands under a timestamped key; `records/latest.json` is
/// overwritten each run so consumers can poll one stable key.
pub struct S3Sink {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl S3Sink {
    pub async fn from_env(bucket: impl Into<String>) -> Self {
        let config = aws_config::load_from_env().await;
        Self {
            client: aws_sdk_s3::Client::new(&config),
            bucket: bucket.into(),
        }
    }

    async fn put_json(&self, key: &str, value: &impl Serialize) -> Result<(), PipelineError> {
        let body = serde_json::to_vec(value).map_err(PipelineError::remote)?;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(body.into())
            .content_type("application/json")
            .send()
            .await
            .map_err(PipelineError::remote)?;

        Ok(())
    }
}

#[async_trait::async_trait]
impl RemoteSink for S3Sink {
    async fn write(&self, record: &ConsolidatedRecord) -> Result<(), PipelineError> {
        let key = format!(
            "records/{}.json",
            record.timestamp.format("%Y-%m-%dT%H-%M-%SZ")
        );

        self.put_json(&key, record).await?;
        self.put_json("records/latest.json", record).await?;

        info!(bucket = %self.bucket, key, "Record written to remote store");
        Ok(())
    }
}
