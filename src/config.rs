//! Process configuration, read once at startup.

use crate::history::DEFAULT_RETENTION_LIMIT;
use crate::pipeline::Schedule;
use std::env;
use std::time::Duration;

pub const DEFAULT_HISTORY_PATH: &str = "history.json";

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Air quality provider API key. Required to run the real extractor.
    pub air_api_key: Option<String>,
    /// Remote bucket. `None` disables the remote sink entirely.
    pub s3_bucket: Option<String>,
    pub history_path: String,
    /// Optional external city table; the embedded table is used otherwise.
    pub city_table_path: Option<String>,
    /// Pacing between per-city provider requests.
    pub request_delay: Duration,
    pub retention_limit: usize,
    pub schedule: Schedule,
}

impl PipelineConfig {
    /// Credentials and paths come from the environment (`.env` supported);
    /// scheduling knobs keep their defaults until the CLI overrides them.
    pub fn from_env() -> Self {
        Self {
            air_api_key: env::var("AIR_API_KEY").ok().filter(|s| !s.is_empty()),
            s3_bucket: env::var("S3_BUCKET").ok().filter(|s| !s.is_empty()),
            history_path: env::var("HISTORY_PATH")
                .unwrap_or_else(|_| DEFAULT_HISTORY_PATH.to_string()),
            city_table_path: env::var("CITY_TABLE").ok().filter(|s| !s.is_empty()),
            request_delay: Duration::from_millis(2000),
            retention_limit: DEFAULT_RETENTION_LIMIT,
            schedule: Schedule::default(),
        }
    }
}
