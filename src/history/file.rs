use super::HistoryBackend;
use crate::error::PipelineError;
use crate::model::ConsolidatedRecord;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// History log persisted as a pretty-printed JSON array, oldest first.
///
/// Writes go to a `.tmp` sibling followed by a rename, so a concurrent
/// reader never observes a partial file.
pub struct JsonFileBackend {
    path: PathBuf,
}

impl JsonFileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        let mut tmp = self.path.as_os_str().to_owned();
        tmp.push(".tmp");
        PathBuf::from(tmp)
    }
}

impl HistoryBackend for JsonFileBackend {
    fn load(&self) -> Vec<ConsolidatedRecord> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No history file yet, starting empty");
                return Vec::new();
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "History unreadable, starting empty");
                return Vec::new();
            }
        };

        match serde_json::from_str(&content) {
            Ok(records) => records,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "History corrupt, starting empty");
                Vec::new()
            }
        }
    }

    fn persist(&self, records: &[ConsolidatedRecord]) -> Result<(), PipelineError> {
        let body = serde_json::to_vec_pretty(records)
            .map_err(|e| PipelineError::Persistence(std::io::Error::other(e)))?;

        let tmp = self.tmp_path();
        std::fs::write(&tmp, body)?;
        std::fs::rename(&tmp, &self.path)?;

        Ok(())
    }
}
