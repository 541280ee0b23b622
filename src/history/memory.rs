use super::HistoryBackend;
use crate::error::PipelineError;
use crate::model::ConsolidatedRecord;
use std::sync::Mutex;

/// In-process backend used by tests and dry runs.
#[derive(Default)]
pub struct MemoryBackend {
    records: Mutex<Vec<ConsolidatedRecord>>,
}

impl HistoryBackend for MemoryBackend {
    fn load(&self) -> Vec<ConsolidatedRecord> {
        self.records.lock().unwrap().clone()
    }

    fn persist(&self, records: &[ConsolidatedRecord]) -> Result<(), PipelineError> {
        *self.records.lock().unwrap() = records.to_vec();
        Ok(())
    }
}
