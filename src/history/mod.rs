//! Bounded local history of consolidated records.
//!
//! The retention logic is pure; persistence sits behind [`HistoryBackend`]
//! so tests run against [`MemoryBackend`] while production uses the atomic
//! [`JsonFileBackend`].

mod file;
mod memory;

pub use file::JsonFileBackend;
pub use memory::MemoryBackend;

use crate::error::PipelineError;
use crate::model::ConsolidatedRecord;
use tracing::info;

pub const DEFAULT_RETENTION_LIMIT: usize = 50;

/// Storage for the ordered history log, oldest record first.
///
/// `load` never fails: a missing or unreadable log degrades to empty (the
/// backend logs why). `persist` failures are run failures.
pub trait HistoryBackend: Send + Sync {
    fn load(&self) -> Vec<ConsolidatedRecord>;
    fn persist(&self, records: &[ConsolidatedRecord]) -> Result<(), PipelineError>;
}

impl<B: HistoryBackend + ?Sized> HistoryBackend for std::sync::Arc<B> {
    fn load(&self) -> Vec<ConsolidatedRecord> {
        (**self).load()
    }

    fn persist(&self, records: &[ConsolidatedRecord]) -> Result<(), PipelineError> {
        (**self).persist(records)
    }
}

/// Appends `record` and evicts from the front until `len <= limit`.
pub fn append_and_trim(
    log: &mut Vec<ConsolidatedRecord>,
    record: ConsolidatedRecord,
    limit: usize,
) {
    log.push(record);
    if log.len() > limit {
        let excess = log.len() - limit;
        log.drain(..excess);
    }
}

/// Load–append–trim–persist wrapper around a backend.
pub struct HistoryStore<B> {
    backend: B,
    retention_limit: usize,
}

impl<B: HistoryBackend> HistoryStore<B> {
    pub fn new(backend: B, retention_limit: usize) -> Self {
        Self {
            backend,
            retention_limit,
        }
    }

    /// Appends one record, enforcing the retention limit, and persists the
    /// whole log. Returns the retained length.
    pub fn append(&self, record: ConsolidatedRecord) -> Result<usize, PipelineError> {
        let mut log = self.backend.load();
        append_and_trim(&mut log, record, self.retention_limit);
        self.backend.persist(&log)?;

        info!(retained = log.len(), limit = self.retention_limit, "History appended");
        Ok(log.len())
    }

    pub fn records(&self) -> Vec<ConsolidatedRecord> {
        self.backend.load()
    }
}
