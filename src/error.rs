//! Stage-level error taxonomy for the pipeline.
//!
//! Every variant maps to one failure mode the orchestrator knows how to
//! absorb; nothing here ever escapes a cycle boundary.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// Network or provider failure during extraction. Recorded as a failed
    /// run; the loop continues.
    #[error("transient fetch failure: {0}")]
    TransientFetch(String),

    /// A city missing from the reference table. Consumed inside the
    /// aggregator (log and skip); never escalates to a run failure.
    #[error("city {city:?} is not in the region mapping table")]
    UnmappedCity { city: String },

    /// Merger received structurally empty input.
    #[error("incomplete data: {0}")]
    IncompleteData(&'static str),

    /// Local history store could not be written.
    #[error("history persistence failed: {0}")]
    Persistence(#[from] std::io::Error),

    /// Remote sink write failed. Degrades the run, never fails it.
    #[error("remote write failed: {0}")]
    RemoteWrite(String),
}

impl PipelineError {
    pub fn transient(err: impl std::fmt::Display) -> Self {
        PipelineError::TransientFetch(err.to_string())
    }

    pub fn remote(err: impl std::fmt::Display) -> Self {
        PipelineError::RemoteWrite(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
