//! Pipeline orchestration: the cycle state machine, run statistics, and the
//! scheduling loop with failure backoff.

mod orchestrator;
mod stats;

pub use orchestrator::Orchestrator;
pub use stats::RunStats;

use std::time::Duration;

/// The stage a cycle failed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Extract,
    Transform,
    Load,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Extract => write!(f, "extract"),
            Stage::Transform => write!(f, "transform"),
            Stage::Load => write!(f, "load"),
        }
    }
}

/// Result of one extract→transform→load cycle.
///
/// `Degraded` means the local append succeeded but the remote write did not;
/// it counts as a successful run and does not feed the backoff counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    Success,
    Degraded,
    Failed(Stage),
}

/// Inter-cycle scheduling policy.
#[derive(Debug, Clone, Copy)]
pub struct Schedule {
    /// Base interval between cycle starts.
    pub interval: Duration,
    /// Consecutive-failure count at which backoff kicks in.
    pub max_consecutive_failures: u32,
    /// Extra delay added on top of the interval once the threshold is hit.
    pub backoff: Duration,
}

impl Default for Schedule {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30 * 60),
            max_consecutive_failures: 5,
            backoff: Duration::from_secs(300),
        }
    }
}
