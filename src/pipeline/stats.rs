//! Process-lifetime run statistics.
//!
//! An explicit state object mutated only by the orchestrator; never
//! persisted across restarts.

use super::{CycleOutcome, Schedule};
use chrono::{DateTime, Utc};
use std::time::Duration;
use tracing::info;

#[derive(Debug, Clone)]
pub struct RunStats {
    pub total_runs: u64,
    pub successful_runs: u64,
    pub failed_runs: u64,
    pub degraded_runs: u64,
    pub consecutive_failures: u32,
    pub started_at: DateTime<Utc>,
    pub last_success: Option<DateTime<Utc>>,
}

impl RunStats {
    pub fn new() -> Self {
        Self {
            total_runs: 0,
            successful_runs: 0,
            failed_runs: 0,
            degraded_runs: 0,
            consecutive_failures: 0,
            started_at: Utc::now(),
            last_success: None,
        }
    }

    /// Folds one cycle outcome into the counters.
    pub fn record(&mut self, outcome: CycleOutcome) {
        self.total_runs += 1;

        match outcome {
            CycleOutcome::Success | CycleOutcome::Degraded => {
                self.successful_runs += 1;
                self.consecutive_failures = 0;
                self.last_success = Some(Utc::now());
                if outcome == CycleOutcome::Degraded {
                    self.degraded_runs += 1;
                }
            }
            CycleOutcome::Failed(_) => {
                self.failed_runs += 1;
                self.consecutive_failures += 1;
            }
        }
    }

    /// Sleep duration before the next cycle: the base interval, plus the
    /// fixed backoff once the consecutive-failure threshold is reached.
    pub fn delay_for_next(&self, schedule: &Schedule) -> Duration {
        if self.consecutive_failures >= schedule.max_consecutive_failures {
            schedule.interval + schedule.backoff
        } else {
            schedule.interval
        }
    }

    pub fn success_rate(&self) -> f64 {
        if self.total_runs == 0 {
            0.0
        } else {
            self.successful_runs as f64 / self.total_runs as f64 * 100.0
        }
    }

    pub fn log_summary(&self) {
        let uptime = Utc::now() - self.started_at;
        info!(
            uptime_secs = uptime.num_seconds(),
            total_runs = self.total_runs,
            successful_runs = self.successful_runs,
            failed_runs = self.failed_runs,
            degraded_runs = self.degraded_runs,
            consecutive_failures = self.consecutive_failures,
            success_rate_pct = self.success_rate(),
            last_success = ?self.last_success,
            "Pipeline statistics"
        );
    }
}

impl Default for RunStats {
    fn default() -> Self {
        Self::new()
    }
}
