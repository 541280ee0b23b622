//! The scheduling loop driving extract→transform→load cycles forever.
//!
//! Every stage error is absorbed at the cycle boundary and folded into
//! [`RunStats`]; only an external shutdown signal stops the loop. The
//! inter-cycle sleep is raced against the shutdown channel, so termination
//! latency is bounded by the in-flight stage, not the full interval.

use super::{CycleOutcome, RunStats, Schedule, Stage};
use crate::extract::Extractor;
use crate::geo::GeoMapper;
use crate::history::{HistoryBackend, HistoryStore};
use crate::sink::RemoteSink;
use crate::transform::{aggregate_by_region, merge_run};
use anyhow::Result;
use chrono::Utc;
use tokio::sync::watch;
use tracing::{error, info, warn};

/// How often the cumulative statistics summary is logged.
const STATS_EVERY_N_RUNS: u64 = 10;

pub struct Orchestrator<E, B, S> {
    extractor: E,
    mapper: GeoMapper,
    history: HistoryStore<B>,
    /// `None` when no remote store is configured; the load stage then skips
    /// the remote write and runs stay full successes.
    sink: Option<S>,
    schedule: Schedule,
    stats: RunStats,
}

impl<E, B, S> Orchestrator<E, B, S>
where
    E: Extractor,
    B: HistoryBackend,
    S: RemoteSink,
{
    pub fn new(
        extractor: E,
        mapper: GeoMapper,
        history: HistoryStore<B>,
        sink: Option<S>,
        schedule: Schedule,
    ) -> Self {
        Self {
            extractor,
            mapper,
            history,
            sink,
            schedule,
            stats: RunStats::new(),
        }
    }

    pub fn stats(&self) -> &RunStats {
        &self.stats
    }

    /// One full cycle. Never returns an error: every stage failure is
    /// converted into a [`CycleOutcome`].
    #[tracing::instrument(skip(self))]
    pub async fn run_cycle(&self) -> CycleOutcome {
        // EXTRACTING
        let measurements = match self.extractor.fetch_measurements().await {
            Ok(m) => m,
            Err(e) => {
                error!(stage = %Stage::Extract, error = %e, "Measurement fetch failed");
                return CycleOutcome::Failed(Stage::Extract);
            }
        };
        let co2 = match self.extractor.fetch_co2().await {
            Ok(c) => c,
            Err(e) => {
                error!(stage = %Stage::Extract, error = %e, "CO2 fetch failed");
                return CycleOutcome::Failed(Stage::Extract);
            }
        };
        info!(measurements = measurements.len(), co2_ppm = co2.ppm, "Extraction complete");

        // TRANSFORMING
        let regions = aggregate_by_region(&measurements, &self.mapper);
        let record = match merge_run(regions, co2, Utc::now()) {
            Ok(r) => r,
            Err(e) => {
                error!(stage = %Stage::Transform, error = %e, "Consolidation failed");
                return CycleOutcome::Failed(Stage::Transform);
            }
        };
        info!(regions = record.regions.len(), "Transformation complete");

        // LOADING: the local append comes first and is never rolled back.
        if let Err(e) = self.history.append(record.clone()) {
            error!(stage = %Stage::Load, error = %e, "History append failed");
            return CycleOutcome::Failed(Stage::Load);
        }

        match &self.sink {
            Some(sink) => match sink.write(&record).await {
                Ok(()) => CycleOutcome::Success,
                Err(e) => {
                    warn!(stage = %Stage::Load, error = %e, "Remote write failed, local copy retained");
                    CycleOutcome::Degraded
                }
            },
            None => CycleOutcome::Success,
        }
    }

    /// Runs one cycle and records it. Used by the `once` subcommand.
    pub async fn run_once(&mut self) -> CycleOutcome {
        let outcome = self.run_cycle().await;
        self.stats.record(outcome);
        self.stats.log_summary();
        outcome
    }

    /// The main loop. Exits only when `shutdown` flips to true; an in-flight
    /// cycle always finishes first.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        info!(
            interval_secs = self.schedule.interval.as_secs(),
            max_consecutive_failures = self.schedule.max_consecutive_failures,
            backoff_secs = self.schedule.backoff.as_secs(),
            "Pipeline started"
        );

        loop {
            let outcome = self.run_cycle().await;
            self.stats.record(outcome);
            info!(?outcome, run = self.stats.total_runs, "Cycle finished");

            if self.stats.total_runs % STATS_EVERY_N_RUNS == 0 {
                self.stats.log_summary();
            }

            if *shutdown.borrow() {
                break;
            }

            let delay = self.stats.delay_for_next(&self.schedule);
            if delay > self.schedule.interval {
                warn!(
                    consecutive_failures = self.stats.consecutive_failures,
                    extra_secs = self.schedule.backoff.as_secs(),
                    "Backoff engaged"
                );
            }

            info!(delay_secs = delay.as_secs(), "Sleeping until next cycle");
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                changed = shutdown.changed() => {
                    // A closed channel means the signal handler is gone;
                    // treat it as a shutdown request.
                    if changed.is_err() || *shutdown.borrow() {
                        info!("Shutdown requested during sleep");
                        break;
                    }
                }
            }
        }

        self.stats.log_summary();
        info!("Pipeline stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;
    use crate::history::MemoryBackend;
    use crate::model::{Co2Reading, Measurement};

    const TABLE: &str = "\
city,region,latitude,longitude
Leeds,Yorkshire,53.8008,-1.5491
York,Yorkshire,53.9599,-1.0873
Inverness,Highlands,57.4778,-4.2247
Belfast,County Antrim,54.5973,-5.9301
";

    struct MockExtractor {
        cities: Vec<&'static str>,
        fail_measurements: bool,
        fail_co2: bool,
    }

    impl MockExtractor {
        fn ok(cities: Vec<&'static str>) -> Self {
            Self {
                cities,
                fail_measurements: false,
                fail_co2: false,
            }
        }
    }

    #[async_trait::async_trait]
    impl Extractor for MockExtractor {
        async fn fetch_measurements(&self) -> Result<Vec<Measurement>, PipelineError> {
            if self.fail_measurements {
                return Err(PipelineError::TransientFetch("provider down".into()));
            }
            Ok(self
                .cities
                .iter()
                .map(|city| Measurement {
                    city: city.to_string(),
                    pm25: 5.0,
                    pm10: 9.0,
                    aqi_us: 21,
                    timestamp: Utc::now(),
                })
                .collect())
        }

        async fn fetch_co2(&self) -> Result<Co2Reading, PipelineError> {
            if self.fail_co2 {
                return Err(PipelineError::TransientFetch("provider down".into()));
            }
            Ok(Co2Reading {
                ppm: 415.0,
                timestamp: Utc::now(),
            })
        }
    }

    struct MockSink {
        fail: bool,
    }

    #[async_trait::async_trait]
    impl RemoteSink for MockSink {
        async fn write(
            &self,
            _record: &crate::model::ConsolidatedRecord,
        ) -> Result<(), PipelineError> {
            if self.fail {
                Err(PipelineError::RemoteWrite("bucket unreachable".into()))
            } else {
                Ok(())
            }
        }
    }

    fn orchestrator(
        extractor: MockExtractor,
        sink: Option<MockSink>,
    ) -> Orchestrator<MockExtractor, MemoryBackend, MockSink> {
        Orchestrator::new(
            extractor,
            GeoMapper::from_csv(TABLE).unwrap(),
            HistoryStore::new(MemoryBackend::default(), 50),
            sink,
            Schedule::default(),
        )
    }

    #[tokio::test]
    async fn test_success_path_appends_history() {
        let orch = orchestrator(
            MockExtractor::ok(vec!["Leeds", "York", "Inverness"]),
            Some(MockSink { fail: false }),
        );

        assert_eq!(orch.run_cycle().await, CycleOutcome::Success);
        let records = orch.history.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].regions.len(), 2);
    }

    #[tokio::test]
    async fn test_extract_failure_stops_cycle() {
        let mut extractor = MockExtractor::ok(vec!["Leeds"]);
        extractor.fail_measurements = true;
        let orch = orchestrator(extractor, Some(MockSink { fail: false }));

        assert_eq!(orch.run_cycle().await, CycleOutcome::Failed(Stage::Extract));
        assert!(orch.history.records().is_empty());
    }

    #[tokio::test]
    async fn test_co2_failure_is_extract_stage() {
        let mut extractor = MockExtractor::ok(vec!["Leeds"]);
        extractor.fail_co2 = true;
        let orch = orchestrator(extractor, None);

        assert_eq!(orch.run_cycle().await, CycleOutcome::Failed(Stage::Extract));
    }

    #[tokio::test]
    async fn test_all_cities_excluded_fails_transform() {
        let orch = orchestrator(MockExtractor::ok(vec!["Belfast"]), None);
        assert_eq!(
            orch.run_cycle().await,
            CycleOutcome::Failed(Stage::Transform)
        );
        assert!(orch.history.records().is_empty());
    }

    #[tokio::test]
    async fn test_remote_failure_is_degraded_with_local_append() {
        let orch = orchestrator(
            MockExtractor::ok(vec!["Leeds", "York"]),
            Some(MockSink { fail: true }),
        );

        assert_eq!(orch.run_cycle().await, CycleOutcome::Degraded);
        // Local append stands even though the remote write failed.
        assert_eq!(orch.history.records().len(), 1);
    }

    #[tokio::test]
    async fn test_no_sink_is_full_success() {
        let orch = orchestrator(MockExtractor::ok(vec!["Leeds"]), None);
        assert_eq!(orch.run_cycle().await, CycleOutcome::Success);
    }

    #[tokio::test]
    async fn test_unmapped_city_does_not_abort_run() {
        let orch = orchestrator(MockExtractor::ok(vec!["Atlantis", "Leeds"]), None);
        assert_eq!(orch.run_cycle().await, CycleOutcome::Success);

        let records = orch.history.records();
        assert_eq!(records[0].regions.len(), 1);
        assert_eq!(records[0].regions[0].region, "Yorkshire");
    }

    #[tokio::test]
    async fn test_run_once_records_stats() {
        let mut orch = orchestrator(MockExtractor::ok(vec!["Leeds"]), None);
        orch.run_once().await;

        assert_eq!(orch.stats().total_runs, 1);
        assert_eq!(orch.stats().successful_runs, 1);
    }

    #[tokio::test]
    async fn test_run_exits_on_shutdown_signal() {
        let orch = orchestrator(MockExtractor::ok(vec!["Leeds"]), None);
        let (tx, rx) = watch::channel(true); // already shut down: one cycle then exit

        orch.run(rx).await.unwrap();
        drop(tx);
    }
}
