use crate::execution::{executor, report::CycleReport};
use engine_core::context::pipeline::PipelineContext;
use std::time::Duration;
use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Counts kept by the loop across cycles.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoopSummary {
    pub cycles: usize,
    pub aborted: usize,
    pub last_report: Option<CycleReportSummary>,
}

/// The parts of the most recent [`CycleReport`] worth keeping around.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReportSummary {
    pub datasets: usize,
    pub failed_loads: usize,
    pub rows_written: u64,
}

impl From<&CycleReport> for CycleReportSummary {
    fn from(report: &CycleReport) -> Self {
        CycleReportSummary {
            datasets: report.loads.len(),
            failed_loads: report.failed_loads().count(),
            rows_written: report.rows_written(),
        }
    }
}

/// Runs cycles back to back with a sleep in between until cancelled.
///
/// Cancellation only interrupts the sleep; a running cycle always finishes.
pub struct CycleScheduler {
    ctx: PipelineContext,
    interval: Duration,
    cancel: CancellationToken,
    max_cycles: Option<usize>,
}

impl CycleScheduler {
    pub fn new(ctx: PipelineContext, cancel: CancellationToken) -> Self {
        let interval = ctx.settings.fetch_interval();
        Self {
            ctx,
            interval,
            cancel,
            max_cycles: None,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Stop after `n` cycles instead of looping forever.
    pub fn with_max_cycles(mut self, n: usize) -> Self {
        self.max_cycles = Some(n);
        self
    }

    pub async fn run(self) -> LoopSummary {
        let mut summary = LoopSummary::default();
        info!(interval_secs = self.interval.as_secs(), "Starting pipeline loop");

        loop {
            if self.cancel.is_cancelled() {
                info!("Shutdown requested, not starting another cycle");
                break;
            }

            summary.cycles += 1;
            match executor::run_cycle(&self.ctx).await {
                Ok(report) => {
                    if !report.is_clean() {
                        warn!(cycle_id = %report.cycle_id, "Cycle finished with failures");
                    }
                    summary.last_report = Some(CycleReportSummary::from(&report));
                }
                Err(e) => {
                    summary.aborted += 1;
                    error!(cycle = summary.cycles, error = %e, "Cycle aborted");
                }
            }

            if self.max_cycles.is_some_and(|max| summary.cycles >= max) {
                break;
            }

            info!(next_in_secs = self.interval.as_secs(), "Waiting for next cycle");
            tokio::select! {
                _ = time::sleep(self.interval) => {}
                _ = self.cancel.cancelled() => {
                    info!("Shutdown requested during sleep");
                    break;
                }
            }
        }

        info!(cycles = summary.cycles, aborted = summary.aborted, "Pipeline loop stopped");
        summary
    }
}
