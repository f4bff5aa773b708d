use log::{error, info, warn};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use crate::engine::executor::CycleExecutor;
use crate::engine::models::CycleReport;
use crate::shared::error::SchedulerError;
use crate::shared::traits::ReportSink;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SchedulerState {
    Idle,
    Running,
    Draining,
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StopReason {
    DurationElapsed,
    ShutdownRequested,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Collection cycles executed, not counting the one-shot info probe.
    pub cycles: u64,
    pub stop_reason: StopReason,
    pub sink_failures: u64,
}

#[derive(Debug, Clone)]
pub struct Schedule {
    pub interval: Duration,
    /// `None` runs until shutdown.
    pub total_duration: Option<Duration>,
}

pub struct Scheduler {
    schedule: Schedule,
    info: CycleExecutor,
    collection: CycleExecutor,
    sink: Arc<dyn ReportSink>,
    state: SchedulerState,
    sink_failures: u64,
}

impl Scheduler {
    pub fn new(
        schedule: Schedule,
        info: CycleExecutor,
        collection: CycleExecutor,
        sink: Arc<dyn ReportSink>,
    ) -> Self {
        Self {
            schedule,
            info,
            collection,
            sink,
            state: SchedulerState::Idle,
            sink_failures: 0,
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    /// Runs the info probe once, then collection cycles until the total
    /// duration elapses or `shutdown` is cancelled. A cycle in flight when
    /// shutdown arrives is finished and delivered before stopping.
    pub async fn run(&mut self, shutdown: CancellationToken) -> Result<RunSummary, SchedulerError> {
        if self.state != SchedulerState::Idle {
            return Err(SchedulerError::AlreadyStarted);
        }
        self.transition(SchedulerState::Running);

        let info = self.info.clone();
        if let Err(e) = self.run_cycle(info, 0, &shutdown).await {
            return Err(self.fail(e));
        }

        let loop_started = Instant::now();
        let deadline = self.schedule.total_duration.and_then(|d| {
            let deadline = loop_started.checked_add(d);
            if deadline.is_none() {
                warn!("Total duration {:?} is beyond the clock's range, running until shutdown", d);
            }
            deadline
        });
        let mut next_at = loop_started;
        let mut cycles = 0u64;

        let stop_reason = loop {
            if self.state == SchedulerState::Draining || shutdown.is_cancelled() {
                break StopReason::ShutdownRequested;
            }

            cycles += 1;
            let collection = self.collection.clone();
            if let Err(e) = self.run_cycle(collection, cycles, &shutdown).await {
                return Err(self.fail(e));
            }
            if self.state == SchedulerState::Draining {
                break StopReason::ShutdownRequested;
            }

            next_at = match next_at.checked_add(self.schedule.interval) {
                Some(next_at) => next_at,
                // No later slot is representable: this was the last cycle.
                None if deadline.is_some() => break StopReason::DurationElapsed,
                None => {
                    warn!(
                        "Interval {:?} is beyond the clock's range, waiting for shutdown",
                        self.schedule.interval
                    );
                    shutdown.cancelled().await;
                    break StopReason::ShutdownRequested;
                }
            };
            let now = Instant::now();
            if next_at < now {
                warn!(
                    "Cycle {} overran the {:?} interval, starting the next one immediately",
                    cycles, self.schedule.interval
                );
                next_at = now;
            }
            if deadline.is_some_and(|d| next_at > d) {
                break StopReason::DurationElapsed;
            }

            tokio::select! {
                biased;
                _ = shutdown.cancelled() => {
                    info!("Shutdown requested while waiting for the next cycle");
                    break StopReason::ShutdownRequested;
                }
                _ = sleep_until(next_at) => {}
            }
        };

        if self.state == SchedulerState::Running {
            self.transition(SchedulerState::Draining);
        }
        self.stop();

        let summary = RunSummary {
            cycles,
            stop_reason,
            sink_failures: self.sink_failures,
        };
        info!(
            "Monitoring finished after {} cycle(s) ({:?}, {} sink failure(s))",
            summary.cycles, summary.stop_reason, summary.sink_failures
        );
        Ok(summary)
    }

    async fn run_cycle(
        &mut self,
        executor: CycleExecutor,
        sequence: u64,
        shutdown: &CancellationToken,
    ) -> Result<(), SchedulerError> {
        info!("Collecting system stats (cycle {})...", sequence);
        let mut cycle = tokio::spawn(async move { executor.execute(sequence).await });

        let running = self.state == SchedulerState::Running;
        let joined = tokio::select! {
            biased;
            joined = &mut cycle => joined,
            _ = shutdown.cancelled(), if running => {
                info!("Shutdown requested, letting cycle {} finish", sequence);
                self.transition(SchedulerState::Draining);
                cycle.await
            }
        };

        let report = joined.map_err(|e| SchedulerError::ExecutorFailed(e.to_string()))?;
        self.deliver(&report).await;
        Ok(())
    }

    async fn deliver(&mut self, report: &CycleReport) {
        info!(
            "Cycle {} complete: {} observation(s), {} failure(s), {} alert(s)",
            report.sequence,
            report.observations().count(),
            report.failures().count(),
            report.alerts.len()
        );

        if let Err(e) = self.sink.deliver(report).await {
            self.sink_failures += 1;
            error!("Failed to deliver report for cycle {}: {}", report.sequence, e);
        }
    }

    fn fail(&mut self, e: SchedulerError) -> SchedulerError {
        error!("Internal scheduling error: {}", e);
        if self.state == SchedulerState::Running {
            self.transition(SchedulerState::Draining);
        }
        self.stop();
        e
    }

    fn stop(&mut self) {
        self.info.shutdown();
        self.collection.shutdown();
        self.transition(SchedulerState::Stopped);
    }

    fn transition(&mut self, next: SchedulerState) {
        info!("Scheduler state: {:?} -> {:?}", self.state, next);
        self.state = next;
    }
}
