//! Ingestion loop
//!
//! Reads lines from the device, parses them and publishes each record. Runs
//! on a blocking thread for the life of the process and is the only writer
//! into the broadcaster.
//!
//! The loop checks its cancellation token between reads, so a stop request
//! takes effect within one read timeout.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Local};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};
use crate::record::{parse_line, Record};
use crate::registry::Broadcaster;
use crate::serial::{LineSource, LinkState, LinkStatus, ReadErrorPolicy, ReadOutcome};
use crate::stats::RelayStats;

/// Why the loop ended without error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineExit {
    /// Stop was requested
    Stopped,
    /// The source reported end of stream
    SourceClosed,
}

/// Read → parse → publish loop over a single source
pub struct IngestPipeline<S: LineSource> {
    source: S,
    broadcaster: Arc<Broadcaster>,
    stats: Arc<RelayStats>,
    policy: ReadErrorPolicy,
    link: LinkStatus,
    clock: fn() -> DateTime<Local>,
}

impl<S: LineSource> IngestPipeline<S> {
    /// Create a pipeline feeding `broadcaster` from `source`
    pub fn new(source: S, broadcaster: Arc<Broadcaster>) -> Self {
        Self {
            source,
            broadcaster,
            stats: Arc::new(RelayStats::new()),
            policy: ReadErrorPolicy::default(),
            link: LinkStatus::new(),
            clock: Local::now,
        }
    }

    /// Share a stats tracker with other components
    pub fn with_stats(mut self, stats: Arc<RelayStats>) -> Self {
        self.stats = stats;
        self
    }

    /// Set the read error policy
    pub fn with_policy(mut self, policy: ReadErrorPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Report link state through `link`
    pub fn with_link(mut self, link: LinkStatus) -> Self {
        self.link = link;
        self
    }

    #[cfg(test)]
    fn with_clock(mut self, clock: fn() -> DateTime<Local>) -> Self {
        self.clock = clock;
        self
    }

    /// Handle one raw line; returns the record if it parsed
    pub fn ingest_line(&self, line: &str) -> Option<Record> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        self.stats.record_line();
        tracing::debug!(line = line, "Received");

        let Some(reading) = parse_line(line) else {
            self.stats.record_rejected();
            tracing::debug!(line = line, "Line did not match, skipping");
            return None;
        };

        let record = Record::observed(reading, (self.clock)());
        let delivery = self.broadcaster.publish(record);
        self.stats.record_published(&delivery);

        tracing::info!(
            id = record.id,
            time = record.time,
            timestamp = %record.timestamp(),
            observers = delivery.delivered,
            "Record published"
        );

        Some(record)
    }

    /// Run the loop on the current thread until stopped, the source closes,
    /// or the error policy gives up
    ///
    /// The source is dropped (releasing the device) before this returns.
    pub fn run(self, cancel: &CancellationToken) -> Result<PipelineExit> {
        let name = self.source.describe();
        self.link.set(LinkState::Connected);
        tracing::info!(source = %name, "Ingestion started");

        let link = self.link.clone();
        let result = self.read_loop(cancel);
        link.set(LinkState::Disconnected);

        match &result {
            Ok(exit) => tracing::info!(source = %name, exit = ?exit, "Ingestion stopped"),
            Err(e) => tracing::error!(source = %name, error = %e, "Ingestion failed"),
        }

        result
    }

    fn read_loop(mut self, cancel: &CancellationToken) -> Result<PipelineExit> {
        let mut consecutive_errors: u32 = 0;
        let mut discarded: u64 = 0;

        loop {
            if cancel.is_cancelled() {
                return Ok(PipelineExit::Stopped);
            }

            let outcome = self.source.read_line();

            let total = self.source.discarded_lines();
            if total > discarded {
                self.stats.record_discarded(total - discarded);
                tracing::warn!(total = total, "Dropped overlong line");
                discarded = total;
            }

            match outcome {
                Ok(ReadOutcome::Line(line)) => {
                    consecutive_errors = 0;
                    self.ingest_line(&line);
                }
                Ok(ReadOutcome::Idle) => {
                    consecutive_errors = 0;
                }
                Ok(ReadOutcome::Closed) => {
                    return Ok(PipelineExit::SourceClosed);
                }
                Err(e) => {
                    consecutive_errors = consecutive_errors.saturating_add(1);
                    self.stats.record_read_error();
                    tracing::warn!(
                        error = %e,
                        consecutive = consecutive_errors,
                        "Error reading serial"
                    );

                    if self.policy.should_give_up(consecutive_errors) {
                        return Err(Error::DeviceLost {
                            consecutive_errors,
                            last: e,
                        });
                    }

                    if wait_or_cancel(cancel, self.policy.error_backoff) {
                        return Ok(PipelineExit::Stopped);
                    }
                }
            }
        }
    }

    /// Run the loop on a blocking thread
    pub fn spawn(self, cancel: CancellationToken) -> PipelineHandle {
        let token = cancel.clone();
        let task = tokio::task::spawn_blocking(move || self.run(&token));

        PipelineHandle { cancel, task }
    }
}

/// Sleep up to `duration`, returning early (with `true`) if cancelled
fn wait_or_cancel(cancel: &CancellationToken, duration: Duration) -> bool {
    const SLICE: Duration = Duration::from_millis(10);

    let deadline = Instant::now() + duration;
    loop {
        if cancel.is_cancelled() {
            return true;
        }
        let now = Instant::now();
        if now >= deadline {
            return false;
        }
        std::thread::sleep(SLICE.min(deadline - now));
    }
}

/// Handle to a spawned ingestion loop
pub struct PipelineHandle {
    cancel: CancellationToken,
    task: JoinHandle<Result<PipelineExit>>,
}

impl PipelineHandle {
    /// Request a stop and wait for the loop to exit
    pub async fn stop(self) -> Result<PipelineExit> {
        self.cancel.cancel();
        self.join().await
    }

    /// Wait for the loop to exit on its own
    pub async fn join(self) -> Result<PipelineExit> {
        match self.task.await {
            Ok(result) => result,
            Err(e) => Err(Error::Task(e.to_string())),
        }
    }
}
