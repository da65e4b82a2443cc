//! The polling loop: read, parse, assemble, write, sleep.
//!
//! Cycles never overlap. Every per-cycle failure is logged and the loop moves
//! on to the next cycle; nothing here terminates the process.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

use crate::collector::{BuddyinfoCollector, CollectError, FileSystem};
use crate::config::Settings;
use crate::point::{Batch, assemble};
use crate::writer::{PointWriter, TransportError};

/// How often the inter-cycle sleep checks for shutdown.
const SHUTDOWN_POLL: Duration = Duration::from_millis(100);

/// Why a cycle produced no write.
#[derive(Debug, thiserror::Error)]
pub enum CycleError {
    #[error(transparent)]
    Collect(#[from] CollectError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The wall clock cannot be expressed as nanoseconds since the epoch.
    #[error("clock out of range: {0}")]
    Clock(DateTime<Utc>),
}

/// Outcome of a successful cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    /// Points written (0 when the source was empty and the write was skipped).
    pub points: usize,
    pub summary: String,
    pub elapsed: Duration,
}

/// Drives collection and writing on a fixed interval.
pub struct Dispatcher<F: FileSystem, W: PointWriter> {
    collector: BuddyinfoCollector<F>,
    writer: W,
    settings: Settings,
    cycles: u64,
    failures: u64,
}

impl<F: FileSystem, W: PointWriter> Dispatcher<F, W> {
    pub fn new(collector: BuddyinfoCollector<F>, writer: W, settings: Settings) -> Self {
        Self {
            collector,
            writer,
            settings,
            cycles: 0,
            failures: 0,
        }
    }

    pub fn writer(&self) -> &W {
        &self.writer
    }

    pub fn collector_mut(&mut self) -> &mut BuddyinfoCollector<F> {
        &mut self.collector
    }

    /// Cycles started so far.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Cycles that ended in an error.
    pub fn failures(&self) -> u64 {
        self.failures
    }

    /// Runs one cycle stamped with the current time.
    pub fn run_cycle(&mut self) -> Result<CycleReport, CycleError> {
        self.run_cycle_at(Utc::now())
    }

    /// Runs one cycle with `now` as the batch base time.
    pub fn run_cycle_at(&mut self, now: DateTime<Utc>) -> Result<CycleReport, CycleError> {
        self.cycles += 1;
        let result = self.cycle(now);
        if result.is_err() {
            self.failures += 1;
        }
        result
    }

    fn cycle(&mut self, now: DateTime<Utc>) -> Result<CycleReport, CycleError> {
        let start = Instant::now();
        let base_ns = now.timestamp_nanos_opt().ok_or(CycleError::Clock(now))?;

        let records = self.collector.collect()?;
        let batch = assemble(
            &records,
            &self.settings.measurement,
            &self.settings.tags,
            base_ns,
        );
        let summary = batch.describe();

        if batch.is_empty() {
            warn!(
                "{} contains no lines, skipping write",
                self.collector.path().display()
            );
        } else {
            self.write(&batch)?;
        }

        Ok(CycleReport {
            points: batch.len(),
            summary,
            elapsed: start.elapsed(),
        })
    }

    fn write(&mut self, batch: &Batch) -> Result<(), TransportError> {
        let start = Instant::now();
        self.writer.write(batch)?;
        debug!(
            points = batch.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "batch written"
        );
        Ok(())
    }

    /// Runs one cycle and logs its outcome.
    pub fn tick(&mut self) -> bool {
        match self.run_cycle() {
            Ok(report) => {
                info!(
                    "Cycle #{}: {} in {:?}",
                    self.cycles, report.summary, report.elapsed
                );
                true
            }
            Err(e) => {
                error!("Cycle #{} failed: {}", self.cycles, e);
                false
            }
        }
    }

    /// Loops until `running` is cleared, sleeping `settings.interval` between cycles.
    pub fn run(&mut self, running: &AtomicBool) {
        info!(
            "Polling {} every {:?}",
            self.collector.path().display(),
            self.settings.interval
        );

        while running.load(Ordering::SeqCst) {
            self.tick();
            sleep_while_running(self.settings.interval, running);
        }

        info!(
            "Stopped after {} cycles ({} failed)",
            self.cycles, self.failures
        );
    }
}

/// Sleeps for `duration`, returning early once `running` is cleared.
fn sleep_while_running(duration: Duration, running: &AtomicBool) {
    let mut remaining = duration;
    while remaining > Duration::ZERO && running.load(Ordering::SeqCst) {
        let sleep_time = remaining.min(SHUTDOWN_POLL);
        std::thread::sleep(sleep_time);
        remaining = remaining.saturating_sub(sleep_time);
    }
}
