//! Scoped stage measurement.
//!
//! [`StageTimings`] is a call-scoped collector. Each pipeline stage holds a
//! [`StageGuard`] for its duration; the guard records the elapsed time when it
//! is dropped, so early returns through `?` are measured too.
//!
//! ```rust,ignore
//! let timings = StageTimings::new();
//! {
//!     let _stage = timings.start("semantic_retrieve");
//!     fetch().await?;
//! }
//! for t in timings.records() {
//!     println!("{}: {:?}", t.stage, t.elapsed);
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// One completed stage measurement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageTiming {
    /// Stage name.
    pub stage: String,
    /// Wall-clock time spent in the stage.
    pub elapsed: Duration,
}

/// Collects stage timings for one retrieval call.
///
/// Guards from concurrently running stages may share one collector.
#[derive(Debug, Default)]
pub struct StageTimings {
    records: Mutex<Vec<StageTiming>>,
}

impl StageTimings {
    /// Create an empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start measuring a stage. Recording happens when the guard drops.
    pub fn start(&self, stage: &'static str) -> StageGuard<'_> {
        StageGuard {
            sink: self,
            stage,
            started: Instant::now(),
        }
    }

    /// Snapshot of the recorded stages in completion order.
    pub fn records(&self) -> Vec<StageTiming> {
        self.lock().clone()
    }

    /// Consume the collector, returning the recorded stages.
    pub fn into_records(self) -> Vec<StageTiming> {
        self.records
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Elapsed time of the first recorded stage with this name.
    pub fn elapsed(&self, stage: &str) -> Option<Duration> {
        self.lock()
            .iter()
            .find(|t| t.stage == stage)
            .map(|t| t.elapsed)
    }

    fn record(&self, stage: &str, elapsed: Duration) {
        self.lock().push(StageTiming {
            stage: stage.to_string(),
            elapsed,
        });
    }

    // A panic while holding the lock cannot leave the Vec half-written.
    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<StageTiming>> {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Live measurement of one stage.
#[derive(Debug)]
#[must_use = "the stage is measured until this guard is dropped"]
pub struct StageGuard<'a> {
    sink: &'a StageTimings,
    stage: &'static str,
    started: Instant,
}

impl StageGuard<'_> {
    /// Time elapsed so far.
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

impl Drop for StageGuard<'_> {
    fn drop(&mut self) {
        let elapsed = self.started.elapsed();
        log::debug!(
            "stage {}: {:.2} ms",
            self.stage,
            elapsed.as_secs_f64() * 1000.0
        );
        self.sink.record(self.stage, elapsed);
    }
}
