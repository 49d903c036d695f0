//! Progress accounting for generation runs
//!
//! The tracker only decides when a notification is due. Observers receive it and
//! return nothing, so they cannot steer the run.

use crate::SAMPLE_BYTES;
use tracing::debug;

/// One progress notification
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Progress {
    /// Completed share of the run, 0.0 - 1.0
    pub fraction: f64,
    /// Bytes produced so far
    pub bytes_generated: u64,
    /// Bytes requested by the caller
    pub bytes_total: u64,
}

impl Progress {
    pub fn percent(&self) -> f64 {
        self.fraction * 100.0
    }
}

/// Receives progress notifications
pub trait ProgressObserver {
    fn on_progress(&mut self, progress: &Progress);
}

impl<F: FnMut(&Progress)> ProgressObserver for F {
    fn on_progress(&mut self, progress: &Progress) {
        self(progress)
    }
}

/// Observer that discards notifications
#[derive(Debug, Default, Clone, Copy)]
pub struct Silent;

impl ProgressObserver for Silent {
    fn on_progress(&mut self, _progress: &Progress) {}
}

/// Observer that logs notifications at debug level
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingProgress;

impl ProgressObserver for TracingProgress {
    fn on_progress(&mut self, progress: &Progress) {
        debug!(
            bytes_generated = progress.bytes_generated,
            bytes_total = progress.bytes_total,
            "Progress: {:.1}%",
            progress.percent()
        );
    }
}

/// Monotonic sample counter that emits every `interval` samples
#[derive(Debug, Clone)]
pub struct ProgressTracker {
    interval: u64,
    total_samples: u64,
    bytes_total: u64,
    produced: u64,
    last_emitted: u64,
}

impl ProgressTracker {
    /// `interval_bytes` is rounded down to whole samples, minimum one
    pub fn new(interval_bytes: u64, total_samples: u64, bytes_total: u64) -> Self {
        Self {
            interval: (interval_bytes / SAMPLE_BYTES).max(1),
            total_samples,
            bytes_total,
            produced: 0,
            last_emitted: 0,
        }
    }

    /// Count one produced sample; returns a notification when one is due
    pub fn record(&mut self) -> Option<Progress> {
        self.produced += 1;

        if self.produced - self.last_emitted < self.interval {
            return None;
        }
        self.last_emitted = self.produced;

        Some(Progress {
            fraction: if self.total_samples == 0 {
                1.0
            } else {
                self.produced as f64 / self.total_samples as f64
            },
            bytes_generated: self.produced * SAMPLE_BYTES,
            bytes_total: self.bytes_total,
        })
    }
}
