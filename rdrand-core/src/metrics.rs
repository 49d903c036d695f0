// SPDX-License-Identifier: MIT
//
// RDRAND Writer: Hardware Random Number Dump Tool
//
// https://github.com/rdrand-writer/rdrand-writer

//! Run statistics
//!
//! Counters are observational only; nothing in the pipeline branches on them.
//! Each run gets a fresh handle, so a snapshot never mixes runs.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Shared run statistics handle
#[derive(Clone)]
pub struct RunStats {
    inner: Arc<StatsInner>,
}

struct StatsInner {
    start_time: Instant,
    samples_drawn: AtomicU64,
    retries: AtomicU64,
    flushes: AtomicU64,
    bytes_written: AtomicU64,
}

/// Point-in-time copy of the counters
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StatsSnapshot {
    pub samples_drawn: u64,
    pub retries: u64,
    pub flushes: u64,
    pub bytes_written: u64,
    pub elapsed_secs: f64,
    pub throughput_mib_per_sec: f64,
}

impl Default for RunStats {
    fn default() -> Self {
        Self::new()
    }
}

impl RunStats {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(StatsInner {
                start_time: Instant::now(),
                samples_drawn: AtomicU64::new(0),
                retries: AtomicU64::new(0),
                flushes: AtomicU64::new(0),
                bytes_written: AtomicU64::new(0),
            }),
        }
    }

    // Source metrics
    pub fn record_sample(&self) {
        self.inner.samples_drawn.fetch_add(1, Ordering::Relaxed);
    }

    /// Record the attempts one draw needed; everything past the first is a retry
    pub fn record_attempts(&self, attempts: u32) {
        if attempts > 1 {
            self.inner
                .retries
                .fetch_add(u64::from(attempts - 1), Ordering::Relaxed);
        }
    }

    pub fn samples_drawn(&self) -> u64 {
        self.inner.samples_drawn.load(Ordering::Relaxed)
    }

    pub fn retries(&self) -> u64 {
        self.inner.retries.load(Ordering::Relaxed)
    }

    // Sink metrics
    pub fn record_flush(&self, bytes: usize) {
        self.inner.flushes.fetch_add(1, Ordering::Relaxed);
        self.inner
            .bytes_written
            .fetch_add(bytes as u64, Ordering::Relaxed);
    }

    pub fn flushes(&self) -> u64 {
        self.inner.flushes.load(Ordering::Relaxed)
    }

    pub fn bytes_written(&self) -> u64 {
        self.inner.bytes_written.load(Ordering::Relaxed)
    }

    // Derived metrics
    pub fn elapsed(&self) -> Duration {
        self.inner.start_time.elapsed()
    }

    pub fn throughput_mib_per_sec(&self) -> f64 {
        let secs = self.elapsed().as_secs_f64();
        if secs > 0.0 {
            self.bytes_written() as f64 / (1024.0 * 1024.0) / secs
        } else {
            0.0
        }
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            samples_drawn: self.samples_drawn(),
            retries: self.retries(),
            flushes: self.flushes(),
            bytes_written: self.bytes_written(),
            elapsed_secs: self.elapsed().as_secs_f64(),
            throughput_mib_per_sec: self.throughput_mib_per_sec(),
        }
    }
}
