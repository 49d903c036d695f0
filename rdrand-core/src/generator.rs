// SPDX-License-Identifier: MIT
//
// RDRAND Writer: Hardware Random Number Dump Tool
//
// https://github.com/rdrand-writer/rdrand-writer

//! Generate-and-flush loop
//!
//! Draws exactly `num_values` samples, appends each to the reusable buffer,
//! flushes full buffers and writes a final partial batch. Any failure unwinds the
//! whole run; the buffer and the destination are released by drop on every path.
//!
//! # Modes
//!
//! - **Sequential** (default): draw and write alternate on one thread.
//! - **Pipelined**: two buffers circulate between the drawing thread and a
//!   writer thread over bounded channels. Batches are written in production
//!   order by a single writer, and a failed draw raises the abort flag so the
//!   writer stops before its next batch.

use crate::{
    buffer::SampleBuffer,
    config::GeneratorConfig,
    metrics::{RunStats, StatsSnapshot},
    progress::{ProgressObserver, ProgressTracker},
    sink::{write_batch, BufferedSink},
    source::{HardwareRng, SampleSource},
    Error, Request, Result,
};
use crossbeam::channel;
use parking_lot::Mutex;
use std::fs::File;
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{error, info, instrument};

/// Outcome of a successful run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunReport {
    /// Samples drawn and written
    pub samples: u64,
    /// Bytes written to the destination
    pub bytes_written: u64,
    pub stats: StatsSnapshot,
}

/// Drives generation runs with a fixed configuration
pub struct Generator {
    config: GeneratorConfig,
}

impl Generator {
    pub fn new(config: GeneratorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Run a request against the file it names
    ///
    /// The file is created or truncated here, after the request was validated.
    /// On success the data is synced to the device before the handle closes.
    #[instrument(skip_all, fields(path = %request.path().display(), bytes = request.output_bytes()))]
    pub fn run<R, O>(&self, request: &Request, rng: R, observer: O) -> Result<RunReport>
    where
        R: HardwareRng,
        O: ProgressObserver,
    {
        let file = File::create(request.path()).map_err(|source| {
            error!("Failed to open output file: {}", source);
            Error::Open {
                path: request.path().to_path_buf(),
                source,
            }
        })?;

        let (file, report) = self.generate(request, rng, file, observer)?;
        file.sync_all().map_err(|source| {
            error!("Failed to sync output file: {}", source);
            Error::Close { source }
        })?;
        drop(file);

        info!(
            samples = report.samples,
            bytes = report.bytes_written,
            flushes = report.stats.flushes,
            "Generation complete"
        );
        Ok(report)
    }

    /// Run a request against an arbitrary writer
    ///
    /// The writer is flushed, then dropped, before this returns.
    pub fn generate_into<R, W, O>(
        &self,
        request: &Request,
        rng: R,
        writer: W,
        observer: O,
    ) -> Result<RunReport>
    where
        R: HardwareRng,
        W: Write + Send,
        O: ProgressObserver,
    {
        self.generate(request, rng, writer, observer)
            .map(|(_, report)| report)
    }

    fn generate<R, W, O>(
        &self,
        request: &Request,
        rng: R,
        writer: W,
        observer: O,
    ) -> Result<(W, RunReport)>
    where
        R: HardwareRng,
        W: Write + Send,
        O: ProgressObserver,
    {
        let stats = RunStats::new();
        let num_values = request.num_values();
        let source = SampleSource::new(rng, self.config.retry_policy(), stats.clone());
        let tracker = ProgressTracker::new(
            self.config.progress_interval_bytes,
            num_values,
            request.size_bytes(),
        );

        let writer = if self.config.pipelined {
            self.generate_pipelined(num_values, source, tracker, writer, observer, &stats)?
        } else {
            self.generate_sequential(num_values, source, tracker, writer, observer, &stats)?
        };

        let stats = stats.snapshot();
        let report = RunReport {
            samples: num_values,
            bytes_written: stats.bytes_written,
            stats,
        };
        Ok((writer, report))
    }

    fn generate_sequential<R, W, O>(
        &self,
        num_values: u64,
        mut source: SampleSource<R>,
        mut tracker: ProgressTracker,
        writer: W,
        mut observer: O,
        stats: &RunStats,
    ) -> Result<W>
    where
        R: HardwareRng,
        W: Write,
        O: ProgressObserver,
    {
        let buffer = SampleBuffer::with_capacity(self.config.buffer_samples)?;
        let mut sink = BufferedSink::new(writer, buffer, stats.clone());

        for _ in 0..num_values {
            let sample = source.draw_one()?;
            sink.push(sample)?;

            if let Some(progress) = tracker.record() {
                observer.on_progress(&progress);
            }
        }

        sink.finish()
    }

    fn generate_pipelined<R, W, O>(
        &self,
        num_values: u64,
        mut source: SampleSource<R>,
        mut tracker: ProgressTracker,
        writer: W,
        mut observer: O,
        stats: &RunStats,
    ) -> Result<W>
    where
        R: HardwareRng,
        W: Write + Send,
        O: ProgressObserver,
    {
        let capacity = self.config.buffer_samples;
        let current = SampleBuffer::with_capacity(capacity)?;
        let spare = SampleBuffer::with_capacity(capacity)?;

        let (filled_tx, filled_rx) = channel::bounded::<SampleBuffer>(1);
        let (empty_tx, empty_rx) = channel::bounded::<SampleBuffer>(2);
        empty_tx
            .send(spare)
            .map_err(|_| Error::Internal("buffer pool closed".to_string()))?;

        let aborted = &AtomicBool::new(false);
        let writer_error: &Mutex<Option<Error>> = &Mutex::new(None);

        std::thread::scope(|scope| {
            // Owns its channel ends so an early return disconnects the drawing side.
            let writer_thread = scope.spawn(move || {
                let mut writer = writer;

                for mut batch in filled_rx.iter() {
                    if aborted.load(Ordering::Acquire) {
                        return None;
                    }
                    if let Err(e) = write_batch(&mut writer, &mut batch, stats) {
                        error!("Writer thread failed: {}", e);
                        *writer_error.lock() = Some(e);
                        return None;
                    }
                    let _ = empty_tx.send(batch);
                }

                if aborted.load(Ordering::Acquire) {
                    return None;
                }
                match writer.flush() {
                    Ok(()) => Some(writer),
                    Err(source) => {
                        *writer_error.lock() = Some(Error::Close { source });
                        None
                    }
                }
            });

            let produced = produce(
                num_values,
                &mut source,
                &mut tracker,
                &mut observer,
                current,
                empty_rx,
                filled_tx,
                aborted,
            );

            let written = writer_thread
                .join()
                .map_err(|_| Error::Internal("writer thread panicked".to_string()))?;

            match (produced, written) {
                (Err(e), _) => Err(e),
                (Ok(true), Some(writer)) => Ok(writer),
                (Ok(_), _) => Err(writer_error.lock().take().unwrap_or_else(|| {
                    Error::Internal("writer thread stopped early".to_string())
                })),
            }
        })
    }
}

/// Drawing side of the pipelined mode
///
/// Returns `Ok(false)` when the writer hung up early; the writer's own error
/// explains why. Dropping `filled_tx` on return ends the writer's loop.
#[allow(clippy::too_many_arguments)]
fn produce<R, O>(
    num_values: u64,
    source: &mut SampleSource<R>,
    tracker: &mut ProgressTracker,
    observer: &mut O,
    mut current: SampleBuffer,
    empty_rx: channel::Receiver<SampleBuffer>,
    filled_tx: channel::Sender<SampleBuffer>,
    aborted: &AtomicBool,
) -> Result<bool>
where
    R: HardwareRng,
    O: ProgressObserver,
{
    for _ in 0..num_values {
        let sample = match source.draw_one() {
            Ok(sample) => sample,
            Err(e) => {
                aborted.store(true, Ordering::Release);
                return Err(e);
            }
        };
        if let Err(e) = current.push(sample) {
            aborted.store(true, Ordering::Release);
            return Err(e);
        }

        if let Some(progress) = tracker.record() {
            observer.on_progress(&progress);
        }

        if current.is_full() {
            let Ok(next) = empty_rx.recv() else {
                return Ok(false);
            };
            let full = std::mem::replace(&mut current, next);
            if filled_tx.send(full).is_err() {
                return Ok(false);
            }
        }
    }

    if !current.is_empty() && filled_tx.send(current).is_err() {
        return Ok(false);
    }
    Ok(true)
}
