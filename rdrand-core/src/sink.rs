// SPDX-License-Identifier: MIT
//
// RDRAND Writer: Hardware Random Number Dump Tool
//
// https://github.com/rdrand-writer/rdrand-writer

//! Buffered sink: accumulates samples and flushes full buffers to a writer
//!
//! The sink owns both the reusable buffer and the destination for the whole run.
//! Dropping it (on any error path) releases both.

use crate::{buffer::SampleBuffer, metrics::RunStats, Error, Result};
use std::io::Write;
use tracing::debug;

/// Write the valid contents of `buffer` in full, then reset it
///
/// Shared by the sequential sink and the pipelined writer thread.
pub(crate) fn write_batch<W: Write>(
    writer: &mut W,
    buffer: &mut SampleBuffer,
    stats: &RunStats,
) -> Result<()> {
    if buffer.is_empty() {
        return Ok(());
    }

    let bytes = buffer.as_bytes();
    let expected = bytes.len();

    writer
        .write_all(bytes)
        .map_err(|source| Error::Write { expected, source })?;

    stats.record_flush(expected);
    debug!(
        samples = buffer.len(),
        bytes = expected,
        flushes = stats.flushes(),
        "Flushed buffer"
    );

    buffer.clear();
    Ok(())
}

/// Sequential buffered writer for samples
pub struct BufferedSink<W: Write> {
    writer: W,
    buffer: SampleBuffer,
    stats: RunStats,
}

impl<W: Write> BufferedSink<W> {
    pub fn new(writer: W, buffer: SampleBuffer, stats: RunStats) -> Self {
        Self {
            writer,
            buffer,
            stats,
        }
    }

    /// Append a sample, flushing when the buffer reaches capacity
    pub fn push(&mut self, sample: u64) -> Result<()> {
        self.buffer.push(sample)?;
        if self.buffer.is_full() {
            self.flush()?;
        }
        Ok(())
    }

    /// Write whatever the buffer holds (possibly a partial batch)
    pub fn flush(&mut self) -> Result<()> {
        write_batch(&mut self.writer, &mut self.buffer, &self.stats)
    }

    /// Flush the tail batch and the writer, returning the writer
    ///
    /// `File::flush` does nothing; `Generator::run` syncs the returned file,
    /// and that is where a file's deferred write errors turn into `Error::Close`.
    pub fn finish(mut self) -> Result<W> {
        self.flush()?;
        self.writer
            .flush()
            .map_err(|source| Error::Close { source })?;
        Ok(self.writer)
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{RecordingWriter, ShortWriter};
    use super::*;

    fn sink(capacity: usize, writer: RecordingWriter) -> BufferedSink<RecordingWriter> {
        BufferedSink::new(
            writer,
            SampleBuffer::with_capacity(capacity).unwrap(),
            RunStats::new(),
        )
    }

    #[test]
    fn test_full_buffers_flush_in_order() {
        let mut sink = sink(3, RecordingWriter::default());
        for v in 0..7u64 {
            sink.push(v).unwrap();
        }
        // One sample is still buffered; only the two full batches went out.
        assert_eq!(sink.writer.writes, vec![24, 24]);

        let writer = sink.finish().unwrap();

        assert_eq!(writer.writes, vec![24, 24, 8]);
        assert_eq!(writer.samples(), (0..7).collect::<Vec<_>>());
        assert!(writer.flushed);
    }

    #[test]
    fn test_exact_multiple_has_no_tail_flush() {
        let mut sink = sink(2, RecordingWriter::default());
        for v in 0..4u64 {
            sink.push(v).unwrap();
        }
        let writer = sink.finish().unwrap();
        assert_eq!(writer.writes, vec![16, 16]);
    }

    #[test]
    fn test_empty_run_writes_nothing() {
        let writer = sink(4, RecordingWriter::default()).finish().unwrap();
        assert!(writer.writes.is_empty());
        assert!(writer.flushed);
    }

    #[test]
    fn test_write_failure_is_fatal() {
        let mut sink = sink(2, RecordingWriter::failing_after(16));
        sink.push(1).unwrap();
        sink.push(2).unwrap();
        sink.push(3).unwrap();

        let err = sink.push(4).unwrap_err();
        assert!(matches!(err, Error::Write { expected: 16, .. }));
    }

    #[test]
    fn test_short_write_is_fatal() {
        let mut sink = BufferedSink::new(
            ShortWriter { accepted: 0 },
            SampleBuffer::with_capacity(2).unwrap(),
            RunStats::new(),
        );
        sink.push(1).unwrap();
        assert!(matches!(sink.push(2), Err(Error::Write { expected: 16, .. })));
    }
}
