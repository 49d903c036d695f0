//! Fixed-capacity sample buffer reused across flushes
//!
//! Samples are stored as native-endian bytes so a flush writes the storage
//! directly, with no intermediate copy. The storage is reserved once; `clear`
//! resets the fill index and keeps the allocation for the next batch.

use crate::{Error, Result, SAMPLE_BYTES};
use bytes::BufMut;

/// Ordered, fixed-capacity holding area for samples pending write-out
///
/// # Invariants
///
/// - `len() <= capacity()` at all times; a push into a full buffer is refused
/// - the backing storage is never reallocated after construction
#[derive(Debug)]
pub struct SampleBuffer {
    data: Vec<u8>,
    capacity: usize,
}

impl SampleBuffer {
    /// Reserve a buffer for `capacity` samples
    ///
    /// The reservation is fallible so an oversized capacity surfaces as
    /// `Error::Allocation` instead of aborting the process.
    pub fn with_capacity(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(Error::Config("buffer capacity must be > 0".to_string()));
        }

        let bytes = capacity
            .checked_mul(SAMPLE_BYTES as usize)
            .ok_or(Error::Allocation { bytes: usize::MAX })?;

        let mut data = Vec::new();
        data.try_reserve_exact(bytes)
            .map_err(|_| Error::Allocation { bytes })?;

        Ok(Self { data, capacity })
    }

    /// Append one sample
    pub fn push(&mut self, sample: u64) -> Result<()> {
        if self.is_full() {
            return Err(Error::Internal(format!(
                "push into full buffer (capacity {} samples)",
                self.capacity
            )));
        }
        self.data.put_u64_ne(sample);
        Ok(())
    }

    /// Number of samples held
    pub fn len(&self) -> usize {
        self.data.len() / SAMPLE_BYTES as usize
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.len() == self.capacity
    }

    /// Capacity in samples
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Valid contents in insertion order, exactly `len() * 8` bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Iterate the held samples in insertion order
    pub fn samples(&self) -> impl Iterator<Item = u64> + '_ {
        self.data.chunks_exact(SAMPLE_BYTES as usize).map(|chunk| {
            let mut raw = [0u8; SAMPLE_BYTES as usize];
            raw.copy_from_slice(chunk);
            u64::from_ne_bytes(raw)
        })
    }

    /// Reset to empty, keeping the storage
    pub fn clear(&mut self) {
        self.data.clear();
    }
}
