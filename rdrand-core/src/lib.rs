// SPDX-License-Identifier: MIT
//
// RDRAND Writer: Hardware Random Number Dump Tool
//
// https://github.com/rdrand-writer/rdrand-writer

//! RDRAND Core Library
//!
//! This crate provides the building blocks of the RDRAND writer: detecting the
//! processor's hardware random number instruction, drawing 64-bit samples from it
//! with a bounded retry window, and streaming the samples to a file through a
//! fixed-capacity, reusable buffer.
//!
//! # Architecture
//!
//! The pipeline is strictly linear: feature check, then draw/append/flush repeated, then a
//! final partial flush.
//!
//! - `cpu`: CPU feature detection for RDRAND
//! - `source`: hardware sample source with bounded retries
//! - `retry`: retry policy and tri-state attempt outcome
//! - `buffer`: fixed-capacity sample buffer reused across flushes
//! - `sink`: buffered writer owning the buffer and the destination
//! - `generator`: the generate-and-flush loop (sequential or pipelined)
//! - `request`: validated run request (size and destination)
//! - `progress`: progress accounting and observers
//! - `config`: tunables loaded from the environment
//! - `metrics`: run statistics
//! - `session`: one complete invocation, from feature check to close
//! - `error`: unified error types
//!
//! # Not a CSPRNG
//!
//! No conditioning, whitening or health testing is performed. Samples are written
//! exactly as the instruction returns them, in native byte order.

pub mod buffer;
pub mod config;
pub mod cpu;
pub mod error;
pub mod generator;
pub mod metrics;
pub mod progress;
pub mod request;
pub mod retry;
pub mod session;
pub mod sink;
pub mod source;

pub use error::{Error, Result};
pub use request::Request;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Size of one sample in bytes
pub const SAMPLE_BYTES: u64 = std::mem::size_of::<u64>() as u64;

/// Bytes in one gigabyte (binary)
pub const BYTES_IN_GB: u64 = 1024 * 1024 * 1024;

/// Default request size in gigabytes
pub const DEFAULT_SIZE_GB: f64 = 0.1;

/// Default destination file
pub const DEFAULT_OUTPUT_FILE: &str = "rdrand_output.bin";

/// Default buffer capacity in samples (4 Mi samples, 32 MiB)
pub const DEFAULT_BUFFER_SAMPLES: usize = 4 * 1024 * 1024;

/// Default number of attempts per draw
pub const DEFAULT_RETRY_LIMIT: u32 = 10;

/// Default progress notification interval (1 MiB)
pub const DEFAULT_PROGRESS_INTERVAL_BYTES: u64 = 1024 * 1024;
