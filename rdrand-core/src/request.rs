// SPDX-License-Identifier: MIT
//
// RDRAND Writer: Hardware Random Number Dump Tool
//
// https://github.com/rdrand-writer/rdrand-writer

//! Validated run request
//!
//! A request is built once from the invocation and never mutated. All validation
//! happens here, before anything touches the file system.

use crate::{Error, Result, BYTES_IN_GB, DEFAULT_OUTPUT_FILE, DEFAULT_SIZE_GB, SAMPLE_BYTES};
use std::path::{Path, PathBuf};

/// Target size and destination for one generation run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    size_bytes: u64,
    path: PathBuf,
}

impl Request {
    /// Build a request from an exact byte count
    pub fn new(size_bytes: u64, path: impl Into<PathBuf>) -> Result<Self> {
        if size_bytes == 0 {
            return Err(Error::InvalidSize(
                "requested size must be at least one byte".to_string(),
            ));
        }
        Ok(Self {
            size_bytes,
            path: path.into(),
        })
    }

    /// Build a request from a size in (binary) gigabytes
    ///
    /// Fractions of a byte are truncated. Sizes beyond `u64::MAX` bytes saturate.
    pub fn from_gigabytes(size_gb: f64, path: impl Into<PathBuf>) -> Result<Self> {
        if !size_gb.is_finite() || size_gb <= 0.0 {
            return Err(Error::InvalidSize(format!(
                "{} is not a positive number of gigabytes",
                size_gb
            )));
        }

        let size_bytes = (size_gb * BYTES_IN_GB as f64) as u64;
        Self::new(size_bytes, path)
    }

    /// Build a request from the optional positional arguments
    pub fn from_args(size_arg: Option<&str>, path_arg: Option<&Path>) -> Result<Self> {
        let size_gb = match size_arg {
            Some(arg) => parse_gigabytes(arg)?,
            None => DEFAULT_SIZE_GB,
        };
        let path = path_arg
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_FILE));

        Self::from_gigabytes(size_gb, path)
    }

    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    pub fn size_gb(&self) -> f64 {
        self.size_bytes as f64 / BYTES_IN_GB as f64
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Samples to draw; any sub-sample remainder of the size is dropped
    pub fn num_values(&self) -> u64 {
        self.size_bytes / SAMPLE_BYTES
    }

    /// Exact length of the file a successful run produces
    pub fn output_bytes(&self) -> u64 {
        self.num_values() * SAMPLE_BYTES
    }
}

/// Parse a user-supplied size in gigabytes
pub fn parse_gigabytes(arg: &str) -> Result<f64> {
    let value: f64 = arg
        .trim()
        .parse()
        .map_err(|_| Error::InvalidSize(format!("'{}' is not a number", arg)))?;

    if !value.is_finite() || value <= 0.0 {
        return Err(Error::InvalidSize(format!(
            "'{}' is not a positive number of gigabytes",
            arg
        )));
    }
    Ok(value)
}
