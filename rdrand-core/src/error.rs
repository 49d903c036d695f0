// SPDX-License-Identifier: MIT
//
// RDRAND Writer: Hardware Random Number Dump Tool
//
// https://github.com/rdrand-writer/rdrand-writer

//! Error types for the RDRAND writer
//!
//! Provides a unified error taxonomy using `thiserror` for ergonomic error handling.
//! Every variant is fatal for the run.

use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for generation runs
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The processor lacks the RDRAND instruction
    #[error("RDRAND is not supported on this CPU")]
    Unsupported,

    /// Requested size is non-positive, non-finite or unparsable
    #[error("Invalid data size: {0}")]
    InvalidSize(String),

    /// Tunable validation failed
    #[error("Configuration error: {0}")]
    Config(String),

    /// Destination could not be created or truncated
    #[error("Failed to open output file '{}': {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The reusable buffer could not be reserved
    #[error("Failed to allocate buffer of {bytes} bytes")]
    Allocation { bytes: usize },

    /// Retry window exhausted for a single draw
    #[error("RDRAND failed to generate a valid random number after {attempts} attempts")]
    HardwareExhausted { attempts: u32 },

    /// A flush did not write the expected byte count
    #[error("Failed to write {expected} bytes to output file: {source}")]
    Write {
        expected: usize,
        #[source]
        source: std::io::Error,
    },

    /// Flushing or syncing the destination at the end of the run failed
    ///
    /// Raised from the final `flush` of the writer and, for files, from
    /// `sync_all`, so deferred write-back errors surface here rather than
    /// being lost when the handle drops.
    #[error("Failed to close output file: {source}")]
    Close {
        #[source]
        source: std::io::Error,
    },

    /// Generic internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Process exit status for this error
    ///
    /// Causes are distinguished by message only.
    pub fn exit_code(&self) -> u8 {
        1
    }

    /// Check if error was raised before any file-system interaction
    pub fn is_pre_io(&self) -> bool {
        matches!(
            self,
            Error::Unsupported | Error::InvalidSize(_) | Error::Config(_)
        )
    }
}

impl From<envy::Error> for Error {
    fn from(e: envy::Error) -> Self {
        Error::Config(format!("Failed to parse environment variables: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_error_exits_with_one() {
        let errors = [
            Error::Unsupported,
            Error::InvalidSize("-5".to_string()),
            Error::Allocation { bytes: 8 },
            Error::HardwareExhausted { attempts: 10 },
            Error::Close {
                source: std::io::Error::other("boom"),
            },
        ];
        for e in &errors {
            assert_eq!(e.exit_code(), 1);
        }
    }

    #[test]
    fn test_messages_are_distinct() {
        let exhausted = Error::HardwareExhausted { attempts: 10 }.to_string();
        let unsupported = Error::Unsupported.to_string();
        assert!(exhausted.contains("10 attempts"));
        assert!(unsupported.contains("not supported"));
        assert_ne!(exhausted, unsupported);
    }

    #[test]
    fn test_open_error_names_path() {
        let e = Error::Open {
            path: PathBuf::from("/nope/out.bin"),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert!(e.to_string().contains("/nope/out.bin"));
        assert!(!e.is_pre_io());
    }
}
