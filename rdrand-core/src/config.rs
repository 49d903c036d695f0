//! Configuration management for generation runs

use crate::{
    retry::RetryPolicy, Error, Result, DEFAULT_BUFFER_SAMPLES, DEFAULT_PROGRESS_INTERVAL_BYTES,
    DEFAULT_RETRY_LIMIT,
};
use serde::{Deserialize, Serialize};

/// Environment variable prefix for all tunables
pub const ENV_PREFIX: &str = "RDRAND_";

/// Generator tunables
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct GeneratorConfig {
    /// Buffer capacity in samples (8 bytes each)
    #[serde(default = "default_buffer_samples")]
    pub buffer_samples: usize,

    /// Attempts per draw before the hardware is declared exhausted
    #[serde(default = "default_retry_limit")]
    pub retry_limit: u32,

    /// Bytes of generated data between progress notifications
    #[serde(default = "default_progress_interval_bytes")]
    pub progress_interval_bytes: u64,

    /// Overlap generation and file writes on two threads
    #[serde(default)]
    pub pipelined: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            buffer_samples: default_buffer_samples(),
            retry_limit: default_retry_limit(),
            progress_interval_bytes: default_progress_interval_bytes(),
            pipelined: false,
        }
    }
}

impl GeneratorConfig {
    /// Load configuration from `RDRAND_*` environment variables
    pub fn from_env() -> Result<Self> {
        let config: Self = envy::prefixed(ENV_PREFIX).from_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from explicit key/value pairs (`RDRAND_`-prefixed)
    pub fn from_vars<I>(vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let config: Self = envy::prefixed(ENV_PREFIX).from_iter(vars)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.buffer_samples == 0 {
            return Err(Error::Config("buffer_samples must be > 0".to_string()));
        }

        if self.buffer_samples.checked_mul(crate::SAMPLE_BYTES as usize).is_none() {
            return Err(Error::Config(format!(
                "buffer_samples {} overflows the addressable byte range",
                self.buffer_samples
            )));
        }

        if self.retry_limit == 0 {
            return Err(Error::Config("retry_limit must be > 0".to_string()));
        }

        if self.progress_interval_bytes == 0 {
            return Err(Error::Config(
                "progress_interval_bytes must be > 0".to_string(),
            ));
        }

        Ok(())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.retry_limit)
    }

    /// Size of one full flush in bytes
    pub fn flush_bytes(&self) -> usize {
        self.buffer_samples * crate::SAMPLE_BYTES as usize
    }
}

// Default value functions
fn default_buffer_samples() -> usize {
    DEFAULT_BUFFER_SAMPLES
}

fn default_retry_limit() -> u32 {
    DEFAULT_RETRY_LIMIT
}

fn default_progress_interval_bytes() -> u64 {
    DEFAULT_PROGRESS_INTERVAL_BYTES
}
