// SPDX-License-Identifier: MIT
//
// RDRAND Writer: Hardware Random Number Dump Tool
//
// https://github.com/rdrand-writer/rdrand-writer

//! One complete invocation: check hardware, validate, open, generate, close
//!
//! The hardware check runs before anything else and the request is validated
//! before the destination is created, so neither failure touches the file system.

use crate::{
    config::GeneratorConfig,
    generator::{Generator, RunReport},
    progress::ProgressObserver,
    source::HardwareRng,
    Error, Request, Result,
};
use std::path::Path;
use tracing::{error, info};

/// Runs requests with a fixed configuration
#[derive(Debug, Clone, Default)]
pub struct Session {
    config: GeneratorConfig,
}

impl Session {
    pub fn new(config: GeneratorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Check the hardware, then validate the invocation arguments
    pub fn prepare<R: HardwareRng>(
        &self,
        rng: &R,
        size_arg: Option<&str>,
        path_arg: Option<&Path>,
    ) -> Result<Request> {
        ensure_supported(rng)?;
        self.config.validate()?;
        Request::from_args(size_arg, path_arg)
    }

    /// Generate a prepared request
    pub fn execute<R, O>(&self, request: &Request, rng: R, observer: O) -> Result<RunReport>
    where
        R: HardwareRng,
        O: ProgressObserver,
    {
        info!(
            bytes = request.size_bytes(),
            samples = request.num_values(),
            buffer_samples = self.config.buffer_samples,
            flush_bytes = self.config.flush_bytes(),
            pipelined = self.config.pipelined,
            "Starting generation"
        );

        let generator = Generator::new(self.config.clone())?;
        generator.run(request, rng, observer)
    }

    /// `prepare` followed by `execute`
    pub fn run<R, O>(
        &self,
        rng: R,
        size_arg: Option<&str>,
        path_arg: Option<&Path>,
        observer: O,
    ) -> Result<RunReport>
    where
        R: HardwareRng,
        O: ProgressObserver,
    {
        let request = self.prepare(&rng, size_arg, path_arg)?;
        self.execute(&request, rng, observer)
    }
}

/// Fail with `Unsupported` unless the hardware primitive exists
///
/// Runs before configuration or arguments are looked at.
pub fn ensure_supported<R: HardwareRng>(rng: &R) -> Result<()> {
    if !rng.is_supported() {
        error!("Hardware RNG instruction not available");
        return Err(Error::Unsupported);
    }
    Ok(())
}

/// Process exit status for a run outcome
pub fn exit_code<T>(outcome: &Result<T>) -> u8 {
    match outcome {
        Ok(_) => 0,
        Err(e) => e.exit_code(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::Silent;
    use crate::source::testing::StubRng;
    use crate::{BYTES_IN_GB, SAMPLE_BYTES};

    fn small_config() -> GeneratorConfig {
        GeneratorConfig {
            buffer_samples: 1024,
            ..GeneratorConfig::default()
        }
    }

    #[test]
    fn test_unsupported_hardware_touches_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.bin");

        let outcome = Session::new(small_config()).run(
            StubRng::unsupported(),
            Some("1"),
            Some(&path),
            Silent,
        );

        assert!(matches!(outcome, Err(Error::Unsupported)));
        assert_eq!(exit_code(&outcome), 1);
        assert!(!path.exists());
    }

    #[test]
    fn test_ensure_supported() {
        assert!(matches!(
            ensure_supported(&StubRng::unsupported()),
            Err(Error::Unsupported)
        ));
        assert!(ensure_supported(&StubRng::seeded(1)).is_ok());
    }

    #[test]
    fn test_support_check_precedes_size_validation() {
        let session = Session::default();
        let err = session
            .prepare(&StubRng::unsupported(), Some("-5"), None)
            .unwrap_err();
        assert!(matches!(err, Error::Unsupported));
    }

    #[test]
    fn test_invalid_size_leaves_existing_file_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.bin");
        std::fs::write(&path, b"keep me").unwrap();

        let outcome = Session::new(small_config()).run(
            StubRng::seeded(1),
            Some("-5"),
            Some(&path),
            Silent,
        );

        let err = outcome.as_ref().unwrap_err();
        assert!(matches!(err, Error::InvalidSize(_)));
        assert!(err.to_string().contains("Invalid data size"));
        assert_eq!(exit_code(&outcome), 1);
        assert_eq!(std::fs::read(&path).unwrap(), b"keep me");
    }

    #[test]
    fn test_invalid_size_creates_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.bin");

        for arg in ["0", "abc", "-0.5"] {
            let outcome =
                Session::new(small_config()).run(StubRng::seeded(1), Some(arg), Some(&path), Silent);
            assert!(outcome.is_err());
        }
        assert!(!path.exists());
    }

    #[test]
    fn test_exhaustion_reports_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.bin");

        let outcome = Session::new(small_config()).run(
            StubRng::failing_after(8, 2048 + 100),
            Some("0.001"),
            Some(&path),
            Silent,
        );

        assert!(matches!(outcome, Err(Error::HardwareExhausted { .. })));
        assert_eq!(exit_code(&outcome), 1);
        // Two full batches reached the disk before the failure.
        assert_eq!(std::fs::metadata(&path).unwrap().len(), 2 * 1024 * 8);
    }

    #[test]
    fn test_sub_sample_request_produces_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.bin");
        let session = Session::new(small_config());
        let request = Request::new(5, &path).unwrap();

        let report = session.execute(&request, StubRng::seeded(2), Silent).unwrap();

        assert_eq!(report.bytes_written, 0);
        assert!(path.exists());
        assert_eq!(std::fs::metadata(&path).unwrap().len(), 0);
    }

    #[test]
    fn test_default_size_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rdrand_output.bin");

        let outcome = Session::default().run(StubRng::seeded(3), None, Some(&path), Silent);

        assert_eq!(exit_code(&outcome), 0);
        let expected = ((0.1 * BYTES_IN_GB as f64) as u64 / SAMPLE_BYTES) * SAMPLE_BYTES;
        assert_eq!(outcome.unwrap().bytes_written, expected);
        assert_eq!(std::fs::metadata(&path).unwrap().len(), expected);
    }
}
