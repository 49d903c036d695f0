// SPDX-License-Identifier: MIT
//
// RDRAND Writer: Hardware Random Number Dump Tool
//
// https://github.com/rdrand-writer/rdrand-writer

//! Hardware sample source
//!
//! `HardwareRng` is the seam between the processor instruction and the rest of
//! the pipeline. `SampleSource` wraps any implementation with the bounded retry
//! window and turns exhaustion into a fatal error.

use crate::{
    metrics::RunStats,
    cpu,
    retry::{Attempt, RetryPolicy},
    Error, Result,
};
use tracing::error;

/// A "try, maybe fail" hardware random number primitive
pub trait HardwareRng: Send {
    /// Whether the primitive exists on this machine
    fn is_supported(&self) -> bool;

    /// Execute the primitive once
    ///
    /// `NotReady` means the hardware was transiently not ready and the step may
    /// be repeated. `Exhausted` means repeating it cannot help.
    fn try_step(&mut self) -> Attempt<u64>;
}

impl<R: HardwareRng + ?Sized> HardwareRng for Box<R> {
    fn is_supported(&self) -> bool {
        (**self).is_supported()
    }

    fn try_step(&mut self) -> Attempt<u64> {
        (**self).try_step()
    }
}

/// The processor's RDRAND instruction
///
/// Never executes the instruction unless CPUID reported support at
/// construction; on unsupported hardware every step gives up at once.
#[derive(Debug, Clone, Copy)]
pub struct RdRand {
    supported: bool,
}

impl RdRand {
    pub fn new() -> Self {
        Self {
            supported: cpu::rdrand_supported(),
        }
    }
}

impl Default for RdRand {
    fn default() -> Self {
        Self::new()
    }
}

impl HardwareRng for RdRand {
    fn is_supported(&self) -> bool {
        self.supported
    }

    fn try_step(&mut self) -> Attempt<u64> {
        if !self.supported {
            return Attempt::Exhausted { attempts: 1 };
        }
        // SAFETY: `supported` is only true when CPUID reported RDRAND.
        unsafe { rdrand64_step() }
    }
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "rdrand")]
unsafe fn rdrand64_step() -> Attempt<u64> {
    let mut value = 0u64;
    if std::arch::x86_64::_rdrand64_step(&mut value) == 1 {
        Attempt::Ready(value)
    } else {
        Attempt::NotReady
    }
}

// No 64-bit form on 32-bit x86; two 32-bit steps must both succeed.
#[cfg(target_arch = "x86")]
#[target_feature(enable = "rdrand")]
unsafe fn rdrand64_step() -> Attempt<u64> {
    use std::arch::x86::_rdrand32_step;

    let (mut lo, mut hi) = (0u32, 0u32);
    if _rdrand32_step(&mut lo) == 1 && _rdrand32_step(&mut hi) == 1 {
        Attempt::Ready((u64::from(hi) << 32) | u64::from(lo))
    } else {
        Attempt::NotReady
    }
}

#[cfg(not(any(target_arch = "x86", target_arch = "x86_64")))]
unsafe fn rdrand64_step() -> Attempt<u64> {
    Attempt::Exhausted { attempts: 1 }
}

/// Draws one sample at a time with a bounded retry window
pub struct SampleSource<R> {
    rng: R,
    policy: RetryPolicy,
    stats: RunStats,
}

impl<R: HardwareRng> SampleSource<R> {
    pub fn new(rng: R, policy: RetryPolicy, stats: RunStats) -> Self {
        Self { rng, policy, stats }
    }

    /// Draw one sample
    ///
    /// Fails with `HardwareExhausted` once `policy.max_attempts` consecutive
    /// attempts report not-ready, or as soon as a step gives up outright. The
    /// caller treats that as fatal.
    pub fn draw_one(&mut self) -> Result<u64> {
        let rng = &mut self.rng;
        let (outcome, attempts) = self.policy.execute(|| rng.try_step());
        self.stats.record_attempts(attempts);

        if let Attempt::Ready(value) = outcome {
            self.stats.record_sample();
            return Ok(value);
        }

        error!("Hardware RNG exhausted after {} attempts", attempts);
        Err(Error::HardwareExhausted { attempts })
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Stub hardware used across the crate's tests

    use super::HardwareRng;
    use crate::retry::Attempt;
    use rand::{rngs::StdRng, RngCore, SeedableRng};
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;

    /// Seeded software stand-in that can be made to fail
    pub struct StubRng {
        pub supported: bool,
        rng: StdRng,
        /// Steps that report not-ready before each success
        pub not_ready_per_draw: u32,
        pending_failures: u32,
        /// After this many successful samples every step reports not-ready
        pub fail_after: Option<u64>,
        produced: u64,
        pub steps: Arc<AtomicU64>,
    }

    impl StubRng {
        pub fn seeded(seed: u64) -> Self {
            Self {
                supported: true,
                rng: StdRng::seed_from_u64(seed),
                not_ready_per_draw: 0,
                pending_failures: 0,
                fail_after: None,
                produced: 0,
                steps: Arc::new(AtomicU64::new(0)),
            }
        }

        pub fn unsupported() -> Self {
            Self {
                supported: false,
                ..Self::seeded(0)
            }
        }

        pub fn always_not_ready() -> Self {
            Self {
                fail_after: Some(0),
                ..Self::seeded(0)
            }
        }

        pub fn flaky(seed: u64, not_ready_per_draw: u32) -> Self {
            Self {
                not_ready_per_draw,
                pending_failures: not_ready_per_draw,
                ..Self::seeded(seed)
            }
        }

        pub fn failing_after(seed: u64, successes: u64) -> Self {
            Self {
                fail_after: Some(successes),
                ..Self::seeded(seed)
            }
        }
    }

    impl HardwareRng for StubRng {
        fn is_supported(&self) -> bool {
            self.supported
        }

        fn try_step(&mut self) -> Attempt<u64> {
            self.steps.fetch_add(1, Ordering::Relaxed);

            if matches!(self.fail_after, Some(limit) if self.produced >= limit) {
                return Attempt::NotReady;
            }
            if self.pending_failures > 0 {
                self.pending_failures -= 1;
                return Attempt::NotReady;
            }

            self.pending_failures = self.not_ready_per_draw;
            self.produced += 1;
            Attempt::Ready(self.rng.next_u64())
        }
    }

    /// The sequence a `StubRng::seeded(seed)` produces
    pub fn expected_samples(seed: u64, count: usize) -> Vec<u64> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..count).map(|_| rng.next_u64()).collect()
    }
}
