//! Bounded retry logic for "try, maybe fail" hardware primitives

use tracing::{debug, warn};

/// Outcome of polling a hardware primitive
///
/// A single step yields `Ready` or `NotReady`; a step may also give up on its
/// own with `Exhausted`. `RetryPolicy::execute` folds a run of steps into
/// `Ready` or `Exhausted`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attempt<T> {
    /// A value was produced
    Ready(T),
    /// The primitive reported transient unavailability
    NotReady,
    /// No value within the retry window
    Exhausted { attempts: u32 },
}

/// Retry policy configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of attempts per operation (including the first)
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: crate::DEFAULT_RETRY_LIMIT,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32) -> Self {
        Self { max_attempts }
    }

    /// Poll `operation` until it yields a value or the window is exhausted
    ///
    /// Returns immediately on the first `Ready` or on an `Exhausted` step;
    /// `NotReady` steps are retried. The second tuple element is the number of
    /// attempts made.
    pub fn execute<T, F>(&self, mut operation: F) -> (Attempt<T>, u32)
    where
        F: FnMut() -> Attempt<T>,
    {
        let mut attempt = 0;

        while attempt < self.max_attempts {
            attempt += 1;

            let value = match operation() {
                Attempt::Ready(value) => value,
                Attempt::NotReady => continue,
                Attempt::Exhausted { .. } => {
                    warn!("Hardware step gave up on attempt {}", attempt);
                    return (Attempt::Exhausted { attempts: attempt }, attempt);
                }
            };

            if attempt > 1 {
                debug!("Hardware step succeeded after {} attempts", attempt);
            }
            if attempt == self.max_attempts && attempt > 1 {
                warn!(
                    "Hardware step succeeded on the last allowed attempt ({}/{})",
                    attempt, self.max_attempts
                );
            }
            return (Attempt::Ready(value), attempt);
        }

        warn!("Hardware step failed after {} attempts", attempt);
        (Attempt::Exhausted { attempts: attempt }, attempt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_success() {
        let policy = RetryPolicy::default();
        let mut attempts = 0;

        let (result, made) = policy.execute(|| {
            attempts += 1;
            if attempts < 3 {
                Attempt::NotReady
            } else {
                Attempt::Ready(42u64)
            }
        });

        assert_eq!(result, Attempt::Ready(42));
        assert_eq!(made, 3);
        assert_eq!(attempts, 3);
    }

    #[test]
    fn test_retry_exhausted() {
        let policy = RetryPolicy::new(10);
        let mut attempts = 0;

        let (result, made) = policy.execute(|| {
            attempts += 1;
            Attempt::<u64>::NotReady
        });

        assert_eq!(result, Attempt::Exhausted { attempts: 10 });
        assert_eq!(made, 10);
        assert_eq!(attempts, 10);
    }

    #[test]
    fn test_stops_on_first_success() {
        let policy = RetryPolicy::new(5);
        let mut calls = 0;

        let (result, _) = policy.execute(|| {
            calls += 1;
            Attempt::Ready(calls)
        });

        assert_eq!(result, Attempt::Ready(1));
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_success_on_last_attempt() {
        let policy = RetryPolicy::new(4);
        let mut calls = 0;

        let (result, made) = policy.execute(|| {
            calls += 1;
            if calls == 4 {
                Attempt::Ready(7u64)
            } else {
                Attempt::NotReady
            }
        });

        assert_eq!(result, Attempt::Ready(7));
        assert_eq!(made, 4);
    }

    #[test]
    fn test_exhausted_step_stops_polling() {
        let policy = RetryPolicy::new(10);
        let mut calls = 0;

        let (result, made) = policy.execute(|| {
            calls += 1;
            if calls < 3 {
                Attempt::<u64>::NotReady
            } else {
                Attempt::Exhausted { attempts: 1 }
            }
        });

        assert_eq!(result, Attempt::Exhausted { attempts: 3 });
        assert_eq!(made, 3);
        assert_eq!(calls, 3);
    }
}
