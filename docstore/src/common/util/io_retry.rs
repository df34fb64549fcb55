use crate::errors::{ErrorKind, StoreError, StoreResult};
use std::io;
use std::time::Duration;

/// Bounded retry policy for filesystem calls.
///
/// Only transient kinds are retried; everything else fails on first sight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    attempts: u32,
    backoff: Duration,
}

impl RetryPolicy {
    pub fn new(attempts: u32, backoff: Duration) -> Self {
        RetryPolicy {
            attempts: attempts.max(1),
            backoff,
        }
    }

    /// A policy that tries exactly once.
    pub fn no_retry() -> Self {
        RetryPolicy::new(1, Duration::ZERO)
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn backoff(&self) -> Duration {
        self.backoff
    }

    /// Runs `op` until it succeeds, fails with a non-transient error, or the
    /// attempts are used up. `what` names the operation in logs and errors.
    /// Exhaustion surfaces as [ErrorKind::DurabilityError].
    pub fn run<T, F>(&self, what: &str, mut op: F) -> StoreResult<T>
    where
        F: FnMut() -> io::Result<T>,
    {
        let mut attempt = 1;
        loop {
            match op() {
                Ok(value) => return Ok(value),
                Err(err) if is_transient(&err) && attempt < self.attempts => {
                    log::warn!(
                        "Transient failure during {} (attempt {}/{}): {}",
                        what, attempt, self.attempts, err
                    );
                    std::thread::sleep(self.backoff * attempt);
                    attempt += 1;
                }
                Err(err) => {
                    log::error!("{} failed after {} attempt(s): {}", what, attempt, err);
                    return Err(StoreError::new_with_cause(
                        &format!("{} failed after {} attempt(s)", what, attempt),
                        ErrorKind::DurabilityError,
                        err.into(),
                    ));
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy::new(
            crate::common::DEFAULT_IO_RETRY_ATTEMPTS,
            Duration::from_millis(crate::common::DEFAULT_IO_RETRY_BACKOFF_MS),
        )
    }
}

pub fn is_transient(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::Interrupted | io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
    )
}
