//! Backoff strategies that track attempts and produce the next delay

mod jitter;
mod simple;

use std::time::Duration;

use thiserror::Error;

pub use jitter::JitterBackoff;
pub use simple::SimpleBackoff;

/// Errors produced while computing the next backoff.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum BackoffError {
    /// The configured attempt cap was reached. Usually means the resource should be considered unavailable.
    #[error("maximum of attempts exceeded")]
    MaxAttemptsExceeded { max_attempts: u32 },
}

/// A strategy for spacing out retries.
pub trait Backoff {
    /// Returns the duration to wait before the next retry, and counts the attempt.
    fn next_attempt(&mut self) -> Result<Duration, BackoffError>;

    /// Clears the attempt count. The next call to [`Backoff::next_attempt`] starts from the minimum again.
    fn reset(&mut self);
}

impl<B: Backoff + ?Sized> Backoff for &mut B {
    #[inline]
    fn next_attempt(&mut self) -> Result<Duration, BackoffError> {
        (**self).next_attempt()
    }

    #[inline]
    fn reset(&mut self) {
        (**self).reset()
    }
}

impl<B: Backoff + ?Sized> Backoff for Box<B> {
    #[inline]
    fn next_attempt(&mut self) -> Result<Duration, BackoffError> {
        self.as_mut().next_attempt()
    }

    #[inline]
    fn reset(&mut self) {
        self.as_mut().reset()
    }
}
