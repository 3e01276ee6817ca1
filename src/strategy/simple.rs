use std::time::Duration;

use crate::{backoff::compute_delay, config::BackoffConfig};

use super::{Backoff, BackoffError};

/// Deterministic exponential backoff.
///
/// Delays start at [`BackoffConfig::min`] and multiply by [`BackoffConfig::factor`] on every attempt until they reach
/// [`BackoffConfig::max`].
#[derive(Debug, Clone)]
pub struct SimpleBackoff {
    config: BackoffConfig,
    attempts: u32,
}

impl SimpleBackoff {
    pub fn new(config: BackoffConfig) -> Self {
        Self {
            config,
            attempts: 0,
        }
    }

    /// Number of delays handed out since construction or the last reset.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn config(&self) -> &BackoffConfig {
        &self.config
    }

    /// True when the attempt cap has been reached. Only a reset leaves this state.
    pub fn is_exhausted(&self) -> bool {
        self.config
            .attempt_limit()
            .is_some_and(|limit| self.attempts >= limit)
    }
}

impl From<BackoffConfig> for SimpleBackoff {
    fn from(config: BackoffConfig) -> Self {
        Self::new(config)
    }
}

impl Backoff for SimpleBackoff {
    fn next_attempt(&mut self) -> Result<Duration, BackoffError> {
        if let Some(max_attempts) = self.config.attempt_limit() {
            if self.attempts >= max_attempts {
                tracing::debug!(max_attempts, "backoff exhausted");
                return Err(BackoffError::MaxAttemptsExceeded { max_attempts });
            }
        }

        let delay = compute_delay(
            self.config.min,
            self.config.max,
            self.config.factor,
            self.attempts,
        );

        self.attempts = self.attempts.saturating_add(1);

        tracing::trace!(attempts = self.attempts, ?delay, "computed backoff");

        Ok(delay)
    }

    fn reset(&mut self) {
        self.attempts = 0;
    }
}
