use std::time::Duration;

use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::config::BackoffConfig;

use super::{Backoff, BackoffError, SimpleBackoff};

/// Exponential backoff with random noise, to keep contending clients from retrying in lockstep.
///
/// Each delay is the [`SimpleBackoff`] delay `d` shifted into `d - min .. d + min`, so the noise is centred on `d`.
///
/// On the first attempt `d == min`, so the delay falls anywhere in `0..2 * min`. Unlike [`SimpleBackoff`], the
/// jittered delay is not floored at `min`.
#[derive(Debug, Clone)]
pub struct JitterBackoff<R = StdRng> {
    inner: SimpleBackoff,
    baseline: Duration,
    rng: R,
}

impl JitterBackoff<StdRng> {
    /// Creates a jittered backoff with its own freshly seeded random source.
    pub fn new(config: BackoffConfig) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }
}

impl<R: Rng> JitterBackoff<R> {
    /// Creates a jittered backoff drawing noise from `rng`.
    pub fn with_rng(config: BackoffConfig, rng: R) -> Self {
        Self {
            inner: SimpleBackoff::new(config),
            baseline: Duration::ZERO,
            rng,
        }
    }

    pub fn attempts(&self) -> u32 {
        self.inner.attempts()
    }

    pub fn config(&self) -> &BackoffConfig {
        self.inner.config()
    }

    /// True when the attempt cap has been reached. Only a reset leaves this state.
    pub fn is_exhausted(&self) -> bool {
        self.inner.is_exhausted()
    }

    /// The last delay before noise was applied. Zero until the first attempt.
    pub fn baseline(&self) -> Duration {
        self.baseline
    }

    fn add_jitter(&mut self, delay: Duration) -> Duration {
        let min = self.inner.config().min;
        let spread = u64::try_from(min.as_nanos().saturating_mul(2)).unwrap_or(u64::MAX);

        let noise = if spread == 0 {
            Duration::ZERO
        } else {
            Duration::from_nanos(self.rng.gen_range(0..spread))
        };

        delay.saturating_sub(min).saturating_add(noise)
    }
}

impl From<BackoffConfig> for JitterBackoff<StdRng> {
    fn from(config: BackoffConfig) -> Self {
        Self::new(config)
    }
}

impl<R: Rng> Backoff for JitterBackoff<R> {
    fn next_attempt(&mut self) -> Result<Duration, BackoffError> {
        let delay = self.inner.next_attempt()?;

        self.baseline = delay;

        Ok(self.add_jitter(delay))
    }

    fn reset(&mut self) {
        self.inner.reset();
    }
}
