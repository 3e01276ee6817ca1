use std::time::Duration;

/// Controls how backoff delays grow and when retries give up.
#[derive(Debug, Clone, PartialEq)]
pub struct BackoffConfig {
    /// Delay returned for the first attempt, and the jitter spread.
    ///
    /// Default 100ms
    pub min: Duration,
    /// Largest delay ever returned. Growth saturates here.
    ///
    /// Default 60s
    pub max: Duration,
    /// Multiplier applied per attempt.
    ///
    /// Default 2.0
    pub factor: f64,
    /// Maximum number of attempts before returning an error.
    /// If None or zero, the attempts are infinite.
    ///
    /// Default None
    pub max_attempts: Option<u32>,
}

impl BackoffConfig {
    /// The attempt cap, if one is in effect.
    pub fn attempt_limit(&self) -> Option<u32> {
        self.max_attempts.filter(|&limit| limit > 0)
    }
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            min: Duration::from_millis(100),
            max: Duration::from_secs(60),
            factor: 2.0,
            max_attempts: None,
        }
    }
}
