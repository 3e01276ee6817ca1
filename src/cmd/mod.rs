use std::time::Duration;

use clap::{Args, Subcommand};
use retry_backoff::{Backoff, BackoffConfig, JitterBackoff, SimpleBackoff};

pub mod connect;
pub mod schedule;

pub trait Run {
    type Response;

    async fn run(self) -> anyhow::Result<Self::Response>;
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the delays a backoff would produce
    Schedule(schedule::Schedule),
    /// Retry a TCP connection until it succeeds or attempts run out
    Connect(connect::Connect),
}

impl Run for Commands {
    type Response = ();

    async fn run(self) -> anyhow::Result<Self::Response> {
        match self {
            Commands::Schedule(cmd) => cmd.run().await,
            Commands::Connect(cmd) => cmd.run().await,
        }
    }
}

/// Backoff options shared by every command.
#[derive(Debug, Args)]
pub struct BackoffArgs {
    /// First delay, in milliseconds
    #[arg(long, default_value_t = 100)]
    min_ms: u64,
    /// Largest delay, in milliseconds
    #[arg(long, default_value_t = 60_000)]
    max_ms: u64,
    /// Growth per attempt
    #[arg(long, default_value_t = 2.0)]
    factor: f64,
    /// Give up after this many attempts. Zero retries forever.
    #[arg(long, default_value_t = 0)]
    max_attempts: u32,
    /// Randomise delays around the exponential curve
    #[arg(long, default_value_t = false)]
    jitter: bool,
}

impl BackoffArgs {
    pub fn build(&self) -> Box<dyn Backoff + Send> {
        let config = BackoffConfig::from(self);

        if self.jitter {
            Box::new(JitterBackoff::new(config))
        } else {
            Box::new(SimpleBackoff::new(config))
        }
    }
}

impl From<&BackoffArgs> for BackoffConfig {
    fn from(value: &BackoffArgs) -> Self {
        Self {
            min: Duration::from_millis(value.min_ms),
            max: Duration::from_millis(value.max_ms),
            factor: value.factor,
            max_attempts: Some(value.max_attempts),
        }
    }
}
