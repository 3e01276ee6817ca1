//! Exponential backoff for retry loops
//!
//! A [`Backoff`] hands out growing delays between attempts at some unreliable operation, up to a ceiling, and
//! optionally gives up after a number of attempts. Call [`Backoff::reset`] once the operation succeeds.
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use retry_backoff::{wait, Backoff, BackoffConfig, SimpleBackoff};
//!
//! let mut backoff = SimpleBackoff::new(BackoffConfig {
//!     min: Duration::from_millis(100),
//!     max: Duration::from_secs(60),
//!     factor: 2.0,
//!     max_attempts: None,
//! });
//!
//! wait(&mut backoff).unwrap(); // sleeps 100ms
//! wait(&mut backoff).unwrap(); // sleeps 200ms
//! assert_eq!(backoff.next_attempt(), Ok(Duration::from_millis(400)));
//! backoff.reset();
//! wait(&mut backoff).unwrap(); // sleeps 100ms
//! ```

mod backoff;
pub mod config;
pub mod strategy;
pub mod wait;

pub use backoff::compute_delay;
pub use config::BackoffConfig;
pub use strategy::{Backoff, BackoffError, JitterBackoff, SimpleBackoff};
pub use wait::{after, wait, wait_async, After};
