//! Helpers that deliver a backoff delay to the caller
//!
//! [`wait`] blocks the current thread, [`wait_async`] suspends the current task, and [`after`] returns a handle that
//! resolves once the delay has passed, so it can be raced against other events in a `select!`.

use std::{
    future::Future,
    pin::Pin,
    sync::Arc,
    task::{ready, Context, Poll},
    time::Instant,
};

use futures::{future::FusedFuture, task::AtomicWaker};
use tokio::sync::oneshot;
use tokio_util::sync::{CancellationToken, DropGuard};

use crate::strategy::{Backoff, BackoffError};

/// Sleeps the current thread for the next backoff delay.
///
/// Returns the error immediately, without sleeping, if the backoff is exhausted.
pub fn wait<B: Backoff + ?Sized>(backoff: &mut B) -> Result<(), BackoffError> {
    let delay = backoff.next_attempt()?;

    tracing::debug!("backing off for {}ms", delay.as_millis());
    std::thread::sleep(delay);

    Ok(())
}

/// Suspends the current task for the next backoff delay.
///
/// Returns the error immediately, without sleeping, if the backoff is exhausted.
pub async fn wait_async<B: Backoff + ?Sized>(backoff: &mut B) -> Result<(), BackoffError> {
    let delay = backoff.next_attempt()?;

    tracing::debug!("backing off for {}ms", delay.as_millis());
    tokio::time::sleep(delay).await;

    Ok(())
}

/// Starts a timer for the next backoff delay and returns a handle that resolves when it fires.
///
/// If the backoff is exhausted the handle is already resolved with the error and no timer is started.
///
/// Dropping the handle cancels the timer.
///
/// # Panics
///
/// Panics if the backoff yields a delay and this is called outside of a Tokio runtime.
pub fn after<B: Backoff + ?Sized>(backoff: &mut B) -> After {
    let (tx, rx) = oneshot::channel();

    let delay = match backoff.next_attempt() {
        Ok(delay) => delay,
        Err(e) => {
            let _ = tx.send(Err(e));
            return After {
                rx,
                deadline: None,
                state: AfterState::Waiting,
                _cancel_on_drop: None,
            };
        }
    };

    let deadline = Instant::now().checked_add(delay);

    tracing::debug!("backing off for {}ms", delay.as_millis());

    let cancellation_token = CancellationToken::new();
    let child_token = cancellation_token.child_token();

    tokio::spawn(async move {
        tokio::select! {
            biased;
            _ = child_token.cancelled() => {},
            _ = tokio::time::sleep(delay) => {
                let _ = tx.send(Ok(()));
            }
        }
    });

    After {
        rx,
        deadline,
        state: AfterState::Waiting,
        _cancel_on_drop: Some(cancellation_token.drop_guard()),
    }
}

#[derive(Debug)]
enum AfterState {
    /// Waiting on the timer task
    Waiting,
    /// The timer task went away without firing, so the delay is waited out on a plain thread
    Lost(Arc<AtomicWaker>),
    Terminated,
}

/// Handle returned by [`after`]. Resolves exactly once.
#[derive(Debug)]
#[must_use = "the backoff timer is cancelled when the handle is dropped"]
pub struct After {
    rx: oneshot::Receiver<Result<(), BackoffError>>,
    /// None when the delay is too long to represent
    deadline: Option<Instant>,
    state: AfterState,
    _cancel_on_drop: Option<DropGuard>,
}

impl After {
    /// Stops the timer without waiting for it.
    pub fn cancel(self) {
        drop(self)
    }
}

impl Future for After {
    type Output = Result<(), BackoffError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if let AfterState::Waiting = self.state {
            match ready!(Pin::new(&mut self.rx).poll(cx)) {
                Ok(res) => {
                    self.state = AfterState::Terminated;
                    return Poll::Ready(res);
                }
                // the runtime shut down before the timer fired
                Err(_) => {
                    tracing::warn!("backoff timer lost, waiting out the remaining delay");
                    self.state = AfterState::Lost(wake_at(self.deadline));
                }
            }
        }

        match &self.state {
            AfterState::Lost(waker) => {
                waker.register(cx.waker());

                if self.deadline.map_or(true, |deadline| Instant::now() < deadline) {
                    return Poll::Pending;
                }

                self.state = AfterState::Terminated;
                Poll::Ready(Ok(()))
            }
            _ => Poll::Pending,
        }
    }
}

impl FusedFuture for After {
    fn is_terminated(&self) -> bool {
        matches!(self.state, AfterState::Terminated)
    }
}

/// Wakes whatever is registered on the returned waker once `deadline` has passed.
fn wake_at(deadline: Option<Instant>) -> Arc<AtomicWaker> {
    let waker = Arc::new(AtomicWaker::new());

    if let Some(deadline) = deadline {
        let thread_waker = waker.clone();

        std::thread::spawn(move || {
            std::thread::sleep(deadline.saturating_duration_since(Instant::now()));
            thread_waker.wake();
        });
    }

    waker
}

#[cfg(test)]
mod test {
    use std::time::Duration;

    use tokio_test::{assert_pending, assert_ready_eq, task};

    use crate::{config::BackoffConfig, strategy::SimpleBackoff};

    use super::*;

    fn single_attempt() -> SimpleBackoff {
        SimpleBackoff::new(BackoffConfig {
            min: Duration::from_millis(100),
            max: Duration::from_secs(2),
            factor: 2.0,
            max_attempts: Some(1),
        })
    }

    const EXHAUSTED: BackoffError = BackoffError::MaxAttemptsExceeded { max_attempts: 1 };

    #[track_caller]
    fn assert_elapsed(start: tokio::time::Instant, expected: Duration) {
        let elapsed = start.elapsed();
        assert!(
            elapsed >= expected && elapsed < expected + Duration::from_millis(5),
            "elapsed {elapsed:?}, expected {expected:?}"
        );
    }

    #[test]
    fn wait_blocks_then_fails_fast() {
        let mut backoff = single_attempt();

        let start = Instant::now();
        assert_eq!(wait(&mut backoff), Ok(()));
        assert!(start.elapsed() >= Duration::from_millis(100));

        let start = Instant::now();
        assert_eq!(wait(&mut backoff), Err(EXHAUSTED));
        assert!(start.elapsed() < Duration::from_millis(50));
    }

    #[tokio::test(start_paused = true)]
    async fn wait_async_sleeps_for_delay() {
        let mut backoff = single_attempt();

        let start = tokio::time::Instant::now();
        assert_eq!(wait_async(&mut backoff).await, Ok(()));
        assert_elapsed(start, Duration::from_millis(100));

        let start = tokio::time::Instant::now();
        assert_eq!(wait_async(&mut backoff).await, Err(EXHAUSTED));
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn after_resolves_once_delay_passes() {
        let mut backoff = single_attempt();

        let start = tokio::time::Instant::now();
        assert_eq!(after(&mut backoff).await, Ok(()));
        assert_elapsed(start, Duration::from_millis(100));

        let start = tokio::time::Instant::now();
        assert_eq!(after(&mut backoff).await, Err(EXHAUSTED));
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn after_does_not_block_caller() {
        let mut backoff = single_attempt();

        let mut handle = task::spawn(after(&mut backoff));
        assert_pending!(handle.poll());

        tokio::time::sleep(Duration::from_millis(99)).await;
        assert_pending!(handle.poll());

        tokio::time::sleep(Duration::from_millis(1)).await;
        // let the timer task run
        tokio::task::yield_now().await;

        assert_ready_eq!(handle.poll(), Ok(()));
        assert!(handle.is_terminated());
        assert_pending!(handle.poll());
    }

    #[test]
    fn exhausted_after_resolves_without_runtime() {
        let mut backoff = single_attempt();
        backoff.next_attempt().unwrap();

        let mut handle = task::spawn(after(&mut backoff));

        assert_ready_eq!(handle.poll(), Err(EXHAUSTED));
    }

    #[tokio::test(start_paused = true)]
    async fn after_races_in_select() {
        let mut backoff = single_attempt();

        let (done_tx, done_rx) = oneshot::channel::<()>();
        done_tx.send(()).unwrap();

        let winner = tokio::select! {
            _ = after(&mut backoff) => "backoff",
            _ = done_rx => "done",
        };

        assert_eq!(winner, "done");
        // the attempt is still counted
        assert_eq!(backoff.attempts(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_attempt_still_counts() {
        let mut backoff = single_attempt();

        let handle = after(&mut backoff);
        assert!(!handle.is_terminated());
        handle.cancel();

        assert_eq!(backoff.attempts(), 1);
        assert_eq!(after(&mut backoff).await, Err(EXHAUSTED));
    }

    #[test]
    fn lost_timer_still_waits_out_delay() {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap();

        let mut backoff = SimpleBackoff::new(BackoffConfig {
            min: Duration::from_millis(150),
            ..Default::default()
        });

        let start = Instant::now();
        let handle = runtime.block_on(async { after(&mut backoff) });

        // takes the never-polled timer task, and its sender, with it
        drop(runtime);

        assert_eq!(futures::executor::block_on(handle), Ok(()));
        assert!(
            start.elapsed() >= Duration::from_millis(150),
            "resolved after {:?}",
            start.elapsed()
        );
    }
}
