//! Cancellable dwell timer.
//!
//! Handlers model real-world action duration (hold, spotlight, laser dwell)
//! by suspending on a [`DwellTimer`] rather than sleeping directly. The
//! timer races the sleep against a per-task [`CancelToken`], so external
//! cancellation interrupts a dwell without the handler logic knowing
//! anything about cancellation plumbing.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::Notify;

/// Cooperative cancellation token shared between the orchestrator and one
/// running task. Clones observe the same state.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    inner: Arc<TokenInner>,
}

#[derive(Debug, Default)]
struct TokenInner {
    notify: Notify,
    cancelled: AtomicBool,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::Release);
        self.inner.notify.notify_waiters();
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::Acquire)
    }

    /// Resolve once cancellation has been requested.
    pub async fn cancelled(&self) {
        loop {
            // Register interest before checking the flag so a cancel between
            // the check and the await cannot be missed.
            let notified = self.inner.notify.notified();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }
}

/// How a dwell ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DwellOutcome {
    /// The full (capped) duration elapsed.
    Elapsed,
    /// The task's cancel token fired first.
    Cancelled,
}

/// A bounded, cancellable sleep.
#[derive(Debug, Clone, Copy)]
pub struct DwellTimer {
    cap: Duration,
}

impl DwellTimer {
    /// A timer that will never dwell longer than `cap_s` seconds, whatever
    /// the handler requests.
    pub fn capped_at_secs(cap_s: f64) -> Self {
        Self {
            cap: Duration::from_secs_f64(cap_s.max(0.0)),
        }
    }

    /// Suspend for `requested_s` seconds (bounded by the cap), returning
    /// early if `token` is cancelled.
    pub async fn sleep(&self, requested_s: f64, token: &CancelToken) -> DwellOutcome {
        let duration = Duration::from_secs_f64(requested_s.max(0.0)).min(self.cap);
        tokio::select! {
            _ = tokio::time::sleep(duration) => DwellOutcome::Elapsed,
            _ = token.cancelled() => DwellOutcome::Cancelled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn dwell_elapses_without_cancellation() {
        let timer = DwellTimer::capped_at_secs(5.0);
        let token = CancelToken::new();
        let outcome = timer.sleep(0.01, &token).await;
        assert_eq!(outcome, DwellOutcome::Elapsed);
    }

    #[tokio::test]
    async fn dwell_is_capped() {
        let timer = DwellTimer::capped_at_secs(0.01);
        let token = CancelToken::new();
        let start = std::time::Instant::now();
        // A request far beyond the cap still returns promptly.
        timer.sleep(60.0, &token).await;
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn cancellation_interrupts_dwell() {
        let timer = DwellTimer::capped_at_secs(30.0);
        let token = CancelToken::new();
        let waiter = {
            let token = token.clone();
            tokio::spawn(async move { timer.sleep(30.0, &token).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        token.cancel();
        let outcome = waiter.await.unwrap();
        assert_eq!(outcome, DwellOutcome::Cancelled);
    }

    #[tokio::test]
    async fn pre_cancelled_token_returns_immediately() {
        let timer = DwellTimer::capped_at_secs(30.0);
        let token = CancelToken::new();
        token.cancel();
        let outcome = timer.sleep(30.0, &token).await;
        assert_eq!(outcome, DwellOutcome::Cancelled);
    }

    #[test]
    fn cancel_is_idempotent_and_observable() {
        let token = CancelToken::new();
        assert!(!token.is_cancelled());
        token.cancel();
        token.cancel();
        assert!(token.is_cancelled());
        // Clones share the same state.
        assert!(token.clone().is_cancelled());
    }
}
