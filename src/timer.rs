//! Cancellable countdown for one round.

use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Runs a callback once after `timeout`, unless cancelled first.
///
/// Cancellation is idempotent: cancelling an already-fired or
/// already-cancelled timer is a no-op. The timer does not outlive the
/// runtime; dropping the handle leaves the countdown running (the round
/// owns it until resolution).
#[derive(Debug)]
pub struct RoundTimer {
    handle: JoinHandle<()>,
}

impl RoundTimer {
    pub fn start<F, Fut>(timeout: Duration, on_fire: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            on_fire().await;
        });
        Self { handle }
    }

    pub fn cancel(&self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_timer_fires_at_deadline() {
        let fired = Arc::new(AtomicU32::new(0));
        let fired_clone = fired.clone();
        let _timer = RoundTimer::start(Duration::from_secs(30), move || async move {
            fired_clone.fetch_add(1, Ordering::SeqCst);
        });

        tokio::time::sleep(Duration::from_secs(29)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_prevents_fire() {
        let fired = Arc::new(AtomicU32::new(0));
        let fired_clone = fired.clone();
        let timer = RoundTimer::start(Duration::from_secs(30), move || async move {
            fired_clone.fetch_add(1, Ordering::SeqCst);
        });

        timer.cancel();
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_is_idempotent() {
        let fired = Arc::new(AtomicU32::new(0));
        let fired_clone = fired.clone();
        let timer = RoundTimer::start(Duration::from_secs(10), move || async move {
            fired_clone.fetch_add(1, Ordering::SeqCst);
        });

        timer.cancel();
        timer.cancel();
        tokio::time::sleep(Duration::from_secs(20)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_after_fire_is_noop() {
        let fired = Arc::new(AtomicU32::new(0));
        let fired_clone = fired.clone();
        let timer = RoundTimer::start(Duration::from_secs(10), move || async move {
            fired_clone.fetch_add(1, Ordering::SeqCst);
        });

        tokio::time::sleep(Duration::from_secs(11)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);

        timer.cancel();
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }
}
