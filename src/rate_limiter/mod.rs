use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{Instant, sleep_until};

/// Controls the rate of requests to prevent API throttling.
///
/// One global cadence shared by every caller: `acquire` returns no sooner than
/// `min_interval` after the previous `acquire` returned. Waiters queue on the
/// mutex, which hands out the lock in FIFO order.
pub struct RateLimiter {
    min_interval: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_request: Mutex::new(None),
        }
    }

    /// Wait for the next free slot.
    ///
    /// The timestamp is only written once the wait completes, so a caller
    /// dropped mid-wait leaves the previous slot untouched.
    pub async fn acquire(&self) {
        let mut last = self.last_request.lock().await;

        if let Some(ready_at) = self.next_slot(*last) {
            log::debug!("Rate limiting: waiting {:?}", ready_at - Instant::now());
            sleep_until(ready_at).await;
        }

        *last = Some(Instant::now());
    }

    fn next_slot(&self, last: Option<Instant>) -> Option<Instant> {
        let ready_at = last? + self.min_interval;
        (ready_at > Instant::now()).then_some(ready_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_first_acquire_does_not_wait() {
        let limiter = RateLimiter::new(Duration::from_millis(500));

        let start = Instant::now();
        limiter.acquire().await;

        assert!(start.elapsed() < Duration::from_millis(100));
    }

    #[tokio::test]
    async fn test_consecutive_acquires_are_spaced() {
        let limiter = RateLimiter::new(Duration::from_millis(100));

        let start = Instant::now();
        limiter.acquire().await;
        limiter.acquire().await;
        limiter.acquire().await;

        assert!(start.elapsed() >= Duration::from_millis(200));
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_cadence() {
        let limiter = Arc::new(RateLimiter::new(Duration::from_millis(50)));
        let start = Instant::now();

        let mut handles = Vec::new();
        for _ in 0..4 {
            let limiter = Arc::clone(&limiter);
            handles.push(tokio::spawn(async move { limiter.acquire().await }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert!(start.elapsed() >= Duration::from_millis(150));
    }

    #[tokio::test]
    async fn test_cancelled_wait_keeps_limiter_usable() {
        let limiter = Arc::new(RateLimiter::new(Duration::from_millis(200)));
        limiter.acquire().await;

        let waiting = {
            let limiter = Arc::clone(&limiter);
            tokio::spawn(async move { limiter.acquire().await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        waiting.abort();
        let _ = waiting.await;

        let result =
            tokio::time::timeout(Duration::from_millis(500), limiter.acquire()).await;
        assert!(result.is_ok());
    }
}
