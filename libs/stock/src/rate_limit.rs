use std::{collections::VecDeque, time::Duration};

use tokio::{
    sync::Mutex,
    time::{Instant, sleep_until},
};
use tracing::debug;

/// At most `max_requests` sends in any rolling `per` window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimit {
    pub max_requests: usize,
    pub per: Duration,
}

impl Default for RateLimit {
    fn default() -> Self {
        Self {
            max_requests: 2,
            per: Duration::from_secs(5),
        }
    }
}

/// Sliding-window limiter shared by every outbound provider request.
///
/// The lock is held while waiting, so callers are released in the order they
/// arrived.
#[derive(Debug)]
pub struct RateLimiter {
    limit: RateLimit,
    sent: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    pub fn new(limit: RateLimit) -> Self {
        let limit = RateLimit {
            max_requests: limit.max_requests.max(1),
            ..limit
        };

        Self {
            limit,
            sent: Mutex::new(VecDeque::with_capacity(limit.max_requests)),
        }
    }

    pub fn limit(&self) -> RateLimit {
        self.limit
    }

    /// Wait until a request may be sent, then record it.
    pub async fn acquire(&self) {
        let mut sent = self.sent.lock().await;

        loop {
            let now = Instant::now();
            while sent
                .front()
                .is_some_and(|oldest| now.duration_since(*oldest) >= self.limit.per)
            {
                sent.pop_front();
            }

            if sent.len() < self.limit.max_requests {
                sent.push_back(now);
                return;
            }

            if let Some(&oldest) = sent.front() {
                let ready_at = oldest + self.limit.per;
                debug!(
                    wait_ms = ready_at.saturating_duration_since(now).as_millis() as u64,
                    "rate limit reached, queueing request"
                );
                sleep_until(ready_at).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn two_per_five() -> RateLimiter {
        RateLimiter::new(RateLimit {
            max_requests: 2,
            per: Duration::from_secs(5),
        })
    }

    #[tokio::test(start_paused = true)]
    async fn third_request_waits_for_the_window() {
        let limiter = two_per_five();
        let start = Instant::now();

        limiter.acquire().await;
        limiter.acquire().await;
        assert!(start.elapsed() < Duration::from_millis(10));

        limiter.acquire().await;
        assert!(start.elapsed() >= Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn window_slides_instead_of_resetting() {
        let limiter = two_per_five();
        let start = Instant::now();

        limiter.acquire().await;
        tokio::time::sleep(Duration::from_secs(3)).await;
        limiter.acquire().await;

        // Frees when the first send ages out at t=5, not at t=8.
        limiter.acquire().await;
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(5));
        assert!(elapsed < Duration::from_secs(6));
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_callers_share_the_quota() {
        let limiter = Arc::new(two_per_five());
        let start = Instant::now();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                tokio::spawn(async move {
                    limiter.acquire().await;
                    Instant::now()
                })
            })
            .collect();

        let mut finished = Vec::new();
        for handle in handles {
            finished.push(handle.await.unwrap().duration_since(start));
        }
        finished.sort();

        assert!(finished[1] < Duration::from_secs(1));
        assert!(finished[2] >= Duration::from_secs(5));
        assert!(finished[3] >= Duration::from_secs(5));
    }

    #[test]
    fn zero_quota_is_clamped() {
        let limiter = RateLimiter::new(RateLimit {
            max_requests: 0,
            per: Duration::from_secs(1),
        });
        assert_eq!(limiter.limit().max_requests, 1);
    }
}
