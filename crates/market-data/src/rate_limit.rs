use chrono::{DateTime, Duration, Utc};
use std::collections::VecDeque;
use tokio::sync::Mutex;

/// Rolling-window rate limiter: at most `limit` acquisitions per `period`.
///
/// `acquire` never waits; a refused acquisition means "try later" and the
/// backoff policy belongs to the caller.
pub struct RateLimiter {
    limit: usize,
    period: Duration,
    calls: Mutex<VecDeque<DateTime<Utc>>>,
}

impl RateLimiter {
    pub fn new(limit: usize, period: Duration) -> Self {
        Self {
            limit,
            period,
            calls: Mutex::new(VecDeque::new()),
        }
    }

    /// Try to acquire permission for an external call.
    ///
    /// The prune-check-record sequence runs as one critical section, so
    /// concurrent callers can never overshoot the quota.
    pub async fn acquire(&self) -> bool {
        let mut calls = self.calls.lock().await;
        let now = Utc::now();
        let cutoff = now - self.period;

        while let Some(&front) = calls.front() {
            if front <= cutoff {
                calls.pop_front();
            } else {
                break;
            }
        }

        if calls.len() < self.limit {
            calls.push_back(now);
            true
        } else {
            tracing::debug!(
                limit = self.limit,
                "rate limiter refused acquisition, window full"
            );
            false
        }
    }

    /// Remaining acquisitions in the current window.
    pub async fn get_remaining(&self) -> usize {
        let calls = self.calls.lock().await;
        let cutoff = Utc::now() - self.period;
        let in_window = calls.iter().filter(|&&t| t > cutoff).count();
        self.limit.saturating_sub(in_window)
    }

    /// When the oldest recorded call falls out of the window, freeing a slot.
    pub async fn get_reset_time(&self) -> Option<DateTime<Utc>> {
        let calls = self.calls.lock().await;
        calls.front().map(|&oldest| oldest + self.period)
    }
}
