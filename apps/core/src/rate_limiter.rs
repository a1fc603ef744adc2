use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// A simple rate limiter using a sliding window algorithm.
///
/// Checking and recording are separate so that a caller can serve a request
/// without charging it against the window (preset answers, for example).
/// The window is scoped to one chat session.
#[derive(Debug)]
pub struct RateLimiter {
    /// Request timestamps, oldest first.
    requests: VecDeque<Instant>,
    /// The maximum number of requests allowed within the `window`.
    limit: usize,
    /// The duration of the sliding window.
    window: Duration,
}

impl RateLimiter {
    /// Creates a new `RateLimiter`.
    ///
    /// # Arguments
    ///
    /// * `limit` - The number of requests allowed per `window`.
    /// * `window` - The time duration of the sliding window.
    pub fn new(limit: usize, window: Duration) -> Self {
        RateLimiter {
            requests: VecDeque::new(),
            limit,
            window,
        }
    }

    /// Checks whether one more request is allowed at `now`.
    ///
    /// Timestamps older than `now - window` are pruned before counting.
    /// Nothing is recorded.
    pub fn allow(&mut self, now: Instant) -> bool {
        self.prune(now);
        self.requests.len() < self.limit
    }

    /// Records a request made at `now`.
    pub fn record(&mut self, now: Instant) {
        self.requests.push_back(now);
    }

    /// Time until the oldest entry leaves the window, when the window is full.
    pub fn retry_after(&mut self, now: Instant) -> Option<Duration> {
        self.prune(now);
        if self.requests.len() < self.limit {
            return None;
        }
        let oldest = *self.requests.front()?;
        Some(self.window.saturating_sub(now.saturating_duration_since(oldest)))
    }

    /// Number of requests currently inside the window (as of the last prune).
    pub fn in_window(&self) -> usize {
        self.requests.len()
    }

    fn prune(&mut self, now: Instant) {
        // Without a representable window start nothing can be old enough.
        let Some(window_start) = now.checked_sub(self.window) else {
            return;
        };
        while self
            .requests
            .front()
            .is_some_and(|&timestamp| timestamp < window_start)
        {
            self.requests.pop_front();
        }
    }
}
