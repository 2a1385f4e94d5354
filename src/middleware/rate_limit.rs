use std::net::IpAddr;
use std::time::{Duration, Instant};

use dashmap::DashMap;

/// Fixed-window limiter keyed by client IP.
pub struct RateLimiter {
    /// Map from IP to (window_start, request_count)
    requests: DashMap<IpAddr, (Instant, u32)>,
    max_requests: u32,
    window: Duration,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            requests: DashMap::new(),
            max_requests,
            window,
        }
    }

    /// Check if a request from this IP is allowed.
    /// Returns Ok(()) if allowed, Err(remaining_wait_time) if rate limited.
    pub fn check(&self, ip: IpAddr) -> Result<(), Duration> {
        let now = Instant::now();

        let mut entry = self.requests.entry(ip).or_insert((now, 0));
        let (window_start, count) = entry.value_mut();

        if now.duration_since(*window_start) >= self.window {
            *window_start = now;
            *count = 1;
            return Ok(());
        }

        if *count >= self.max_requests {
            return Err(self.window - now.duration_since(*window_start));
        }

        *count += 1;
        Ok(())
    }

    /// Drop entries whose window is long over (call periodically).
    pub fn cleanup(&self) {
        let now = Instant::now();
        self.requests
            .retain(|_, (window_start, _)| now.duration_since(*window_start) < self.window * 2);
    }

    pub fn tracked(&self) -> usize {
        self.requests.len()
    }
}

/// Limiter for login attempts: `per_minute` tries per IP.
pub fn login_limiter(per_minute: u32) -> RateLimiter {
    RateLimiter::new(per_minute, Duration::from_secs(60))
}
