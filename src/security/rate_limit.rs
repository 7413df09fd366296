//! Per-client request rate limiting.
//!
//! # Design Decisions
//! - Fixed one-minute window per client key
//! - Windows older than a minute are pruned when the table grows

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

const WINDOW: Duration = Duration::from_secs(60);
/// Table size above which stale windows are pruned.
const PRUNE_THRESHOLD: usize = 4096;

struct Window {
    started: Instant,
    count: u32,
}

pub struct RateLimiter {
    windows: Mutex<HashMap<String, Window>>,
    requests_per_minute: u32,
}

impl RateLimiter {
    pub fn new(requests_per_minute: u32) -> Self {
        Self {
            windows: Mutex::new(HashMap::new()),
            requests_per_minute,
        }
    }

    /// Count a request from `key`. Returns false once the key is over its limit.
    pub fn check(&self, key: &str) -> bool {
        self.check_at(key, Instant::now())
    }

    pub fn check_at(&self, key: &str, now: Instant) -> bool {
        let mut windows = self.windows.lock().unwrap_or_else(|p| p.into_inner());

        if windows.len() >= PRUNE_THRESHOLD {
            windows.retain(|_, w| now.saturating_duration_since(w.started) < WINDOW);
        }

        let window = windows.entry(key.to_string()).or_insert(Window {
            started: now,
            count: 0,
        });
        if now.saturating_duration_since(window.started) >= WINDOW {
            window.started = now;
            window.count = 0;
        }

        if window.count >= self.requests_per_minute {
            tracing::warn!(client = %key, limit = self.requests_per_minute, "Rate limit exceeded");
            return false;
        }
        window.count += 1;
        true
    }

    pub fn limit(&self) -> u32 {
        self.requests_per_minute
    }

    pub fn tracked_clients(&self) -> usize {
        self.windows.lock().unwrap_or_else(|p| p.into_inner()).len()
    }
}
