//! In-process server counters, served by `/api/stats`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;

use crate::observability::metrics;

#[derive(Debug, Default)]
pub struct ServerStats {
    requests_served: AtomicU64,
    bytes_sent: AtomicU64,
    bytes_received: AtomicU64,
    active_connections: AtomicU64,
    error_count: AtomicU64,
}

/// Point-in-time copy of the counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub requests_served: u64,
    pub bytes_sent: u64,
    pub bytes_received: u64,
    pub active_connections: u64,
    pub error_count: u64,
}

impl ServerStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a parsed request and its body bytes.
    pub fn record_request(&self, body_bytes: usize) {
        self.requests_served.fetch_add(1, Ordering::Relaxed);
        self.bytes_received
            .fetch_add(body_bytes as u64, Ordering::Relaxed);
        metrics::record_bytes_received(body_bytes);
    }

    pub fn record_sent(&self, bytes: usize) {
        self.bytes_sent.fetch_add(bytes as u64, Ordering::Relaxed);
        metrics::record_bytes_sent(bytes);
    }

    pub fn record_error(&self, kind: &'static str) {
        self.error_count.fetch_add(1, Ordering::Relaxed);
        metrics::record_error(kind);
    }

    /// Count an open connection until the guard drops.
    pub fn connection_opened(self: &Arc<Self>) -> ActiveConnection {
        let count = self.active_connections.fetch_add(1, Ordering::SeqCst) + 1;
        metrics::set_active_connections(count);
        ActiveConnection {
            stats: Arc::clone(self),
        }
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            requests_served: self.requests_served.load(Ordering::Relaxed),
            bytes_sent: self.bytes_sent.load(Ordering::Relaxed),
            bytes_received: self.bytes_received.load(Ordering::Relaxed),
            active_connections: self.active_connections.load(Ordering::SeqCst),
            error_count: self.error_count.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug)]
pub struct ActiveConnection {
    stats: Arc<ServerStats>,
}

impl Drop for ActiveConnection {
    fn drop(&mut self) {
        let count = self.stats.active_connections.fetch_sub(1, Ordering::SeqCst) - 1;
        metrics::set_active_connections(count);
    }
}
