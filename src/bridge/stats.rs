//! Observability counters for the native bridge.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use serde::Serialize;

/// Process-wide bridge counters, shared with the health endpoint.
#[derive(Debug, Default)]
pub struct BridgeStats {
    active_connections: AtomicUsize,
    total_connections: AtomicU64,
    frames_relayed: AtomicU64,
    frames_dropped: AtomicU64,
}

/// Point-in-time copy of [`BridgeStats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BridgeStatsSnapshot {
    /// Native connections currently open.
    pub active_connections: usize,
    /// Native connections accepted since startup.
    pub total_connections: u64,
    /// Frames published to the bus.
    pub frames_relayed: u64,
    /// Chunks dropped as malformed.
    pub frames_dropped: u64,
}

impl BridgeStats {
    /// Creates zeroed counters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a native connection as open until the returned guard drops.
    #[must_use]
    pub fn track_connection(self: &Arc<Self>) -> ActiveConnection {
        self.active_connections.fetch_add(1, Ordering::Relaxed);
        self.total_connections.fetch_add(1, Ordering::Relaxed);
        ActiveConnection {
            stats: Arc::clone(self),
        }
    }

    pub(crate) fn record_relayed(&self) {
        self.frames_relayed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_dropped(&self) {
        self.frames_dropped.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns the current counter values.
    #[must_use]
    pub fn snapshot(&self) -> BridgeStatsSnapshot {
        BridgeStatsSnapshot {
            active_connections: self.active_connections.load(Ordering::Relaxed),
            total_connections: self.total_connections.load(Ordering::Relaxed),
            frames_relayed: self.frames_relayed.load(Ordering::Relaxed),
            frames_dropped: self.frames_dropped.load(Ordering::Relaxed),
        }
    }
}

/// Guard returned by [`BridgeStats::track_connection`].
#[derive(Debug)]
pub struct ActiveConnection {
    stats: Arc<BridgeStats>,
}

impl Drop for ActiveConnection {
    fn drop(&mut self) {
        self.stats.active_connections.fetch_sub(1, Ordering::Relaxed);
    }
}

/// Per-connection byte and frame counts, logged when the connection ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConnectionStats {
    /// Bytes read from the native client.
    pub bytes_read: u64,
    /// Bytes written to the native client.
    pub bytes_written: u64,
    /// Frames published to the bus.
    pub frames_relayed: u64,
    /// Chunks dropped as malformed.
    pub frames_dropped: u64,
}
