use crate::field::TickReport;
use chrono::Utc;
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

/// Tracks metrics for the dashboard engine
#[derive(Clone)]
pub struct EngineMetrics {
    /// Snapshots applied (lifetime counter)
    snapshots: Arc<AtomicU64>,

    /// Snapshot timestamps for rate calculation (sliding window)
    snapshot_timestamps: Arc<RwLock<VecDeque<i64>>>,

    /// Snapshots that changed the device count
    replacements: Arc<AtomicU64>,

    change_records: Arc<AtomicU64>,

    frames: Arc<AtomicU64>,

    /// Particles removed because their state went non-finite
    particles_dropped: Arc<AtomicU64>,

    /// Live particles after the last frame
    population: Arc<AtomicU64>,

    /// Open highlight windows after the last reconciliation or timer pass
    active_highlights: Arc<AtomicU64>,

    /// WebSocket connection count
    websocket_connections: Arc<AtomicU64>,

    rate_window_seconds: i64,
}

impl EngineMetrics {
    pub fn new(rate_window_seconds: i64) -> Self {
        Self {
            snapshots: Arc::new(AtomicU64::new(0)),
            snapshot_timestamps: Arc::new(RwLock::new(VecDeque::new())),
            replacements: Arc::new(AtomicU64::new(0)),
            change_records: Arc::new(AtomicU64::new(0)),
            frames: Arc::new(AtomicU64::new(0)),
            particles_dropped: Arc::new(AtomicU64::new(0)),
            population: Arc::new(AtomicU64::new(0)),
            active_highlights: Arc::new(AtomicU64::new(0)),
            websocket_connections: Arc::new(AtomicU64::new(0)),
            rate_window_seconds: rate_window_seconds.max(1),
        }
    }

    /// Record an applied snapshot
    pub fn record_snapshot(&self) {
        self.snapshots.fetch_add(1, Ordering::Relaxed);

        let now = Utc::now().timestamp_millis();
        let window_ms = self.rate_window_seconds * 1000;

        let mut timestamps = self
            .snapshot_timestamps
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        timestamps.push_back(now);

        // Prune timestamps that fell out of the window
        while let Some(&oldest) = timestamps.front() {
            if now - oldest > window_ms {
                timestamps.pop_front();
            } else {
                break;
            }
        }
    }

    pub fn record_replacement(&self) {
        self.replacements.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_changes(&self, count: usize) {
        self.change_records
            .fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn record_frame(&self, report: &TickReport) {
        self.frames.fetch_add(1, Ordering::Relaxed);
        self.particles_dropped
            .fetch_add(report.dropped_invalid as u64, Ordering::Relaxed);
        self.population
            .store(report.population as u64, Ordering::Relaxed);
    }

    pub fn set_active_highlights(&self, count: usize) {
        self.active_highlights
            .store(count as u64, Ordering::Relaxed);
    }

    /// Snapshots per second over the rate window
    pub fn snapshot_rate(&self) -> f64 {
        let threshold = Utc::now().timestamp_millis() - self.rate_window_seconds * 1000;
        let timestamps = self
            .snapshot_timestamps
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        let recent = timestamps.iter().filter(|&&ts| ts >= threshold).count();
        recent as f64 / self.rate_window_seconds as f64
    }

    pub fn increment_ws_connection(&self) {
        self.websocket_connections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn decrement_ws_connection(&self) {
        self.websocket_connections.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn get_ws_connection_count(&self) -> u64 {
        self.websocket_connections.load(Ordering::Relaxed)
    }

    pub fn get_total_snapshots(&self) -> u64 {
        self.snapshots.load(Ordering::Relaxed)
    }

    /// Get snapshot of all metrics
    pub fn get_snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            total_snapshots: self.get_total_snapshots(),
            snapshot_rate: self.snapshot_rate(),
            replacements: self.replacements.load(Ordering::Relaxed),
            change_records: self.change_records.load(Ordering::Relaxed),
            frames: self.frames.load(Ordering::Relaxed),
            particles_dropped: self.particles_dropped.load(Ordering::Relaxed),
            population: self.population.load(Ordering::Relaxed),
            active_highlights: self.active_highlights.load(Ordering::Relaxed),
            websocket_connections: self.get_ws_connection_count(),
        }
    }
}

impl Default for EngineMetrics {
    fn default() -> Self {
        Self::new(60)
    }
}

/// Snapshot of metrics at a point in time
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub total_snapshots: u64,
    pub snapshot_rate: f64,
    pub replacements: u64,
    pub change_records: u64,
    pub frames: u64,
    pub particles_dropped: u64,
    pub population: u64,
    pub active_highlights: u64,
    pub websocket_connections: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_snapshot_recording() {
        let metrics = EngineMetrics::new(10);
        assert_eq!(metrics.get_total_snapshots(), 0);

        metrics.record_snapshot();
        metrics.record_snapshot();
        assert_eq!(metrics.get_total_snapshots(), 2);
        // 2 snapshots / 10s
        assert_eq!(metrics.snapshot_rate(), 0.2);
    }

    #[test]
    fn test_frame_recording_accumulates_drops_and_tracks_population() {
        let metrics = EngineMetrics::default();
        metrics.record_frame(&TickReport {
            dropped_invalid: 2,
            population: 40,
            ..Default::default()
        });
        metrics.record_frame(&TickReport {
            dropped_invalid: 1,
            population: 35,
            ..Default::default()
        });

        let snapshot = metrics.get_snapshot();
        assert_eq!(snapshot.frames, 2);
        assert_eq!(snapshot.particles_dropped, 3);
        assert_eq!(snapshot.population, 35);
    }

    #[test]
    fn test_websocket_connection_tracking() {
        let metrics = EngineMetrics::default();

        metrics.increment_ws_connection();
        metrics.increment_ws_connection();
        assert_eq!(metrics.get_ws_connection_count(), 2);

        metrics.decrement_ws_connection();
        assert_eq!(metrics.get_ws_connection_count(), 1);
    }

    #[test]
    fn test_metrics_snapshot() {
        let metrics = EngineMetrics::default();
        metrics.record_snapshot();
        metrics.record_replacement();
        metrics.record_changes(3);
        metrics.set_active_highlights(2);

        let snapshot = metrics.get_snapshot();
        assert_eq!(snapshot.total_snapshots, 1);
        assert_eq!(snapshot.replacements, 1);
        assert_eq!(snapshot.change_records, 3);
        assert_eq!(snapshot.active_highlights, 2);
        assert!(snapshot.snapshot_rate > 0.0);
    }

    #[test]
    fn test_concurrent_access() {
        let metrics = Arc::new(EngineMetrics::default());
        let mut handles = vec![];

        for _ in 0..10 {
            let metrics = Arc::clone(&metrics);
            handles.push(thread::spawn(move || {
                for _ in 0..100 {
                    metrics.record_snapshot();
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(metrics.get_total_snapshots(), 1000);
    }
}
