use crate::engine::EngineHandle;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tracing::debug;

/// Periodically broadcast metrics to all subscribers
///
/// Runs until the engine's metrics channel has no sender left. Sending is
/// non-blocking and never stalls the engine task.
pub async fn run_metrics_broadcaster(handle: EngineHandle, interval_seconds: u64) {
    let mut ticker = interval(Duration::from_secs(interval_seconds.max(1)));

    // Skip missed ticks to prevent backlog under load
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;

        if handle.is_closed() {
            debug!("Engine stopped, metrics broadcaster exiting");
            break;
        }

        let update = MetricsUpdate {
            device_count: handle.latest_view().devices.len(),
            metrics: handle.metrics().get_snapshot(),
        };

        // Sending only fails when nobody is subscribed
        let _ = handle.publish_metrics(update);
    }
}

/// Metrics update message broadcast to WebSocket clients
#[derive(Debug, Clone, serde::Serialize)]
pub struct MetricsUpdate {
    pub device_count: usize,
    pub metrics: crate::engine::MetricsSnapshot,
}
