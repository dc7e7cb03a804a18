use crate::engine::{DashboardView, DeviceView, EngineCommand, FrameView, MetricsUpdate};
use crate::render::DrawCommand;
use crate::status::AirStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Client → Server message types
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    /// Page visibility; hidden pauses the frame loop
    #[serde(rename = "set_visibility")]
    SetVisibility { visible: bool },
    /// Drawing surface size in pixels
    #[serde(rename = "resize")]
    Resize { width: f32, height: f32 },
}

impl From<ClientMessage> for EngineCommand {
    fn from(msg: ClientMessage) -> Self {
        match msg {
            ClientMessage::SetVisibility { visible } => EngineCommand::Visibility(visible),
            ClientMessage::Resize { width, height } => EngineCommand::Resize { width, height },
        }
    }
}

/// Server → Client: merged device state with highlight flags
#[derive(Debug, Clone, Serialize)]
pub struct DashboardUpdateMessage {
    #[serde(rename = "type")]
    pub msg_type: String,
    pub status: AirStatus,
    pub driver: f64,
    pub devices: Vec<DeviceView>,
    pub timestamp: DateTime<Utc>,
}

impl From<DashboardView> for DashboardUpdateMessage {
    fn from(view: DashboardView) -> Self {
        Self {
            msg_type: "dashboard_update".to_string(),
            status: view.status,
            driver: view.driver,
            devices: view.devices,
            timestamp: view.timestamp,
        }
    }
}

/// Server → Client: particle draw list
#[derive(Debug, Clone, Serialize)]
pub struct FrameUpdateMessage {
    #[serde(rename = "type")]
    pub msg_type: String,
    pub frame: u64,
    pub width: f32,
    pub height: f32,
    pub population: usize,
    pub target_population: usize,
    pub smoothed_driver: f64,
    pub status: AirStatus,
    pub particles: Vec<DrawCommand>,
}

impl From<FrameView> for FrameUpdateMessage {
    fn from(frame: FrameView) -> Self {
        Self {
            msg_type: "frame_update".to_string(),
            frame: frame.frame,
            width: frame.width,
            height: frame.height,
            population: frame.population,
            target_population: frame.target_population,
            smoothed_driver: frame.smoothed_driver,
            status: frame.status,
            particles: frame.particles,
        }
    }
}

/// Server → Client: Metrics update notification
#[derive(Debug, Clone, Serialize)]
pub struct MetricsUpdateMessage {
    #[serde(rename = "type")]
    pub msg_type: String,
    pub timestamp: DateTime<Utc>,
    pub devices: MetricsDevices,
    pub snapshots: MetricsSnapshots,
    pub particles: MetricsParticles,
    pub websocket: MetricsWebSocket,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsDevices {
    pub total: usize,
    pub highlighted: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshots {
    pub total: u64,
    pub rate_per_second: f64,
    pub replacements: u64,
    pub change_records: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsParticles {
    pub population: u64,
    pub dropped: u64,
    pub frames: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsWebSocket {
    pub connections: u64,
}

impl From<MetricsUpdate> for MetricsUpdateMessage {
    fn from(update: MetricsUpdate) -> Self {
        let m = update.metrics;
        Self {
            msg_type: "metrics_update".to_string(),
            timestamp: Utc::now(),
            devices: MetricsDevices {
                total: update.device_count,
                highlighted: m.active_highlights,
            },
            snapshots: MetricsSnapshots {
                total: m.total_snapshots,
                rate_per_second: m.snapshot_rate,
                replacements: m.replacements,
                change_records: m.change_records,
            },
            particles: MetricsParticles {
                population: m.population,
                dropped: m.particles_dropped,
                frames: m.frames,
            },
            websocket: MetricsWebSocket {
                connections: m.websocket_connections,
            },
        }
    }
}

/// Server → Client: Error message
#[derive(Debug, Clone, Serialize)]
pub struct ErrorMessage {
    #[serde(rename = "type")]
    pub msg_type: String,
    pub error: String,
}

impl ErrorMessage {
    pub fn new(error: String) -> Self {
        Self {
            msg_type: "error".to_string(),
            error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::EngineMetrics;
    use serde_json::json;

    #[test]
    fn test_parse_client_messages() {
        let msg: ClientMessage =
            serde_json::from_value(json!({ "type": "set_visibility", "visible": false })).unwrap();
        assert_eq!(msg, ClientMessage::SetVisibility { visible: false });
        assert!(matches!(
            EngineCommand::from(msg),
            EngineCommand::Visibility(false)
        ));

        let msg: ClientMessage =
            serde_json::from_value(json!({ "type": "resize", "width": 800, "height": 600 }))
                .unwrap();
        assert!(matches!(
            EngineCommand::from(msg),
            EngineCommand::Resize { width, height } if width == 800.0 && height == 600.0
        ));
    }

    #[test]
    fn test_unknown_client_message_is_rejected() {
        let result = serde_json::from_value::<ClientMessage>(json!({ "type": "subscribe" }));
        assert!(result.is_err());
    }

    #[test]
    fn test_dashboard_update_shape() {
        let msg = DashboardUpdateMessage::from(DashboardView::default());
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["type"], "dashboard_update");
        assert_eq!(value["status"], "nominal");
        assert_eq!(value["driver"], 1.0);
        assert_eq!(value["devices"], json!([]));
    }

    #[test]
    fn test_metrics_update_shape() {
        let metrics = EngineMetrics::default();
        metrics.record_snapshot();
        metrics.increment_ws_connection();
        let msg = MetricsUpdateMessage::from(MetricsUpdate {
            device_count: 3,
            metrics: metrics.get_snapshot(),
        });

        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["type"], "metrics_update");
        assert_eq!(value["devices"]["total"], 3);
        assert_eq!(value["snapshots"]["total"], 1);
        assert_eq!(value["websocket"]["connections"], 1);
    }
}
