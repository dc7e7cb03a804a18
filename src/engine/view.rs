use crate::device::{DeviceReading, EntityKey, FieldSet};
use crate::render::DrawCommand;
use crate::status::AirStatus;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// One device as presented, with its highlight state
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceView {
    pub key: EntityKey,
    #[serde(flatten)]
    pub reading: DeviceReading,
    /// True from the first change until the window is released
    pub updating: bool,
    /// Fields currently marked as recently changed
    pub highlighted: FieldSet,
}

/// Merged snapshot plus status, published after every reconciliation and timer transition
#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    pub devices: Vec<DeviceView>,
    pub status: AirStatus,
    pub driver: f64,
    pub timestamp: DateTime<Utc>,
}

impl DashboardView {
    pub fn device(&self, key: EntityKey) -> Option<&DeviceView> {
        self.devices.iter().find(|d| d.key == key)
    }
}

impl Default for DashboardView {
    fn default() -> Self {
        Self {
            devices: Vec::new(),
            status: AirStatus::Nominal,
            driver: 1.0,
            timestamp: Utc::now(),
        }
    }
}

/// Particle draw list for one rendered frame
#[derive(Debug, Clone, Serialize)]
pub struct FrameView {
    pub frame: u64,
    pub width: f32,
    pub height: f32,
    pub population: usize,
    pub target_population: usize,
    pub smoothed_driver: f64,
    pub status: AirStatus,
    pub particles: Vec<DrawCommand>,
}
