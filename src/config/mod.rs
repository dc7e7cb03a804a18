use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

// Re-export component config types
pub use crate::feed::FeedConfig;
pub use crate::field::{SimulationConfig, SmootherConfig, SpawnCurveConfig};
pub use crate::reconcile::HighlightConfig;
pub use crate::status::StatusThresholds;

/// Complete airflux configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AirfluxConfig {
    #[serde(default)]
    pub smoother: SmootherConfig,
    #[serde(default)]
    pub spawn: SpawnCurveConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub highlight: HighlightConfig,
    #[serde(default)]
    pub status: StatusThresholds,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub nats: FeedConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Frame loop and surface configuration
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_frame_rate")]
    pub frame_rate: u32,
    /// Publish the particle list every N frames
    #[serde(default = "default_frame_broadcast_every")]
    pub frame_broadcast_every: u64,
    #[serde(default = "default_width")]
    pub width: f32,
    #[serde(default = "default_height")]
    pub height: f32,
    /// Inbound command queue depth
    #[serde(default = "default_command_buffer")]
    pub command_buffer: usize,
}

fn default_frame_rate() -> u32 {
    60
}

fn default_frame_broadcast_every() -> u64 {
    4
}

fn default_width() -> f32 {
    1280.0
}

fn default_height() -> f32 {
    720.0
}

fn default_command_buffer() -> usize {
    64
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            frame_rate: default_frame_rate(),
            frame_broadcast_every: default_frame_broadcast_every(),
            width: default_width(),
            height: default_height(),
            command_buffer: default_command_buffer(),
        }
    }
}

/// HTTP/WebSocket configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

fn default_bind_addr() -> String {
    "0.0.0.0:5000".to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
        }
    }
}

/// Metrics configuration
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    /// How often to broadcast metrics via WebSocket (seconds)
    #[serde(default = "default_broadcast_interval")]
    pub broadcast_interval_seconds: u64,
    /// Time window for the snapshot rate (seconds)
    #[serde(default = "default_rate_window")]
    pub rate_window_seconds: i64,
}

fn default_broadcast_interval() -> u64 {
    2
}

fn default_rate_window() -> i64 {
    60
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            broadcast_interval_seconds: default_broadcast_interval(),
            rate_window_seconds: default_rate_window(),
        }
    }
}

/// Load configuration from TOML file
pub fn load_config(path: impl AsRef<Path>) -> Result<AirfluxConfig> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    let config: AirfluxConfig = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse config file {}", path.display()))?;
    Ok(config)
}
