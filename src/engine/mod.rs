// Dashboard engine: reconciliation, highlight timing and the particle frame loop

mod dashboard;
mod handle;
mod metrics;
mod metrics_broadcaster;
mod view;

pub use dashboard::DashboardEngine;
pub use handle::{EngineCommand, EngineHandle};
pub use metrics::{EngineMetrics, MetricsSnapshot};
pub use metrics_broadcaster::{run_metrics_broadcaster, MetricsUpdate};
pub use view::{DashboardView, DeviceView, FrameView};
