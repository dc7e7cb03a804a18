use crate::device::Snapshot;
use crate::engine::metrics::EngineMetrics;
use crate::engine::metrics_broadcaster::MetricsUpdate;
use crate::engine::view::{DashboardView, FrameView};
use anyhow::{anyhow, Result};
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::{broadcast, mpsc};

/// Inputs the engine task accepts
#[derive(Debug)]
pub enum EngineCommand {
    Snapshot(Snapshot),
    Resize { width: f32, height: f32 },
    Visibility(bool),
    Shutdown,
}

/// Cloneable access to a running engine: its command queue and published views
#[derive(Clone)]
pub struct EngineHandle {
    pub(crate) commands: mpsc::Sender<EngineCommand>,
    pub(crate) dashboard_tx: broadcast::Sender<DashboardView>,
    pub(crate) frame_tx: broadcast::Sender<FrameView>,
    pub(crate) metrics_tx: broadcast::Sender<MetricsUpdate>,
    pub(crate) latest: Arc<RwLock<DashboardView>>,
    pub(crate) metrics: EngineMetrics,
}

impl EngineHandle {
    /// Queue a command for the engine task
    pub async fn send(&self, command: EngineCommand) -> Result<()> {
        self.commands
            .send(command)
            .await
            .map_err(|_| anyhow!("Dashboard engine is not running"))
    }

    pub async fn submit_snapshot(&self, snapshot: Snapshot) -> Result<()> {
        self.send(EngineCommand::Snapshot(snapshot)).await
    }

    /// True once the engine task has stopped reading commands
    pub fn is_closed(&self) -> bool {
        self.commands.is_closed()
    }

    /// Most recently published dashboard view
    pub fn latest_view(&self) -> DashboardView {
        self.latest
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn subscribe_dashboard(&self) -> broadcast::Receiver<DashboardView> {
        self.dashboard_tx.subscribe()
    }

    pub fn subscribe_frames(&self) -> broadcast::Receiver<FrameView> {
        self.frame_tx.subscribe()
    }

    pub fn subscribe_metrics(&self) -> broadcast::Receiver<MetricsUpdate> {
        self.metrics_tx.subscribe()
    }

    pub fn metrics(&self) -> &EngineMetrics {
        &self.metrics
    }

    pub(crate) fn publish_metrics(
        &self,
        update: MetricsUpdate,
    ) -> Result<usize, broadcast::error::SendError<MetricsUpdate>> {
        self.metrics_tx.send(update)
    }
}
