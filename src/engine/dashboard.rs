use crate::config::AirfluxConfig;
use crate::device::{EntityKey, Snapshot};
use crate::engine::handle::{EngineCommand, EngineHandle};
use crate::engine::metrics::EngineMetrics;
use crate::engine::metrics_broadcaster::MetricsUpdate;
use crate::engine::view::{DashboardView, DeviceView, FrameView};
use crate::field::{
    ParticleSimulation, SignalSmoother, SpawnPlan, SpawnRateController, TickReport, WorkingBounds,
};
use crate::reconcile::{
    DiffEngine, HighlightScheduler, MergeKind, Reconciliation, Transition,
};
use crate::render::{DrawList, Renderer, VisibilityChange};
use crate::status::{AirStatus, StatusThresholds};
use chrono::Utc;
use std::collections::HashSet;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio::time::{interval, sleep_until, Instant, MissedTickBehavior};
use tracing::{debug, info, trace};

/// Owns both flows: snapshot reconciliation with highlight timing, and the
/// driver-parameterised particle field.
///
/// All mutation happens on the task running [`DashboardEngine::run`]; the
/// outside world talks to it through an [`EngineHandle`].
pub struct DashboardEngine {
    diff: DiffEngine,
    scheduler: HighlightScheduler,
    smoother: SignalSmoother,
    controller: SpawnRateController,
    simulation: ParticleSimulation,
    renderer: Renderer<DrawList>,
    thresholds: StatusThresholds,

    /// Raw driver from the latest snapshot
    driver: f64,
    plan: SpawnPlan,

    /// Origin of the simulation clock
    epoch: Instant,
    frame_index: u64,
    frame_period: Duration,
    frame_broadcast_every: u64,

    dashboard_tx: broadcast::Sender<DashboardView>,
    frame_tx: broadcast::Sender<FrameView>,
    metrics_tx: broadcast::Sender<MetricsUpdate>,
    latest: Arc<RwLock<DashboardView>>,
    metrics: EngineMetrics,
}

impl DashboardEngine {
    pub fn new(config: &AirfluxConfig) -> Self {
        let (dashboard_tx, _) = broadcast::channel(100);
        let (frame_tx, _) = broadcast::channel(16);
        let (metrics_tx, _) = broadcast::channel(10);

        let smoother = SignalSmoother::new(&config.smoother);
        let controller = SpawnRateController::new(&config.spawn);
        let plan = controller.compute(smoother.value());
        let bounds = WorkingBounds::new(config.engine.width, config.engine.height);

        let mut simulation =
            ParticleSimulation::new(&config.simulation, controller.max_cap(), bounds);
        simulation.reset_cadence(0.0);
        if config.simulation.initial_burst > 0 {
            let seeded = simulation.seed_burst(config.simulation.initial_burst, &plan);
            debug!(seeded = seeded, "Seeded initial particles");
        }

        let frame_rate = config.engine.frame_rate.max(1);

        Self {
            diff: DiffEngine::new(),
            scheduler: HighlightScheduler::new(&config.highlight),
            smoother,
            controller,
            simulation,
            renderer: Renderer::new(DrawList::new(), bounds.width, bounds.height),
            thresholds: config.status.clone(),
            driver: 1.0,
            plan,
            epoch: Instant::now(),
            frame_index: 0,
            frame_period: Duration::from_secs_f64(1.0 / frame_rate as f64),
            frame_broadcast_every: config.engine.frame_broadcast_every.max(1),
            dashboard_tx,
            frame_tx,
            metrics_tx,
            latest: Arc::new(RwLock::new(DashboardView::default())),
            metrics: EngineMetrics::new(config.metrics.rate_window_seconds),
        }
    }

    /// Handle sharing this engine's channels, sending commands into `commands`
    pub fn handle(&self, commands: mpsc::Sender<EngineCommand>) -> EngineHandle {
        EngineHandle {
            commands,
            dashboard_tx: self.dashboard_tx.clone(),
            frame_tx: self.frame_tx.clone(),
            metrics_tx: self.metrics_tx.clone(),
            latest: Arc::clone(&self.latest),
            metrics: self.metrics.clone(),
        }
    }

    /// Reconcile a snapshot, schedule highlights and publish the merged view.
    ///
    /// Every change record is computed before the scheduler sees any of them.
    pub fn apply_snapshot(&mut self, snapshot: Snapshot, now: Instant) -> Reconciliation {
        self.metrics.record_snapshot();
        let driver = snapshot.driver_value();

        let scheduler = &self.scheduler;
        let reconciliation = self
            .diff
            .reconcile(snapshot, |key| scheduler.is_active(key));

        if reconciliation.kind == MergeKind::Replaced {
            self.metrics.record_replacement();
            let present: HashSet<EntityKey> =
                self.diff.retained().iter().map(|d| d.key).collect();
            let cancelled = self.scheduler.retain(|key| present.contains(&key));
            if cancelled > 0 {
                debug!(cancelled = cancelled, "Cancelled highlights of removed devices");
            }
        }

        for record in &reconciliation.records {
            self.scheduler.on_change(record.key, &record.fields, now);
        }
        self.metrics.record_changes(reconciliation.records.len());

        let previous_status = self.status();
        self.driver = driver;
        let status = self.status();
        if status != previous_status {
            info!(status = ?status, driver = driver, "Air status changed");
        }

        self.publish_dashboard();
        reconciliation
    }

    /// Fire every highlight deadline at or before `now`
    pub fn fire_timers(&mut self, now: Instant) -> Vec<Transition> {
        let transitions = self.scheduler.fire_due(now);
        if !transitions.is_empty() {
            trace!(transitions = transitions.len(), "Highlight timers fired");
            self.publish_dashboard();
        }
        transitions
    }

    /// Advance the smoother, re-plan, step the simulation and draw one frame
    pub fn tick_frame(&mut self, now: Instant) -> TickReport {
        if !self.renderer.is_visible() {
            return TickReport {
                population: self.simulation.population(),
                ..Default::default()
            };
        }

        let smoothed = self.smoother.advance(self.driver);
        self.plan = self.controller.compute(smoothed);
        let report = self.simulation.tick(&self.plan, self.clock_ms(now));
        let drawn = self.renderer.draw(self.simulation.particles());

        self.frame_index += 1;
        self.metrics.record_frame(&report);
        trace!(
            frame = self.frame_index,
            drawn = drawn,
            target = self.plan.target_population,
            "Frame rendered"
        );

        if self.frame_index % self.frame_broadcast_every == 0 {
            let _ = self.frame_tx.send(self.frame_view());
        }
        report
    }

    /// Gate the frame loop; resuming restarts the spawn cadence at `now`
    pub fn set_visible(&mut self, visible: bool, now: Instant) -> VisibilityChange {
        let change = self.renderer.set_visible(visible);
        match change {
            VisibilityChange::Resumed => {
                self.simulation.reset_cadence(self.clock_ms(now));
                info!("Frame loop resumed");
            }
            VisibilityChange::Paused => info!("Frame loop paused"),
            VisibilityChange::Unchanged => {}
        }
        change
    }

    pub fn resize(&mut self, width: f32, height: f32) -> WorkingBounds {
        let bounds = self.renderer.resize(width, height);
        self.simulation.set_bounds(bounds);
        bounds
    }

    /// Cancel every outstanding highlight timer
    pub fn shutdown(&mut self) -> usize {
        let cancelled = self.scheduler.teardown();
        self.metrics.set_active_highlights(0);
        info!(cancelled = cancelled, "Dashboard engine shut down");
        cancelled
    }

    pub fn view(&self) -> DashboardView {
        let devices = self
            .diff
            .retained()
            .iter()
            .map(|device| DeviceView {
                key: device.key,
                reading: device.reading.clone(),
                updating: self.scheduler.is_updating(device.key),
                highlighted: self
                    .scheduler
                    .highlighted(device.key)
                    .cloned()
                    .unwrap_or_default(),
            })
            .collect();

        DashboardView {
            devices,
            status: self.status(),
            driver: self.driver,
            timestamp: Utc::now(),
        }
    }

    pub fn frame_view(&self) -> FrameView {
        let bounds = self.renderer.bounds();
        FrameView {
            frame: self.frame_index,
            width: bounds.width,
            height: bounds.height,
            population: self.simulation.population(),
            target_population: self.plan.target_population,
            smoothed_driver: self.smoother.value(),
            status: self.status(),
            particles: self.renderer.surface().commands().to_vec(),
        }
    }

    pub fn status(&self) -> AirStatus {
        self.thresholds.classify(self.driver)
    }

    pub fn driver(&self) -> f64 {
        self.driver
    }

    pub fn plan(&self) -> &SpawnPlan {
        &self.plan
    }

    pub fn population(&self) -> usize {
        self.simulation.population()
    }

    pub fn is_visible(&self) -> bool {
        self.renderer.is_visible()
    }

    /// Run the engine until shutdown or until every handle is dropped
    pub async fn run(mut self, mut commands: mpsc::Receiver<EngineCommand>) {
        let mut frames = interval(self.frame_period);
        frames.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!(
            frame_ms = self.frame_period.as_millis() as u64,
            "Dashboard engine running"
        );

        loop {
            let deadline = self.scheduler.next_deadline();
            let visible = self.renderer.is_visible();

            tokio::select! {
                command = commands.recv() => match command {
                    Some(EngineCommand::Snapshot(snapshot)) => {
                        self.apply_snapshot(snapshot, Instant::now());
                    }
                    Some(EngineCommand::Resize { width, height }) => {
                        self.resize(width, height);
                    }
                    Some(EngineCommand::Visibility(visible)) => {
                        if self.set_visible(visible, Instant::now()) == VisibilityChange::Resumed {
                            frames.reset();
                        }
                    }
                    Some(EngineCommand::Shutdown) | None => break,
                },

                now = frames.tick(), if visible => {
                    self.tick_frame(now);
                }

                _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    self.fire_timers(Instant::now());
                }
            }
        }

        self.shutdown();
    }

    fn publish_dashboard(&self) {
        self.metrics
            .set_active_highlights(self.scheduler.active_count());
        let view = self.view();
        *self.latest.write().unwrap_or_else(PoisonError::into_inner) = view.clone();
        // No subscribers is fine
        let _ = self.dashboard_tx.send(view);
    }

    /// Milliseconds since the engine was created
    fn clock_ms(&self, now: Instant) -> f64 {
        now.saturating_duration_since(self.epoch).as_secs_f64() * 1000.0
    }
}
