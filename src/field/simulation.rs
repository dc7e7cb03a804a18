use crate::field::arena::ParticleArena;
use crate::field::particle::{Fate, Particle, Physics};
use crate::field::spawn::SpawnPlan;
use crate::field::WorkingBounds;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Where new particles enter the field
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpawnMode {
    /// Just outside a uniformly chosen edge
    #[default]
    Edge,
    /// Anywhere inside the working bounds
    Burst,
}

/// What happens to a culled particle's slot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CullMode {
    #[default]
    Remove,
    /// Re-spawn into the same slot while the population is within target
    Recycle,
}

/// Particle simulation tuning (all per-tick quantities)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    #[serde(default)]
    pub spawn_mode: SpawnMode,
    #[serde(default)]
    pub cull_mode: CullMode,
    #[serde(default = "default_gravity")]
    pub gravity: f32,
    #[serde(default = "default_friction")]
    pub friction: f32,
    /// Radius around the focal point where attraction stops and particles are absorbed
    #[serde(default = "default_near_radius")]
    pub near_radius: f32,
    #[serde(default = "default_absorb_decay")]
    pub absorb_decay: f32,
    #[serde(default = "default_cull_margin")]
    pub cull_margin: f32,
    #[serde(default = "default_edge_offset")]
    pub edge_offset: f32,
    #[serde(default = "default_perspective")]
    pub perspective: f32,
    #[serde(default = "default_depth_range")]
    pub depth_range: f32,
    #[serde(default = "default_depth_drift")]
    pub depth_drift: f32,
    #[serde(default = "default_base_speed")]
    pub base_speed: f32,
    /// Extra speed at full intensity, as a multiple of `base_speed`
    #[serde(default = "default_speed_gain")]
    pub speed_gain: f32,
    #[serde(default = "default_size_gain")]
    pub size_gain: f32,
    #[serde(default = "default_decay_gain")]
    pub decay_gain: f32,
    /// Largest spawn backlog carried between ticks
    #[serde(default = "default_max_spawn_backlog_ms")]
    pub max_spawn_backlog_ms: f64,
    /// Particles seeded at random interior points on start
    #[serde(default)]
    pub initial_burst: usize,
    /// Fixed RNG seed; entropy when absent
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_gravity() -> f32 {
    0.0375
}

fn default_friction() -> f32 {
    0.99
}

fn default_near_radius() -> f32 {
    40.0
}

fn default_absorb_decay() -> f32 {
    0.05
}

fn default_cull_margin() -> f32 {
    50.0
}

fn default_edge_offset() -> f32 {
    10.0
}

fn default_perspective() -> f32 {
    800.0
}

fn default_depth_range() -> f32 {
    400.0
}

fn default_depth_drift() -> f32 {
    0.5
}

fn default_base_speed() -> f32 {
    1.0
}

fn default_speed_gain() -> f32 {
    1.5
}

fn default_size_gain() -> f32 {
    0.3
}

fn default_decay_gain() -> f32 {
    0.5
}

fn default_max_spawn_backlog_ms() -> f64 {
    100.0
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            spawn_mode: SpawnMode::default(),
            cull_mode: CullMode::default(),
            gravity: default_gravity(),
            friction: default_friction(),
            near_radius: default_near_radius(),
            absorb_decay: default_absorb_decay(),
            cull_margin: default_cull_margin(),
            edge_offset: default_edge_offset(),
            perspective: default_perspective(),
            depth_range: default_depth_range(),
            depth_drift: default_depth_drift(),
            base_speed: default_base_speed(),
            speed_gain: default_speed_gain(),
            size_gain: default_size_gain(),
            decay_gain: default_decay_gain(),
            max_spawn_backlog_ms: default_max_spawn_backlog_ms(),
            initial_burst: 0,
            seed: None,
        }
    }
}

/// Counters for one simulation tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub spawned: usize,
    pub recycled: usize,
    pub culled: usize,
    /// Removed because the target dropped below the live population
    pub trimmed: usize,
    /// Removed because their state became non-finite
    pub dropped_invalid: usize,
    pub population: usize,
}

/// Owns the particle population and advances it one tick at a time
#[derive(Debug)]
pub struct ParticleSimulation {
    arena: ParticleArena,
    config: SimulationConfig,
    physics: Physics,
    bounds: WorkingBounds,
    rng: StdRng,
    last_spawn_ms: f64,
}

impl ParticleSimulation {
    pub fn new(config: &SimulationConfig, capacity: usize, bounds: WorkingBounds) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            arena: ParticleArena::with_capacity(capacity),
            physics: Physics {
                gravity: config.gravity,
                friction: config.friction,
                near_radius: config.near_radius.max(f32::EPSILON),
                absorb_decay: config.absorb_decay,
                perspective: config.perspective,
            },
            config: config.clone(),
            bounds,
            rng,
            last_spawn_ms: 0.0,
        }
    }

    pub fn bounds(&self) -> WorkingBounds {
        self.bounds
    }

    pub fn set_bounds(&mut self, bounds: WorkingBounds) {
        self.bounds = bounds;
    }

    /// Restart the spawn cadence at `now_ms`, discarding any backlog
    pub fn reset_cadence(&mut self, now_ms: f64) {
        self.last_spawn_ms = now_ms;
    }

    pub fn population(&self) -> usize {
        self.arena.len()
    }

    pub fn capacity(&self) -> usize {
        self.arena.capacity()
    }

    pub fn particles(&self) -> impl Iterator<Item = &Particle> {
        self.arena.iter()
    }

    /// Seed up to `count` particles at random interior points with partial life
    pub fn seed_burst(&mut self, count: usize, plan: &SpawnPlan) -> usize {
        let room = plan
            .target_population
            .min(self.arena.capacity())
            .saturating_sub(self.arena.len());
        let mut seeded = 0;
        for _ in 0..count.min(room) {
            let particle = self.spawn(plan.scale, true);
            if self.arena.insert(particle).is_none() {
                break;
            }
            seeded += 1;
        }
        seeded
    }

    /// Admit spawns, integrate every live particle, then cull.
    ///
    /// The live population never exceeds `plan.target_population` when this
    /// returns.
    pub fn tick(&mut self, plan: &SpawnPlan, now_ms: f64) -> TickReport {
        let mut report = TickReport::default();
        let target = plan.target_population.min(self.arena.capacity());

        self.admit(plan, target, now_ms, &mut report);
        self.integrate(plan, target, &mut report);
        self.trim(target, &mut report);

        report.population = self.arena.len();
        trace!(
            spawned = report.spawned,
            culled = report.culled,
            population = report.population,
            "Particle tick"
        );
        report
    }

    fn admit(&mut self, plan: &SpawnPlan, target: usize, now_ms: f64, report: &mut TickReport) {
        let interval = plan.spawn_interval_ms;
        if !interval.is_finite() || interval <= 0.0 || !now_ms.is_finite() {
            return;
        }

        // The accumulator advances one interval per admitted particle, so a
        // long gap would otherwise be replayed as a burst.
        let window = self.config.max_spawn_backlog_ms.max(interval);
        if now_ms - self.last_spawn_ms > window {
            self.last_spawn_ms = now_ms - window;
        }

        while self.arena.len() < target && now_ms - self.last_spawn_ms >= interval {
            let particle = self.spawn(plan.scale, false);
            if self.arena.insert(particle).is_none() {
                break;
            }
            self.last_spawn_ms += interval;
            report.spawned += 1;
        }
    }

    fn integrate(&mut self, plan: &SpawnPlan, target: usize, report: &mut TickReport) {
        let (cx, cy) = self.bounds.center();
        let margin = self.config.cull_margin;

        for index in self.arena.occupied() {
            let fate = match self.arena.get_mut(index) {
                Some(p) => {
                    let fate = p.integrate(&self.physics, cx, cy);
                    if fate == Fate::Alive && !self.bounds.contains(p.x, p.y, margin) {
                        Fate::Escaped
                    } else {
                        fate
                    }
                }
                None => continue,
            };

            match fate {
                Fate::Alive => {}
                Fate::Invalid => {
                    self.arena.remove(index);
                    report.dropped_invalid += 1;
                }
                Fate::Expired | Fate::Escaped => {
                    if self.config.cull_mode == CullMode::Recycle && self.arena.len() <= target {
                        let fresh = self.spawn(plan.scale, false);
                        self.arena.replace(index, fresh);
                        report.recycled += 1;
                    } else {
                        self.arena.remove(index);
                        report.culled += 1;
                    }
                }
            }
        }
    }

    /// Drop the weakest particles until the population fits the target
    fn trim(&mut self, target: usize, report: &mut TickReport) {
        let excess = self.arena.len().saturating_sub(target);
        if excess == 0 {
            return;
        }

        let mut by_life: Vec<(usize, f32)> = self
            .arena
            .occupied()
            .into_iter()
            .filter_map(|i| self.arena.get(i).map(|p| (i, p.life)))
            .collect();
        by_life.sort_by(|a, b| a.1.total_cmp(&b.1));

        for (index, _) in by_life.into_iter().take(excess) {
            self.arena.remove(index);
            report.trimmed += 1;
        }
    }

    /// Fresh particle whose weight reflects the intensity at spawn time
    fn spawn(&mut self, scale: f64, seeding: bool) -> Particle {
        let intensity = if scale.is_finite() {
            scale.clamp(0.0, 1.0) as f32
        } else {
            1.0
        };
        let cfg = &self.config;
        let rng = &mut self.rng;
        let (w, h) = (self.bounds.width, self.bounds.height);

        let speed = cfg.base_speed * (1.0 + cfg.speed_gain * intensity);

        let (x, y) = if seeding || cfg.spawn_mode == SpawnMode::Burst {
            (rng.gen::<f32>() * w, rng.gen::<f32>() * h)
        } else {
            let offset = cfg.edge_offset;
            match rng.gen_range(0..4) {
                0 => (rng.gen::<f32>() * w, -offset),
                1 => (w + offset, rng.gen::<f32>() * h),
                2 => (rng.gen::<f32>() * w, h + offset),
                _ => (-offset, rng.gen::<f32>() * h),
            }
        };

        // Burst spawns appear mid-life like the seeded field
        let life = if seeding || cfg.spawn_mode == SpawnMode::Burst {
            0.2 + rng.gen::<f32>() * 0.8
        } else {
            1.0
        };
        let base_size = (2.0 + rng.gen::<f32>() * 3.0) * (1.0 + cfg.size_gain * intensity);
        let base_opacity = 0.5 + rng.gen::<f32>() * 0.5;

        Particle {
            x,
            y,
            vx: (rng.gen::<f32>() - 0.5) * speed,
            vy: (rng.gen::<f32>() - 0.5) * speed,
            depth: rng.gen::<f32>() * cfg.depth_range,
            vz: (rng.gen::<f32>() - 0.5) * cfg.depth_drift,
            life,
            life_decay: (0.001 + rng.gen::<f32>() * 0.002) * (1.0 + cfg.decay_gain * intensity),
            base_size,
            base_opacity,
            perspective_scale: 1.0,
            size: base_size,
            opacity: base_opacity * life,
        }
    }
}
