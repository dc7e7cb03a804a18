// Particle field: driver smoothing, spawn cadence and simulation

mod arena;
mod particle;
mod simulation;
mod smoother;
mod spawn;

pub use arena::ParticleArena;
pub use particle::{Fate, Particle, Physics};
pub use simulation::{CullMode, ParticleSimulation, SimulationConfig, SpawnMode, TickReport};
pub use smoother::{SignalSmoother, SmootherConfig};
pub use spawn::{SpawnCurveConfig, SpawnPlan, SpawnRateController};

use serde::Serialize;

/// Rectangle in which particles are live, anchored at the origin
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WorkingBounds {
    pub width: f32,
    pub height: f32,
}

impl WorkingBounds {
    pub fn new(width: f32, height: f32) -> Self {
        let clean = |v: f32| if v.is_finite() { v.max(1.0) } else { 1.0 };
        Self {
            width: clean(width),
            height: clean(height),
        }
    }

    pub fn center(&self) -> (f32, f32) {
        (self.width / 2.0, self.height / 2.0)
    }

    /// Whether `(x, y)` lies within the bounds grown by `margin` on every side
    pub fn contains(&self, x: f32, y: f32, margin: f32) -> bool {
        x > -margin && x < self.width + margin && y > -margin && y < self.height + margin
    }
}
