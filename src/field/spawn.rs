use serde::{Deserialize, Serialize};

/// Shape of the driver → population curve
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpawnCurveConfig {
    /// Driver value at which the power term reaches 1
    #[serde(default = "default_base")]
    pub base: f64,
    #[serde(default = "default_exponent")]
    pub exponent: f64,
    /// Weight of the `ln(1 + v/base)` term
    #[serde(default = "default_log_boost")]
    pub log_boost: f64,
    /// Population at a zero driver
    #[serde(default = "default_base_count")]
    pub base_count: usize,
    #[serde(default = "default_max_count")]
    pub max_count: usize,
    /// Hard population cap; also the particle arena capacity
    #[serde(default = "default_max_cap")]
    pub max_cap: usize,
    /// Spawns per second at a zero driver
    #[serde(default = "default_min_rate")]
    pub min_rate: f64,
    /// Spawn rate cap, per second
    #[serde(default = "default_max_rate")]
    pub max_rate: f64,
}

fn default_base() -> f64 {
    100.0
}

fn default_exponent() -> f64 {
    2.0
}

fn default_log_boost() -> f64 {
    0.25
}

fn default_base_count() -> usize {
    30
}

fn default_max_count() -> usize {
    3000
}

fn default_max_cap() -> usize {
    3000
}

fn default_min_rate() -> f64 {
    10.0
}

fn default_max_rate() -> f64 {
    500.0
}

impl Default for SpawnCurveConfig {
    fn default() -> Self {
        Self {
            base: default_base(),
            exponent: default_exponent(),
            log_boost: default_log_boost(),
            base_count: default_base_count(),
            max_count: default_max_count(),
            max_cap: default_max_cap(),
            min_rate: default_min_rate(),
            max_rate: default_max_rate(),
        }
    }
}

/// Keeps `base_count + span * scale` finite for absurd drivers
const SCALE_CEILING: f64 = 1e6;

/// Controller output for one tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SpawnPlan {
    pub target_population: usize,
    pub spawn_rate: f64,
    pub spawn_interval_ms: f64,
    /// Intensity used to weight newly spawned particles
    pub scale: f64,
}

/// Maps the smoothed driver value to a population target and spawn cadence.
///
/// Monotone non-decreasing in the driver; population never exceeds
/// `max_cap` and the spawn rate never exceeds `max_rate`.
#[derive(Debug, Clone)]
pub struct SpawnRateController {
    base: f64,
    exponent: f64,
    log_boost: f64,
    base_count: usize,
    max_count: usize,
    max_cap: usize,
    min_rate: f64,
    max_rate: f64,
}

impl SpawnRateController {
    pub fn new(config: &SpawnCurveConfig) -> Self {
        let positive = |v: f64, fallback: f64| if v.is_finite() && v > 0.0 { v } else { fallback };

        let min_rate = positive(config.min_rate, default_min_rate());
        Self {
            base: positive(config.base, default_base()),
            exponent: positive(config.exponent, default_exponent()),
            log_boost: if config.log_boost.is_finite() {
                config.log_boost.max(0.0)
            } else {
                0.0
            },
            base_count: config.base_count.min(config.max_cap),
            max_count: config.max_count.max(config.base_count),
            max_cap: config.max_cap,
            min_rate,
            max_rate: positive(config.max_rate, default_max_rate()).max(min_rate),
        }
    }

    pub fn max_cap(&self) -> usize {
        self.max_cap
    }

    /// Intensity in [0, SCALE_CEILING] for a driver value
    pub fn scale(&self, smoothed: f64) -> f64 {
        let v = if smoothed.is_finite() {
            smoothed.max(0.0)
        } else {
            0.0
        };
        let ratio = v / self.base;
        let scale = ratio.powf(self.exponent) + self.log_boost * ratio.ln_1p();
        if scale.is_finite() {
            scale.min(SCALE_CEILING)
        } else {
            SCALE_CEILING
        }
    }

    pub fn compute(&self, smoothed: f64) -> SpawnPlan {
        let scale = self.scale(smoothed);

        let span = (self.max_count - self.base_count) as f64;
        let population = (self.base_count as f64 + span * scale).min(self.max_cap as f64);
        let target_population = population.floor() as usize;

        let spawn_rate = (self.min_rate + (self.max_rate - self.min_rate) * scale).min(self.max_rate);

        SpawnPlan {
            target_population,
            spawn_rate,
            spawn_interval_ms: 1000.0 / spawn_rate,
            scale,
        }
    }
}
