use serde::{Deserialize, Serialize};

/// Signal smoother configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmootherConfig {
    /// Fraction of the remaining distance covered per tick, in (0, 1)
    #[serde(default = "default_rate")]
    pub rate: f64,
    /// Starting value before any driver has been seen
    #[serde(default)]
    pub initial: f64,
}

fn default_rate() -> f64 {
    0.02
}

impl Default for SmootherConfig {
    fn default() -> Self {
        Self {
            rate: default_rate(),
            initial: 0.0,
        }
    }
}

const MIN_RATE: f64 = 1e-6;
const MAX_RATE: f64 = 0.999;

/// Exponential low-pass filter on the driver value
#[derive(Debug, Clone)]
pub struct SignalSmoother {
    value: f64,
    rate: f64,
}

impl SignalSmoother {
    pub fn new(config: &SmootherConfig) -> Self {
        let rate = if config.rate.is_finite() {
            config.rate.clamp(MIN_RATE, MAX_RATE)
        } else {
            default_rate()
        };
        let value = if config.initial.is_finite() {
            config.initial
        } else {
            0.0
        };
        Self { value, rate }
    }

    /// Move one step toward `target` and return the new smoothed value.
    ///
    /// The result always lies between the previous value and `target`.
    /// A non-finite target leaves the value unchanged.
    pub fn advance(&mut self, target: f64) -> f64 {
        if !target.is_finite() {
            return self.value;
        }
        let next = self.value + (target - self.value) * self.rate;
        self.value = if target >= self.value {
            next.min(target)
        } else {
            next.max(target)
        };
        self.value
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn smoother(initial: f64) -> SignalSmoother {
        SignalSmoother::new(&SmootherConfig {
            rate: 0.02,
            initial,
        })
    }

    #[test]
    fn test_first_step_is_fraction_of_gap() {
        let mut s = smoother(0.0);
        let v = s.advance(100.0);
        assert!((v - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_converges_without_overshoot_from_below() {
        let mut s = smoother(0.0);
        let target = 73.0;
        let mut ticks = 0;
        while (target - s.value()).abs() > 0.01 {
            let v = s.advance(target);
            assert!(v <= target);
            ticks += 1;
            assert!(ticks < 1000, "did not converge");
        }
    }

    #[test]
    fn test_converges_without_overshoot_from_above() {
        let mut s = smoother(500.0);
        for _ in 0..1000 {
            let v = s.advance(1.0);
            assert!(v >= 1.0);
        }
        assert!((s.value() - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_non_finite_target_is_ignored() {
        let mut s = smoother(10.0);
        assert_eq!(s.advance(f64::NAN), 10.0);
        assert_eq!(s.advance(f64::INFINITY), 10.0);
    }

    #[test]
    fn test_rate_is_clamped_into_open_interval() {
        let s = SignalSmoother::new(&SmootherConfig {
            rate: 5.0,
            initial: 0.0,
        });
        assert!(s.rate() < 1.0);
        let s = SignalSmoother::new(&SmootherConfig {
            rate: -1.0,
            initial: 0.0,
        });
        assert!(s.rate() > 0.0);
    }
}
