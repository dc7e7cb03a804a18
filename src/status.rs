use serde::{Deserialize, Serialize};

/// Coarse system status derived from the driver value
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AirStatus {
    Nominal,
    Moderate,
    Caution,
    Alert,
}

/// Lower bounds (exclusive) of the three upper status bands, in PM2.5
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusThresholds {
    #[serde(default = "default_moderate")]
    pub moderate: f64,
    #[serde(default = "default_caution")]
    pub caution: f64,
    #[serde(default = "default_alert")]
    pub alert: f64,
}

fn default_moderate() -> f64 {
    20.0
}

fn default_caution() -> f64 {
    50.0
}

fn default_alert() -> f64 {
    85.0
}

impl Default for StatusThresholds {
    fn default() -> Self {
        Self {
            moderate: default_moderate(),
            caution: default_caution(),
            alert: default_alert(),
        }
    }
}

impl StatusThresholds {
    pub fn classify(&self, driver: f64) -> AirStatus {
        if !driver.is_finite() {
            return AirStatus::Nominal;
        }
        if driver > self.alert {
            AirStatus::Alert
        } else if driver > self.caution {
            AirStatus::Caution
        } else if driver > self.moderate {
            AirStatus::Moderate
        } else {
            AirStatus::Nominal
        }
    }
}
