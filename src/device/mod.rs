// Device model shared by the feed, the diff engine and the presentation views

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeSet;
use std::fmt;


/// Stable identity of a monitored device.
///
/// Assigned once when a device is first seen and never recomputed from its
/// field values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityKey(u64);

impl EntityKey {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "dev-{}", self.0)
    }
}

/// Observable fields compared between snapshots
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceField {
    Power,
    Mode,
    FanSpeed,
    AirQuality,
    AirQualityValue,
    FilterLife,
}

impl DeviceField {
    pub const ALL: [DeviceField; 6] = [
        DeviceField::Power,
        DeviceField::Mode,
        DeviceField::FanSpeed,
        DeviceField::AirQuality,
        DeviceField::AirQualityValue,
        DeviceField::FilterLife,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DeviceField::Power => "power",
            DeviceField::Mode => "mode",
            DeviceField::FanSpeed => "fan_speed",
            DeviceField::AirQuality => "air_quality",
            DeviceField::AirQualityValue => "air_quality_value",
            DeviceField::FilterLife => "filter_life",
        }
    }
}

impl fmt::Display for DeviceField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered set of changed or highlighted fields
pub type FieldSet = BTreeSet<DeviceField>;

/// One device reading as delivered by the telemetry feed.
///
/// Every field is optional on the wire. Missing or mistyped values decode to
/// their default instead of rejecting the whole snapshot.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceReading {
    #[serde(default, deserialize_with = "lenient_or_default")]
    pub name: String,

    #[serde(default, deserialize_with = "lenient")]
    pub model: Option<String>,

    #[serde(default, deserialize_with = "lenient_or_default")]
    pub is_on: bool,

    #[serde(default, deserialize_with = "lenient")]
    pub mode: Option<String>,

    #[serde(default, deserialize_with = "lenient")]
    pub fan_speed: Option<u8>,

    /// Discrete air quality category (1 = excellent .. 4 = poor)
    #[serde(default, deserialize_with = "lenient")]
    pub air_quality: Option<u8>,

    /// PM2.5 concentration
    #[serde(default, deserialize_with = "lenient")]
    pub air_quality_value: Option<f64>,

    /// Remaining filter life in percent
    #[serde(default, deserialize_with = "lenient")]
    pub filter_life: Option<u8>,
}

impl DeviceReading {
    /// Fields whose value differs between `self` (previous) and `next`
    pub fn changed_fields(&self, next: &DeviceReading) -> FieldSet {
        let mut changed = FieldSet::new();
        if self.is_on != next.is_on {
            changed.insert(DeviceField::Power);
        }
        if self.mode != next.mode {
            changed.insert(DeviceField::Mode);
        }
        if self.fan_speed != next.fan_speed {
            changed.insert(DeviceField::FanSpeed);
        }
        if self.air_quality != next.air_quality {
            changed.insert(DeviceField::AirQuality);
        }
        if self.air_quality_value != next.air_quality_value {
            changed.insert(DeviceField::AirQualityValue);
        }
        if self.filter_life != next.filter_life {
            changed.insert(DeviceField::FilterLife);
        }
        changed
    }

    /// PM2.5 value with absent or non-finite readings treated as 0
    pub fn concentration(&self) -> f64 {
        match self.air_quality_value {
            Some(v) if v.is_finite() && v > 0.0 => v,
            _ => 0.0,
        }
    }
}

/// Full replace-state message: the ordered device collection
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Snapshot {
    pub devices: Vec<DeviceReading>,
}

impl Snapshot {
    pub fn new(devices: Vec<DeviceReading>) -> Self {
        Self { devices }
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Max concentration across devices, floored at 1
    pub fn driver_value(&self) -> f64 {
        self.devices
            .iter()
            .map(DeviceReading::concentration)
            .fold(1.0, f64::max)
    }
}

/// Accepts either a bare array or `{ "devices": [...] }`
impl<'de> Deserialize<'de> for Snapshot {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Wire {
            List(Vec<DeviceReading>),
            Wrapped { devices: Vec<DeviceReading> },
        }

        Ok(match Wire::deserialize(deserializer)? {
            Wire::List(devices) | Wire::Wrapped { devices } => Snapshot { devices },
        })
    }
}

/// Device with its stable identity, as held in the retained snapshot
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Device {
    pub key: EntityKey,
    #[serde(flatten)]
    pub reading: DeviceReading,
}

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

fn lenient_or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    Ok(lenient(deserializer)?.unwrap_or_default())
}
