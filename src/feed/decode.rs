use crate::device::Snapshot;
use std::fmt;

/// Reasons an inbound payload could not become a snapshot
#[derive(Debug, Clone, PartialEq)]
pub enum FeedError {
    EmptyPayload,
    InvalidJson(String),
    /// Valid JSON, but neither a device array nor `{ "devices": [...] }`
    UnexpectedShape(String),
}

impl fmt::Display for FeedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedError::EmptyPayload => write!(f, "payload is empty"),
            FeedError::InvalidJson(e) => write!(f, "payload is not valid JSON: {}", e),
            FeedError::UnexpectedShape(kind) => {
                write!(f, "expected a device array or devices object, got {}", kind)
            }
        }
    }
}

impl std::error::Error for FeedError {}

/// Decode one published payload into a snapshot.
///
/// Individual device fields are decoded leniently; only the envelope can fail.
pub fn decode_snapshot(payload: &[u8]) -> Result<Snapshot, FeedError> {
    if payload.iter().all(u8::is_ascii_whitespace) {
        return Err(FeedError::EmptyPayload);
    }

    let value: serde_json::Value =
        serde_json::from_slice(payload).map_err(|e| FeedError::InvalidJson(e.to_string()))?;
    let kind = json_kind(&value);

    serde_json::from_value(value).map_err(|_| FeedError::UnexpectedShape(kind.to_string()))
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
