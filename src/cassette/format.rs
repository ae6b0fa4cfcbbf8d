//! On-disk cassette layout.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A recorded session of port interactions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cassette {
    /// Human-readable session name.
    pub name: String,
    /// When the recording finished.
    pub recorded_at: DateTime<Utc>,
    /// Git commit the recording was made from.
    pub commit: String,
    /// Interactions in call order.
    #[serde(default)]
    pub interactions: Vec<Interaction>,
}

/// One call through a port, with its input and `Ok`/`Err` output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    /// Position in the recording, starting at 0.
    pub seq: u64,
    /// Port name (e.g., `"image_generator"`).
    pub port: String,
    /// Method name on the port.
    pub method: String,
    /// Serialized request.
    #[serde(default)]
    pub input: serde_json::Value,
    /// `{"Ok": ...}` or `{"Err": "..."}`.
    pub output: serde_json::Value,
}
