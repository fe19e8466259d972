use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::terminator::expand_symbolic;

/// Per-request device settings, carried through the broker at
/// `S#device#comm#settings` and applied to exactly one round-trip.
///
/// Every field is optional: an absent field means "use the endpoint's
/// configured default", matching the source's unknown-keys-ignored,
/// missing-keys-default behavior (see the Design Note on unknown settings
/// keys).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceSettings {
    #[serde(rename = "ReplyTimeout", default, skip_serializing_if = "Option::is_none")]
    pub reply_timeout_ms: Option<u64>,

    #[serde(rename = "ReadTimeout", default, skip_serializing_if = "Option::is_none")]
    pub read_timeout_ms: Option<u64>,

    #[serde(rename = "MaxInput", default, skip_serializing_if = "Option::is_none")]
    pub max_input: Option<i64>,

    #[serde(rename = "Terminator", default, skip_serializing_if = "Option::is_none")]
    pub terminator: Option<String>,
}

impl DeviceSettings {
    /// Settings attached to no request: every field falls back to the
    /// endpoint's configured default.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse a settings frame from its wire form (a JSON object, or an empty
    /// byte string for "no override"). Malformed JSON is reported to the
    /// caller rather than silently treated as empty, so a bad `CFG` frame
    /// surfaces instead of silently applying no override.
    pub fn from_json_bytes(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        if bytes.is_empty() {
            return Ok(Self::empty());
        }
        serde_json::from_slice(bytes)
    }

    pub fn to_json_bytes(&self) -> Vec<u8> {
        serde_json::to_vec(self).unwrap_or_default()
    }

    pub fn reply_timeout(&self) -> Option<Duration> {
        self.reply_timeout_ms.map(Duration::from_millis)
    }

    pub fn read_timeout(&self) -> Option<Duration> {
        self.read_timeout_ms.map(Duration::from_millis)
    }

    /// The terminator as raw bytes, with symbolic tokens (`\LF\`, `\CR\`, …)
    /// expanded the same way the endpoint's configured default is.
    pub fn terminator_bytes(&self) -> Option<Vec<u8>> {
        self.terminator.as_deref().map(expand_symbolic)
    }
}
