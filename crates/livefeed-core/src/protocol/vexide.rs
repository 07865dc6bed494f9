//! Locally-timestamped protocol
//!
//! Payloads only carry values, keyed under `updates`:
//!
//! ```json
//! {"updates": {"drive": {"left": 1.5, "right": 1.4}, "battery": 12.6}}
//! ```
//!
//! With no robot clock on the wire, the session starts at the local receipt
//! time of the first successful message.

use serde::Deserialize;
use serde_json::{Map, Value};

use super::Protocol;
use crate::error::{LiveError, Result};
use crate::log::TelemetryLog;

/// Host feed name for this protocol
pub const VEXIDE_FEED: &str = "live-cargo-v5";

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct VexideUpdate {
    pub updates: Map<String, Value>,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct VexideProtocol;

impl Protocol for VexideProtocol {
    type Update = VexideUpdate;

    fn feed(&self) -> &'static str {
        VEXIDE_FEED
    }

    fn decode(&self, payload: &str) -> Result<VexideUpdate> {
        serde_json::from_str(payload).map_err(|e| LiveError::Decode(e.to_string()))
    }

    // Set even when the first message is undecodable
    fn baseline(&self, _update: Option<&VexideUpdate>, received_at: f64) -> Option<f64> {
        Some(received_at)
    }

    fn record(&self, update: &VexideUpdate, log: &mut TelemetryLog, timestamp: f64) {
        for (key, value) in &update.updates {
            log.put_json(key, timestamp, value);
        }
    }
}
