//! Server-timestamped protocol
//!
//! Payloads carry the robot's own elapsed time next to the values:
//!
//! ```json
//! {"data": {"temp": 42, "pose": [1.0, 2.0, 0.5]}, "now_sec": 10.0}
//! ```
//!
//! The baseline aligns robot time with local time once per epoch, so a
//! robot that booted ten seconds before the first packet starts the session
//! at `t = 10`.

use serde::Deserialize;
use serde_json::{Map, Value};

use super::Protocol;
use crate::error::{LiveError, Result};
use crate::log::TelemetryLog;

/// Host feed name for this protocol
pub const XYV_FEED: &str = "live-vex-v5";

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct XyvUpdate {
    pub data: Map<String, Value>,
    /// Robot elapsed time in seconds
    pub now_sec: f64,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct XyvProtocol;

impl Protocol for XyvProtocol {
    type Update = XyvUpdate;

    fn feed(&self) -> &'static str {
        XYV_FEED
    }

    fn decode(&self, payload: &str) -> Result<XyvUpdate> {
        serde_json::from_str(payload).map_err(|e| LiveError::Decode(e.to_string()))
    }

    fn baseline(&self, update: Option<&XyvUpdate>, received_at: f64) -> Option<f64> {
        update.map(|u| received_at - u.now_sec)
    }

    fn record(&self, update: &XyvUpdate, log: &mut TelemetryLog, timestamp: f64) {
        for (key, value) in &update.data {
            log.put_value(key, timestamp, value);
        }
    }
}
