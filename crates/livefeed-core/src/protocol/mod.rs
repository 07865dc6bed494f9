//! Wire payload protocols
//!
//! A protocol is the small part of a live source that differs between
//! robot runtimes: the host feed name, how a payload decodes, how the clock
//! baseline is picked, and which log operation records the values. The
//! lifecycle (status, reconnects, identity filtering) is shared and lives in
//! [`crate::source::LiveSource`].

mod vexide;
mod xyv;

pub use vexide::{VexideProtocol, VexideUpdate, VEXIDE_FEED};
pub use xyv::{XyvProtocol, XyvUpdate, XYV_FEED};

use crate::error::Result;
use crate::log::TelemetryLog;

/// Decode and record strategy for one payload schema
pub trait Protocol: Send + 'static {
    /// Decoded form of one payload
    type Update;

    /// Host feed name; intents are `{feed}-start` / `{feed}-stop`
    fn feed(&self) -> &'static str;

    fn decode(&self, payload: &str) -> Result<Self::Update>;

    /// Zero time for a new epoch, given the first successful message.
    ///
    /// `update` is `None` when that message failed to decode. Returning
    /// `None` leaves the baseline unset so the next message tries again.
    fn baseline(&self, update: Option<&Self::Update>, received_at: f64) -> Option<f64>;

    /// Insert every value of `update` into `log` at `timestamp`
    fn record(&self, update: &Self::Update, log: &mut TelemetryLog, timestamp: f64);
}
