//! Correlation identity
//!
//! Every live source gets one opaque token at construction. Start intents
//! carry it to the host, and the host stamps it on every message it sends
//! back, which is how messages for one source are kept away from another.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Process-unique token identifying one live source instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationId(Uuid);

impl CorrelationId {
    /// Generate a fresh random identity (UUID v4)
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Compare against the raw identity string a host put on a message.
    ///
    /// The token is opaque: only the exact string handed out in the start
    /// intent matches.
    pub fn matches(&self, raw: &str) -> bool {
        raw == self.0.to_string()
    }
}

impl Default for CorrelationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
