//! Connection status state machine
//!
//! ```text
//!  Waiting ──connect──▶ Connecting ──success──▶ Active
//!                          ▲  │                   │
//!                          │  └──no prefs──▶ Error │
//!                          └──────failure──────────┘
//!
//!  any ──stop──▶ Stopped (absorbing)
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Status of a live source
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    /// Created but `connect` not called yet
    #[default]
    Waiting,
    /// A start intent is outstanding (first attempt or reconnect)
    Connecting,
    /// Data is arriving
    Active,
    /// No usable configuration; no automatic retry
    Error,
    /// Terminal. Nothing is observable after this.
    Stopped,
}

impl ConnectionStatus {
    pub fn is_terminal(self) -> bool {
        self == ConnectionStatus::Stopped
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionStatus::Waiting => write!(f, "waiting"),
            ConnectionStatus::Connecting => write!(f, "connecting"),
            ConnectionStatus::Active => write!(f, "active"),
            ConnectionStatus::Error => write!(f, "error"),
            ConnectionStatus::Stopped => write!(f, "stopped"),
        }
    }
}

/// Callback invoked synchronously on every observable status change
pub type StatusCallback = Box<dyn FnMut(ConnectionStatus) + Send>;

/// Current status plus the consumer's status callback
///
/// This is the piece of the engine that guarantees the callback never fires
/// after `Stopped` and never fires for a no-change update.
#[derive(Default)]
pub struct StatusTracker {
    status: ConnectionStatus,
    callback: Option<StatusCallback>,
}

impl StatusTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    pub fn is_stopped(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn set_callback(&mut self, callback: StatusCallback) {
        self.callback = Some(callback);
    }

    /// Move to `status`, notifying the callback.
    ///
    /// Returns `true` if a transition happened.
    pub fn set(&mut self, status: ConnectionStatus) -> bool {
        if self.status.is_terminal() || self.status == status {
            return false;
        }

        tracing::debug!(from = %self.status, to = %status, "Status change");
        self.status = status;
        if let Some(callback) = self.callback.as_mut() {
            callback(status);
        }
        true
    }
}

impl fmt::Debug for StatusTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatusTracker")
            .field("status", &self.status)
            .field("has_callback", &self.callback.is_some())
            .finish()
    }
}
