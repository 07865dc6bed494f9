//! Library-wide error types
//!
//! A single `thiserror` enum covers every fallible operation in the crate.
//! Note that most lifecycle failures are *not* surfaced as errors: a missing
//! configuration becomes `ConnectionStatus::Error`, a transport failure
//! becomes a reconnect, and an undecodable payload is skipped. Errors here
//! are for callers that talk to the crate directly (config lookup, decoding,
//! the driver handle).

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Library-wide error type
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "message")]
pub enum LiveError {
    /// No usable preferences were available
    #[error("Configuration unavailable")]
    ConfigUnavailable,

    /// Preferences exist but could not be read or parsed
    #[error("Configuration error: {0}")]
    Config(String),

    /// A payload could not be decoded for the active protocol
    #[error("Decode error: {0}")]
    Decode(String),

    /// The driver task behind a handle has exited
    #[error("Live source is closed")]
    SourceClosed,
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, LiveError>;
