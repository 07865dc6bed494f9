//! livefeed Core Library
//!
//! Live telemetry sources for robot dashboards. A source asks an external
//! host process to open a feed, turns the payloads the host delivers back
//! into session-relative time-series points, and keeps the feed alive with a
//! fixed-delay reconnect loop. Sockets are the host's business; this crate
//! only reacts to delivered messages and issues start/stop intents.
//!
//! # Modules
//!
//! - [`source`] - The live source engine and its `LiveDataSource` contract
//! - [`protocol`] - Payload schemas (server-timestamped XYV, locally-timestamped vexide)
//! - [`status`] - Connection status state machine
//! - [`driver`] - Tokio task that runs a source and its reconnect timer
//! - [`message`] - Host messages, intents and the messenger capability
//! - [`log`] - In-memory time-series log
//! - [`config`] - Connection preferences and providers
//! - [`clock`] - Injectable wall-clock
//! - [`identity`] - Per-source correlation identity
//! - [`error`] - Error types

pub mod clock;
pub mod config;
pub mod driver;
pub mod error;
pub mod identity;
pub mod log;
pub mod message;
pub mod protocol;
pub mod source;
pub mod status;

// Re-export commonly used types
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ConfigProvider, FileConfig, Preferences, StaticConfig};
pub use driver::{spawn, SourceCommand, SourceHandle};
pub use error::{LiveError, Result};
pub use identity::CorrelationId;
pub use log::{LogValue, Point, Series, TelemetryLog};
pub use message::{ChannelMessenger, HostIntent, HostMessenger, InboundMessage};
pub use protocol::{Protocol, VexideProtocol, XyvProtocol};
pub use source::{
    LiveDataSource, LiveSource, OutputCallback, TimeSupplier, VexideSource, XyvSource,
};
pub use status::{ConnectionStatus, StatusCallback, StatusTracker};
