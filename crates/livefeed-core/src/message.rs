//! Host process messaging
//!
//! The host process owns the physical link. Sources talk to it through the
//! [`HostMessenger`] capability (outbound, fire-and-forget intents) and the
//! host hands back [`InboundMessage`]s tagged with the source's identity.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::identity::CorrelationId;

/// A message delivered by the host process
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InboundMessage {
    /// Identity of the source the host is answering
    #[serde(alias = "uuid")]
    pub correlation_id: String,

    /// `false` means the link failed or dropped
    pub success: bool,

    /// Raw payload text (JSON for both known protocols)
    #[serde(default, alias = "string", skip_serializing_if = "Option::is_none")]
    pub payload: Option<String>,
}

impl InboundMessage {
    pub fn success(correlation_id: &CorrelationId, payload: impl Into<String>) -> Self {
        Self {
            correlation_id: correlation_id.to_string(),
            success: true,
            payload: Some(payload.into()),
        }
    }

    pub fn failure(correlation_id: &CorrelationId) -> Self {
        Self {
            correlation_id: correlation_id.to_string(),
            success: false,
            payload: None,
        }
    }
}

/// Command sent from a source to the host process
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostIntent {
    /// Open the feed and tag everything it delivers with `correlation_id`
    Start {
        feed: &'static str,
        correlation_id: CorrelationId,
    },
    /// Close the feed
    Stop { feed: &'static str },
}

impl HostIntent {
    pub fn feed(&self) -> &'static str {
        match self {
            HostIntent::Start { feed, .. } | HostIntent::Stop { feed } => feed,
        }
    }

    /// Wire name, e.g. `live-vex-v5-start`
    pub fn name(&self) -> String {
        match self {
            HostIntent::Start { feed, .. } => format!("{feed}-start"),
            HostIntent::Stop { feed } => format!("{feed}-stop"),
        }
    }
}

#[derive(Serialize)]
struct WireIntent {
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    uuid: Option<String>,
}

impl Serialize for HostIntent {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let uuid = match self {
            HostIntent::Start { correlation_id, .. } => Some(correlation_id.to_string()),
            HostIntent::Stop { .. } => None,
        };
        WireIntent {
            name: self.name(),
            uuid,
        }
        .serialize(serializer)
    }
}

/// Outbound capability to the host process
///
/// Sends are fire-and-forget. A host that has gone away is not an error the
/// source can act on, so implementations log and drop.
pub trait HostMessenger: Send + Sync {
    fn send(&self, intent: HostIntent);
}

/// Messenger that forwards intents over an unbounded channel
#[derive(Debug, Clone)]
pub struct ChannelMessenger {
    tx: mpsc::UnboundedSender<HostIntent>,
}

impl ChannelMessenger {
    pub fn new(tx: mpsc::UnboundedSender<HostIntent>) -> Self {
        Self { tx }
    }

    /// Create a messenger together with the receiver a host should drain
    pub fn create() -> (Self, mpsc::UnboundedReceiver<HostIntent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }
}

impl HostMessenger for ChannelMessenger {
    fn send(&self, intent: HostIntent) {
        let name = intent.name();
        if self.tx.send(intent).is_err() {
            tracing::warn!("Host channel closed, dropping intent {}", name);
        }
    }
}
