//! Tokio driver for live sources
//!
//! A source is a synchronous state machine; something has to feed it
//! messages and wake it when its reconnect timer is due. [`spawn`] moves the
//! source onto its own task, so consumer commands, host messages and timer
//! expiry are handled one at a time and every callback runs on that task.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};

use crate::error::{LiveError, Result};
use crate::identity::CorrelationId;
use crate::message::InboundMessage;
use crate::source::{LiveDataSource, OutputCallback};
use crate::status::StatusCallback;

/// Work item for a driven source
pub enum SourceCommand {
    Connect {
        address: String,
        on_status: StatusCallback,
        on_output: OutputCallback,
    },
    Stop,
    Message(InboundMessage),
}

/// Clonable handle to a source running on a driver task
#[derive(Debug, Clone)]
pub struct SourceHandle {
    id: CorrelationId,
    tx: mpsc::UnboundedSender<SourceCommand>,
}

impl SourceHandle {
    /// Identity of the driven source
    pub fn correlation_id(&self) -> CorrelationId {
        self.id
    }

    pub fn connect(
        &self,
        address: impl Into<String>,
        on_status: StatusCallback,
        on_output: OutputCallback,
    ) -> Result<()> {
        self.send(SourceCommand::Connect {
            address: address.into(),
            on_status,
            on_output,
        })
    }

    /// Stop the source. The driver task exits after processing this.
    pub fn stop(&self) -> Result<()> {
        self.send(SourceCommand::Stop)
    }

    /// Hand a host message to the source
    pub fn deliver(&self, message: InboundMessage) -> Result<()> {
        self.send(SourceCommand::Message(message))
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    fn send(&self, command: SourceCommand) -> Result<()> {
        self.tx.send(command).map_err(|_| LiveError::SourceClosed)
    }
}

/// Run `source` on a new task.
///
/// The task ends after a stop command or once every handle is dropped, and
/// yields the source back so its final state can be inspected.
pub fn spawn<S>(source: S) -> (SourceHandle, JoinHandle<S>)
where
    S: LiveDataSource + 'static,
{
    let (tx, rx) = mpsc::unbounded_channel();
    let handle = SourceHandle {
        id: source.correlation_id(),
        tx,
    };
    let task = tokio::spawn(run(source, rx));
    (handle, task)
}

/// Drive `source` until stopped or until `commands` closes
pub async fn run<S>(mut source: S, mut commands: mpsc::UnboundedReceiver<SourceCommand>) -> S
where
    S: LiveDataSource,
{
    loop {
        let deadline = source.reconnect_deadline();

        tokio::select! {
            command = commands.recv() => {
                let Some(command) = command else {
                    tracing::debug!(source = %source.correlation_id(), "All handles dropped");
                    break;
                };
                match command {
                    SourceCommand::Connect { address, on_status, on_output } => {
                        source.connect(&address, on_status, on_output);
                    }
                    SourceCommand::Stop => {
                        source.stop();
                        break;
                    }
                    SourceCommand::Message(message) => source.handle_main_message(&message),
                }
            }
            _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                source.poll_reconnect(Instant::now());
            }
        }
    }

    source
}
