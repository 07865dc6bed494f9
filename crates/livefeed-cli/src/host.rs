//! Host process side of a live feed
//!
//! The host owns the physical link. It listens for intents from the source,
//! opens a TCP connection on `start`, and forwards every newline-delimited
//! payload back to the source tagged with the identity from the intent. Any
//! way the link ends (refused, EOF, read error) is reported as a single
//! failure message; the source decides whether to retry.

use livefeed_core::{ConfigProvider, CorrelationId, HostIntent, InboundMessage, SourceHandle};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// How long a TCP connect may take before it counts as a failure
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

pub struct Host {
    config: Arc<dyn ConfigProvider>,
    intents: mpsc::UnboundedReceiver<HostIntent>,
    source: SourceHandle,
    link: Option<JoinHandle<()>>,
}

impl Host {
    pub fn new(
        config: Arc<dyn ConfigProvider>,
        intents: mpsc::UnboundedReceiver<HostIntent>,
        source: SourceHandle,
    ) -> Self {
        Self {
            config,
            intents,
            source,
            link: None,
        }
    }

    /// Serve intents until the source side hangs up
    pub async fn run(mut self) {
        while let Some(intent) = self.intents.recv().await {
            tracing::debug!("Host received {}", intent.name());
            match intent {
                HostIntent::Start { correlation_id, .. } => self.start(correlation_id),
                HostIntent::Stop { .. } => self.close_link(),
            }
        }
        self.close_link();
    }

    fn start(&mut self, correlation_id: CorrelationId) {
        self.close_link();

        let Some(prefs) = self.config.preferences() else {
            tracing::warn!("No preferences available, reporting link failure");
            let _ = self.source.deliver(InboundMessage::failure(&correlation_id));
            return;
        };

        let address = prefs.socket_address();
        self.link = Some(tokio::spawn(run_link(
            address,
            correlation_id,
            self.source.clone(),
        )));
    }

    fn close_link(&mut self) {
        if let Some(link) = self.link.take() {
            link.abort();
        }
    }
}

async fn run_link(address: String, correlation_id: CorrelationId, source: SourceHandle) {
    let stream = match tokio::time::timeout(CONNECT_TIMEOUT, TcpStream::connect(&address)).await {
        Ok(Ok(stream)) => stream,
        Ok(Err(e)) => {
            tracing::warn!("Failed to connect to {}: {}", address, e);
            let _ = source.deliver(InboundMessage::failure(&correlation_id));
            return;
        }
        Err(_) => {
            tracing::warn!("Timed out connecting to {}", address);
            let _ = source.deliver(InboundMessage::failure(&correlation_id));
            return;
        }
    };

    tracing::info!("Connected to {}", address);
    let mut lines = BufReader::new(stream).lines();

    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if line.trim().is_empty() {
                    continue;
                }
                if source
                    .deliver(InboundMessage::success(&correlation_id, line))
                    .is_err()
                {
                    break;
                }
            }
            Ok(None) => {
                tracing::info!("Link to {} closed", address);
                let _ = source.deliver(InboundMessage::failure(&correlation_id));
                break;
            }
            Err(e) => {
                tracing::warn!("Error reading from {}: {}", address, e);
                let _ = source.deliver(InboundMessage::failure(&correlation_id));
                break;
            }
        }
    }
}
