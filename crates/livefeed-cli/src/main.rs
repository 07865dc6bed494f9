//! livefeed CLI
//!
//! Streams live robot telemetry to the terminal. The binary plays the host
//! process: it owns the TCP link to the robot's telemetry bridge, while a
//! `livefeed-core` live source handles status, reconnects and timestamps.

use clap::Parser;
use livefeed_core::{
    spawn, ChannelMessenger, ConfigProvider, ConnectionStatus, LiveSource, Protocol,
    TelemetryLog, TimeSupplier, VexideProtocol, XyvProtocol,
};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

mod host;
mod output;
mod settings;

use host::Host;
use output::{FeedPrinter, OutputFormat};
use settings::{CliConfig, Overrides};

/// livefeed - live telemetry from a competition robot
#[derive(Parser, Debug)]
#[command(name = "livefeed")]
#[command(version, about, long_about = None)]
struct Args {
    /// Payload protocol spoken by the robot
    #[arg(short, long, value_enum, default_value = "xyv")]
    protocol: ProtocolKind,

    /// Telemetry bridge address (overrides preferences)
    #[arg(short, long)]
    address: Option<String>,

    /// Telemetry bridge port (overrides preferences)
    #[arg(long)]
    port: Option<u16>,

    /// Preferences file (JSON)
    #[arg(short, long, env = "LIVEFEED_CONFIG")]
    config: Option<PathBuf>,

    /// Output format: text or json
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Delay before reconnecting after the link drops (milliseconds)
    #[arg(long)]
    reconnect_delay_ms: Option<u64>,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum ProtocolKind {
    /// Server-timestamped (`data` + `now_sec`)
    Xyv,
    /// Locally-timestamped (`updates`)
    Vexide,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = CliConfig::new(
        args.config.clone(),
        Overrides {
            address: args.address.clone(),
            port: args.port,
            reconnect_delay_ms: args.reconnect_delay_ms,
        },
    );
    if let Some(file) = config.file() {
        tracing::info!("Using preferences from {}", file.path().display());
    }

    let result = match args.protocol {
        ProtocolKind::Xyv => run_feed(XyvProtocol, config, args.format).await,
        ProtocolKind::Vexide => run_feed(VexideProtocol, config, args.format).await,
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run_feed<P: Protocol>(
    protocol: P,
    config: CliConfig,
    format: OutputFormat,
) -> Result<ExitCode, String> {
    let config: Arc<dyn ConfigProvider> = Arc::new(config);
    let prefs = config.preferences().unwrap_or_default();

    let (messenger, intents) = ChannelMessenger::create();
    let source = LiveSource::new(protocol, Arc::new(messenger), config.clone())
        .with_reconnect_delay(prefs.reconnect_delay());
    let (handle, task) = spawn(source);
    let host_task = tokio::spawn(Host::new(config, intents, handle.clone()).run());

    let (status_tx, mut status_rx) = mpsc::unbounded_channel();
    let mut printer = FeedPrinter::new(format);

    tracing::info!("Starting livefeed for {}", prefs.socket_address());
    handle
        .connect(
            prefs.socket_address(),
            Box::new(move |status: ConnectionStatus| {
                let _ = status_tx.send(status);
            }),
            Box::new(move |log: &TelemetryLog, time: &TimeSupplier| {
                tracing::debug!("Session time {:.3}s", time.now());
                for line in printer.render(log, time) {
                    println!("{line}");
                }
            }),
        )
        .map_err(|e| format!("Failed to start source: {e}"))?;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let mut exit_code = ExitCode::SUCCESS;
    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                tracing::info!("Interrupted, stopping");
                break;
            }
            status = status_rx.recv() => match status {
                Some(ConnectionStatus::Error) => {
                    tracing::error!("No usable preferences, giving up");
                    exit_code = ExitCode::FAILURE;
                    break;
                }
                Some(status) => tracing::info!("Status: {}", status),
                None => break,
            },
        }
    }

    // The driver may already be gone if it was stopped elsewhere
    let _ = handle.stop();
    drop(handle);
    task.await.map_err(|e| format!("Source task failed: {e}"))?;
    host_task
        .await
        .map_err(|e| format!("Host task failed: {e}"))?;

    Ok(exit_code)
}
