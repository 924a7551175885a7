//! # Tello Bridge
//!
//! Fly a small UDP-controlled quadcopter with a gamepad.
//!
//! This application bridges gamepad inputs to the vehicle's ASCII command
//! interface over Wi-Fi.

use anyhow::{Context, Result};
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use tello_bridge::bridge::{Bridge, BridgeSettings};
use tello_bridge::command::protocol::Command;
use tello_bridge::config::Config;
use tello_bridge::controller;
use tello_bridge::controller::translator::CommandTranslator;
use tello_bridge::link::{Console, Session, UdpTransport};

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(name = "tello-bridge", version, about = "Fly a Tello-style UDP drone with a gamepad")]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Vehicle endpoint, overrides the configuration
    #[arg(long, value_name = "IP:PORT")]
    remote: Option<SocketAddr>,

    /// Local UDP port, overrides the configuration
    #[arg(long, value_name = "PORT")]
    local_port: Option<u16>,
}

impl Args {
    /// Load the configuration file (or defaults) and apply overrides
    fn load_config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
            None => Config::default(),
        };

        if let Some(remote) = self.remote {
            config.connection.remote_host = remote.ip().to_string();
            config.connection.remote_port = remote.port();
        }
        if let Some(port) = self.local_port {
            config.connection.local_port = port;
        }

        config.validate().context("Invalid configuration")?;
        Ok(config)
    }
}

/// Main entry point for Tello Bridge
///
/// # Control Flow
///
/// 1. **Initialization**
///    - Set up logging with a non-blocking stderr writer
///    - Load configuration and apply command-line overrides
///    - Open the first gamepad (`gilrs`, then evdev)
///
/// 2. **Connection**
///    - Bind the local UDP port and handshake with the vehicle
///    - Start the receiver task printing status lines
///    - Send the configured cruise speed, if any
///
/// 3. **Main Loop**
///    - Poll the gamepad, translate and send commands every tick
///    - Re-detect a lost gamepad; run the failsafe if it stays gone
///    - Handle Ctrl+C by landing
///
/// 4. **Shutdown**
///    - Stop the receiver task, wait for it, release the socket
///
/// # Errors
///
/// Returns error (exit status 1) if:
/// - No gamepad is found
/// - The vehicle does not answer the handshake
/// - The gamepad was lost for good
/// - The receiver task failed
#[tokio::main]
async fn main() -> Result<()> {
    // Diagnostics go to stderr; stdout is the operator console
    let (writer, _guard) = tracing_appender::non_blocking(std::io::stderr());
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(writer)
        .init();

    info!("Tello Bridge v{} starting...", env!("CARGO_PKG_VERSION"));

    let args = Args::parse();
    let config = args.load_config()?;

    let source = controller::open_input(config.controller.trigger_threshold)
        .context("Could not find any input device. Connect a gamepad and try again.")?;
    info!("Input device: {}", source.name());

    let remote = config.remote_addr()?;
    let transport = UdpTransport::connect(config.local_addr(), remote)
        .await
        .context("Failed to open the UDP socket")?;

    let session = Session::establish(Arc::new(transport), Console::stdout().shared())
        .await
        .context("Could not connect to the vehicle. Make sure the correct Wi-Fi is selected.")?;
    info!("Connected to {}", remote);

    if let Some(speed) = config.vehicle.speed {
        session.sender().send(&Command::Speed(speed)).await;
    }

    let translator = CommandTranslator::with_config(config.axis_calibration(), config.button_map());
    let mut bridge = Bridge::new(
        source,
        translator,
        session.sender().clone(),
        BridgeSettings::from_config(&config),
    );

    info!("Press Ctrl+C to land and exit");
    let outcome = bridge.run().await;
    // Release the bridge's handle on the socket before teardown
    drop(bridge);

    let closed = session.close().await;
    if let Err(e) = &closed {
        warn!("Receiver ended with an error: {}", e);
    }

    outcome.context("Flight ended by the failsafe")?;
    closed.context("Lost the connection to the vehicle")?;

    info!("Tello Bridge stopped");
    Ok(())
}
