//! # Vehicle Link Module
//!
//! UDP session with the vehicle.
//!
//! This module handles:
//! - Binding the local port and associating it with the vehicle
//! - The `command` / `ok` handshake with bounded retries
//! - The background receiver task printing status lines
//! - Serialized, fire-and-forget command sending
//! - Orderly teardown (stop receiver, wait for it, then release the socket)

pub mod console;
pub mod handshake;
pub mod receiver;
pub mod sender;
pub mod state;
pub mod transport;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{error, info};

pub use console::{Console, SharedConsole};
pub use sender::Sender;
pub use state::ConnectionState;
pub use transport::{Transport, UdpTransport};

use crate::command::protocol::HANDSHAKE_SCHEDULE;
use crate::error::{BridgeError, Result};

/// Established command-mode session
///
/// Owns the socket, the receiver task and the shutdown signal. The only way
/// to end it cleanly is [`Session::close`]; dropping it also stops the
/// receiver because the shutdown sender goes away with it.
pub struct Session {
    transport: Arc<dyn Transport>,
    sender: Sender,
    receiver: JoinHandle<Result<()>>,
    shutdown: oneshot::Sender<()>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Handshake over `transport` and start the receiver
    ///
    /// # Errors
    ///
    /// Returns `ConnectionRefused` or `HandshakeTimeout`. The transport is
    /// dropped before returning and no task has been spawned.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use std::sync::Arc;
    /// use tello_bridge::link::{Console, Session, UdpTransport};
    ///
    /// #[tokio::main]
    /// async fn main() -> anyhow::Result<()> {
    ///     let transport = UdpTransport::connect(
    ///         "0.0.0.0:9000".parse()?,
    ///         "192.168.10.1:8889".parse()?,
    ///     )
    ///     .await?;
    ///     let session = Session::establish(Arc::new(transport), Console::stdout().shared()).await?;
    ///     session.close().await?;
    ///     Ok(())
    /// }
    /// ```
    pub async fn establish(transport: Arc<dyn Transport>, console: SharedConsole) -> Result<Self> {
        Self::establish_with_schedule(transport, console, &HANDSHAKE_SCHEDULE).await
    }

    /// Like [`Session::establish`] with a custom handshake schedule
    pub(crate) async fn establish_with_schedule(
        transport: Arc<dyn Transport>,
        console: SharedConsole,
        schedule: &[Duration],
    ) -> Result<Self> {
        handshake::handshake_with_schedule(transport.as_ref(), schedule).await?;

        let (shutdown, shutdown_rx) = oneshot::channel();
        let receiver = receiver::spawn_receiver(transport.clone(), console.clone(), shutdown_rx);
        let sender = Sender::new(transport.clone(), console);

        Ok(Self {
            transport,
            sender,
            receiver,
            shutdown,
        })
    }

    /// Command writer for this session
    pub fn sender(&self) -> &Sender {
        &self.sender
    }

    /// `Connected` while the receiver runs, `Closed` once it has exited
    ///
    /// A session only exists after a successful handshake, so the receiver
    /// task is the only thing left that can end it.
    pub fn state(&self) -> ConnectionState {
        if self.receiver.is_finished() {
            ConnectionState::Closed
        } else {
            ConnectionState::Connected
        }
    }

    /// Tear the session down
    ///
    /// Signals the receiver, waits for it to exit, then releases the socket.
    ///
    /// # Errors
    ///
    /// Returns the receiver's failure (`Receive`) if it died on a read error,
    /// so the run as a whole is reported as failed.
    pub async fn close(self) -> Result<()> {
        let Session {
            transport,
            sender,
            receiver,
            shutdown,
        } = self;

        // The receiver may already be gone; a failed send is fine then.
        let _ = shutdown.send(());

        let outcome = match receiver.await {
            Ok(result) => result,
            Err(join_error) => {
                error!("Receiver task panicked: {}", join_error);
                Err(BridgeError::Receive(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    join_error.to_string(),
                )))
            }
        };

        // Receiver is gone; nothing else reads from the socket now.
        drop(sender);
        drop(transport);
        info!("Session closed");

        outcome
    }
}
