//! # Sender
//!
//! Serializes every outgoing command.
//!
//! Logged commands take the output lock, print, then take the transmission
//! lock and send while still holding the output lock, so the console shows
//! commands in exactly the order they hit the socket. `rc` commands go out
//! every poll tick and take the transmission lock only.
//!
//! Lock order is always output lock, then transmission lock.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{trace, warn};

use super::console::SharedConsole;
use super::transport::Transport;
use crate::command::encoder::encode_command;
use crate::command::protocol::{Command, CommandMessage, MessageKind};
use crate::error::BridgeError;

/// Fire-and-forget command writer
///
/// Cheap to clone; clones share the socket and both locks.
#[derive(Clone)]
pub struct Sender {
    transport: Arc<dyn Transport>,
    console: SharedConsole,
    transmission: Arc<Mutex<()>>,
}

impl std::fmt::Debug for Sender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sender").finish_non_exhaustive()
    }
}

impl Sender {
    /// Create a sender over `transport`, printing to `console`
    pub fn new(transport: Arc<dyn Transport>, console: SharedConsole) -> Self {
        Self {
            transport,
            console,
            transmission: Arc::new(Mutex::new(())),
        }
    }

    /// Encode and send a command
    ///
    /// Failures are printed and dropped; nothing is retried.
    pub async fn send(&self, command: &Command) {
        let message = encode_command(command);
        self.send_message(&message).await;
    }

    /// Send an already encoded message
    pub async fn send_message(&self, message: &CommandMessage) {
        match message.kind {
            MessageKind::HighFrequency => self.send_quiet(message).await,
            MessageKind::Logged => self.send_logged(message).await,
        }
    }

    async fn send_logged(&self, message: &CommandMessage) {
        let mut console = self.console.lock().await;
        console.print_sent(message.text());

        let result = {
            let _tx = self.transmission.lock().await;
            self.transport.send(&message.payload).await
        };

        if let Err(e) = result {
            let err = BridgeError::Send(e);
            console.print_error(&format!("Failed to send `{}`: {}", message.text(), err));
            warn!("Dropped `{}`: {}", message.text(), err);
        }
    }

    async fn send_quiet(&self, message: &CommandMessage) {
        let result = {
            let _tx = self.transmission.lock().await;
            self.transport.send(&message.payload).await
        };

        match result {
            Ok(_) => trace!("Sent `{}`", message.text()),
            Err(e) => {
                let err = BridgeError::Send(e);
                // Transmission lock is released here; taking the output lock keeps the order.
                self.console
                    .lock()
                    .await
                    .print_error(&format!("Failed to send `{}`: {}", message.text(), err));
                warn!("Dropped `{}`: {}", message.text(), err);
            }
        }
    }

    /// Shared console, for components that print alongside the sender
    pub fn console(&self) -> &SharedConsole {
        &self.console
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::protocol::ControlVector;
    use crate::link::console::mocks::CaptureBuffer;
    use crate::link::transport::mocks::MockTransport;
    use std::io;

    fn setup() -> (Arc<MockTransport>, CaptureBuffer, Sender) {
        let mock = Arc::new(MockTransport::new());
        let buffer = CaptureBuffer::new();
        let sender = Sender::new(mock.clone(), buffer.console());
        (mock, buffer, sender)
    }

    #[tokio::test]
    async fn test_logged_command_is_printed_and_sent() {
        let (mock, buffer, sender) = setup();

        sender.send(&Command::Takeoff).await;

        assert_eq!(mock.sent_texts(), vec!["takeoff"]);
        let lines = buffer.lines();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].ends_with("]: takeoff"));
    }

    #[tokio::test]
    async fn test_rc_is_sent_but_not_printed() {
        let (mock, buffer, sender) = setup();

        sender
            .send(&Command::Rc(ControlVector::new(50, 0, 0, 0)))
            .await;

        assert_eq!(mock.sent_texts(), vec!["rc 50 0 0 0"]);
        assert!(buffer.lines().is_empty());
    }

    #[tokio::test]
    async fn test_send_failure_is_printed_not_propagated() {
        let (mock, buffer, sender) = setup();
        mock.set_send_error(io::ErrorKind::Other);

        sender.send(&Command::Land).await;
        sender.send(&Command::Rc(ControlVector::neutral())).await;

        let lines = buffer.lines();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].ends_with("]: land"));
        assert!(lines[1].contains("Failed to send `land`"));
        assert!(lines[2].contains("Failed to send `rc 0 0 0 0`"));
    }

    #[tokio::test]
    async fn test_rc_does_not_wait_for_console() {
        let (mock, _buffer, sender) = setup();

        // Someone else holds the output lock
        let guard = sender.console().lock().await;
        sender.send(&Command::Rc(ControlVector::neutral())).await;
        drop(guard);

        assert_eq!(mock.sent_texts(), vec!["rc 0 0 0 0"]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_logged_sends_keep_print_order() {
        let (mock, buffer, sender) = setup();

        let mut tasks = Vec::new();
        for i in 0..20u8 {
            let sender = sender.clone();
            tasks.push(tokio::spawn(async move {
                sender.send(&Command::Speed(10 + i)).await;
                sender.send(&Command::Rc(ControlVector::neutral())).await;
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        let printed: Vec<String> = buffer
            .lines()
            .iter()
            .map(|l| l.split("]: ").nth(1).unwrap().to_string())
            .collect();
        let logged_sends: Vec<String> = mock
            .sent_texts()
            .into_iter()
            .filter(|t| !t.starts_with("rc"))
            .collect();

        assert_eq!(printed.len(), 20);
        assert_eq!(printed, logged_sends);
    }
}
