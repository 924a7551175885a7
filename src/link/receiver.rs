//! # Receiver Task
//!
//! Background task that owns every read from the vehicle socket.
//!
//! The task waits on two signals at once: a datagram arriving, or the
//! session asking it to stop. Received lines are printed under the output
//! lock. A read error ends the task with a failure status which the session
//! reports at teardown; it does not stop the poll loop.

use std::sync::Arc;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use super::console::SharedConsole;
use super::transport::Transport;
use crate::command::protocol::MAX_DATAGRAM_SIZE;
use crate::error::{BridgeError, Result};
use crate::telemetry::TelemetryLine;

/// Start the receiver task
///
/// # Arguments
///
/// * `transport` - Socket shared with the sender
/// * `console` - Output lock target
/// * `shutdown` - Fires (or is dropped) when the session tears down
pub fn spawn_receiver(
    transport: Arc<dyn Transport>,
    console: SharedConsole,
    shutdown: oneshot::Receiver<()>,
) -> JoinHandle<Result<()>> {
    tokio::spawn(run_receiver(transport, console, shutdown))
}

/// Receive loop; returns `Ok` on shutdown and `Err(Receive)` on a read error
pub async fn run_receiver(
    transport: Arc<dyn Transport>,
    console: SharedConsole,
    mut shutdown: oneshot::Receiver<()>,
) -> Result<()> {
    let mut buf = vec![0u8; MAX_DATAGRAM_SIZE];
    let mut lines: u64 = 0;

    loop {
        tokio::select! {
            biased;

            _ = &mut shutdown => {
                info!("Receiver stopping after {} line(s)", lines);
                return Ok(());
            }

            received = transport.recv(&mut buf) => match received {
                Ok(n) => {
                    let line = TelemetryLine::decode(&buf[..n]);
                    debug!("Received {} bytes", n);
                    console.lock().await.print_received(&line);
                    lines += 1;
                }
                Err(e) => {
                    console
                        .lock()
                        .await
                        .print_error(&format!("--> Failed to receive: {}", e));
                    error!("Receiver stopped: {}", e);
                    return Err(BridgeError::Receive(e));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::link::console::mocks::CaptureBuffer;
    use crate::link::transport::mocks::{MockTransport, Reply};
    use std::io;

    #[tokio::test]
    async fn test_prints_lines_then_stops_on_shutdown() {
        let mock = Arc::new(MockTransport::with_replies([
            Reply::Data(b"ok\n".to_vec()),
            Reply::Data(b"87".to_vec()),
        ]));
        let buffer = CaptureBuffer::new();
        let (stop, shutdown) = oneshot::channel();

        let handle = spawn_receiver(mock.clone(), buffer.console(), shutdown);
        while buffer.lines().len() < 2 {
            tokio::task::yield_now().await;
        }
        stop.send(()).unwrap();

        assert!(handle.await.unwrap().is_ok());
        let lines = buffer.lines();
        assert!(lines[0].ends_with("]: --> ok"));
        assert!(lines[1].ends_with("]: --> 87"));
    }

    #[tokio::test]
    async fn test_full_size_datagram_printed_whole() {
        let mut datagram = vec![b'x'; MAX_DATAGRAM_SIZE - 1];
        datagram.push(b'\n');
        let mock = Arc::new(MockTransport::with_replies([Reply::Data(datagram)]));
        let buffer = CaptureBuffer::new();
        let (stop, shutdown) = oneshot::channel();

        let handle = spawn_receiver(mock, buffer.console(), shutdown);
        while buffer.lines().is_empty() {
            tokio::task::yield_now().await;
        }
        stop.send(()).unwrap();
        assert!(handle.await.unwrap().is_ok());

        let lines = buffer.lines();
        assert_eq!(lines.len(), 1);
        let body = lines[0].split("]: --> ").nth(1).unwrap();
        assert_eq!(body.len(), 1517);
        assert!(body.bytes().all(|b| b == b'x'));
    }

    #[tokio::test]
    async fn test_read_error_fails_task() {
        let mock = Arc::new(MockTransport::with_replies([
            Reply::Data(b"ok".to_vec()),
            Reply::Error(io::ErrorKind::ConnectionReset),
        ]));
        let buffer = CaptureBuffer::new();
        let (_stop, shutdown) = oneshot::channel();

        let result = spawn_receiver(mock, buffer.console(), shutdown)
            .await
            .unwrap();

        assert!(matches!(result, Err(BridgeError::Receive(_))));
        let lines = buffer.lines();
        assert_eq!(lines.len(), 2);
        assert!(lines[1].contains("Failed to receive"));
    }

    #[tokio::test]
    async fn test_dropped_shutdown_sender_stops_task() {
        let mock = Arc::new(MockTransport::new());
        let buffer = CaptureBuffer::new();
        let (stop, shutdown) = oneshot::channel::<()>();

        let handle = spawn_receiver(mock, buffer.console(), shutdown);
        drop(stop);

        assert!(handle.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn test_shutdown_wins_over_pending_data() {
        let mock = Arc::new(MockTransport::with_replies([Reply::Data(b"late".to_vec())]));
        let buffer = CaptureBuffer::new();
        let (stop, shutdown) = oneshot::channel();
        stop.send(()).unwrap();

        let result = run_receiver(mock, buffer.console(), shutdown).await;

        assert!(result.is_ok());
        assert!(buffer.lines().is_empty());
    }
}
