//! # Handshake
//!
//! Puts the vehicle into command mode before any other traffic.
//!
//! `command` is sent and the bridge waits for a datagram reading exactly
//! `ok`. Each attempt waits five times longer than the previous one
//! ([`HANDSHAKE_SCHEDULE`]). A reset from the peer aborts at once: that is an
//! active refusal, not packet loss.

use std::time::Duration;

use tokio::time::timeout;
use tracing::{debug, info, warn};

use super::state::ConnectionState;
use super::transport::{is_reset, Transport};
use crate::command::encoder::encode_command;
use crate::command::protocol::{Command, HANDSHAKE_ACK, HANDSHAKE_SCHEDULE, MAX_DATAGRAM_SIZE};
use crate::error::{BridgeError, Result};

/// Enter command mode using the standard schedule
///
/// # Returns
///
/// * `Result<usize>` - Number of attempts it took
///
/// # Errors
///
/// - `ConnectionRefused`: the peer reset the connection
/// - `HandshakeTimeout`: five attempts went unanswered
pub async fn handshake(transport: &dyn Transport) -> Result<usize> {
    handshake_with_schedule(transport, &HANDSHAKE_SCHEDULE).await
}

/// Enter command mode, waiting `schedule[i]` for the reply to attempt `i`
pub(crate) async fn handshake_with_schedule(
    transport: &dyn Transport,
    schedule: &[Duration],
) -> Result<usize> {
    let request = encode_command(&Command::EnterCommandMode);
    let mut state = ConnectionState::Disconnected;
    let mut buf = vec![0u8; MAX_DATAGRAM_SIZE];

    for (index, &wait) in schedule.iter().enumerate() {
        let attempt = index + 1;
        state.advance(ConnectionState::Handshaking {
            attempt,
            timeout_ms: wait.as_millis() as u64,
        });

        if let Err(e) = transport.send(&request.payload).await {
            // Lost sends look like silence to the vehicle; keep to the schedule.
            warn!("Handshake {}: failed to send: {}", state, e);
        }

        match timeout(wait, transport.recv(&mut buf)).await {
            Ok(Ok(n)) if &buf[..n] == HANDSHAKE_ACK => {
                state.advance(ConnectionState::Connected);
                info!("Vehicle entered command mode after {} attempt(s)", attempt);
                return Ok(attempt);
            }
            Ok(Ok(n)) => {
                debug!(
                    "Handshake {}: unexpected reply {:?}",
                    state,
                    String::from_utf8_lossy(&buf[..n])
                );
            }
            Ok(Err(e)) if is_reset(&e) => {
                warn!("Handshake {}: connection refused ({})", state, e);
                state.advance(ConnectionState::Closed);
                return Err(BridgeError::ConnectionRefused);
            }
            Ok(Err(e)) => {
                debug!("Handshake {}: receive error: {}", state, e);
            }
            Err(_) => {
                debug!("Handshake {}: no reply", state);
            }
        }
    }

    state.advance(ConnectionState::Closed);
    warn!("Could not get a response from the vehicle");
    Err(BridgeError::HandshakeTimeout {
        attempts: schedule.len(),
    })
}
