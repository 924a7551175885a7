//! # Command Encoder
//!
//! Turns typed [`Command`]s into wire messages.

use bytes::Bytes;

use super::protocol::*;

/// Encode a command into an ASCII datagram
///
/// # Arguments
///
/// * `command` - Command to encode
///
/// # Returns
///
/// * `CommandMessage` - Payload without terminator, tagged with its console treatment
///
/// # Examples
///
/// ```
/// use tello_bridge::command::encoder::encode_command;
/// use tello_bridge::command::protocol::{Command, MessageKind};
///
/// let msg = encode_command(&Command::Land);
/// assert_eq!(&msg.payload[..], b"land");
/// assert_eq!(msg.kind, MessageKind::Logged);
/// ```
pub fn encode_command(command: &Command) -> CommandMessage {
    let text = match command {
        Command::Speed(cm_s) => Command::Speed((*cm_s).clamp(SPEED_MIN, SPEED_MAX)).to_string(),
        other => other.to_string(),
    };
    debug_assert!(text.len() <= MAX_COMMAND_LEN);

    CommandMessage {
        payload: Bytes::from(text),
        kind: message_kind(command),
    }
}

/// Console treatment for a command
///
/// Only the continuous stick command is high-frequency.
pub fn message_kind(command: &Command) -> MessageKind {
    match command {
        Command::Rc(_) => MessageKind::HighFrequency,
        _ => MessageKind::Logged,
    }
}
