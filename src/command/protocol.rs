//! # Command Protocol Constants and Types
//!
//! Core definitions for the vehicle's ASCII command interface.

use std::fmt;
use std::time::Duration;

/// Local UDP port the bridge binds to
pub const LOCAL_PORT: u16 = 9000;

/// Vehicle address on its own Wi-Fi network
pub const VEHICLE_HOST: &str = "192.168.10.1";

/// Vehicle command port
pub const VEHICLE_PORT: u16 = 8889;

/// Acknowledgment sent by the vehicle after entering command mode
pub const HANDSHAKE_ACK: &[u8] = b"ok";

/// Largest datagram the vehicle sends (telemetry frame size)
pub const MAX_DATAGRAM_SIZE: usize = 1518;

/// Longest command on the wire (`rc -100 -100 -100 -100` plus headroom)
pub const MAX_COMMAND_LEN: usize = 24;

/// Stick deflection range accepted by the `rc` command
pub const RC_MIN: i8 = -100;
/// Stick deflection range accepted by the `rc` command
pub const RC_MAX: i8 = 100;

/// Range accepted by the `speed` command in cm/s
pub const SPEED_MIN: u8 = 10;
/// Range accepted by the `speed` command in cm/s
pub const SPEED_MAX: u8 = 100;

/// Handshake wait per attempt: starts at 8 ms, each step five times longer
pub const HANDSHAKE_SCHEDULE: [Duration; 5] = [
    Duration::from_millis(8),
    Duration::from_millis(40),
    Duration::from_millis(200),
    Duration::from_millis(1000),
    Duration::from_millis(5000),
];

/// Four-axis stick command, each axis in [-100, 100]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ControlVector {
    /// Left/right
    pub roll: i8,
    /// Forward/backward
    pub pitch: i8,
    /// Up/down
    pub throttle: i8,
    /// Rotation
    pub yaw: i8,
}

impl ControlVector {
    /// Builds a vector, clamping every axis into the accepted range.
    #[must_use]
    pub fn new(roll: i32, pitch: i32, throttle: i32, yaw: i32) -> Self {
        let clamp = |v: i32| v.clamp(RC_MIN as i32, RC_MAX as i32) as i8;
        Self {
            roll: clamp(roll),
            pitch: clamp(pitch),
            throttle: clamp(throttle),
            yaw: clamp(yaw),
        }
    }

    /// All sticks centered.
    #[must_use]
    pub fn neutral() -> Self {
        Self::default()
    }
}

/// Commands the bridge can issue to the vehicle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Enter SDK command mode (handshake)
    EnterCommandMode,
    /// Automatic takeoff
    Takeoff,
    /// Automatic landing
    Land,
    /// Stop all motors immediately
    Emergency,
    /// Set cruise speed in cm/s
    Speed(u8),
    /// Ask for the battery percentage
    QueryBattery,
    /// Continuous stick command
    Rc(ControlVector),
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::EnterCommandMode => f.write_str("command"),
            Command::Takeoff => f.write_str("takeoff"),
            Command::Land => f.write_str("land"),
            Command::Emergency => f.write_str("emergency"),
            Command::Speed(cm_s) => write!(f, "speed {}", cm_s),
            Command::QueryBattery => f.write_str("battery?"),
            Command::Rc(v) => write!(f, "rc {} {} {} {}", v.roll, v.pitch, v.throttle, v.yaw),
        }
    }
}

/// How the sender treats a message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    /// Sent every poll tick; skips the console
    HighFrequency,
    /// Printed to the console before it is transmitted
    Logged,
}

/// Encoded command ready for the socket
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandMessage {
    /// ASCII payload without terminator
    pub payload: bytes::Bytes,
    /// Console treatment
    pub kind: MessageKind,
}

impl CommandMessage {
    /// Payload as text (always ASCII).
    #[must_use]
    pub fn text(&self) -> &str {
        std::str::from_utf8(&self.payload).unwrap_or("<non-ascii>")
    }

    /// Whether this message bypasses the console.
    #[must_use]
    pub fn is_high_frequency(&self) -> bool {
        self.kind == MessageKind::HighFrequency
    }
}
