//! # Telemetry Module
//!
//! Status and acknowledgment lines received from the vehicle.
//!
//! Lines are timestamped on receipt and printed to the console; nothing is
//! persisted.

use chrono::{DateTime, Local};

/// Console timestamp format (`[HH:MM:SS]`)
pub const TIMESTAMP_FORMAT: &str = "%H:%M:%S";

/// One line received from the vehicle
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryLine {
    /// Wall-clock time of receipt
    pub received_at: DateTime<Local>,
    /// Text with a single trailing newline removed
    pub text: String,
}

impl TelemetryLine {
    /// Decode a received datagram, stamping it with the current time.
    ///
    /// # Examples
    ///
    /// ```
    /// use tello_bridge::telemetry::TelemetryLine;
    ///
    /// let line = TelemetryLine::decode(b"87\n");
    /// assert_eq!(line.text, "87");
    /// ```
    #[must_use]
    pub fn decode(datagram: &[u8]) -> Self {
        Self::decode_at(datagram, Local::now())
    }

    /// Decode a received datagram with an explicit timestamp.
    #[must_use]
    pub fn decode_at(datagram: &[u8], received_at: DateTime<Local>) -> Self {
        let body = datagram.strip_suffix(b"\n").unwrap_or(datagram);
        Self {
            received_at,
            text: String::from_utf8_lossy(body).into_owned(),
        }
    }

    /// Console form: `[HH:MM:SS]: --> text`
    #[must_use]
    pub fn to_console_line(&self) -> String {
        format!("{} --> {}", stamp(&self.received_at), self.text)
    }
}

/// Formats a timestamp prefix such as `[14:03:59]:`
#[must_use]
pub fn stamp(at: &DateTime<Local>) -> String {
    format!("[{}]:", at.format(TIMESTAMP_FORMAT))
}
