//! Operator console shared by the sender and the receiver task.
//!
//! Every write goes through the output lock so lines never interleave and
//! the printed order matches the order things happened on the socket.

use std::io::{self, Write};
use std::sync::Arc;

use chrono::Local;
use tokio::sync::Mutex;

use crate::telemetry::{stamp, TelemetryLine};

/// Console sink guarded by the output lock
pub type SharedConsole = Arc<Mutex<Console>>;

/// Line-oriented console writer
pub struct Console {
    sink: Box<dyn Write + Send + Sync>,
}

impl std::fmt::Debug for Console {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Console").finish_non_exhaustive()
    }
}

impl Console {
    /// Wrap any writer
    pub fn new(sink: Box<dyn Write + Send + Sync>) -> Self {
        Self { sink }
    }

    /// Console on standard output
    pub fn stdout() -> Self {
        Self::new(Box::new(io::stdout()))
    }

    /// Wrap into the shared, lockable form
    pub fn shared(self) -> SharedConsole {
        Arc::new(Mutex::new(self))
    }

    /// `[HH:MM:SS]: land`
    pub fn print_sent(&mut self, text: &str) {
        let line = format!("{} {}", stamp(&Local::now()), text);
        self.write_line(&line);
    }

    /// `[HH:MM:SS]: --> 87`
    pub fn print_received(&mut self, line: &TelemetryLine) {
        self.write_line(&line.to_console_line());
    }

    /// `[HH:MM:SS]: Failed to send `land`: ...`
    pub fn print_error(&mut self, message: &str) {
        let line = format!("{} {}", stamp(&Local::now()), message);
        self.write_line(&line);
    }

    fn write_line(&mut self, line: &str) {
        // Console failures never reach the link.
        if let Err(e) = writeln!(self.sink, "{}", line).and_then(|_| self.sink.flush()) {
            tracing::warn!("Console write failed: {}", e);
        }
    }
}
