//! # Failsafe Module
//!
//! Escalating stop sequence for when the operator can no longer steer.
//!
//! `land` is repeated with growing gaps in case earlier datagrams were lost,
//! then `emergency` stops the motors outright:
//!
//! | Offset | Command |
//! |--------|---------|
//! | 0 ms | `land` |
//! | 100 ms | `land` |
//! | 600 ms | `land` |
//! | 3100 ms | `land` |
//! | 15600 ms | `land` |
//! | 15600 ms | `emergency` |

use std::time::Duration;

use tracing::{error, info};

use crate::command::protocol::Command;
use crate::link::Sender;

/// One entry of the panic sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PanicStep {
    /// Command to send
    pub command: Command,
    /// Wait before sending it
    pub delay: Duration,
}

/// Fixed panic sequence
pub const PANIC_SEQUENCE: [PanicStep; 6] = [
    PanicStep { command: Command::Land, delay: Duration::from_millis(0) },
    PanicStep { command: Command::Land, delay: Duration::from_millis(100) },
    PanicStep { command: Command::Land, delay: Duration::from_millis(500) },
    PanicStep { command: Command::Land, delay: Duration::from_millis(2500) },
    PanicStep { command: Command::Land, delay: Duration::from_millis(12500) },
    PanicStep { command: Command::Emergency, delay: Duration::from_millis(0) },
];

/// Run the panic sequence to completion
///
/// Every step goes through the logged send path. Send failures are printed
/// by the sender and do not stop the sequence.
pub async fn run_panic(sender: &Sender) {
    error!("Input lost, running failsafe sequence");

    for step in PANIC_SEQUENCE.iter() {
        if !step.delay.is_zero() {
            tokio::time::sleep(step.delay).await;
        }
        sender.send(&step.command).await;
    }

    info!("Failsafe sequence complete");
}
