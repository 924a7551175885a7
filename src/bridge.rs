//! # Bridge Loop
//!
//! The foreground poll loop: read the gamepad, translate, send, sleep.
//!
//! A lost gamepad gets a bounded number of re-detection attempts. If it does
//! not come back the failsafe sequence lands the vehicle and the loop ends
//! with `InputDeviceLost`. Ctrl+C sends one `land` and ends the loop
//! normally so the session can be closed.

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::command::protocol::Command;
use crate::config::Config;
use crate::controller::source::{InputFrame, InputSource};
use crate::controller::translator::CommandTranslator;
use crate::error::{BridgeError, Result};
use crate::failsafe::run_panic;
use crate::link::Sender;

/// Number of ticks between status log messages
const LOG_INTERVAL_TICKS: u64 = 1000;

/// Loop timing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BridgeSettings {
    /// Sleep after each tick
    pub poll_interval: Duration,
    /// Re-detection attempts before giving up on a lost gamepad
    pub reconnect_attempts: u32,
    /// Wait before each re-detection attempt
    pub reconnect_interval: Duration,
}

impl Default for BridgeSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl BridgeSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            poll_interval: config.poll_interval(),
            reconnect_attempts: config.controller.reconnect_attempts,
            reconnect_interval: config.reconnect_interval(),
        }
    }
}

/// Gamepad-to-vehicle loop
pub struct Bridge {
    source: Box<dyn InputSource>,
    translator: CommandTranslator,
    sender: Sender,
    settings: BridgeSettings,
    ticks: u64,
}

impl Bridge {
    pub fn new(
        source: Box<dyn InputSource>,
        translator: CommandTranslator,
        sender: Sender,
        settings: BridgeSettings,
    ) -> Self {
        Self {
            source,
            translator,
            sender,
            settings,
            ticks: 0,
        }
    }

    /// Completed ticks so far
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Run until Ctrl+C or unrecoverable input loss
    ///
    /// # Errors
    ///
    /// `InputDeviceLost` after the failsafe sequence has been sent.
    pub async fn run(&mut self) -> Result<()> {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Ctrl+C handler unavailable: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await
    }

    /// Run until `shutdown` resolves or input is lost for good
    ///
    /// `shutdown` is only checked between ticks; a tick in progress (or the
    /// failsafe sequence) always completes.
    pub async fn run_until<F>(&mut self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        info!(
            "Bridging {} every {}ms",
            self.source.name(),
            self.settings.poll_interval.as_millis()
        );

        loop {
            let frame = match self.source.poll() {
                Ok(frame) => frame,
                Err(cause) => {
                    if let Err(lost) = self.recover(cause).await {
                        run_panic(&self.sender).await;
                        return Err(lost);
                    }
                    continue;
                }
            };

            self.tick(&frame).await;

            tokio::select! {
                biased;

                _ = &mut shutdown => {
                    info!("Shutdown requested, landing...");
                    self.sender.send(&Command::Land).await;
                    info!("Total ticks: {}", self.ticks);
                    return Ok(());
                }

                _ = sleep(self.settings.poll_interval) => {}
            }
        }
    }

    async fn tick(&mut self, frame: &InputFrame) {
        for command in self.translator.translate(frame) {
            self.sender.send(&command).await;
        }

        self.ticks += 1;
        if self.ticks % LOG_INTERVAL_TICKS == 0 {
            debug!("Completed {} ticks", self.ticks);
        }
    }

    /// Bounded re-detection after a failed poll
    async fn recover(&mut self, cause: BridgeError) -> Result<()> {
        warn!("{}", cause);

        for attempt in 1..=self.settings.reconnect_attempts {
            sleep(self.settings.reconnect_interval).await;
            let rebased = self.source.reconnect().and_then(|()| self.source.poll());
            match rebased {
                Ok(frame) => {
                    info!("Input re-detected: {}", self.source.name());
                    // Edges continue from the re-detected state
                    self.translator.rebase(&frame);
                    return Ok(());
                }
                Err(e) => warn!(
                    "Re-detection attempt {}/{} failed: {}",
                    attempt, self.settings.reconnect_attempts, e
                ),
            }
        }

        Err(BridgeError::InputDeviceLost(cause.to_string()))
    }
}
