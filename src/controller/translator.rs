//! # Command Translator Module
//!
//! Maps gamepad input to vehicle commands, once per poll tick.
//!
//! ## Assignments (defaults)
//!
//! | Input | Command | Trigger |
//! |-------|---------|---------|
//! | Right Stick X | `rc` roll | every tick |
//! | Right Stick Y | `rc` pitch | every tick |
//! | Left Stick Y | `rc` throttle | every tick |
//! | Left Stick X | `rc` yaw | every tick |
//! | Cross (1) | `land` | rising edge |
//! | Circle (2) | `battery?` | rising edge |
//! | Triangle (3) | `takeoff` | rising edge |
//! | L1 + R1 + L2 + R2 (4-7) | `emergency` | rising edge of all four held |
//!
//! The `rc` command is emitted every tick even when nothing changed; the
//! vehicle drops to hover if it stops hearing it.
//!
//! ## Usage
//!
//! ```
//! use tello_bridge::command::protocol::Command;
//! use tello_bridge::controller::source::{ButtonSet, InputFrame};
//! use tello_bridge::controller::translator::CommandTranslator;
//!
//! let mut translator = CommandTranslator::new();
//! let frame = InputFrame { buttons: ButtonSet::from_indices(&[3]), ..Default::default() };
//!
//! let commands = translator.translate(&frame);
//! assert_eq!(commands[0], Command::Takeoff);
//! assert!(matches!(commands[1], Command::Rc(_)));
//! ```

use super::calibration::AxisCalibration;
use super::source::{buttons, ButtonSet, InputFrame};
use crate::command::protocol::Command;

/// Which button indices trigger which commands
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ButtonMap {
    /// One-shot commands fired on a press
    pub one_shots: Vec<(usize, Command)>,
    /// Buttons that must all be held to fire `emergency`
    pub emergency_combo: [usize; 4],
}

impl Default for ButtonMap {
    fn default() -> Self {
        Self {
            one_shots: vec![
                (buttons::SOUTH, Command::Land),
                (buttons::EAST, Command::QueryBattery),
                (buttons::NORTH, Command::Takeoff),
            ],
            emergency_combo: [buttons::L1, buttons::R1, buttons::L2, buttons::R2],
        }
    }
}

/// Buttons held on the previous tick
///
/// Owned by the translator and updated once per tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ButtonLatchState {
    previous: ButtonSet,
}

impl ButtonLatchState {
    /// Whether `index` went from released to held
    #[must_use]
    pub fn rising(&self, current: &ButtonSet, index: usize) -> bool {
        current.contains(index) && !self.previous.contains(index)
    }

    /// Whether the conjunction of `indices` went from false to true
    #[must_use]
    pub fn rising_all(&self, current: &ButtonSet, indices: &[usize]) -> bool {
        current.contains_all(indices) && !self.previous.contains_all(indices)
    }

    /// Remember `current` for the next tick
    pub fn latch(&mut self, current: ButtonSet) {
        self.previous = current;
    }
}

/// Turns input frames into commands.
#[derive(Debug, Clone, Default)]
pub struct CommandTranslator {
    calibration: AxisCalibration,
    buttons: ButtonMap,
    latch: ButtonLatchState,
}

impl CommandTranslator {
    /// Creates a translator with default deadzone and button assignments.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a translator with explicit calibration and button map.
    #[must_use]
    pub fn with_config(calibration: AxisCalibration, buttons: ButtonMap) -> Self {
        Self {
            calibration,
            buttons,
            latch: ButtonLatchState::default(),
        }
    }

    /// Translates one tick of input.
    ///
    /// # Returns
    ///
    /// One-shot commands in button-map order, then the combo command, then
    /// exactly one `rc` command.
    pub fn translate(&mut self, frame: &InputFrame) -> Vec<Command> {
        let mut commands = Vec::with_capacity(2);
        let held = &frame.buttons;

        for &(index, command) in &self.buttons.one_shots {
            if self.latch.rising(held, index) {
                commands.push(command);
            }
        }

        if self.latch.rising_all(held, &self.buttons.emergency_combo) {
            commands.push(Command::Emergency);
        }

        self.latch.latch(*held);

        let vector = self.calibration.to_control_vector(&frame.sticks);
        commands.push(Command::Rc(vector));
        commands
    }

    /// Adopts `frame` as the button history without emitting anything.
    ///
    /// Used after the device was re-detected: buttons held through the
    /// outage stay latched, buttons released during it re-arm.
    pub fn rebase(&mut self, frame: &InputFrame) {
        self.latch.latch(frame.buttons);
    }
}
