//! # gilrs Gamepad Module
//!
//! Cross-platform gamepad backend on top of `gilrs`. Tried first; the evdev
//! backend is the fallback.
//!
//! `gilrs` already reports sticks in -1.0..=1.0 with Y pointing up, and
//! analog triggers in 0.0..=1.0.

use gilrs::{Axis, Button, Event, EventType, GamepadId, Gilrs};
use tracing::{debug, info, warn};

use super::calibration::{normalize_float, StickSample};
use super::source::{buttons, ButtonSet, InputFrame, InputSource};
use crate::error::{BridgeError, Result};

/// gilrs button to canonical button index
const BUTTON_MAP: [(Button, usize); 13] = [
    (Button::West, buttons::WEST),
    (Button::South, buttons::SOUTH),
    (Button::East, buttons::EAST),
    (Button::North, buttons::NORTH),
    (Button::LeftTrigger, buttons::L1),
    (Button::RightTrigger, buttons::R1),
    (Button::LeftTrigger2, buttons::L2),
    (Button::RightTrigger2, buttons::R2),
    (Button::Select, buttons::SELECT),
    (Button::Start, buttons::START),
    (Button::LeftThumb, buttons::L3),
    (Button::RightThumb, buttons::R3),
    (Button::Mode, buttons::MODE),
];

/// Builds a frame from per-axis and per-button readings.
///
/// `button_value` returns 0.0..=1.0; a button counts as held when it is
/// reported pressed or its value reaches `trigger_threshold` (analog
/// triggers rarely report "pressed" at light travel).
pub fn frame_from_readings<A, B>(axis: A, button_value: B, trigger_threshold: f32) -> InputFrame
where
    A: Fn(Axis) -> f32,
    B: Fn(Button) -> (bool, f32),
{
    let sticks = StickSample {
        left_x: normalize_float(axis(Axis::LeftStickX)),
        left_y: normalize_float(axis(Axis::LeftStickY)),
        right_x: normalize_float(axis(Axis::RightStickX)),
        right_y: normalize_float(axis(Axis::RightStickY)),
    };

    let mut held = ButtonSet::empty();
    for (button, index) in BUTTON_MAP {
        let (pressed, value) = button_value(button);
        let analog = matches!(button, Button::LeftTrigger2 | Button::RightTrigger2);
        if pressed || (analog && value >= trigger_threshold) {
            held.set(index, true);
        }
    }

    InputFrame { sticks, buttons: held }
}

/// First connected gamepad seen by `gilrs`
pub struct GilrsGamepad {
    gilrs: Gilrs,
    active: GamepadId,
    trigger_threshold: f32,
}

impl GilrsGamepad {
    /// Initialize `gilrs` and pick the first connected gamepad
    ///
    /// # Errors
    ///
    /// - `InputNotFound`: `gilrs` could not start, or no gamepad is connected
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use tello_bridge::controller::gamepad::GilrsGamepad;
    /// use tello_bridge::controller::source::InputSource;
    ///
    /// let pad = GilrsGamepad::open(0.12)?;
    /// println!("Using {}", pad.name());
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn open(trigger_threshold: f32) -> Result<Self> {
        let gilrs = Gilrs::new()
            .map_err(|e| BridgeError::InputNotFound(format!("gilrs unavailable: {}", e)))?;

        let active = first_connected(&gilrs)?;

        Ok(Self {
            gilrs,
            active,
            trigger_threshold,
        })
    }

    /// Process queued events; returns an error if the active pad went away
    fn drain_events(&mut self) -> Result<()> {
        let mut lost = false;
        while let Some(Event { id, event, .. }) = self.gilrs.next_event() {
            match event {
                EventType::Disconnected if id == self.active => {
                    warn!("Gamepad {} disconnected", id);
                    lost = true;
                }
                EventType::Connected => debug!("Gamepad {} connected", id),
                _ => (),
            }
        }

        if lost || self.gilrs.connected_gamepad(self.active).is_none() {
            return Err(BridgeError::InputDisconnected(format!(
                "gamepad {} is no longer connected",
                self.active
            )));
        }
        Ok(())
    }
}

fn first_connected(gilrs: &Gilrs) -> Result<GamepadId> {
    for (id, gamepad) in gilrs.gamepads() {
        debug!("Found gamepad {}: {} ({:?})", id, gamepad.name(), gamepad.power_info());
        if gamepad.is_connected() {
            info!("Using gamepad {}: {}", id, gamepad.name());
            return Ok(id);
        }
    }
    Err(BridgeError::InputNotFound("no gamepad connected".to_string()))
}

impl InputSource for GilrsGamepad {
    fn name(&self) -> String {
        self.gilrs.gamepad(self.active).name().to_string()
    }

    fn poll(&mut self) -> Result<InputFrame> {
        self.drain_events()?;

        let gamepad = self.gilrs.gamepad(self.active);
        let frame = frame_from_readings(
            |axis| gamepad.value(axis),
            |button| {
                let value = gamepad.button_data(button).map_or(0.0, |data| data.value());
                (gamepad.is_pressed(button), value)
            },
            self.trigger_threshold,
        );
        Ok(frame)
    }

    fn reconnect(&mut self) -> Result<()> {
        // Pick up Connected events queued since the loss
        while self.gilrs.next_event().is_some() {}
        self.active = first_connected(&self.gilrs)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn idle_button(_: Button) -> (bool, f32) {
        (false, 0.0)
    }

    #[test]
    fn test_idle_pad_is_default_frame() {
        let frame = frame_from_readings(|_| 0.0, idle_button, 0.12);
        assert_eq!(frame, InputFrame::default());
    }

    #[test]
    fn test_sticks_scaled_to_raw_range() {
        let frame = frame_from_readings(
            |axis| match axis {
                Axis::LeftStickX => 1.0,
                Axis::LeftStickY => -1.0,
                Axis::RightStickX => 0.5,
                _ => 0.0,
            },
            idle_button,
            0.12,
        );
        assert_eq!(frame.sticks.left_x, 32767);
        assert_eq!(frame.sticks.left_y, -32768);
        assert_eq!(frame.sticks.right_x, 16384);
        assert_eq!(frame.sticks.right_y, 0);
    }

    #[test]
    fn test_buttons_map_to_canonical_indices() {
        let frame = frame_from_readings(
            |_| 0.0,
            |button| (matches!(button, Button::East | Button::LeftTrigger), 0.0),
            0.12,
        );
        assert_eq!(frame.buttons, ButtonSet::from_indices(&[buttons::EAST, buttons::L1]));
    }

    #[test]
    fn test_analog_trigger_threshold() {
        let frame = frame_from_readings(
            |_| 0.0,
            |button| match button {
                Button::LeftTrigger2 => (false, 0.5),
                Button::RightTrigger2 => (false, 0.05),
                // Analog value on a digital button is ignored
                Button::South => (false, 0.9),
                _ => (false, 0.0),
            },
            0.12,
        );
        assert_eq!(frame.buttons, ButtonSet::from_indices(&[buttons::L2]));
    }

    #[test]
    fn test_button_map_covers_every_index_once() {
        let mut seen: Vec<usize> = BUTTON_MAP.iter().map(|&(_, i)| i).collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..=12).collect::<Vec<_>>());
    }

    // Integration test - only runs with real hardware
    #[test]
    #[ignore]
    fn test_open_with_real_hardware() {
        let mut pad = GilrsGamepad::open(0.12).expect("No gamepad found");
        let frame = pad.poll().expect("Poll should succeed on a connected pad");
        println!("{}: {:?}", pad.name(), frame);
    }
}
