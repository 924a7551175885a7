//! # evdev Gamepad Module
//!
//! Raw Linux input backend, used when `gilrs` finds no gamepad.
//!
//! ## Controller Detection
//!
//! Any `/dev/input/event*` device that reports both a south face button
//! (`BTN_SOUTH`) and a left stick X axis (`ABS_X`) is treated as a gamepad.
//! Devices are scanned in path order so the same pad wins every time.
//!
//! ## Polling
//!
//! Each poll reads the current key and axis state with ioctls instead of
//! draining the event queue, so it never blocks the poll loop.
//!
//! - Left stick: `ABS_X`, `ABS_Y`
//! - Right stick: `ABS_RX`, `ABS_RY`
//! - Analog triggers: `ABS_Z` (L2), `ABS_RZ` (R2)
//!
//! Y axes grow downwards on evdev and are inverted.

use evdev::{AbsoluteAxisType, AttributeSetRef, Device, Key};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::calibration::{normalize_axis, StickSample};
use super::source::{buttons, ButtonSet, InputFrame, InputSource};
use crate::error::{BridgeError, Result};

/// Directory scanned for event devices
const INPUT_DIR: &str = "/dev/input";

/// Key code to canonical button index
const KEY_MAP: [(Key, usize); 13] = [
    (Key::BTN_WEST, buttons::WEST),
    (Key::BTN_SOUTH, buttons::SOUTH),
    (Key::BTN_EAST, buttons::EAST),
    (Key::BTN_NORTH, buttons::NORTH),
    (Key::BTN_TL, buttons::L1),
    (Key::BTN_TR, buttons::R1),
    (Key::BTN_TL2, buttons::L2),
    (Key::BTN_TR2, buttons::R2),
    (Key::BTN_SELECT, buttons::SELECT),
    (Key::BTN_START, buttons::START),
    (Key::BTN_THUMBL, buttons::L3),
    (Key::BTN_THUMBR, buttons::R3),
    (Key::BTN_MODE, buttons::MODE),
];

/// One absolute axis reading with its reported bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisReading {
    pub value: i32,
    pub minimum: i32,
    pub maximum: i32,
}

impl AxisReading {
    /// Position in the raw stick range
    fn normalized(&self, invert: bool) -> i32 {
        normalize_axis(self.value, self.minimum, self.maximum, invert)
    }

    /// Fraction of full travel, 0.0..=1.0
    fn travel(&self) -> f32 {
        if self.maximum <= self.minimum {
            return 0.0;
        }
        let value = self.value.clamp(self.minimum, self.maximum);
        (value - self.minimum) as f32 / (self.maximum - self.minimum) as f32
    }
}

/// Builds a frame from a key-state snapshot and an axis lookup.
///
/// Missing axes read as centered; an analog trigger past `trigger_threshold`
/// counts as its digital button.
pub fn frame_from_state<F>(keys: &AttributeSetRef<Key>, axis: F, trigger_threshold: f32) -> InputFrame
where
    F: Fn(AbsoluteAxisType) -> Option<AxisReading>,
{
    let stick = |kind, invert| axis(kind).map_or(0, |r: AxisReading| r.normalized(invert));

    let sticks = StickSample {
        left_x: stick(AbsoluteAxisType::ABS_X, false),
        left_y: stick(AbsoluteAxisType::ABS_Y, true),
        right_x: stick(AbsoluteAxisType::ABS_RX, false),
        right_y: stick(AbsoluteAxisType::ABS_RY, true),
    };

    let mut held = ButtonSet::empty();
    for (key, index) in KEY_MAP {
        if keys.contains(key) {
            held.set(index, true);
        }
    }

    for (kind, index) in [
        (AbsoluteAxisType::ABS_Z, buttons::L2),
        (AbsoluteAxisType::ABS_RZ, buttons::R2),
    ] {
        if axis(kind).map_or(false, |r| r.travel() >= trigger_threshold) {
            held.set(index, true);
        }
    }

    InputFrame { sticks, buttons: held }
}

/// Gamepad read through the evdev interface
pub struct EvdevGamepad {
    device: Device,
    device_path: PathBuf,
    trigger_threshold: f32,
}

impl EvdevGamepad {
    /// Detect and open the first gamepad-like event device
    ///
    /// # Errors
    ///
    /// - `InputNotFound`: `/dev/input` missing, unreadable, or no matching device
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use tello_bridge::controller::evdev_pad::EvdevGamepad;
    ///
    /// let pad = EvdevGamepad::open(0.12)?;
    /// println!("Using {}", pad.device_path().display());
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn open(trigger_threshold: f32) -> Result<Self> {
        let (device, device_path) = Self::scan()?;
        Ok(Self {
            device,
            device_path,
            trigger_threshold,
        })
    }

    fn scan() -> Result<(Device, PathBuf)> {
        let input_dir = Path::new(INPUT_DIR);

        if !input_dir.exists() {
            return Err(BridgeError::InputNotFound(format!(
                "{} directory not found",
                INPUT_DIR
            )));
        }

        let mut paths: Vec<PathBuf> = std::fs::read_dir(input_dir)
            .map_err(|e| BridgeError::InputNotFound(format!("Failed to read {}: {}", INPUT_DIR, e)))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.file_name()
                    .map_or(false, |name| name.to_string_lossy().starts_with("event"))
            })
            .collect();

        paths.sort();

        for path in paths {
            match Device::open(&path) {
                Ok(device) => {
                    debug!(
                        "Found input device: {} ({})",
                        path.display(),
                        device.name().unwrap_or("unnamed")
                    );
                    if is_gamepad(&device) {
                        info!("Using evdev gamepad at: {}", path.display());
                        return Ok((device, path));
                    }
                }
                Err(e) => {
                    // Permission denied or other errors - skip device
                    debug!("Could not open {}: {}", path.display(), e);
                }
            }
        }

        Err(BridgeError::InputNotFound(
            "no evdev device with gamepad buttons and sticks".to_string(),
        ))
    }

    /// The `/dev/input/eventX` path in use
    pub fn device_path(&self) -> &Path {
        &self.device_path
    }

    fn read_frame(&self) -> std::io::Result<InputFrame> {
        let keys = self.device.get_key_state()?;
        let abs = self.device.get_abs_state()?;
        let supported = self.device.supported_absolute_axes();

        let lookup = |kind: AbsoluteAxisType| {
            if !supported.map_or(false, |axes| axes.contains(kind)) {
                return None;
            }
            abs.get(kind.0 as usize).map(|info| AxisReading {
                value: info.value,
                minimum: info.minimum,
                maximum: info.maximum,
            })
        };

        Ok(frame_from_state(&keys, lookup, self.trigger_threshold))
    }
}

fn is_gamepad(device: &Device) -> bool {
    let has_south = device
        .supported_keys()
        .map_or(false, |keys| keys.contains(Key::BTN_SOUTH));
    let has_stick = device
        .supported_absolute_axes()
        .map_or(false, |axes| axes.contains(AbsoluteAxisType::ABS_X));
    has_south && has_stick
}

impl InputSource for EvdevGamepad {
    fn name(&self) -> String {
        format!(
            "{} ({})",
            self.device.name().unwrap_or("evdev gamepad"),
            self.device_path.display()
        )
    }

    fn poll(&mut self) -> Result<InputFrame> {
        self.read_frame().map_err(|e| {
            warn!("Reading {} failed: {}", self.device_path.display(), e);
            BridgeError::InputDisconnected(format!("{}: {}", self.device_path.display(), e))
        })
    }

    fn reconnect(&mut self) -> Result<()> {
        let (device, device_path) = Self::scan()?;
        self.device = device;
        self.device_path = device_path;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use evdev::AttributeSet;

    fn reading(value: i32) -> Option<AxisReading> {
        Some(AxisReading {
            value,
            minimum: 0,
            maximum: 255,
        })
    }

    #[test]
    fn test_keys_map_to_canonical_indices() {
        let mut keys = AttributeSet::<Key>::new();
        keys.insert(Key::BTN_SOUTH);
        keys.insert(Key::BTN_NORTH);
        keys.insert(Key::BTN_TR2);

        let frame = frame_from_state(&keys, |_| None, 0.12);
        assert_eq!(frame.buttons, ButtonSet::from_indices(&[1, 3, 7]));
    }

    #[test]
    fn test_key_map_covers_every_index_once() {
        let mut seen: Vec<usize> = KEY_MAP.iter().map(|&(_, i)| i).collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..=12).collect::<Vec<_>>());
    }

    #[test]
    fn test_missing_axes_are_centered() {
        let keys = AttributeSet::<Key>::new();
        let frame = frame_from_state(&keys, |_| None, 0.12);
        assert_eq!(frame, InputFrame::default());
    }

    #[test]
    fn test_stick_axes_and_y_inversion() {
        let keys = AttributeSet::<Key>::new();
        let frame = frame_from_state(
            &keys,
            |kind| match kind {
                AbsoluteAxisType::ABS_X => reading(255),
                // Stick pushed up reads as minimum on evdev
                AbsoluteAxisType::ABS_Y => reading(0),
                AbsoluteAxisType::ABS_RX => reading(0),
                AbsoluteAxisType::ABS_RY => reading(255),
                _ => None,
            },
            0.12,
        );

        assert_eq!(frame.sticks.left_x, 32767);
        assert_eq!(frame.sticks.left_y, 32767);
        assert_eq!(frame.sticks.right_x, -32768);
        assert_eq!(frame.sticks.right_y, -32768);
        assert!(frame.buttons.is_empty());
    }

    #[test]
    fn test_analog_triggers_past_threshold() {
        let keys = AttributeSet::<Key>::new();
        let frame = frame_from_state(
            &keys,
            |kind| match kind {
                AbsoluteAxisType::ABS_Z => reading(200),
                AbsoluteAxisType::ABS_RZ => reading(10),
                _ => None,
            },
            0.12,
        );

        assert!(frame.buttons.contains(buttons::L2));
        assert!(!frame.buttons.contains(buttons::R2));
    }

    #[test]
    fn test_axis_travel() {
        let r = AxisReading { value: 50, minimum: 0, maximum: 100 };
        assert!((r.travel() - 0.5).abs() < f32::EPSILON);

        let degenerate = AxisReading { value: 1, minimum: 3, maximum: 3 };
        assert_eq!(degenerate.travel(), 0.0);
    }

    // Integration test - only runs with real hardware
    #[test]
    #[ignore]
    fn test_open_with_real_hardware() {
        let mut pad = EvdevGamepad::open(0.12).expect("No evdev gamepad found");
        assert!(pad.device_path().starts_with("/dev/input"));

        let frame = pad.poll().expect("Poll should succeed on a connected pad");
        println!("{}: {:?}", pad.name(), frame);
    }
}
