//! # Controller Module
//!
//! Gamepad input handling.
//!
//! This module handles:
//! - Gamepad detection through `gilrs`, falling back to raw evdev
//! - Reading analog stick and button inputs into one frame per tick
//! - Applying deadzones and rescaling sticks to the `rc` range
//! - Edge-triggered buttons and the emergency combo

pub mod calibration;
pub mod evdev_pad;
pub mod gamepad;
pub mod source;
pub mod translator;

use tracing::warn;

use crate::error::{BridgeError, Result};
use evdev_pad::EvdevGamepad;
use gamepad::GilrsGamepad;
use source::InputSource;

/// Open the first available input backend
///
/// Tries `gilrs` first, then evdev.
///
/// # Errors
///
/// `InputNotFound` listing why each backend failed.
pub fn open_input(trigger_threshold: f32) -> Result<Box<dyn InputSource>> {
    let gilrs_error = match GilrsGamepad::open(trigger_threshold) {
        Ok(pad) => return Ok(Box::new(pad)),
        Err(e) => {
            warn!("gilrs backend: {}", e);
            e
        }
    };

    match EvdevGamepad::open(trigger_threshold) {
        Ok(pad) => Ok(Box::new(pad)),
        Err(evdev_error) => {
            warn!("evdev backend: {}", evdev_error);
            Err(BridgeError::InputNotFound(format!(
                "gilrs: {}; evdev: {}",
                gilrs_error, evdev_error
            )))
        }
    }
}
