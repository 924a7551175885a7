//! # Calibration Module
//!
//! Deadzone correction and rescaling of raw stick values to the `rc` range.
//!
//! ## Deadzone
//!
//! A deadzone eliminates small stick movements near center to prevent drift.
//! Values within the deadzone map to 0; values outside are rescaled so the
//! deadzone edge maps to 0 and the raw extreme maps to ±100:
//!
//! ```text
//! raw >=  dz:  100 * (raw - dz) / (positive_extreme - dz)
//! raw <= -dz:  100 * (raw + dz) / (negative_extreme - dz)
//! ```
//!
//! Integer division truncates towards zero.
//!
//! ## Raw Range
//!
//! Backends hand over sticks in the signed 16-bit range: -32768 ..= 32767,
//! Y axes pointing up. [`normalize_axis`] and [`normalize_float`] get device
//! values there.
//!
//! ## Usage
//!
//! ```
//! use tello_bridge::controller::calibration::Calibration;
//!
//! let cal = Calibration::from_fraction(0.06); // 6% deadzone
//!
//! // Input near center (within deadzone)
//! assert_eq!(cal.apply(983), 0);
//!
//! // Input at full deflection
//! assert_eq!(cal.apply(32767), 100);
//! assert_eq!(cal.apply(-32768), -100);
//! ```

use crate::command::protocol::{ControlVector, RC_MAX, RC_MIN};

/// Magnitude of the most negative raw value
pub const RAW_NEGATIVE_EXTREME: i32 = 32768;
/// Most positive raw value
pub const RAW_POSITIVE_EXTREME: i32 = 32767;

/// Deadzone and scale for one axis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Calibration {
    /// Raw magnitude below which output is 0
    deadzone: i32,
    /// Scale denominator for negative input (magnitude)
    negative_extreme: i32,
    /// Scale denominator for positive input
    positive_extreme: i32,
}

impl Default for Calibration {
    fn default() -> Self {
        Self::from_fraction(0.06)
    }
}

impl Calibration {
    /// Creates a calibration for an arbitrary asymmetric range.
    ///
    /// # Arguments
    ///
    /// * `deadzone` - Raw deadzone threshold. Clamped below both extremes.
    /// * `negative_extreme` - Magnitude of the lowest raw value
    /// * `positive_extreme` - Highest raw value
    #[must_use]
    pub fn new(deadzone: i32, negative_extreme: i32, positive_extreme: i32) -> Self {
        let negative_extreme = negative_extreme.max(1);
        let positive_extreme = positive_extreme.max(1);
        let ceiling = negative_extreme.min(positive_extreme) - 1;
        Self {
            deadzone: deadzone.clamp(0, ceiling),
            negative_extreme,
            positive_extreme,
        }
    }

    /// Creates a calibration for the standard raw range with the deadzone
    /// given as a fraction of full deflection (0.06 = 6%).
    ///
    /// # Examples
    ///
    /// ```
    /// use tello_bridge::controller::calibration::Calibration;
    ///
    /// let cal = Calibration::from_fraction(0.06);
    /// assert_eq!(cal.deadzone(), 1966);
    /// ```
    #[must_use]
    pub fn from_fraction(fraction: f32) -> Self {
        let fraction = fraction.clamp(0.0, 0.99);
        let deadzone = (fraction * RAW_POSITIVE_EXTREME as f32).round() as i32;
        Self::new(deadzone, RAW_NEGATIVE_EXTREME, RAW_POSITIVE_EXTREME)
    }

    /// Creates a calibration with no deadzone.
    #[must_use]
    pub fn linear() -> Self {
        Self::new(0, RAW_NEGATIVE_EXTREME, RAW_POSITIVE_EXTREME)
    }

    /// Returns the raw deadzone threshold.
    #[must_use]
    pub fn deadzone(&self) -> i32 {
        self.deadzone
    }

    /// Applies the deadzone and rescales to -100..=100.
    ///
    /// # Examples
    ///
    /// ```
    /// use tello_bridge::controller::calibration::Calibration;
    ///
    /// let cal = Calibration::new(10, 100, 100);
    /// assert_eq!(cal.apply(5), 0);
    /// assert_eq!(cal.apply(55), 50);
    /// assert_eq!(cal.apply(-100), -100);
    /// ```
    #[must_use]
    pub fn apply(&self, raw: i32) -> i8 {
        let dz = self.deadzone as i64;
        let raw = raw as i64;

        let scaled = if raw >= dz && raw > 0 {
            100 * (raw - dz) / (self.positive_extreme as i64 - dz)
        } else if raw <= -dz && raw < 0 {
            100 * (raw + dz) / (self.negative_extreme as i64 - dz)
        } else {
            0
        };

        scaled.clamp(RC_MIN as i64, RC_MAX as i64) as i8
    }
}

/// Raw stick positions from one poll, in the standard raw range
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StickSample {
    /// Left stick X (yaw), right positive
    pub left_x: i32,
    /// Left stick Y (throttle), up positive
    pub left_y: i32,
    /// Right stick X (roll), right positive
    pub right_x: i32,
    /// Right stick Y (pitch), up positive
    pub right_y: i32,
}

/// Calibration settings for all flight axes.
#[derive(Debug, Clone, Default)]
pub struct AxisCalibration {
    /// Roll axis calibration (right stick X).
    pub roll: Calibration,
    /// Pitch axis calibration (right stick Y).
    pub pitch: Calibration,
    /// Throttle axis calibration (left stick Y).
    pub throttle: Calibration,
    /// Yaw axis calibration (left stick X).
    pub yaw: Calibration,
}

impl AxisCalibration {
    /// Same deadzone on every stick axis.
    #[must_use]
    pub fn uniform(deadzone_fraction: f32) -> Self {
        let cal = Calibration::from_fraction(deadzone_fraction);
        Self {
            roll: cal,
            pitch: cal,
            throttle: cal,
            yaw: cal,
        }
    }

    /// Separate deadzones for the left (yaw, throttle) and right (roll,
    /// pitch) sticks.
    #[must_use]
    pub fn per_stick(left_fraction: f32, right_fraction: f32) -> Self {
        let left = Calibration::from_fraction(left_fraction);
        let right = Calibration::from_fraction(right_fraction);
        Self {
            roll: right,
            pitch: right,
            throttle: left,
            yaw: left,
        }
    }

    /// Corrects each axis independently and assembles the control vector.
    #[must_use]
    pub fn to_control_vector(&self, sticks: &StickSample) -> ControlVector {
        ControlVector {
            roll: self.roll.apply(sticks.right_x),
            pitch: self.pitch.apply(sticks.right_y),
            throttle: self.throttle.apply(sticks.left_y),
            yaw: self.yaw.apply(sticks.left_x),
        }
    }
}

/// Converts a device axis reading with reported bounds to the raw range.
///
/// The midpoint of `min..=max` maps to 0; `invert` flips the sign for
/// axes that grow downwards.
///
/// # Examples
///
/// ```
/// use tello_bridge::controller::calibration::normalize_axis;
///
/// assert_eq!(normalize_axis(0, 0, 255, false), -32768);
/// assert_eq!(normalize_axis(255, 0, 255, false), 32767);
/// assert_eq!(normalize_axis(0, 0, 255, true), 32767);
/// ```
#[must_use]
pub fn normalize_axis(value: i32, min: i32, max: i32, invert: bool) -> i32 {
    if max <= min {
        return 0;
    }
    let value = value.clamp(min, max) as i64;
    let (min, max) = (min as i64, max as i64);
    let span = max - min;

    // Map min..=max onto -32768..=32767
    let scaled = (value - min) * 65535 / span - RAW_NEGATIVE_EXTREME as i64;
    let scaled = if invert { -scaled - 1 } else { scaled };
    scaled.clamp(-(RAW_NEGATIVE_EXTREME as i64), RAW_POSITIVE_EXTREME as i64) as i32
}

/// Converts a -1.0..=1.0 reading (as gamepad libraries report) to the raw range.
///
/// # Examples
///
/// ```
/// use tello_bridge::controller::calibration::normalize_float;
///
/// assert_eq!(normalize_float(1.0), 32767);
/// assert_eq!(normalize_float(0.0), 0);
/// assert_eq!(normalize_float(-1.0), -32768);
/// ```
#[must_use]
pub fn normalize_float(value: f32) -> i32 {
    let value = value.clamp(-1.0, 1.0);
    if value < 0.0 {
        (value * RAW_NEGATIVE_EXTREME as f32).round() as i32
    } else {
        (value * RAW_POSITIVE_EXTREME as f32).round() as i32
    }
}
