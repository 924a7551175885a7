//! # Input Source Module
//!
//! One interface over every gamepad backend: "poll once" returns the raw
//! stick sample and the set of held buttons.
//!
//! ## Button Indices
//!
//! All backends report buttons by the same index, following the usual
//! DirectInput numbering of a PlayStation pad:
//!
//! | Index | Button | Xbox name |
//! |-------|--------|-----------|
//! | 0 | Square | X |
//! | 1 | Cross | A |
//! | 2 | Circle | B |
//! | 3 | Triangle | Y |
//! | 4 | L1 | LB |
//! | 5 | R1 | RB |
//! | 6 | L2 | LT |
//! | 7 | R2 | RT |
//! | 8 | Share | Back |
//! | 9 | Options | Start |
//! | 10 | L3 | LS |
//! | 11 | R3 | RS |
//! | 12 | PS | Guide |

use super::calibration::StickSample;
use crate::error::Result;

/// Canonical button indices.
pub mod buttons {
    /// Square / X
    pub const WEST: usize = 0;
    /// Cross / A
    pub const SOUTH: usize = 1;
    /// Circle / B
    pub const EAST: usize = 2;
    /// Triangle / Y
    pub const NORTH: usize = 3;
    /// L1 / LB
    pub const L1: usize = 4;
    /// R1 / RB
    pub const R1: usize = 5;
    /// L2 / LT
    pub const L2: usize = 6;
    /// R2 / RT
    pub const R2: usize = 7;
    /// Share / Back
    pub const SELECT: usize = 8;
    /// Options / Start
    pub const START: usize = 9;
    /// Left stick click
    pub const L3: usize = 10;
    /// Right stick click
    pub const R3: usize = 11;
    /// PS / Guide
    pub const MODE: usize = 12;
}

/// Highest button index a [`ButtonSet`] can hold, plus one
pub const MAX_BUTTONS: usize = 32;

/// Set of held buttons, one bit per canonical index
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ButtonSet(u32);

impl ButtonSet {
    /// No buttons held
    #[must_use]
    pub fn empty() -> Self {
        Self(0)
    }

    /// Set holding exactly `indices` (out-of-range indices are ignored)
    #[must_use]
    pub fn from_indices(indices: &[usize]) -> Self {
        let mut set = Self::empty();
        for &i in indices {
            set.set(i, true);
        }
        set
    }

    /// Mark `index` held or released
    pub fn set(&mut self, index: usize, held: bool) {
        if index >= MAX_BUTTONS {
            return;
        }
        if held {
            self.0 |= 1 << index;
        } else {
            self.0 &= !(1 << index);
        }
    }

    /// Whether `index` is held
    #[must_use]
    pub fn contains(&self, index: usize) -> bool {
        index < MAX_BUTTONS && self.0 & (1 << index) != 0
    }

    /// Whether every index in `indices` is held
    #[must_use]
    pub fn contains_all(&self, indices: &[usize]) -> bool {
        !indices.is_empty() && indices.iter().all(|&i| self.contains(i))
    }

    /// Whether nothing is held
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

/// Output of one poll
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputFrame {
    /// Raw stick positions
    pub sticks: StickSample,
    /// Buttons held this tick
    pub buttons: ButtonSet,
}

/// A gamepad backend
///
/// Backends may wrap thread-bound OS handles, so the trait does not require
/// `Send`; the poll loop runs on the main task.
#[cfg_attr(test, mockall::automock)]
pub trait InputSource {
    /// Human-readable device description
    fn name(&self) -> String;

    /// Read the current state without blocking
    ///
    /// # Errors
    ///
    /// `InputDisconnected` when the device has gone away.
    fn poll(&mut self) -> Result<InputFrame>;

    /// Look for the device again after a disconnect
    ///
    /// # Errors
    ///
    /// `InputNotFound` when no usable device is present.
    fn reconnect(&mut self) -> Result<()>;
}
