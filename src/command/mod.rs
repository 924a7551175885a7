//! # Command Protocol Module
//!
//! The vehicle's plain-text UDP command set.
//!
//! This module handles:
//! - Command vocabulary (`takeoff`, `land`, `rc ...`, ...)
//! - Wire encoding (ASCII, no terminator)
//! - Connection constants and the handshake schedule

pub mod protocol;
pub mod encoder;
