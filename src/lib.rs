//! # Tello Bridge Library
//!
//! Fly a small UDP-controlled quadcopter with a gamepad.
//!
//! This library provides the core functionality for bridging gamepad inputs
//! to the vehicle's ASCII command interface: the `command`/`ok` handshake,
//! a background receiver for status lines, serialized command sending, the
//! stick/button translator and the failsafe landing sequence.

pub mod bridge;
pub mod command;
pub mod config;
pub mod controller;
pub mod error;
pub mod failsafe;
pub mod link;
pub mod telemetry;
