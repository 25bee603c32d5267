//! Trait definitions for hardware abstraction, telemetry, and readout displays.
//!
//! This module defines the seams that allow rs-iotlab to:
//! - Run on different hardware (ESP32, desktop mock)
//! - Feed telemetry services from any sensor combination
//! - Render readings on whatever display a station carries
//!
//! # Submodules
//!
//! - `hardware`: Pulse counting for frequency-output sensors
//! - `telemetry`: Sample sources for the streaming services
//! - `display`: Readout display rendering trait
//!
//! Bus- and pin-level abstraction is *not* redefined here: the drivers in
//! [`crate::drivers`] are generic over the `embedded-hal` 1.0 traits
//! directly, which is what lets them run against `embedded-hal-mock` in
//! tests and `esp-idf-hal` on hardware.

pub mod display;
pub mod hardware;
pub mod telemetry;

pub use display::*;
pub use hardware::*;
pub use telemetry::*;
