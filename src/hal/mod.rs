//! Hardware Abstraction Layer implementations.
//!
//! This module contains concrete implementations of the traits
//! defined in [`crate::traits`] for various platforms.
//!
//! # Available Implementations
//!
//! - `mock`: Test implementations for desktop development
//! - `esp32`: ESP32 DevKit with the lab sensor breakouts (requires `esp32` feature)
//!
//! Bus- and pin-level mocking comes from `embedded-hal-mock`; the mocks
//! here cover the crate's own traits only.

pub mod mock;

#[cfg(feature = "esp32")]
pub mod esp32;

pub use mock::*;

#[cfg(feature = "esp32")]
pub use esp32::*;
