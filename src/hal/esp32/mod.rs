//! ESP32 implementations of the crate's hardware traits.
//!
//! Built on `esp-idf-hal`/`esp-idf-svc` (std, ESP-IDF). The drivers in
//! [`crate::drivers`] take the HAL's `I2cDriver`, `PinDriver`, and
//! `Delay` types directly; this module adds the pieces that need an
//! ESP-IDF peripheral behind a crate trait:
//!
//! - [`Esp32Pulse`]: PCNT-backed [`PulseCounter`] for the TCS3200
//! - [`Esp32Wifi`]: blocking station-mode WiFi bring-up (feature `wifi`)
//! - [`Esp32Readout`]: SSD1306 OLED readout (feature `display`)
//!
//! [`PulseCounter`]: crate::traits::PulseCounter

pub mod pulse;

#[cfg(feature = "wifi")]
pub mod wifi;

#[cfg(feature = "display")]
pub mod display;

pub use pulse::*;

#[cfg(feature = "wifi")]
pub use wifi::*;

#[cfg(feature = "display")]
pub use display::*;
