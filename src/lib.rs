//! # rs-iotlab
//!
//! Driver and telemetry toolkit for the IoT-course ESP32 hardware kit:
//! sensor and display drivers, a plot-server line protocol, and desktop
//! TCP streaming services.
//!
//! ## Features
//!
//! - **Device drivers**: TM1637 seven-segment display, SHT3x and BMP180
//!   environment sensors, BH1750 light sensor, QMC5883/HMC5883L
//!   magnetometers, ADXL345 accelerometer, TCS3200 color sensor
//! - **Hardware abstraction**: all drivers are generic over
//!   `embedded-hal` 1.0 traits and run unmodified against mocks
//! - **Telemetry**: the `name:value,...` line protocol spoken by the
//!   course's PC plot server, plus tokio client/server services
//! - **ESP32 support**: Wi-Fi, pulse counting, and OLED readout behind
//!   feature gates
//!
//! ## Architecture
//!
//! The crate is structured to allow testing on desktop without hardware:
//!
//! - `drivers` - Chip drivers over `embedded-hal` buses and pins
//! - `telemetry` - Sample types and the plot-server wire format
//! - `traits` - Seams the drivers and services plug into
//! - `hal` - Concrete implementations (mock for testing, esp32 for hardware)
//! - `services` - Desktop TCP plot server and sample streamer (`net` feature)
//!
//! ## Example
//!
//! ```rust
//! use rs_iotlab::telemetry::Sample;
//!
//! let mut sample = Sample::new();
//! sample.push("temperature", 23.5).unwrap();
//! sample.push("humidity", 47.2).unwrap();
//!
//! // The wire format understood by the course plot server
//! let line = sample.encode_line().unwrap();
//! assert_eq!(line.as_str(), "temperature:23.50,humidity:47.20\r\n");
//!
//! // And back
//! let parsed = Sample::parse_line(&line).unwrap();
//! assert_eq!(parsed.len(), 2);
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]

extern crate alloc;

/// Shared configuration system for desktop and ESP32.
pub mod config;
/// Chip drivers for the course hardware kit.
pub mod drivers;
/// Hardware abstraction layer with mock implementations for testing.
pub mod hal;
/// Sample types and the plot-server line protocol.
pub mod telemetry;
/// Core traits for hardware abstraction and telemetry sources.
pub mod traits;

/// Desktop TCP services for the plot-server exercises (feature-gated).
#[cfg(feature = "net")]
pub mod services;

// Re-exports for convenience
pub use drivers::adxl345::Adxl345;
pub use drivers::bh1750::Bh1750;
pub use drivers::bmp180::Bmp180;
pub use drivers::compass::Declination;
pub use drivers::hmc5883::Hmc5883;
pub use drivers::qmc5883::Qmc5883;
pub use drivers::sht3x::Sht3x;
pub use drivers::tcs3200::Tcs3200;
pub use drivers::tm1637::Tm1637;
pub use telemetry::{Reading, Sample};
pub use traits::{PulseCounter, ReadoutDisplay, SampleSource};

// Config re-exports
pub use config::{Config, DisplayConfig, NetConfig, SensorConfig, WifiConfig};
