//! Shared configuration system for desktop and ESP32.
//!
//! Uses `heapless::String` for `no_std` compatibility while remaining
//! ergonomic to use on desktop with `std`.
//!
//! # Example
//!
//! ```rust
//! use rs_iotlab::config::{Config, NetConfig, DisplayConfig};
//!
//! // Use defaults
//! let config = Config::default();
//!
//! // Or customize
//! let config = Config::default()
//!     .with_net(NetConfig::default().with_host("192.168.1.100").with_port(5000))
//!     .with_display(DisplayConfig::default().with_brightness(3));
//! ```

use crate::drivers::sht3x::Repeatability;
use heapless::String as HString;

/// Maximum length for short config strings (hostnames, SSIDs)
pub const MAX_SHORT_STRING: usize = 64;

/// Maximum length for longer config strings (greetings, messages)
pub const MAX_LONG_STRING: usize = 128;

/// Type alias for short config strings
pub type ShortString = HString<MAX_SHORT_STRING>;

/// Type alias for longer config strings
pub type LongString = HString<MAX_LONG_STRING>;

// ============================================================================
// Helper for creating heapless strings
// ============================================================================

/// Create a ShortString from a &str, truncating if too long
pub fn short_string(s: &str) -> ShortString {
    let mut hs = ShortString::new();
    // Take only whole characters that fit within the capacity
    let take = s.len().min(MAX_SHORT_STRING);
    let valid_end = s
        .char_indices()
        .take_while(|&(i, c)| i + c.len_utf8() <= take)
        .last()
        .map(|(i, c)| i + c.len_utf8())
        .unwrap_or(0);
    let _ = hs.push_str(&s[..valid_end]);
    hs
}

/// Create a LongString from a &str, truncating if too long
pub fn long_string(s: &str) -> LongString {
    let mut hs = LongString::new();
    let take = s.len().min(MAX_LONG_STRING);
    let valid_end = s
        .char_indices()
        .take_while(|&(i, c)| i + c.len_utf8() <= take)
        .last()
        .map(|(i, c)| i + c.len_utf8())
        .unwrap_or(0);
    let _ = hs.push_str(&s[..valid_end]);
    hs
}

// ============================================================================
// Main Config
// ============================================================================

/// Complete station configuration
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Config {
    /// WiFi connection configuration
    pub wifi: WifiConfig,
    /// Telemetry network configuration
    pub net: NetConfig,
    /// Seven-segment / OLED readout configuration
    pub display: DisplayConfig,
    /// Sensor tuning
    pub sensor: SensorConfig,
}

impl Config {
    /// Set WiFi configuration
    pub fn with_wifi(mut self, wifi: WifiConfig) -> Self {
        self.wifi = wifi;
        self
    }

    /// Set telemetry network configuration
    pub fn with_net(mut self, net: NetConfig) -> Self {
        self.net = net;
        self
    }

    /// Set display configuration
    pub fn with_display(mut self, display: DisplayConfig) -> Self {
        self.display = display;
        self
    }

    /// Set sensor configuration
    pub fn with_sensor(mut self, sensor: SensorConfig) -> Self {
        self.sensor = sensor;
        self
    }
}

// ============================================================================
// WiFi Config
// ============================================================================

/// WiFi connection configuration
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WifiConfig {
    /// WiFi network SSID
    pub ssid: ShortString,
    /// WiFi password
    pub password: ShortString,
    /// Per-attempt connection timeout in milliseconds (0 = no deadline)
    pub connect_timeout_ms: u32,
    /// Maximum connection attempts (0 = keep trying forever)
    pub max_retries: u8,
}

impl Default for WifiConfig {
    fn default() -> Self {
        Self {
            ssid: ShortString::new(),
            password: ShortString::new(),
            connect_timeout_ms: 30_000,
            max_retries: 5,
        }
    }
}

impl WifiConfig {
    /// Set the SSID
    pub fn with_ssid(mut self, ssid: &str) -> Self {
        self.ssid = short_string(ssid);
        self
    }

    /// Set the password
    pub fn with_password(mut self, password: &str) -> Self {
        self.password = short_string(password);
        self
    }

    /// Set the connection timeout
    pub fn with_connect_timeout_ms(mut self, ms: u32) -> Self {
        self.connect_timeout_ms = ms;
        self
    }

    /// Set the maximum retry count
    pub fn with_max_retries(mut self, retries: u8) -> Self {
        self.max_retries = retries;
        self
    }

    /// Check if WiFi credentials are configured
    pub fn is_configured(&self) -> bool {
        !self.ssid.is_empty()
    }

    /// Whether another connection attempt is allowed after `attempts`
    /// failures. With `max_retries` 0 this never gives up.
    pub fn can_retry(&self, attempts: u32) -> bool {
        self.max_retries == 0 || attempts < u32::from(self.max_retries)
    }
}

// ============================================================================
// Net Config
// ============================================================================

/// Telemetry network configuration shared by the plot server and the
/// streaming client.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NetConfig {
    /// Plot server hostname or IP (client side), or bind address (server side)
    pub host: ShortString,
    /// TCP port
    pub port: u16,
    /// Interval between streamed samples in milliseconds
    pub interval_ms: u32,
    /// Greeting line the server sends to a freshly connected client
    pub greeting: LongString,
}

impl Default for NetConfig {
    fn default() -> Self {
        Self {
            host: short_string("0.0.0.0"),
            port: 5000,
            interval_ms: 1000,
            greeting: long_string("Connected to rs-iotlab"),
        }
    }
}

impl NetConfig {
    /// Set the host
    pub fn with_host(mut self, host: &str) -> Self {
        self.host = short_string(host);
        self
    }

    /// Set the port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the streaming interval
    pub fn with_interval_ms(mut self, ms: u32) -> Self {
        self.interval_ms = ms;
        self
    }

    /// Set the server greeting line
    pub fn with_greeting(mut self, greeting: &str) -> Self {
        self.greeting = long_string(greeting);
        self
    }
}

// ============================================================================
// Display Config
// ============================================================================

/// Readout display configuration
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DisplayConfig {
    /// TM1637 brightness level, 0 (dim) to 7 (max)
    pub brightness: u8,
    /// Whether the TM1637 colon segment is lit
    pub colon: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            brightness: 7,
            colon: false,
        }
    }
}

impl DisplayConfig {
    /// Set the brightness level (clamped to 0..=7)
    pub fn with_brightness(mut self, level: u8) -> Self {
        self.brightness = level.min(7);
        self
    }

    /// Set the colon state
    pub fn with_colon(mut self, on: bool) -> Self {
        self.colon = on;
        self
    }
}

// ============================================================================
// Sensor Config
// ============================================================================

/// Sensor tuning parameters
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SensorConfig {
    /// SHT3x I2C address (0x45 with the ADDR pin high, 0x44 low)
    pub sht3x_address: u8,
    /// SHT3x single-shot measurement repeatability
    pub sht3x_repeatability: Repeatability,
    /// BH1750 measurement-time register value (31..=254)
    pub bh1750_mtreg: u8,
    /// TCS3200 gate time in milliseconds for one frequency measurement
    pub tcs_gate_ms: u32,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            sht3x_address: 0x45,
            sht3x_repeatability: Repeatability::High,
            bh1750_mtreg: 69,
            tcs_gate_ms: 100,
        }
    }
}

impl SensorConfig {
    /// Set the SHT3x I2C address
    pub fn with_sht3x_address(mut self, address: u8) -> Self {
        self.sht3x_address = address;
        self
    }

    /// Set the SHT3x measurement repeatability
    pub fn with_sht3x_repeatability(mut self, repeatability: Repeatability) -> Self {
        self.sht3x_repeatability = repeatability;
        self
    }

    /// Set the BH1750 measurement time register (clamped to 31..=254)
    pub fn with_bh1750_mtreg(mut self, mtreg: u8) -> Self {
        self.bh1750_mtreg = mtreg.clamp(31, 254);
        self
    }

    /// Set the TCS3200 gate time
    pub fn with_tcs_gate_ms(mut self, ms: u32) -> Self {
        self.tcs_gate_ms = ms;
        self
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.net.port, 5000);
        assert_eq!(config.net.interval_ms, 1000);
        assert_eq!(config.display.brightness, 7);
        assert_eq!(config.sensor.sht3x_address, 0x45);
    }

    #[test]
    fn builder_pattern() {
        let config = Config::default()
            .with_net(NetConfig::default().with_host("plot.local").with_port(5050))
            .with_display(DisplayConfig::default().with_brightness(2).with_colon(true))
            .with_sensor(SensorConfig::default().with_sht3x_address(0x44));

        assert_eq!(config.net.host.as_str(), "plot.local");
        assert_eq!(config.net.port, 5050);
        assert_eq!(config.display.brightness, 2);
        assert!(config.display.colon);
        assert_eq!(config.sensor.sht3x_address, 0x44);
    }

    // =========================================================================
    // WifiConfig Tests
    // =========================================================================

    #[test]
    fn wifi_config_default() {
        let wifi = WifiConfig::default();
        assert!(wifi.ssid.is_empty());
        assert!(wifi.password.is_empty());
        assert_eq!(wifi.connect_timeout_ms, 30_000);
        assert_eq!(wifi.max_retries, 5);
    }

    #[test]
    fn wifi_config_is_configured() {
        let unconfigured = WifiConfig::default();
        assert!(!unconfigured.is_configured());

        let configured = WifiConfig::default().with_ssid("MyNetwork");
        assert!(configured.is_configured());

        let empty_ssid = WifiConfig::default().with_ssid("");
        assert!(!empty_ssid.is_configured());
    }

    #[test]
    fn wifi_config_builder() {
        let wifi = WifiConfig::default()
            .with_ssid("TestNetwork")
            .with_password("secret123")
            .with_connect_timeout_ms(15_000)
            .with_max_retries(3);

        assert_eq!(wifi.ssid.as_str(), "TestNetwork");
        assert_eq!(wifi.password.as_str(), "secret123");
        assert_eq!(wifi.connect_timeout_ms, 15_000);
        assert_eq!(wifi.max_retries, 3);
    }

    #[test]
    fn wifi_retry_budget() {
        let wifi = WifiConfig::default().with_max_retries(3);
        assert!(wifi.can_retry(0));
        assert!(wifi.can_retry(2));
        assert!(!wifi.can_retry(3));
        assert!(!wifi.can_retry(4));

        // 0 means never give up
        let persistent = WifiConfig::default().with_max_retries(0);
        assert!(persistent.can_retry(1_000_000));
    }

    // =========================================================================
    // NetConfig Tests
    // =========================================================================

    #[test]
    fn net_config_default() {
        let net = NetConfig::default();
        assert_eq!(net.host.as_str(), "0.0.0.0");
        assert_eq!(net.port, 5000);
        assert_eq!(net.interval_ms, 1000);
        assert_eq!(net.greeting.as_str(), "Connected to rs-iotlab");
    }

    #[test]
    fn net_config_builder() {
        let net = NetConfig::default()
            .with_host("192.168.1.50")
            .with_port(5001)
            .with_interval_ms(250)
            .with_greeting("hello");

        assert_eq!(net.host.as_str(), "192.168.1.50");
        assert_eq!(net.port, 5001);
        assert_eq!(net.interval_ms, 250);
        assert_eq!(net.greeting.as_str(), "hello");
    }

    // =========================================================================
    // DisplayConfig Tests
    // =========================================================================

    #[test]
    fn display_brightness_clamped() {
        let display = DisplayConfig::default().with_brightness(12);
        assert_eq!(display.brightness, 7);
    }

    // =========================================================================
    // SensorConfig Tests
    // =========================================================================

    #[test]
    fn sensor_config_default() {
        let sensor = SensorConfig::default();
        assert_eq!(sensor.sht3x_address, 0x45);
        assert_eq!(sensor.sht3x_repeatability, Repeatability::High);
        assert_eq!(sensor.bh1750_mtreg, 69);
        assert_eq!(sensor.tcs_gate_ms, 100);
    }

    #[test]
    fn sensor_repeatability_builder() {
        let sensor = SensorConfig::default().with_sht3x_repeatability(Repeatability::Low);
        assert_eq!(sensor.sht3x_repeatability, Repeatability::Low);
    }

    #[test]
    fn sensor_mtreg_clamped() {
        assert_eq!(SensorConfig::default().with_bh1750_mtreg(10).bh1750_mtreg, 31);
        assert_eq!(SensorConfig::default().with_bh1750_mtreg(255).bh1750_mtreg, 254);
    }

    // =========================================================================
    // String Helper Tests
    // =========================================================================

    #[test]
    fn short_string_truncation() {
        let long_input = "a".repeat(100);
        let s = short_string(&long_input);
        assert!(s.len() <= MAX_SHORT_STRING);
    }

    #[test]
    fn long_string_truncation() {
        let long_input = "b".repeat(200);
        let s = long_string(&long_input);
        assert!(s.len() <= MAX_LONG_STRING);
    }

    #[test]
    fn string_helpers_utf8_boundary() {
        // Multi-byte UTF-8 characters must not be split
        let input = "°C°F°K".repeat(20);
        let s = short_string(&input);
        assert!(s.len() <= MAX_SHORT_STRING);
        assert!(core::str::from_utf8(s.as_bytes()).is_ok());
    }

    #[test]
    fn short_string_straddling_character_is_dropped_not_the_whole_string() {
        // 30 three-byte chars = 90 bytes; the 22nd char would straddle
        // the 64-byte capacity, so exactly 21 whole chars (63 bytes) fit.
        let input = "€".repeat(30);
        let s = short_string(&input);
        assert!(!s.is_empty());
        assert_eq!(s.len(), 63);
        assert_eq!(s.chars().count(), 21);
        assert!(s.chars().all(|c| c == '€'));
    }

    #[test]
    fn long_string_straddling_character_is_dropped_not_the_whole_string() {
        // 60 three-byte chars = 180 bytes; 42 whole chars (126 bytes) fit
        // in the 128-byte capacity.
        let input = "€".repeat(60);
        let s = long_string(&input);
        assert!(!s.is_empty());
        assert_eq!(s.len(), 126);
        assert_eq!(s.chars().count(), 42);
    }
}
