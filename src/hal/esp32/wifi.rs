//! WiFi connection management for ESP32 stations.
//!
//! Provides synchronous WiFi station mode connection using esp-idf-svc.
//!
//! # Example
//!
//! ```ignore
//! use rs_iotlab::hal::esp32::Esp32Wifi;
//! use rs_iotlab::config::WifiConfig;
//!
//! let config = WifiConfig::default()
//!     .with_ssid("MyNetwork")
//!     .with_password("secret123");
//!
//! let wifi = Esp32Wifi::new(modem, sysloop, nvs, &config)?;
//! // WiFi is now connected and has an IP address
//! println!("IP: {:?}", wifi.ip_addr());
//! ```

use crate::config::WifiConfig;
use esp_idf_hal::modem::Modem;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::wifi::{BlockingWifi, ClientConfiguration, Configuration, EspWifi};
use std::net::Ipv4Addr;
use std::thread;
use std::time::{Duration, Instant};

const CONNECT_POLL_MS: u64 = 250;

/// WiFi connection manager for ESP32.
///
/// Manages a station-mode WiFi connection. The connection is established
/// during construction and maintained for the lifetime of this struct.
pub struct Esp32Wifi<'a> {
    wifi: BlockingWifi<EspWifi<'a>>,
}

impl<'a> Esp32Wifi<'a> {
    /// Create a new WiFi connection.
    ///
    /// This will:
    /// 1. Initialize the WiFi driver
    /// 2. Configure station mode with the provided credentials
    /// 3. Connect to the access point, retrying up to
    ///    `config.max_retries` times (0 = keep trying forever)
    /// 4. Wait for DHCP to assign an IP address, bounded per attempt by
    ///    `config.connect_timeout_ms` (0 = no deadline)
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - WiFi initialization fails
    /// - Connection to AP fails on every allowed attempt
    /// - DHCP times out on every allowed attempt
    pub fn new(
        modem: Modem,
        sysloop: EspSystemEventLoop,
        nvs: Option<EspDefaultNvsPartition>,
        config: &WifiConfig,
    ) -> anyhow::Result<Self> {
        let esp_wifi = EspWifi::new(modem, sysloop.clone(), nvs)?;
        let mut wifi = BlockingWifi::wrap(esp_wifi, sysloop)?;

        // Configure station mode
        let ssid = config.ssid.as_str();
        let password = config.password.as_str();

        // esp-idf wants its own fixed-capacity strings
        let mut ssid_buf: heapless::String<32> = heapless::String::new();
        let _ = ssid_buf.push_str(ssid);

        let mut pass_buf: heapless::String<64> = heapless::String::new();
        let _ = pass_buf.push_str(password);

        wifi.set_configuration(&Configuration::Client(ClientConfiguration {
            ssid: ssid_buf,
            password: pass_buf,
            ..Default::default()
        }))?;

        println!("[WiFi] Starting...");
        wifi.start()?;

        let mut attempts: u32 = 0;
        loop {
            attempts += 1;
            println!("[WiFi] Connecting to '{}' (attempt {})...", ssid, attempts);
            match Self::connect_once(&mut wifi, config.connect_timeout_ms) {
                Ok(()) => break,
                Err(e) if config.can_retry(attempts) => {
                    println!("[WiFi] Attempt {} failed: {}; retrying", attempts, e);
                    let _ = wifi.disconnect();
                }
                Err(e) => {
                    return Err(e.context(format!(
                        "WiFi connect to '{}' failed after {} attempt(s)",
                        ssid, attempts
                    )));
                }
            }
        }

        if let Ok(ip_info) = wifi.wifi().sta_netif().get_ip_info() {
            println!("[WiFi] Connected! IP: {}", ip_info.ip);
        }

        Ok(Self { wifi })
    }

    /// One connect attempt: kick off the association, then poll for link
    /// and DHCP within the deadline. `timeout_ms` 0 waits indefinitely.
    fn connect_once(wifi: &mut BlockingWifi<EspWifi<'a>>, timeout_ms: u32) -> anyhow::Result<()> {
        wifi.wifi_mut().connect()?;

        println!("[WiFi] Waiting for DHCP...");
        let deadline = if timeout_ms > 0 {
            Some(Instant::now() + Duration::from_millis(u64::from(timeout_ms)))
        } else {
            None
        };

        loop {
            if wifi.is_connected()? && wifi.wifi().sta_netif().is_up()? {
                return Ok(());
            }
            if let Some(deadline) = deadline {
                if Instant::now() >= deadline {
                    anyhow::bail!("no IP address within {} ms", timeout_ms);
                }
            }
            thread::sleep(Duration::from_millis(CONNECT_POLL_MS));
        }
    }

    /// Get the current IP address, if connected.
    pub fn ip_addr(&self) -> Option<Ipv4Addr> {
        self.wifi
            .wifi()
            .sta_netif()
            .get_ip_info()
            .ok()
            .map(|info| info.ip)
    }

    /// Check if WiFi is connected.
    pub fn is_connected(&self) -> bool {
        self.wifi.is_connected().unwrap_or(false)
    }

    /// Disconnect from the current network.
    pub fn disconnect(&mut self) -> anyhow::Result<()> {
        self.wifi.disconnect()?;
        Ok(())
    }
}
