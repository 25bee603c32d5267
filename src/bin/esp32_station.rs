//! ESP32 sensor station.
//!
//! The reference station for the course kit: reads the SHT3x once a
//! second, mirrors the temperature on the TM1637, and streams both
//! readings to the PC plot server over WiFi.
//!
//! # Hardware Setup
//!
//! - SHT3x: SDA → GPIO21, SCL → GPIO22
//! - TM1637: CLK → GPIO18, DIO → GPIO19 (pull-up on DIO)
//! - Optional SSD1306 on the same I2C bus (`station` feature)
//!
//! # Build
//!
//! ```bash
//! # Sensors + seven-segment only
//! cargo build --bin esp32_station --features esp32
//!
//! # With WiFi streaming
//! WIFI_SSID=lab WIFI_PASSWORD=secret PLOT_HOST=192.168.1.10 \
//!     cargo build --bin esp32_station --features wifi
//!
//! # Full station (WiFi + OLED readout)
//! cargo build --bin esp32_station --features station
//! ```

use std::io::{BufRead, BufReader, Write};
use std::net::TcpStream;
use std::thread;
use std::time::Duration;

use esp_idf_hal::delay::Delay;
use esp_idf_hal::gpio::PinDriver;
use esp_idf_hal::i2c::{I2cConfig, I2cDriver};
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_hal::prelude::*;

use rs_iotlab::drivers::sht3x::Sht3x;
use rs_iotlab::telemetry::Sample;
use rs_iotlab::{Config, NetConfig, Tm1637, WifiConfig};

fn main() -> anyhow::Result<()> {
    // Initialize ESP-IDF
    esp_idf_hal::sys::link_patches();

    println!();
    println!("================================");
    println!("  rs-iotlab Sensor Station");
    println!("================================");
    println!();

    // =========================================================================
    // Configuration
    // =========================================================================
    let config = Config::default()
        .with_wifi(
            WifiConfig::default()
                .with_ssid(option_env!("WIFI_SSID").unwrap_or(""))
                .with_password(option_env!("WIFI_PASSWORD").unwrap_or("")),
        )
        .with_net(
            NetConfig::default()
                .with_host(option_env!("PLOT_HOST").unwrap_or(""))
                .with_port(
                    option_env!("PLOT_PORT")
                        .and_then(|p| p.parse().ok())
                        .unwrap_or(5000),
                ),
        );

    let peripherals = Peripherals::take()?;

    // =========================================================================
    // Initialize SHT3x (I2C on GPIO21/22)
    // =========================================================================
    let i2c = I2cDriver::new(
        peripherals.i2c0,
        peripherals.pins.gpio21, // SDA
        peripherals.pins.gpio22, // SCL
        &I2cConfig::new().baudrate(100.kHz().into()),
    )?;
    let mut sht = Sht3x::new(i2c, Delay::new_default(), config.sensor.sht3x_address);
    println!("[OK] SHT3x initialized (GPIO21/22 I2C)");

    // =========================================================================
    // Initialize TM1637 (GPIO18/19)
    // =========================================================================
    let clk = PinDriver::output(peripherals.pins.gpio18)?;
    let dio = PinDriver::input_output_od(peripherals.pins.gpio19)?;
    let mut readout = Tm1637::new(clk, dio, Delay::new_default());
    readout
        .set_brightness(config.display.brightness)
        .map_err(|e| anyhow::anyhow!("TM1637 init failed: {:?}", e))?;
    readout
        .clear()
        .map_err(|e| anyhow::anyhow!("TM1637 clear failed: {:?}", e))?;
    println!("[OK] TM1637 initialized (GPIO18/19)");

    // =========================================================================
    // Initialize OLED readout (same I2C bus) - Optional
    // =========================================================================
    #[cfg(feature = "display")]
    let mut oled = {
        use rs_iotlab::hal::esp32::Esp32Readout;
        use rs_iotlab::traits::ReadoutDisplay;

        let i2c = I2cDriver::new(
            peripherals.i2c1,
            peripherals.pins.gpio25, // SDA
            peripherals.pins.gpio26, // SCL
            &I2cConfig::new().baudrate(400.kHz().into()),
        )?;
        let mut oled = Esp32Readout::new(i2c);
        oled.init()
            .map_err(|e| anyhow::anyhow!("OLED init failed: {:?}", e))?;
        let _ = oled.show_message("rs-iotlab", Some("Starting..."));
        println!("[OK] OLED initialized (GPIO25/26 I2C)");
        oled
    };

    // =========================================================================
    // Initialize WiFi
    // =========================================================================
    #[cfg(feature = "wifi")]
    let _wifi = {
        use esp_idf_svc::eventloop::EspSystemEventLoop;
        use esp_idf_svc::nvs::EspDefaultNvsPartition;
        use rs_iotlab::hal::esp32::Esp32Wifi;

        if config.wifi.is_configured() {
            let sysloop = EspSystemEventLoop::take()?;
            let nvs = EspDefaultNvsPartition::take()?;
            let wifi = Esp32Wifi::new(peripherals.modem, sysloop, Some(nvs), &config.wifi)?;
            println!("[OK] WiFi connected: {:?}", wifi.ip_addr());
            Some(wifi)
        } else {
            println!("[SKIP] WiFi not configured (set WIFI_SSID/WIFI_PASSWORD)");
            None
        }
    };

    // =========================================================================
    // Connect to the plot server
    // =========================================================================
    let mut plot = if config.net.host.is_empty() {
        println!("[SKIP] No plot server configured (set PLOT_HOST)");
        None
    } else {
        let addr = format!("{}:{}", config.net.host, config.net.port);
        match TcpStream::connect(&addr) {
            Ok(stream) => {
                let mut reader = BufReader::new(stream);
                let mut greeting = String::new();
                reader.read_line(&mut greeting)?;
                println!("[OK] Plot server says: {}", greeting.trim_end());
                Some(reader.into_inner())
            }
            Err(e) => {
                println!("[WARN] Plot server at {} unreachable: {}", addr, e);
                None
            }
        }
    };

    println!();
    println!("Streaming one sample per second...");
    println!();

    // =========================================================================
    // Main Loop (1 Hz)
    // =========================================================================
    loop {
        let measurement = match sht.measure(config.sensor.sht3x_repeatability) {
            Ok(m) => m,
            Err(e) => {
                println!("[WARN] SHT3x read failed: {:?}", e);
                thread::sleep(Duration::from_millis(u64::from(config.net.interval_ms)));
                continue;
            }
        };

        let mut sample = Sample::new();
        let _ = sample.push("temperature", measurement.temperature);
        let _ = sample.push("humidity", measurement.humidity);

        println!(
            "T: {:.2} C  RH: {:.2} %",
            measurement.temperature, measurement.humidity
        );

        // Seven-segment shows tenths of a degree: 23.5 C reads "235"
        let tenths = (measurement.temperature * 10.0) as i16;
        if let Err(e) = readout.write_dec(tenths.clamp(-999, 9999)) {
            println!("[WARN] TM1637 write failed: {:?}", e);
        }

        #[cfg(feature = "display")]
        {
            use rs_iotlab::traits::ReadoutDisplay;
            let _ = oled.show_sample(&sample);
        }

        let mut connection_lost = false;
        if let Some(ref mut stream) = plot {
            match sample.encode_line() {
                Ok(line) => {
                    if let Err(e) = stream.write_all(line.as_bytes()) {
                        println!("[WARN] Plot server connection lost: {}", e);
                        connection_lost = true;
                    }
                }
                Err(e) => println!("[WARN] Encoding failed: {:?}", e),
            }
        }
        if connection_lost {
            plot = None;
        }

        thread::sleep(Duration::from_millis(u64::from(config.net.interval_ms)));
    }
}
