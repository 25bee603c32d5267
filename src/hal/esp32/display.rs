//! SSD1306 OLED readout for ESP32 stations.
//!
//! Renders the latest telemetry sample as one `label: value` line per
//! reading on a 128x64 OLED, plus short status messages during startup.
//!
//! # Wiring
//!
//! - SDA → GPIO21
//! - SCL → GPIO22
//! - VCC → 3.3V
//! - GND → GND

use core::fmt::Write as _;

use embedded_graphics::{
    mono_font::{ascii::FONT_6X10, MonoTextStyle},
    pixelcolor::BinaryColor,
    prelude::*,
    text::Text,
};
use esp_idf_hal::i2c::I2cDriver;
use ssd1306::{mode::BufferedGraphicsMode, prelude::*, I2CDisplayInterface, Ssd1306};

use crate::telemetry::Sample;
use crate::traits::ReadoutDisplay;

/// SSD1306 display type alias for cleaner code.
type DisplayDriver<'d> = Ssd1306<
    I2CInterface<I2cDriver<'d>>,
    DisplaySize128x64,
    BufferedGraphicsMode<DisplaySize128x64>,
>;

/// Line height for [`FONT_6X10`], with a little leading.
const LINE_HEIGHT: i32 = 12;

/// SSD1306 OLED readout for ESP32.
///
/// # Display Layout
///
/// ```text
/// ┌────────────────────────────┐
/// │ temperature: 23.50         │
/// │ humidity: 47.20            │
/// │ pressure: 1013.25          │
/// │ ...                        │
/// └────────────────────────────┘
/// ```
pub struct Esp32Readout<'d> {
    display: DisplayDriver<'d>,
}

impl<'d> Esp32Readout<'d> {
    /// Creates the readout from an I2C driver configured for the OLED
    /// pins. Call [`init`](ReadoutDisplay::init) before first use.
    pub fn new(i2c: I2cDriver<'d>) -> Self {
        let interface = I2CDisplayInterface::new(i2c);
        let display = Ssd1306::new(interface, DisplaySize128x64, DisplayRotation::Rotate0)
            .into_buffered_graphics_mode();

        Self { display }
    }
}

impl ReadoutDisplay for Esp32Readout<'_> {
    type Error = DisplayError;

    fn init(&mut self) -> Result<(), Self::Error> {
        self.display.init()?;
        self.clear()
    }

    fn clear(&mut self) -> Result<(), Self::Error> {
        self.display.clear(BinaryColor::Off)?;
        self.display.flush()?;
        Ok(())
    }

    fn show_sample(&mut self, sample: &Sample) -> Result<(), Self::Error> {
        self.display.clear(BinaryColor::Off)?;

        let text_style = MonoTextStyle::new(&FONT_6X10, BinaryColor::On);

        // 64 px / 12 px per line: up to 5 readings fit
        for (i, reading) in sample.readings().take(5).enumerate() {
            let mut line: heapless::String<48> = heapless::String::new();
            if write!(line, "{}: {:.2}", reading.label, reading.value).is_err() {
                // Label too long for the buffer; show what fits
                let _ = line.push_str("...");
            }
            let y = LINE_HEIGHT * (i as i32 + 1);
            Text::new(line.as_str(), Point::new(2, y), text_style).draw(&mut self.display)?;
        }

        self.display.flush()?;
        Ok(())
    }

    fn show_message(&mut self, line1: &str, line2: Option<&str>) -> Result<(), Self::Error> {
        self.display.clear(BinaryColor::Off)?;

        let text_style = MonoTextStyle::new(&FONT_6X10, BinaryColor::On);

        Text::new(line1, Point::new(4, 24), text_style).draw(&mut self.display)?;

        if let Some(l2) = line2 {
            Text::new(l2, Point::new(4, 40), text_style).draw(&mut self.display)?;
        }

        self.display.flush()?;
        Ok(())
    }
}

/// Display error type.
#[derive(Debug)]
pub struct DisplayError;

impl From<display_interface::DisplayError> for DisplayError {
    fn from(_: display_interface::DisplayError) -> Self {
        DisplayError
    }
}
