//! Readout display abstraction.

use crate::telemetry::Sample;

/// A display that can render a telemetry sample and short messages.
///
/// Station binaries render the latest readings through this trait so the
/// same loop works with the SSD1306 OLED (`display` feature), the TM1637
/// seven-segment display, or the mock used in tests.
pub trait ReadoutDisplay {
    /// Error type for display operations.
    type Error;

    /// Initialize the display hardware.
    fn init(&mut self) -> Result<(), Self::Error>;

    /// Clear the screen.
    fn clear(&mut self) -> Result<(), Self::Error>;

    /// Render one line per reading in the sample.
    fn show_sample(&mut self, sample: &Sample) -> Result<(), Self::Error>;

    /// Show a short status message (startup, Wi-Fi state, errors).
    fn show_message(&mut self, line1: &str, line2: Option<&str>) -> Result<(), Self::Error>;
}
