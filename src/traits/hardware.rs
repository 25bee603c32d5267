//! Hardware abstraction traits that `embedded-hal` does not cover.
//!
//! Most of the drivers in this crate talk to their chip through plain
//! `embedded-hal` I2C, pin, and delay traits. The one thing the course
//! hardware needs beyond that is edge counting: the TCS3200 color sensor
//! reports light intensity as a square-wave frequency, so reading it means
//! counting rising edges over a fixed gate time.
//!
//! # Implementation
//!
//! For testing and desktop development, use [`MockPulseCounter`] from
//! [`crate::hal::mock`]. On ESP32 hardware the PCNT peripheral does the
//! counting (requires the `esp32` feature).
//!
//! [`MockPulseCounter`]: crate::hal::mock::MockPulseCounter

/// Rising-edge counter for frequency-output sensors.
///
/// Implementations count rising edges on an input line between a
/// [`reset`](Self::reset) and a [`count`](Self::count) call. The TCS3200
/// driver pairs this with a delay to gate the count over a fixed window
/// and derive a frequency.
///
/// # Implementation Notes
///
/// - `count` must return edges accumulated since the last `reset`
/// - Counting continues across `count` calls; only `reset` clears it
/// - Hardware counters with a limited range should saturate rather
///   than wrap
pub trait PulseCounter {
    /// Error type for counter operations.
    type Error;

    /// Clear the accumulated count and start counting from zero.
    fn reset(&mut self) -> Result<(), Self::Error>;

    /// Return the number of rising edges seen since the last reset.
    fn count(&mut self) -> Result<u32, Self::Error>;
}
