//! TCS3200 color sensor driver.
//!
//! The TCS3200 has no digital bus at all: it outputs a square wave whose
//! frequency tracks light intensity on the currently selected color
//! filter. Reading it therefore takes GPIOs for the filter-select pins
//! plus a [`PulseCounter`] gated over a fixed window to turn edges into a
//! frequency.
//!
//! Raw channel frequencies depend heavily on lighting and distance, so
//! RGB output goes through a two-point [`Calibration`] taken against a
//! black and a white reference card.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;

use crate::traits::PulseCounter;

/// Default gate time for one frequency measurement.
pub const DEFAULT_GATE_MS: u32 = 100;

/// Errors the TCS3200 driver can raise.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Error<PE, CE> {
    /// A GPIO operation failed.
    Pin(PE),
    /// The pulse counter failed.
    Counter(CE),
    /// The operation needs a pin this instance was built without.
    Unsupported,
}

/// Photodiode filter selection (S2/S3).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Channel {
    /// Red filter.
    Red,
    /// Green filter.
    Green,
    /// Blue filter.
    Blue,
    /// No filter.
    Clear,
}

impl Channel {
    /// (S2, S3) levels, true = high.
    fn select(self) -> (bool, bool) {
        match self {
            Channel::Red => (false, false),
            Channel::Blue => (false, true),
            Channel::Green => (true, true),
            Channel::Clear => (true, false),
        }
    }
}

/// Output frequency scaling (S0/S1).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Scaling {
    /// Output disabled, sensor powered down.
    PowerOff,
    /// 2% of full scale.
    TwoPercent,
    /// 20% of full scale (the usual choice for gated counting).
    TwentyPercent,
    /// Full scale, up to ~600 kHz.
    Full,
}

impl Scaling {
    /// (S0, S1) levels, true = high.
    fn select(self) -> (bool, bool) {
        match self {
            Scaling::PowerOff => (false, false),
            Scaling::TwoPercent => (false, true),
            Scaling::TwentyPercent => (true, false),
            Scaling::Full => (true, true),
        }
    }
}

/// Two-point calibration: channel frequencies against black and white
/// reference cards, in R, G, B order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Calibration {
    /// Channel frequencies measured against the black card.
    pub black_hz: [u32; 3],
    /// Channel frequencies measured against the white card.
    pub white_hz: [u32; 3],
}

impl Calibration {
    /// Maps one channel frequency onto 0..=255 by linear interpolation.
    pub fn map(&self, channel_index: usize, hz: u32) -> u8 {
        let black = i64::from(self.black_hz[channel_index]);
        let white = i64::from(self.white_hz[channel_index]);
        if white <= black {
            return 0;
        }
        let v = (i64::from(hz) - black) * 255 / (white - black);
        v.clamp(0, 255) as u8
    }
}

/// A calibrated color reading.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rgb {
    /// Red, 0..=255.
    pub r: u8,
    /// Green, 0..=255.
    pub g: u8,
    /// Blue, 0..=255.
    pub b: u8,
}

/// TCS3200 driver over GPIOs, a pulse counter, and a delay provider.
///
/// S2/S3 (filter select) are required. S0/S1 (scaling) and the
/// white-LED pin are optional; boards often strap them.
pub struct Tcs3200<P, C, D> {
    s2: P,
    s3: P,
    s0: Option<P>,
    s1: Option<P>,
    led: Option<P>,
    counter: C,
    delay: D,
    gate_ms: u32,
}

impl<P, C, D, PE> Tcs3200<P, C, D>
where
    P: OutputPin<Error = PE>,
    C: PulseCounter,
    D: DelayNs,
{
    /// Creates the driver with filter-select pins only and the default
    /// gate time.
    pub fn new(s2: P, s3: P, counter: C, delay: D) -> Self {
        Self {
            s2,
            s3,
            s0: None,
            s1: None,
            led: None,
            counter,
            delay,
            gate_ms: DEFAULT_GATE_MS,
        }
    }

    /// Adds the S0/S1 frequency-scaling pins.
    pub fn with_scaling_pins(mut self, s0: P, s1: P) -> Self {
        self.s0 = Some(s0);
        self.s1 = Some(s1);
        self
    }

    /// Adds the white-LED control pin.
    pub fn with_led_pin(mut self, led: P) -> Self {
        self.led = Some(led);
        self
    }

    /// Sets the gate time for frequency measurements. Longer gates give
    /// better resolution at the cost of slower readings.
    pub fn with_gate_ms(mut self, ms: u32) -> Self {
        self.gate_ms = ms.max(1);
        self
    }

    /// Releases the pins and counter, consuming the driver.
    pub fn release(self) -> (P, P, Option<P>, Option<P>, Option<P>, C) {
        (self.s2, self.s3, self.s0, self.s1, self.led, self.counter)
    }

    /// Sets the output frequency scaling. Needs the S0/S1 pins.
    pub fn set_scaling(&mut self, scaling: Scaling) -> Result<(), Error<PE, C::Error>> {
        let (s0, s1) = match (self.s0.as_mut(), self.s1.as_mut()) {
            (Some(s0), Some(s1)) => (s0, s1),
            _ => return Err(Error::Unsupported),
        };
        let (l0, l1) = scaling.select();
        set_level(s0, l0).map_err(Error::Pin)?;
        set_level(s1, l1).map_err(Error::Pin)?;
        Ok(())
    }

    /// Switches the white illumination LED. Needs the LED pin.
    pub fn set_led(&mut self, on: bool) -> Result<(), Error<PE, C::Error>> {
        let led = self.led.as_mut().ok_or(Error::Unsupported)?;
        set_level(led, on).map_err(Error::Pin)
    }

    /// Measures the output frequency in Hz for one filter channel by
    /// counting edges over the gate window.
    pub fn measure_hz(&mut self, channel: Channel) -> Result<u32, Error<PE, C::Error>> {
        let (l2, l3) = channel.select();
        set_level(&mut self.s2, l2).map_err(Error::Pin)?;
        set_level(&mut self.s3, l3).map_err(Error::Pin)?;

        self.counter.reset().map_err(Error::Counter)?;
        self.delay.delay_ms(self.gate_ms);
        let count = self.counter.count().map_err(Error::Counter)?;

        Ok(count.saturating_mul(1000) / self.gate_ms)
    }

    /// Measures the red, green, and blue channel frequencies.
    ///
    /// Point the sensor at a black or white card to collect the inputs
    /// for a [`Calibration`].
    pub fn measure_rgb_hz(&mut self) -> Result<[u32; 3], Error<PE, C::Error>> {
        Ok([
            self.measure_hz(Channel::Red)?,
            self.measure_hz(Channel::Green)?,
            self.measure_hz(Channel::Blue)?,
        ])
    }

    /// Measures a calibrated RGB color.
    pub fn read_rgb(&mut self, cal: &Calibration) -> Result<Rgb, Error<PE, C::Error>> {
        let hz = self.measure_rgb_hz()?;
        Ok(Rgb {
            r: cal.map(0, hz[0]),
            g: cal.map(1, hz[1]),
            b: cal.map(2, hz[2]),
        })
    }
}

fn set_level<P: OutputPin>(pin: &mut P, high: bool) -> Result<(), P::Error> {
    if high {
        pin.set_high()
    } else {
        pin.set_low()
    }
}
