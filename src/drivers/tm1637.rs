//! TM1637 4-digit seven-segment display driver.
//!
//! The TM1637 speaks a two-wire protocol that looks like I2C but is not:
//! there is no device address, bytes go out LSB first, and the chip pulls
//! DIO low for one clock to acknowledge each byte. Because no I2C
//! peripheral can produce that framing, the driver bit-bangs two GPIOs.
//!
//! DIO is driven open-drain with an external pull-up, so the pin type must
//! implement both [`OutputPin`] and [`InputPin`]: the driver releases the
//! line (drives it high) to sample the chip's acknowledge bit.
//!
//! # Example
//!
//! ```rust
//! use rs_iotlab::drivers::tm1637::Tm1637;
//! use embedded_hal_mock::eh1::delay::NoopDelay;
//! # use embedded_hal_mock::eh1::digital::{Mock as PinMock, Transaction, State};
//! # let clk = PinMock::new(&[] as &[Transaction]);
//! # let dio = PinMock::new(&[] as &[Transaction]);
//!
//! let mut display = Tm1637::new(clk, dio, NoopDelay);
//! // display.write_dec(1234)?;
//! # let (mut clk, mut dio) = display.release();
//! # clk.done(); dio.done();
//! ```

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};

/// Half-period of the bit-banged clock in microseconds.
///
/// The chip tops out at 250 kHz; 50 us per phase keeps it well inside
/// spec even through long jumper wires.
const DELAY_US: u32 = 50;

/// Data command: write with auto-incrementing address.
const CMD_DATA_AUTO: u8 = 0x40;
/// Address command base; OR in the grid position (0..=3).
const CMD_ADDR: u8 = 0xC0;
/// Display control base: display off, brightness ignored.
const CMD_DISPLAY_OFF: u8 = 0x80;
/// Display control base: display on; OR in the brightness (0..=7).
const CMD_DISPLAY_ON: u8 = 0x88;

/// Segment pattern for a minus sign (segment G only).
pub const SEG_MINUS: u8 = 0x40;

/// Segment pattern for a blank cell.
pub const SEG_BLANK: u8 = 0x00;

/// Colon bit. The module's colon LEDs are wired to the high bit of the
/// second grid, so OR this into the segment byte at position 1.
pub const SEG_COLON: u8 = 0x80;

/// Segment patterns for hex digits 0..=F.
pub const DIGITS: [u8; 16] = [
    0x3f, 0x06, 0x5b, 0x4f, 0x66, 0x6d, 0x7d, 0x07, // 0-7
    0x7f, 0x6f, 0x77, 0x7c, 0x39, 0x5e, 0x79, 0x71, // 8-F
];

/// Number of display cells on the module.
pub const WIDTH: u8 = 4;

/// Segment pattern for a hex digit, or `None` above 0xF.
pub fn encode_digit(value: u8) -> Option<u8> {
    DIGITS.get(value as usize).copied()
}

/// Errors the TM1637 driver can raise.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Error<E> {
    /// A GPIO operation failed.
    Pin(E),
    /// The chip did not acknowledge a byte. Usually a wiring problem or
    /// a missing pull-up on DIO.
    Ack,
    /// A value was out of range for the operation (brightness above 7,
    /// digit above 0xF, position past the last cell).
    InvalidValue,
}

/// TM1637 driver over two GPIOs and a delay provider.
///
/// `CLK` only needs push-pull output. `DIO` must read back as well, so
/// the acknowledge bit can be sampled after releasing the line.
pub struct Tm1637<CLK, DIO, D> {
    clk: CLK,
    dio: DIO,
    delay: D,
    brightness: u8,
    on: bool,
    colon: bool,
}

impl<CLK, DIO, D, E> Tm1637<CLK, DIO, D>
where
    CLK: OutputPin<Error = E>,
    DIO: OutputPin<Error = E> + InputPin<Error = E>,
    D: DelayNs,
{
    /// Creates the driver. The display starts logically on at full
    /// brightness; nothing is written to the chip until the first call.
    pub fn new(clk: CLK, dio: DIO, delay: D) -> Self {
        Self {
            clk,
            dio,
            delay,
            brightness: 7,
            on: true,
            colon: false,
        }
    }

    /// Releases the pins, consuming the driver.
    pub fn release(self) -> (CLK, DIO) {
        (self.clk, self.dio)
    }

    /// Turns the display on at the stored brightness.
    pub fn display_on(&mut self) -> Result<(), Error<E>> {
        self.on = true;
        self.push_display_control()
    }

    /// Turns the display off. Segment memory is retained.
    pub fn display_off(&mut self) -> Result<(), Error<E>> {
        self.on = false;
        self.push_display_control()
    }

    /// Sets the brightness level, 0 (dim) to 7 (max).
    pub fn set_brightness(&mut self, level: u8) -> Result<(), Error<E>> {
        if level > 7 {
            return Err(Error::InvalidValue);
        }
        self.brightness = level;
        self.push_display_control()
    }

    /// Sets whether the colon is lit on subsequent segment writes.
    pub fn set_colon(&mut self, on: bool) {
        self.colon = on;
    }

    /// Writes raw segment bytes starting at `position` (0..=3).
    ///
    /// The colon bit is OR'ed into position 1 if the colon is enabled.
    pub fn write_segments(&mut self, position: u8, segments: &[u8]) -> Result<(), Error<E>> {
        if position >= WIDTH || segments.len() > (WIDTH - position) as usize {
            return Err(Error::InvalidValue);
        }
        self.write_raw(position, segments, self.colon)
    }

    /// Writes one digit (0..=0xF) at `position`.
    pub fn write_digit(&mut self, position: u8, digit: u8) -> Result<(), Error<E>> {
        let seg = encode_digit(digit).ok_or(Error::InvalidValue)?;
        self.write_segments(position, &[seg])
    }

    /// Shows a 16-bit value as four hex digits, leading zeros included.
    pub fn write_hex(&mut self, value: u16) -> Result<(), Error<E>> {
        let mut segs = [SEG_BLANK; WIDTH as usize];
        for (i, seg) in segs.iter_mut().enumerate() {
            let nibble = (value >> (12 - 4 * i)) & 0xF;
            *seg = DIGITS[nibble as usize];
        }
        self.write_segments(0, &segs)
    }

    /// Shows a decimal number, right-aligned with blank padding.
    ///
    /// Accepts -999..=9999; anything wider than four cells is an error.
    pub fn write_dec(&mut self, value: i16) -> Result<(), Error<E>> {
        if !(-999..=9999).contains(&value) {
            return Err(Error::InvalidValue);
        }
        let mut segs = [SEG_BLANK; WIDTH as usize];
        let mut n = value.unsigned_abs();
        let mut idx = segs.len();
        loop {
            idx -= 1;
            segs[idx] = DIGITS[(n % 10) as usize];
            n /= 10;
            if n == 0 {
                break;
            }
        }
        if value < 0 {
            idx -= 1;
            segs[idx] = SEG_MINUS;
        }
        self.write_segments(0, &segs)
    }

    /// Blanks all four cells and the colon.
    pub fn clear(&mut self) -> Result<(), Error<E>> {
        self.write_raw(0, &[SEG_BLANK; WIDTH as usize], false)
    }

    fn write_raw(&mut self, position: u8, segments: &[u8], colon: bool) -> Result<(), Error<E>> {
        self.command(CMD_DATA_AUTO)?;

        self.start()?;
        self.write_byte(CMD_ADDR | position)?;
        for (i, seg) in segments.iter().enumerate() {
            let mut byte = *seg;
            if colon && position + i as u8 == 1 {
                byte |= SEG_COLON;
            }
            self.write_byte(byte)?;
        }
        self.stop()?;

        self.push_display_control()
    }

    fn push_display_control(&mut self) -> Result<(), Error<E>> {
        let byte = if self.on {
            CMD_DISPLAY_ON | self.brightness
        } else {
            CMD_DISPLAY_OFF
        };
        self.command(byte)
    }

    fn command(&mut self, byte: u8) -> Result<(), Error<E>> {
        self.start()?;
        self.write_byte(byte)?;
        self.stop()
    }

    /// Start condition: DIO falls while CLK is high.
    fn start(&mut self) -> Result<(), Error<E>> {
        self.dio.set_high().map_err(Error::Pin)?;
        self.clk.set_high().map_err(Error::Pin)?;
        self.delay.delay_us(DELAY_US);
        self.dio.set_low().map_err(Error::Pin)?;
        self.delay.delay_us(DELAY_US);
        Ok(())
    }

    /// Stop condition: DIO rises while CLK is high.
    fn stop(&mut self) -> Result<(), Error<E>> {
        self.clk.set_low().map_err(Error::Pin)?;
        self.delay.delay_us(DELAY_US);
        self.dio.set_low().map_err(Error::Pin)?;
        self.delay.delay_us(DELAY_US);
        self.clk.set_high().map_err(Error::Pin)?;
        self.delay.delay_us(DELAY_US);
        self.dio.set_high().map_err(Error::Pin)?;
        self.delay.delay_us(DELAY_US);
        Ok(())
    }

    /// Clocks one byte out LSB first, then samples the acknowledge bit.
    fn write_byte(&mut self, byte: u8) -> Result<(), Error<E>> {
        for i in 0..8 {
            self.clk.set_low().map_err(Error::Pin)?;
            self.delay.delay_us(DELAY_US);
            if byte & (1 << i) != 0 {
                self.dio.set_high().map_err(Error::Pin)?;
            } else {
                self.dio.set_low().map_err(Error::Pin)?;
            }
            self.delay.delay_us(DELAY_US);
            self.clk.set_high().map_err(Error::Pin)?;
            self.delay.delay_us(DELAY_US);
        }

        // Ninth clock: release DIO and let the chip pull it low.
        self.clk.set_low().map_err(Error::Pin)?;
        self.dio.set_high().map_err(Error::Pin)?;
        self.delay.delay_us(DELAY_US);
        self.clk.set_high().map_err(Error::Pin)?;
        self.delay.delay_us(DELAY_US);
        if self.dio.is_high().map_err(Error::Pin)? {
            return Err(Error::Ack);
        }
        Ok(())
    }
}
