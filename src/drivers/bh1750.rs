//! BH1750 ambient light sensor driver.
//!
//! The chip is command-driven: one opcode byte selects power state,
//! resolution mode, or measurement time, and results are read back as a
//! big-endian 16-bit word. Sensitivity is tuned through the measurement
//! time register (MTreg); the driver scales both the conversion wait and
//! the lux math accordingly.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

/// I2C address with the ADDR pin low (course breakout default).
pub const ADDR_LOW: u8 = 0x23;

/// I2C address with the ADDR pin high.
pub const ADDR_HIGH: u8 = 0x5C;

/// Default measurement time register value (datasheet typical).
pub const MTREG_DEFAULT: u8 = 69;

/// Valid MTreg range.
pub const MTREG_RANGE: core::ops::RangeInclusive<u8> = 31..=254;

const CMD_POWER_DOWN: u8 = 0x00;
const CMD_POWER_ON: u8 = 0x01;
const CMD_RESET: u8 = 0x07;
const CMD_MTREG_HIGH: u8 = 0x40; // OR in MTreg[7:5]
const CMD_MTREG_LOW: u8 = 0x60; // OR in MTreg[4:0]

/// Errors the BH1750 driver can raise.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Error<E> {
    /// An I2C transaction failed.
    I2c(E),
    /// MTreg value outside 31..=254.
    InvalidMtreg,
}

/// Resolution modes. Continuous modes keep converting after the first
/// result; one-time modes power the chip down afterwards.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Mode {
    /// 1 lx resolution, continuous.
    ContinuousHighRes = 0x10,
    /// 0.5 lx resolution, continuous.
    ContinuousHighRes2 = 0x11,
    /// 4 lx resolution, continuous, fastest.
    ContinuousLowRes = 0x13,
    /// 1 lx resolution, single conversion.
    OneTimeHighRes = 0x20,
    /// 0.5 lx resolution, single conversion.
    OneTimeHighRes2 = 0x21,
    /// 4 lx resolution, single conversion.
    OneTimeLowRes = 0x23,
}

impl Mode {
    fn is_low_res(self) -> bool {
        self as u8 & 0x03 == 0x03
    }

    fn is_high_res2(self) -> bool {
        self as u8 & 0x03 == 0x01
    }

    /// Conversion time at the default MTreg, in milliseconds.
    fn base_wait_ms(self) -> u32 {
        if self.is_low_res() {
            24
        } else {
            180
        }
    }
}

/// BH1750 driver over an I2C bus and a delay provider.
pub struct Bh1750<I2C, D> {
    i2c: I2C,
    delay: D,
    address: u8,
    mtreg: u8,
}

impl<I2C, D, E> Bh1750<I2C, D>
where
    I2C: I2c<Error = E>,
    D: DelayNs,
{
    /// Creates the driver for the sensor at `address` ([`ADDR_LOW`] or
    /// [`ADDR_HIGH`]), assuming the default MTreg.
    pub fn new(i2c: I2C, delay: D, address: u8) -> Self {
        Self {
            i2c,
            delay,
            address,
            mtreg: MTREG_DEFAULT,
        }
    }

    /// Releases the bus, consuming the driver.
    pub fn release(self) -> I2C {
        self.i2c
    }

    /// Wakes the chip from power-down.
    pub fn power_on(&mut self) -> Result<(), Error<E>> {
        self.command(CMD_POWER_ON)
    }

    /// Puts the chip into its low-power state.
    pub fn power_down(&mut self) -> Result<(), Error<E>> {
        self.command(CMD_POWER_DOWN)
    }

    /// Clears the data register. The chip must be powered on.
    pub fn reset(&mut self) -> Result<(), Error<E>> {
        self.command(CMD_RESET)
    }

    /// Sets the measurement time register (31..=254). Larger values
    /// trade conversion time for sensitivity.
    pub fn set_mtreg(&mut self, mtreg: u8) -> Result<(), Error<E>> {
        if !MTREG_RANGE.contains(&mtreg) {
            return Err(Error::InvalidMtreg);
        }
        self.command(CMD_MTREG_HIGH | (mtreg >> 5))?;
        self.command(CMD_MTREG_LOW | (mtreg & 0x1F))?;
        self.mtreg = mtreg;
        Ok(())
    }

    /// Runs one conversion in `mode`, blocking for the conversion time,
    /// and returns illuminance in lux.
    pub fn measure(&mut self, mode: Mode) -> Result<f32, Error<E>> {
        self.start(mode)?;
        self.delay.delay_ms(self.wait_ms(mode));
        self.read_lux(mode)
    }

    /// Starts a conversion without waiting. Pair with [`read_lux`] after
    /// the conversion time; in continuous modes, keep calling `read_lux`.
    ///
    /// [`read_lux`]: Self::read_lux
    pub fn start(&mut self, mode: Mode) -> Result<(), Error<E>> {
        self.command(mode as u8)
    }

    /// Reads the data register and converts it to lux for `mode`.
    pub fn read_lux(&mut self, mode: Mode) -> Result<f32, Error<E>> {
        let mut buf = [0u8; 2];
        self.i2c.read(self.address, &mut buf).map_err(Error::I2c)?;
        let raw = u16::from_be_bytes(buf);
        Ok(self.convert(raw, mode))
    }

    /// Conversion time for `mode` at the current MTreg, in milliseconds.
    pub fn wait_ms(&self, mode: Mode) -> u32 {
        // Scales linearly with MTreg; round up.
        (mode.base_wait_ms() * u32::from(self.mtreg) + u32::from(MTREG_DEFAULT) - 1)
            / u32::from(MTREG_DEFAULT)
    }

    fn convert(&self, raw: u16, mode: Mode) -> f32 {
        let mut lux = f32::from(raw) / 1.2;
        lux *= f32::from(MTREG_DEFAULT) / f32::from(self.mtreg);
        if mode.is_high_res2() {
            lux /= 2.0;
        }
        lux
    }

    fn command(&mut self, cmd: u8) -> Result<(), Error<E>> {
        self.i2c.write(self.address, &[cmd]).map_err(Error::I2c)
    }
}
