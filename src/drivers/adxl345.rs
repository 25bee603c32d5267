//! ADXL345 3-axis accelerometer driver.
//!
//! Covers what the lab stations use: device probe, range and resolution
//! selection, measurement mode, axis offsets, and burst axis reads. The
//! chip powers up in standby, so call [`Adxl345::start_measurement`]
//! before expecting data.

use embedded_hal::i2c::I2c;

/// I2C address with the ALT ADDRESS pin low (course breakout default).
pub const ADDRESS: u8 = 0x53;

/// I2C address with the ALT ADDRESS pin high.
pub const ADDRESS_ALT: u8 = 0x1D;

const REG_DEVID: u8 = 0x00;
const REG_THRESH_TAP: u8 = 0x1D;
const REG_OFSX: u8 = 0x1E;
const REG_POWER_CTL: u8 = 0x2D;
const REG_DATA_FORMAT: u8 = 0x31;
const REG_DATAX0: u8 = 0x32;

const DEVID: u8 = 0xE5;
const POWER_CTL_MEASURE: u8 = 0x08;
const DATA_FORMAT_FULL_RES: u8 = 0x08;
const DATA_FORMAT_RANGE_MASK: u8 = 0x03;

/// g per LSB in full resolution mode (and at +/- 2 g fixed).
const SCALE_FULL_RES: f32 = 0.0039;
/// g per LSB for the offset registers.
const SCALE_OFFSET: f32 = 0.0156;
/// g per LSB for the tap threshold register.
const SCALE_THRESH: f32 = 0.0625;

/// Errors the ADXL345 driver can raise.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Error<E> {
    /// An I2C transaction failed.
    I2c(E),
    /// The DEVID register did not read 0xE5.
    BadChipId(u8),
    /// A threshold or offset was outside the register's range.
    InvalidValue,
}

/// Measurement range.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Range {
    /// +/- 2 g
    G2 = 0b00,
    /// +/- 4 g
    G4 = 0b01,
    /// +/- 8 g
    G8 = 0b10,
    /// +/- 16 g
    G16 = 0b11,
}

impl Range {
    /// g per LSB at this range in fixed 10-bit mode.
    fn fixed_scale(self) -> f32 {
        match self {
            Range::G2 => 0.0039,
            Range::G4 => 0.0078,
            Range::G8 => 0.0156,
            Range::G16 => 0.0312,
        }
    }
}

/// One acceleration measurement.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Acceleration {
    /// Raw axis counts.
    pub raw: [i16; 3],
    /// Acceleration in g, same axis order.
    pub g: [f32; 3],
}

/// ADXL345 driver over an I2C bus.
pub struct Adxl345<I2C> {
    i2c: I2C,
    address: u8,
    range: Range,
    full_res: bool,
}

impl<I2C, E> Adxl345<I2C>
where
    I2C: I2c<Error = E>,
{
    /// Verifies the device ID at `address` ([`ADDRESS`] or
    /// [`ADDRESS_ALT`]). The chip stays in standby.
    pub fn probe(i2c: I2C, address: u8) -> Result<Self, Error<E>> {
        let mut this = Self {
            i2c,
            address,
            range: Range::G2,
            full_res: false,
        };

        let mut id = [0u8; 1];
        this.i2c
            .write_read(address, &[REG_DEVID], &mut id)
            .map_err(Error::I2c)?;
        if id[0] != DEVID {
            return Err(Error::BadChipId(id[0]));
        }
        Ok(this)
    }

    /// Releases the bus, consuming the driver.
    pub fn release(self) -> I2C {
        self.i2c
    }

    /// Selects the range and resolution mode. In full resolution the
    /// scale stays at 3.9 mg/LSB and the bit depth grows with the range.
    pub fn set_range(&mut self, range: Range, full_res: bool) -> Result<(), Error<E>> {
        let bits = (range as u8) | if full_res { DATA_FORMAT_FULL_RES } else { 0 };
        self.modify_register(
            REG_DATA_FORMAT,
            DATA_FORMAT_RANGE_MASK | DATA_FORMAT_FULL_RES,
            bits,
        )?;
        self.range = range;
        self.full_res = full_res;
        Ok(())
    }

    /// Leaves standby and starts converting.
    pub fn start_measurement(&mut self) -> Result<(), Error<E>> {
        self.modify_register(REG_POWER_CTL, POWER_CTL_MEASURE, POWER_CTL_MEASURE)
    }

    /// Returns to standby.
    pub fn stop_measurement(&mut self) -> Result<(), Error<E>> {
        self.modify_register(REG_POWER_CTL, POWER_CTL_MEASURE, 0)
    }

    /// Reads all three axes in one burst.
    pub fn read_acceleration(&mut self) -> Result<Acceleration, Error<E>> {
        let mut buf = [0u8; 6];
        self.i2c
            .write_read(self.address, &[REG_DATAX0], &mut buf)
            .map_err(Error::I2c)?;
        let raw = [
            i16::from_le_bytes([buf[0], buf[1]]),
            i16::from_le_bytes([buf[2], buf[3]]),
            i16::from_le_bytes([buf[4], buf[5]]),
        ];
        let scale = if self.full_res {
            SCALE_FULL_RES
        } else {
            self.range.fixed_scale()
        };
        Ok(Acceleration {
            raw,
            g: [
                f32::from(raw[0]) * scale,
                f32::from(raw[1]) * scale,
                f32::from(raw[2]) * scale,
            ],
        })
    }

    /// Programs the per-axis offset registers, in g (+/- 2 g usable,
    /// 15.6 mg steps).
    pub fn set_offsets(&mut self, x: f32, y: f32, z: f32) -> Result<(), Error<E>> {
        let to_reg = |g: f32| -> Result<u8, Error<E>> {
            let counts = libm::roundf(g / SCALE_OFFSET);
            if !(-128.0..=127.0).contains(&counts) {
                return Err(Error::InvalidValue);
            }
            Ok((counts as i8) as u8)
        };
        let regs = [to_reg(x)?, to_reg(y)?, to_reg(z)?];
        self.i2c
            .write(self.address, &[REG_OFSX, regs[0], regs[1], regs[2]])
            .map_err(Error::I2c)
    }

    /// Sets the single-tap detection threshold in g (62.5 mg steps,
    /// up to ~16 g).
    pub fn set_tap_threshold(&mut self, g: f32) -> Result<(), Error<E>> {
        let counts = libm::roundf(g / SCALE_THRESH);
        if !(0.0..=255.0).contains(&counts) {
            return Err(Error::InvalidValue);
        }
        self.i2c
            .write(self.address, &[REG_THRESH_TAP, counts as u8])
            .map_err(Error::I2c)
    }

    /// Read-modify-write of the bits selected by `mask`.
    fn modify_register(&mut self, reg: u8, mask: u8, value: u8) -> Result<(), Error<E>> {
        let mut current = [0u8; 1];
        self.i2c
            .write_read(self.address, &[reg], &mut current)
            .map_err(Error::I2c)?;
        let next = (current[0] & !mask) | (value & mask);
        self.i2c
            .write(self.address, &[reg, next])
            .map_err(Error::I2c)
    }
}
