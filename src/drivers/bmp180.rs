//! BMP180 barometric pressure and temperature sensor driver.
//!
//! The BMP180 returns raw ADC counts that mean nothing without the
//! per-device calibration coefficients burned into its EEPROM. The driver
//! reads those once at initialization and then runs the datasheet's exact
//! integer compensation pipeline for every measurement, so results match
//! the reference implementation bit for bit.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

/// The chip's fixed I2C address.
pub const ADDRESS: u8 = 0x77;

const REG_CHIP_ID: u8 = 0xD0;
const REG_CALIB: u8 = 0xAA;
const REG_CTRL: u8 = 0xF4;
const REG_DATA: u8 = 0xF6;

const CHIP_ID: u8 = 0x55;
const CMD_TEMPERATURE: u8 = 0x2E;
const CMD_PRESSURE: u8 = 0x34;

/// Errors the BMP180 driver can raise.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Error<E> {
    /// An I2C transaction failed.
    I2c(E),
    /// The chip ID register did not read 0x55; wrong chip or wiring.
    BadChipId(u8),
    /// A calibration word read as 0x0000 or 0xFFFF, which the datasheet
    /// rules out for a healthy device.
    InvalidCalibration,
    /// The raw reading and the calibration produced a degenerate
    /// compensation (division by zero or out-of-range intermediate);
    /// garbage on the bus.
    InvalidData,
}

/// Pressure oversampling setting. More samples per result means less
/// noise and a longer conversion.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Oversampling {
    /// 1 sample, ~4.5 ms
    UltraLowPower = 0,
    /// 2 samples, ~7.5 ms
    Standard = 1,
    /// 4 samples, ~13.5 ms
    HighRes = 2,
    /// 8 samples, ~25.5 ms
    UltraHighRes = 3,
}

impl Oversampling {
    fn wait_ms(self) -> u32 {
        match self {
            Oversampling::UltraLowPower => 5,
            Oversampling::Standard => 8,
            Oversampling::HighRes => 14,
            Oversampling::UltraHighRes => 26,
        }
    }
}

/// Calibration coefficients from the chip's EEPROM.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Calibration {
    /// AC1..AC3: signed pressure coefficients.
    pub ac1: i16,
    /// See [`Calibration::ac1`].
    pub ac2: i16,
    /// See [`Calibration::ac1`].
    pub ac3: i16,
    /// AC4..AC6: unsigned coefficients.
    pub ac4: u16,
    /// See [`Calibration::ac4`].
    pub ac5: u16,
    /// See [`Calibration::ac4`].
    pub ac6: u16,
    /// B1, B2: pressure compensation terms.
    pub b1: i16,
    /// See [`Calibration::b1`].
    pub b2: i16,
    /// MB, MC, MD: temperature compensation terms.
    pub mb: i16,
    /// See [`Calibration::mb`].
    pub mc: i16,
    /// See [`Calibration::mb`].
    pub md: i16,
}

impl Calibration {
    /// Parses the 22-byte EEPROM block at register 0xAA.
    pub fn from_registers<E>(buf: &[u8; 22]) -> Result<Self, Error<E>> {
        // Every word must be neither all-zeros nor all-ones.
        for chunk in buf.chunks_exact(2) {
            let word = u16::from_be_bytes([chunk[0], chunk[1]]);
            if word == 0x0000 || word == 0xFFFF {
                return Err(Error::InvalidCalibration);
            }
        }
        let i = |n: usize| i16::from_be_bytes([buf[n], buf[n + 1]]);
        let u = |n: usize| u16::from_be_bytes([buf[n], buf[n + 1]]);
        Ok(Self {
            ac1: i(0),
            ac2: i(2),
            ac3: i(4),
            ac4: u(6),
            ac5: u(8),
            ac6: u(10),
            b1: i(12),
            b2: i(14),
            mb: i(16),
            mc: i(18),
            md: i(20),
        })
    }
}

/// One compensated measurement.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Measurement {
    /// Temperature in degrees Celsius (0.1 degree resolution).
    pub temperature: f32,
    /// Pressure in Pascal.
    pub pressure: i32,
}

/// BMP180 driver over an I2C bus and a delay provider.
pub struct Bmp180<I2C, D> {
    i2c: I2C,
    delay: D,
    calibration: Calibration,
}

impl<I2C, D, E> Bmp180<I2C, D>
where
    I2C: I2c<Error = E>,
    D: DelayNs,
{
    /// Probes the chip and loads its calibration EEPROM.
    pub fn initialize(i2c: I2C, delay: D) -> Result<Self, Error<E>> {
        let mut i2c = i2c;
        let mut id = [0u8; 1];
        i2c.write_read(ADDRESS, &[REG_CHIP_ID], &mut id)
            .map_err(Error::I2c)?;
        if id[0] != CHIP_ID {
            return Err(Error::BadChipId(id[0]));
        }

        let mut buf = [0u8; 22];
        i2c.write_read(ADDRESS, &[REG_CALIB], &mut buf)
            .map_err(Error::I2c)?;
        let calibration = Calibration::from_registers(&buf)?;

        Ok(Self {
            i2c,
            delay,
            calibration,
        })
    }

    /// Releases the bus, consuming the driver.
    pub fn release(self) -> I2C {
        self.i2c
    }

    /// The calibration coefficients read at initialization.
    pub fn calibration(&self) -> &Calibration {
        &self.calibration
    }

    /// Runs a temperature conversion followed by a pressure conversion
    /// and returns both compensated values.
    pub fn measure(&mut self, oss: Oversampling) -> Result<Measurement, Error<E>> {
        let ut = self.read_raw_temperature()?;
        let up = self.read_raw_pressure(oss)?;

        let b5 = compute_b5(&self.calibration, ut).ok_or(Error::InvalidData)?;
        Ok(Measurement {
            temperature: compensate_temperature(b5),
            pressure: compensate_pressure(&self.calibration, b5, up, oss as u8),
        })
    }

    /// Temperature only, skipping the pressure conversion.
    pub fn measure_temperature(&mut self) -> Result<f32, Error<E>> {
        let ut = self.read_raw_temperature()?;
        let b5 = compute_b5(&self.calibration, ut).ok_or(Error::InvalidData)?;
        Ok(compensate_temperature(b5))
    }

    fn read_raw_temperature(&mut self) -> Result<i32, Error<E>> {
        self.i2c
            .write(ADDRESS, &[REG_CTRL, CMD_TEMPERATURE])
            .map_err(Error::I2c)?;
        self.delay.delay_ms(5);
        let mut buf = [0u8; 2];
        self.i2c
            .write_read(ADDRESS, &[REG_DATA], &mut buf)
            .map_err(Error::I2c)?;
        Ok(i32::from(u16::from_be_bytes(buf)))
    }

    fn read_raw_pressure(&mut self, oss: Oversampling) -> Result<i32, Error<E>> {
        let cmd = CMD_PRESSURE | ((oss as u8) << 6);
        self.i2c
            .write(ADDRESS, &[REG_CTRL, cmd])
            .map_err(Error::I2c)?;
        self.delay.delay_ms(oss.wait_ms());
        let mut buf = [0u8; 3];
        self.i2c
            .write_read(ADDRESS, &[REG_DATA], &mut buf)
            .map_err(Error::I2c)?;
        let raw = (u32::from(buf[0]) << 16) | (u32::from(buf[1]) << 8) | u32::from(buf[2]);
        Ok((raw >> (8 - oss as u8)) as i32)
    }
}

/// Barometric altitude from pressure, in meters.
///
/// `sea_level_pa` is the reference pressure; 101_325.0 for the standard
/// atmosphere, or a local QNH for better absolute accuracy.
pub fn pressure_to_altitude(pressure_pa: i32, sea_level_pa: f32) -> f32 {
    44330.0 * (1.0 - libm::powf(pressure_pa as f32 / sea_level_pa, 1.0 / 5.255))
}

// The functions below are the datasheet's integer pipeline, verbatim in
// semantics. Shifts on negative values are arithmetic, as in the
// reference C code.

// Widened to i64 so garbage raw values cannot overflow the multiply,
// and the divisor is checked: the datasheet's i32 form assumes sane
// inputs a dying bus does not guarantee.
fn compute_b5(cal: &Calibration, ut: i32) -> Option<i32> {
    let x1 = ((i64::from(ut) - i64::from(cal.ac6)) * i64::from(cal.ac5)) >> 15;
    let x2 = (i64::from(cal.mc) * 2048).checked_div(x1 + i64::from(cal.md))?;
    i32::try_from(x1 + x2).ok()
}

fn compensate_temperature(b5: i32) -> f32 {
    let tenths = (b5 + 8) >> 4;
    tenths as f32 / 10.0
}

fn compensate_pressure(cal: &Calibration, b5: i32, up: i32, oss: u8) -> i32 {
    let b6 = b5 - 4000;
    let x1 = (i32::from(cal.b2) * ((b6 * b6) >> 12)) >> 11;
    let x2 = (i32::from(cal.ac2) * b6) >> 11;
    let x3 = x1 + x2;
    let b3 = (((i32::from(cal.ac1) * 4 + x3) << oss) + 2) / 4;

    let x1 = (i32::from(cal.ac3) * b6) >> 13;
    let x2 = (i32::from(cal.b1) * ((b6 * b6) >> 12)) >> 16;
    let x3 = (x1 + x2 + 2) >> 2;
    let b4 = (u32::from(cal.ac4) * ((x3 + 32768) as u32)) >> 15;
    let b7 = ((up - b3) as u32) * (50000 >> oss);

    let p = if b7 < 0x8000_0000 {
        ((b7 * 2) / b4) as i32
    } else {
        ((b7 / b4) * 2) as i32
    };

    let x1 = (p >> 8) * (p >> 8);
    let x1 = (x1 * 3038) >> 16;
    let x2 = (-7357 * p) >> 16;
    p + ((x1 + x2 + 3791) >> 4)
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal_mock::eh1::delay::NoopDelay;
    use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction as I2cTransaction};

    /// The worked example from the datasheet.
    fn datasheet_calibration() -> Calibration {
        Calibration {
            ac1: 408,
            ac2: -72,
            ac3: -14383,
            ac4: 32741,
            ac5: 32757,
            ac6: 23153,
            b1: 6190,
            b2: 4,
            mb: -32768,
            mc: -8711,
            md: 2868,
        }
    }

    // =========================================================================
    // Compensation math (datasheet worked example)
    // =========================================================================

    #[test]
    fn datasheet_temperature_vector() {
        let cal = datasheet_calibration();
        let b5 = compute_b5(&cal, 27898).unwrap();
        assert_eq!(compensate_temperature(b5), 15.0);
    }

    #[test]
    fn datasheet_pressure_vector() {
        let cal = datasheet_calibration();
        let b5 = compute_b5(&cal, 27898).unwrap();
        assert_eq!(compensate_pressure(&cal, b5, 23843, 0), 69964);
    }

    #[test]
    fn extreme_raw_temperature_does_not_overflow() {
        // (0xFFFF - ac6) * ac5 would overflow an i32 multiply; widening
        // keeps a garbage reading a value, not a panic.
        let mut cal = datasheet_calibration();
        cal.ac6 = 1;
        cal.ac5 = 65535;
        assert!(compute_b5(&cal, 0xFFFF).is_some());
    }

    #[test]
    fn degenerate_divisor_is_rejected() {
        // ut == ac6 makes x1 zero; with md zero the temperature divisor
        // vanishes entirely.
        let mut cal = datasheet_calibration();
        cal.md = 0;
        assert_eq!(compute_b5(&cal, i32::from(cal.ac6)), None);
    }

    #[test]
    fn altitude_at_sea_level_is_zero() {
        let alt = pressure_to_altitude(101_325, 101_325.0);
        assert!(alt.abs() < 0.01);
    }

    #[test]
    fn altitude_drops_with_pressure() {
        // ~500 hPa is roughly half the atmosphere, ~5.5 km up
        let alt = pressure_to_altitude(50_000, 101_325.0);
        assert!(alt > 5000.0 && alt < 6500.0);
    }

    // =========================================================================
    // Bus behavior
    // =========================================================================

    fn calibration_bytes() -> Vec<u8> {
        let cal = datasheet_calibration();
        let mut buf = Vec::new();
        for word in [cal.ac1, cal.ac2, cal.ac3] {
            buf.extend_from_slice(&word.to_be_bytes());
        }
        for word in [cal.ac4, cal.ac5, cal.ac6] {
            buf.extend_from_slice(&word.to_be_bytes());
        }
        for word in [cal.b1, cal.b2, cal.mb, cal.mc, cal.md] {
            buf.extend_from_slice(&word.to_be_bytes());
        }
        buf
    }

    #[test]
    fn full_measurement_matches_datasheet() {
        // ut = 27898 = 0x6CFA; up = 23843 at oss 0 means raw = 23843 << 8
        let expectations = [
            I2cTransaction::write_read(ADDRESS, vec![REG_CHIP_ID], vec![CHIP_ID]),
            I2cTransaction::write_read(ADDRESS, vec![REG_CALIB], calibration_bytes()),
            I2cTransaction::write(ADDRESS, vec![REG_CTRL, CMD_TEMPERATURE]),
            I2cTransaction::write_read(ADDRESS, vec![REG_DATA], vec![0x6C, 0xFA]),
            I2cTransaction::write(ADDRESS, vec![REG_CTRL, CMD_PRESSURE]),
            I2cTransaction::write_read(ADDRESS, vec![REG_DATA], vec![0x5D, 0x23, 0x00]),
        ];
        let mut sensor = Bmp180::initialize(I2cMock::new(&expectations), NoopDelay).unwrap();

        let m = sensor.measure(Oversampling::UltraLowPower).unwrap();
        assert_eq!(m.temperature, 15.0);
        assert_eq!(m.pressure, 69964);

        sensor.release().done();
    }

    #[test]
    fn wrong_chip_id_is_rejected() {
        let expectations = [I2cTransaction::write_read(
            ADDRESS,
            vec![REG_CHIP_ID],
            vec![0x58], // a BMP280 answering on the same address
        )];
        let mut mock = I2cMock::new(&expectations);
        let result = Bmp180::initialize(mock.clone(), NoopDelay);
        assert!(matches!(result, Err(Error::BadChipId(0x58))));
        mock.done();
    }

    #[test]
    fn dead_eeprom_is_rejected() {
        let expectations = [
            I2cTransaction::write_read(ADDRESS, vec![REG_CHIP_ID], vec![CHIP_ID]),
            I2cTransaction::write_read(ADDRESS, vec![REG_CALIB], vec![0xFF; 22]),
        ];
        let mut mock = I2cMock::new(&expectations);
        let result = Bmp180::initialize(mock.clone(), NoopDelay);
        assert!(matches!(result, Err(Error::InvalidCalibration)));
        mock.done();
    }

    #[test]
    fn oversampling_shifts_the_command_and_raw_value() {
        let mut expectations = vec![
            I2cTransaction::write_read(ADDRESS, vec![REG_CHIP_ID], vec![CHIP_ID]),
            I2cTransaction::write_read(ADDRESS, vec![REG_CALIB], calibration_bytes()),
            I2cTransaction::write(ADDRESS, vec![REG_CTRL, CMD_TEMPERATURE]),
            I2cTransaction::write_read(ADDRESS, vec![REG_DATA], vec![0x6C, 0xFA]),
        ];
        // oss 3: command 0x34 | (3 << 6) = 0xF4, raw shifted right by 5
        expectations.push(I2cTransaction::write(ADDRESS, vec![REG_CTRL, 0xF4]));
        expectations.push(I2cTransaction::write_read(
            ADDRESS,
            vec![REG_DATA],
            vec![0x5D, 0x23, 0x00],
        ));
        let mut sensor = Bmp180::initialize(I2cMock::new(&expectations), NoopDelay).unwrap();

        let m = sensor.measure(Oversampling::UltraHighRes).unwrap();
        // raw 0x5D2300 >> 5
        assert!(m.pressure > 0);

        sensor.release().done();
    }
}
