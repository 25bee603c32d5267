//! QMC5883L 3-axis magnetometer driver.
//!
//! The QMC5883L is the cheap replacement commonly found on breakouts sold
//! as "HMC5883L"; it sits at address 0x0D and has a completely different
//! register map than the Honeywell part. [`Qmc5883::probe`] checks the
//! chip ID so the mixup is caught early.
//!
//! Raw axis values scale with the configured field range; [`Qmc5883::read`]
//! returns both raw counts and values in Gauss.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

/// The chip's fixed I2C address.
pub const ADDRESS: u8 = 0x0D;

const REG_DATA: u8 = 0x00;
const REG_STATUS: u8 = 0x06;
const REG_TEMP: u8 = 0x07;
const REG_CTRL1: u8 = 0x09;
const REG_CTRL2: u8 = 0x0A;
const REG_PERIOD: u8 = 0x0B;
const REG_CHIP_ID: u8 = 0x0C;

const CHIP_ID: u8 = 0xFF;
const SOFT_RESET: u8 = 0x80;
const PERIOD_RECOMMENDED: u8 = 0x01;

const STATUS_DRDY: u8 = 0x01;
const STATUS_OVL: u8 = 0x02;
const STATUS_DOR: u8 = 0x04;

/// Errors the QMC5883 driver can raise.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Error<E> {
    /// An I2C transaction failed.
    I2c(E),
    /// The chip ID register did not read 0xFF.
    BadChipId(u8),
    /// A measurement overflowed the configured field range.
    Overflow,
}

/// Operating mode (CTRL_1 bits 1:0).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Mode {
    /// Standby, registers retain their values.
    Standby = 0b00,
    /// Continuous conversion at the configured data rate.
    Continuous = 0b01,
}

/// Output data rate (CTRL_1 bits 3:2).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum OutputDataRate {
    /// 10 Hz
    Hz10 = 0b00,
    /// 50 Hz
    Hz50 = 0b01,
    /// 100 Hz
    Hz100 = 0b10,
    /// 200 Hz
    Hz200 = 0b11,
}

/// Full-scale field range (CTRL_1 bits 5:4).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum FieldRange {
    /// +/- 2 Gauss, 12000 LSB/G
    Gauss2 = 0b00,
    /// +/- 8 Gauss, 3000 LSB/G
    Gauss8 = 0b01,
}

impl FieldRange {
    fn lsb_per_gauss(self) -> f32 {
        match self {
            FieldRange::Gauss2 => 12000.0,
            FieldRange::Gauss8 => 3000.0,
        }
    }
}

/// Internal oversampling (CTRL_1 bits 7:6).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum OverSample {
    /// 512 samples
    Os512 = 0b00,
    /// 256 samples
    Os256 = 0b01,
    /// 128 samples
    Os128 = 0b10,
    /// 64 samples
    Os64 = 0b11,
}

/// One field measurement: raw counts plus converted Gauss per axis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Field {
    /// Raw axis counts.
    pub raw: [i16; 3],
    /// Field in Gauss, same axis order.
    pub gauss: [f32; 3],
}

/// QMC5883L driver over an I2C bus and a delay provider.
pub struct Qmc5883<I2C, D> {
    i2c: I2C,
    delay: D,
    range: FieldRange,
}

impl<I2C, D, E> Qmc5883<I2C, D>
where
    I2C: I2c<Error = E>,
    D: DelayNs,
{
    /// Verifies the chip ID, soft-resets, and programs the SET/RESET
    /// period register the datasheet requires before continuous mode.
    pub fn probe(i2c: I2C, delay: D) -> Result<Self, Error<E>> {
        let mut this = Self {
            i2c,
            delay,
            range: FieldRange::Gauss2,
        };

        let mut id = [0u8; 1];
        this.i2c
            .write_read(ADDRESS, &[REG_CHIP_ID], &mut id)
            .map_err(Error::I2c)?;
        if id[0] != CHIP_ID {
            return Err(Error::BadChipId(id[0]));
        }

        this.i2c
            .write(ADDRESS, &[REG_CTRL2, SOFT_RESET])
            .map_err(Error::I2c)?;
        this.delay.delay_ms(50);
        this.i2c
            .write(ADDRESS, &[REG_PERIOD, PERIOD_RECOMMENDED])
            .map_err(Error::I2c)?;

        Ok(this)
    }

    /// Releases the bus, consuming the driver.
    pub fn release(self) -> I2C {
        self.i2c
    }

    /// Writes CTRL_1 with the full operating configuration.
    pub fn configure(
        &mut self,
        mode: Mode,
        odr: OutputDataRate,
        range: FieldRange,
        osr: OverSample,
    ) -> Result<(), Error<E>> {
        let ctrl =
            (mode as u8) | ((odr as u8) << 2) | ((range as u8) << 4) | ((osr as u8) << 6);
        self.i2c
            .write(ADDRESS, &[REG_CTRL1, ctrl])
            .map_err(Error::I2c)?;
        self.range = range;
        Ok(())
    }

    /// True when a fresh result is waiting in the data registers.
    pub fn data_ready(&mut self) -> Result<bool, Error<E>> {
        Ok(self.status()? & STATUS_DRDY != 0)
    }

    /// True when the last result was overwritten before being read.
    pub fn data_overrun(&mut self) -> Result<bool, Error<E>> {
        Ok(self.status()? & STATUS_DOR != 0)
    }

    /// Reads the latest field measurement.
    ///
    /// Returns [`Error::Overflow`] if the status register flags a range
    /// overflow, since the axis values are then meaningless.
    pub fn read(&mut self) -> Result<Field, Error<E>> {
        if self.status()? & STATUS_OVL != 0 {
            return Err(Error::Overflow);
        }
        let mut buf = [0u8; 6];
        self.i2c
            .write_read(ADDRESS, &[REG_DATA], &mut buf)
            .map_err(Error::I2c)?;
        let raw = [
            i16::from_le_bytes([buf[0], buf[1]]),
            i16::from_le_bytes([buf[2], buf[3]]),
            i16::from_le_bytes([buf[4], buf[5]]),
        ];
        let scale = self.range.lsb_per_gauss();
        Ok(Field {
            raw,
            gauss: [
                f32::from(raw[0]) / scale,
                f32::from(raw[1]) / scale,
                f32::from(raw[2]) / scale,
            ],
        })
    }

    /// Reads the die temperature in degrees Celsius.
    ///
    /// The offset is not factory calibrated, so this is only useful for
    /// tracking relative changes.
    pub fn temperature(&mut self) -> Result<f32, Error<E>> {
        let mut buf = [0u8; 2];
        self.i2c
            .write_read(ADDRESS, &[REG_TEMP], &mut buf)
            .map_err(Error::I2c)?;
        let raw = i16::from_le_bytes(buf);
        Ok(f32::from(raw) / 100.0)
    }

    /// Puts the chip into standby.
    pub fn standby(&mut self) -> Result<(), Error<E>> {
        self.configure(
            Mode::Standby,
            OutputDataRate::Hz10,
            self.range,
            OverSample::Os512,
        )
    }

    fn status(&mut self) -> Result<u8, Error<E>> {
        let mut buf = [0u8; 1];
        self.i2c
            .write_read(ADDRESS, &[REG_STATUS], &mut buf)
            .map_err(Error::I2c)?;
        Ok(buf[0])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal_mock::eh1::delay::NoopDelay;
    use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction as I2cTransaction};

    fn probe_expectations() -> Vec<I2cTransaction> {
        vec![
            I2cTransaction::write_read(ADDRESS, vec![REG_CHIP_ID], vec![CHIP_ID]),
            I2cTransaction::write(ADDRESS, vec![REG_CTRL2, SOFT_RESET]),
            I2cTransaction::write(ADDRESS, vec![REG_PERIOD, PERIOD_RECOMMENDED]),
        ]
    }

    #[test]
    fn probe_resets_and_sets_period() {
        let sensor = Qmc5883::probe(I2cMock::new(&probe_expectations()), NoopDelay).unwrap();
        sensor.release().done();
    }

    #[test]
    fn probe_rejects_wrong_chip() {
        let expectations = [I2cTransaction::write_read(
            ADDRESS,
            vec![REG_CHIP_ID],
            vec![0x00],
        )];
        let mut mock = I2cMock::new(&expectations);
        assert!(matches!(
            Qmc5883::probe(mock.clone(), NoopDelay),
            Err(Error::BadChipId(0x00))
        ));
        mock.done();
    }

    #[test]
    fn configure_packs_ctrl1_fields() {
        let mut expectations = probe_expectations();
        // continuous | 100 Hz << 2 | 8 G << 4 | 256 os << 6
        expectations.push(I2cTransaction::write(
            ADDRESS,
            vec![REG_CTRL1, 0b01_01_10_01],
        ));
        let mut sensor = Qmc5883::probe(I2cMock::new(&expectations), NoopDelay).unwrap();

        sensor
            .configure(
                Mode::Continuous,
                OutputDataRate::Hz100,
                FieldRange::Gauss8,
                OverSample::Os256,
            )
            .unwrap();

        sensor.release().done();
    }

    #[test]
    fn read_scales_little_endian_axes() {
        let mut expectations = probe_expectations();
        expectations.push(I2cTransaction::write_read(
            ADDRESS,
            vec![REG_STATUS],
            vec![STATUS_DRDY],
        ));
        // x = 12000 (1 G at the 2 G range), y = -12000, z = 0
        expectations.push(I2cTransaction::write_read(
            ADDRESS,
            vec![REG_DATA],
            vec![0xE0, 0x2E, 0x20, 0xD1, 0x00, 0x00],
        ));
        let mut sensor = Qmc5883::probe(I2cMock::new(&expectations), NoopDelay).unwrap();

        let field = sensor.read().unwrap();
        assert_eq!(field.raw, [12000, -12000, 0]);
        assert_eq!(field.gauss[0], 1.0);
        assert_eq!(field.gauss[1], -1.0);

        sensor.release().done();
    }

    #[test]
    fn overflow_flag_rejects_the_sample() {
        let mut expectations = probe_expectations();
        expectations.push(I2cTransaction::write_read(
            ADDRESS,
            vec![REG_STATUS],
            vec![STATUS_DRDY | STATUS_OVL],
        ));
        let mut sensor = Qmc5883::probe(I2cMock::new(&expectations), NoopDelay).unwrap();

        assert_eq!(sensor.read(), Err(Error::Overflow));

        sensor.release().done();
    }

    #[test]
    fn temperature_is_centidegrees() {
        let mut expectations = probe_expectations();
        // 2350 LSB = 23.5 C
        expectations.push(I2cTransaction::write_read(
            ADDRESS,
            vec![REG_TEMP],
            vec![0x2E, 0x09],
        ));
        let mut sensor = Qmc5883::probe(I2cMock::new(&expectations), NoopDelay).unwrap();

        assert_eq!(sensor.temperature().unwrap(), 23.5);

        sensor.release().done();
    }
}
