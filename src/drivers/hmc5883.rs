//! HMC5883L 3-axis magnetometer driver.
//!
//! The Honeywell part at address 0x1E. Note that many modern "HMC5883L"
//! breakouts actually carry a QMC5883L; [`Hmc5883::probe`] reads the
//! three identification registers (`"H43"`) so the wrong chip fails fast
//! instead of returning garbage. See [`crate::drivers::qmc5883`] for the
//! clone.
//!
//! The data registers come back in X, Z, Y order, a classic trap this
//! driver straightens out before returning axes.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

/// The chip's fixed I2C address.
pub const ADDRESS: u8 = 0x1E;

const REG_CFG_A: u8 = 0x00;
const REG_CFG_B: u8 = 0x01;
const REG_MODE: u8 = 0x02;
const REG_DATA: u8 = 0x03;
const REG_STATUS: u8 = 0x09;
const REG_ID_A: u8 = 0x0A;

const ID: [u8; 3] = *b"H43";
const STATUS_RDY: u8 = 0x01;

/// ADC output when an axis saturates.
const OVERFLOW_VALUE: i16 = -4096;

/// Errors the HMC5883 driver can raise.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Error<E> {
    /// An I2C transaction failed.
    I2c(E),
    /// The identification registers did not read `"H43"`. Often means a
    /// QMC5883L clone on the board.
    BadChipId([u8; 3]),
    /// An axis saturated at the configured gain.
    Overflow,
}

/// Samples averaged per output (CFG_A bits 6:5).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum SamplesAveraged {
    /// 1 sample
    One = 0b00,
    /// 2 samples
    Two = 0b01,
    /// 4 samples
    Four = 0b10,
    /// 8 samples
    Eight = 0b11,
}

/// Continuous-mode output rate (CFG_A bits 4:2).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum DataRate {
    /// 0.75 Hz
    Hz0_75 = 0b000,
    /// 1.5 Hz
    Hz1_5 = 0b001,
    /// 3 Hz
    Hz3 = 0b010,
    /// 7.5 Hz
    Hz7_5 = 0b011,
    /// 15 Hz (power-on default)
    Hz15 = 0b100,
    /// 30 Hz
    Hz30 = 0b101,
    /// 75 Hz
    Hz75 = 0b110,
}

/// Measurement bias for self-test (CFG_A bits 1:0).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Bias {
    /// Normal measurement flow.
    Normal = 0b00,
    /// Positive self-test bias on all axes.
    Positive = 0b01,
    /// Negative self-test bias on all axes.
    Negative = 0b10,
}

/// Gain setting (CFG_B bits 7:5), named by full-scale range.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Gain {
    /// +/- 0.88 Ga, 1370 LSB/Ga
    Ga0_88 = 0b000,
    /// +/- 1.3 Ga, 1090 LSB/Ga (power-on default)
    Ga1_3 = 0b001,
    /// +/- 1.9 Ga, 820 LSB/Ga
    Ga1_9 = 0b010,
    /// +/- 2.5 Ga, 660 LSB/Ga
    Ga2_5 = 0b011,
    /// +/- 4.0 Ga, 440 LSB/Ga
    Ga4_0 = 0b100,
    /// +/- 4.7 Ga, 390 LSB/Ga
    Ga4_7 = 0b101,
    /// +/- 5.6 Ga, 330 LSB/Ga
    Ga5_6 = 0b110,
    /// +/- 8.1 Ga, 230 LSB/Ga
    Ga8_1 = 0b111,
}

impl Gain {
    fn lsb_per_gauss(self) -> f32 {
        match self {
            Gain::Ga0_88 => 1370.0,
            Gain::Ga1_3 => 1090.0,
            Gain::Ga1_9 => 820.0,
            Gain::Ga2_5 => 660.0,
            Gain::Ga4_0 => 440.0,
            Gain::Ga4_7 => 390.0,
            Gain::Ga5_6 => 330.0,
            Gain::Ga8_1 => 230.0,
        }
    }
}

/// Operating mode (MODE register bits 1:0).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Mode {
    /// Free-running conversions at the configured data rate.
    Continuous = 0b00,
    /// One conversion, then back to idle.
    Single = 0b01,
    /// Idle.
    Idle = 0b10,
}

/// One field measurement in X, Y, Z order.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Field {
    /// Raw axis counts.
    pub raw: [i16; 3],
    /// Field in Gauss, same axis order.
    pub gauss: [f32; 3],
}

/// HMC5883L driver over an I2C bus and a delay provider.
pub struct Hmc5883<I2C, D> {
    i2c: I2C,
    delay: D,
    gain: Gain,
}

impl<I2C, D, E> Hmc5883<I2C, D>
where
    I2C: I2c<Error = E>,
    D: DelayNs,
{
    /// Verifies the identification registers.
    pub fn probe(i2c: I2C, delay: D) -> Result<Self, Error<E>> {
        let mut this = Self {
            i2c,
            delay,
            gain: Gain::Ga1_3,
        };

        let mut id = [0u8; 3];
        this.i2c
            .write_read(ADDRESS, &[REG_ID_A], &mut id)
            .map_err(Error::I2c)?;
        if id != ID {
            return Err(Error::BadChipId(id));
        }
        Ok(this)
    }

    /// Releases the bus, consuming the driver.
    pub fn release(self) -> I2C {
        self.i2c
    }

    /// Writes configuration register A.
    pub fn configure(
        &mut self,
        averaged: SamplesAveraged,
        rate: DataRate,
        bias: Bias,
    ) -> Result<(), Error<E>> {
        let cfg = ((averaged as u8) << 5) | ((rate as u8) << 2) | (bias as u8);
        self.i2c
            .write(ADDRESS, &[REG_CFG_A, cfg])
            .map_err(Error::I2c)
    }

    /// Sets the gain. Takes effect on the next conversion.
    pub fn set_gain(&mut self, gain: Gain) -> Result<(), Error<E>> {
        self.i2c
            .write(ADDRESS, &[REG_CFG_B, (gain as u8) << 5])
            .map_err(Error::I2c)?;
        self.gain = gain;
        Ok(())
    }

    /// Sets the operating mode.
    pub fn set_mode(&mut self, mode: Mode) -> Result<(), Error<E>> {
        self.i2c
            .write(ADDRESS, &[REG_MODE, mode as u8])
            .map_err(Error::I2c)
    }

    /// True when a fresh result is waiting in the data registers.
    pub fn data_ready(&mut self) -> Result<bool, Error<E>> {
        let mut buf = [0u8; 1];
        self.i2c
            .write_read(ADDRESS, &[REG_STATUS], &mut buf)
            .map_err(Error::I2c)?;
        Ok(buf[0] & STATUS_RDY != 0)
    }

    /// Reads the latest field measurement, reordering the chip's
    /// X, Z, Y register layout to X, Y, Z.
    pub fn read(&mut self) -> Result<Field, Error<E>> {
        let mut buf = [0u8; 6];
        self.i2c
            .write_read(ADDRESS, &[REG_DATA], &mut buf)
            .map_err(Error::I2c)?;
        let x = i16::from_be_bytes([buf[0], buf[1]]);
        let z = i16::from_be_bytes([buf[2], buf[3]]);
        let y = i16::from_be_bytes([buf[4], buf[5]]);
        let raw = [x, y, z];
        if raw.contains(&OVERFLOW_VALUE) {
            return Err(Error::Overflow);
        }
        let scale = self.gain.lsb_per_gauss();
        Ok(Field {
            raw,
            gauss: [
                f32::from(x) / scale,
                f32::from(y) / scale,
                f32::from(z) / scale,
            ],
        })
    }

    /// Triggers a single conversion, waits it out, and reads the result.
    pub fn measure(&mut self) -> Result<Field, Error<E>> {
        self.set_mode(Mode::Single)?;
        self.delay.delay_ms(7);
        self.read()
    }
}

// ============================================================================
// MPU6050 bypass
// ============================================================================

/// MPU6050 I2C address (AD0 low).
pub const MPU6050_ADDRESS: u8 = 0x68;

const MPU_WHO_AM_I: u8 = 0x75;
const MPU_PWR_MGMT_1: u8 = 0x6B;
const MPU_USER_CTRL: u8 = 0x6A;
const MPU_INT_PIN_CFG: u8 = 0x37;
const MPU_BYPASS_EN: u8 = 0x02;

/// Opens the MPU6050's auxiliary I2C bypass so a magnetometer wired to
/// its AUX pins (GY-86 style modules) appears on the main bus.
///
/// Wakes the MPU out of sleep, disables its I2C master, and enables
/// bypass. Afterwards the 5883 can be probed at its own address.
pub fn enable_mpu6050_bypass<I2C, E>(i2c: &mut I2C) -> Result<(), Error<E>>
where
    I2C: I2c<Error = E>,
{
    let mut who = [0u8; 1];
    i2c.write_read(MPU6050_ADDRESS, &[MPU_WHO_AM_I], &mut who)
        .map_err(Error::I2c)?;
    if who[0] != MPU6050_ADDRESS {
        return Err(Error::BadChipId([who[0], 0, 0]));
    }

    i2c.write(MPU6050_ADDRESS, &[MPU_PWR_MGMT_1, 0x00])
        .map_err(Error::I2c)?;
    i2c.write(MPU6050_ADDRESS, &[MPU_USER_CTRL, 0x00])
        .map_err(Error::I2c)?;
    i2c.write(MPU6050_ADDRESS, &[MPU_INT_PIN_CFG, MPU_BYPASS_EN])
        .map_err(Error::I2c)
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal_mock::eh1::delay::NoopDelay;
    use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction as I2cTransaction};

    fn probe_expectation() -> I2cTransaction {
        I2cTransaction::write_read(ADDRESS, vec![REG_ID_A], ID.to_vec())
    }

    #[test]
    fn probe_checks_identification() {
        let sensor = Hmc5883::probe(I2cMock::new(&[probe_expectation()]), NoopDelay).unwrap();
        sensor.release().done();
    }

    #[test]
    fn probe_flags_qmc_clone() {
        // A QMC5883L does not decode these registers and typically
        // answers with zeros.
        let expectations = [I2cTransaction::write_read(
            ADDRESS,
            vec![REG_ID_A],
            vec![0, 0, 0],
        )];
        let mut mock = I2cMock::new(&expectations);
        assert!(matches!(
            Hmc5883::probe(mock.clone(), NoopDelay),
            Err(Error::BadChipId([0, 0, 0]))
        ));
        mock.done();
    }

    #[test]
    fn read_reorders_x_z_y() {
        // x = 1090 (1 Ga at default gain), z = 2, y = -1090
        let expectations = [
            probe_expectation(),
            I2cTransaction::write_read(
                ADDRESS,
                vec![REG_DATA],
                vec![0x04, 0x42, 0x00, 0x02, 0xFB, 0xBE],
            ),
        ];
        let mut sensor = Hmc5883::probe(I2cMock::new(&expectations), NoopDelay).unwrap();

        let field = sensor.read().unwrap();
        assert_eq!(field.raw, [1090, -1090, 2]);
        assert_eq!(field.gauss[0], 1.0);
        assert_eq!(field.gauss[1], -1.0);

        sensor.release().done();
    }

    #[test]
    fn saturated_axis_is_an_overflow() {
        // -4096 = 0xF000
        let expectations = [
            probe_expectation(),
            I2cTransaction::write_read(
                ADDRESS,
                vec![REG_DATA],
                vec![0xF0, 0x00, 0x00, 0x00, 0x00, 0x00],
            ),
        ];
        let mut sensor = Hmc5883::probe(I2cMock::new(&expectations), NoopDelay).unwrap();

        assert_eq!(sensor.read(), Err(Error::Overflow));

        sensor.release().done();
    }

    #[test]
    fn configure_packs_cfg_a() {
        let expectations = [
            probe_expectation(),
            // 8 avg << 5 | 15 Hz << 2 | normal bias
            I2cTransaction::write(ADDRESS, vec![REG_CFG_A, 0b011_100_00]),
        ];
        let mut sensor = Hmc5883::probe(I2cMock::new(&expectations), NoopDelay).unwrap();

        sensor
            .configure(SamplesAveraged::Eight, DataRate::Hz15, Bias::Normal)
            .unwrap();

        sensor.release().done();
    }

    #[test]
    fn gain_lands_in_cfg_b_high_bits() {
        let expectations = [
            probe_expectation(),
            I2cTransaction::write(ADDRESS, vec![REG_CFG_B, 0b111_00000]),
        ];
        let mut sensor = Hmc5883::probe(I2cMock::new(&expectations), NoopDelay).unwrap();

        sensor.set_gain(Gain::Ga8_1).unwrap();

        sensor.release().done();
    }

    #[test]
    fn mpu_bypass_sequence() {
        let expectations = [
            I2cTransaction::write_read(MPU6050_ADDRESS, vec![MPU_WHO_AM_I], vec![0x68]),
            I2cTransaction::write(MPU6050_ADDRESS, vec![MPU_PWR_MGMT_1, 0x00]),
            I2cTransaction::write(MPU6050_ADDRESS, vec![MPU_USER_CTRL, 0x00]),
            I2cTransaction::write(MPU6050_ADDRESS, vec![MPU_INT_PIN_CFG, 0x02]),
        ];
        let mut mock = I2cMock::new(&expectations);
        enable_mpu6050_bypass(&mut mock).unwrap();
        mock.done();
    }
}
