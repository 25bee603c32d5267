//! SHT30/31/35 temperature and humidity sensor driver.
//!
//! Supports single-shot measurements (the common case for a station that
//! streams once a second) and the chip's periodic acquisition mode, plus
//! the built-in heater and the status register.
//!
//! Every word the chip sends is protected by a CRC-8; the driver checks
//! it and refuses corrupted data with [`Error::Crc`].
//!
//! # Example
//!
//! ```rust,no_run
//! use rs_iotlab::drivers::sht3x::{Sht3x, Repeatability, ADDR_DEFAULT};
//! # use embedded_hal_mock::eh1::i2c::Mock as I2cMock;
//! # use embedded_hal_mock::eh1::delay::NoopDelay;
//! # let i2c = I2cMock::new(&[]);
//!
//! let mut sensor = Sht3x::new(i2c, NoopDelay, ADDR_DEFAULT);
//! let m = sensor.measure(Repeatability::High)?;
//! println!("{:.2} C, {:.2} %RH", m.temperature, m.humidity);
//! # Ok::<(), rs_iotlab::drivers::sht3x::Error<embedded_hal::i2c::ErrorKind>>(())
//! ```

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

/// I2C address with the ADDR pin pulled high (course breakout default).
pub const ADDR_DEFAULT: u8 = 0x45;

/// I2C address with the ADDR pin pulled low.
pub const ADDR_ALT: u8 = 0x44;

const CMD_FETCH: u16 = 0xE000;
const CMD_BREAK: u16 = 0x3093;
const CMD_SOFT_RESET: u16 = 0x30A2;
const CMD_HEATER_ON: u16 = 0x306D;
const CMD_HEATER_OFF: u16 = 0x3066;
const CMD_READ_STATUS: u16 = 0xF32D;
const CMD_CLEAR_STATUS: u16 = 0x3041;
const CMD_READ_SERIAL: u16 = 0x3780;
const CMD_ART: u16 = 0x2B32;

/// Errors the SHT3x driver can raise.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Error<E> {
    /// An I2C transaction failed.
    I2c(E),
    /// A received word failed its CRC check.
    Crc,
}

/// Measurement repeatability. Higher repeatability means less noise,
/// more conversion time, and more self-heating.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Repeatability {
    /// ~15 ms conversion
    High,
    /// ~6 ms conversion
    Medium,
    /// ~4 ms conversion
    Low,
}

impl Repeatability {
    fn single_shot_command(self) -> u16 {
        match self {
            Repeatability::High => 0x2400,
            Repeatability::Medium => 0x240B,
            Repeatability::Low => 0x2416,
        }
    }

    fn duration_ms(self) -> u32 {
        match self {
            Repeatability::High => 15,
            Repeatability::Medium => 6,
            Repeatability::Low => 4,
        }
    }
}

/// Periodic mode acquisition rate in measurements per second.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mps {
    /// 0.5 measurements per second
    Half,
    /// 1 measurement per second
    One,
    /// 2 measurements per second
    Two,
    /// 4 measurements per second
    Four,
    /// 10 measurements per second
    Ten,
}

fn periodic_command(mps: Mps, rep: Repeatability) -> u16 {
    use Repeatability::*;
    match (mps, rep) {
        (Mps::Half, High) => 0x2032,
        (Mps::Half, Medium) => 0x2024,
        (Mps::Half, Low) => 0x202F,
        (Mps::One, High) => 0x2130,
        (Mps::One, Medium) => 0x2126,
        (Mps::One, Low) => 0x212D,
        (Mps::Two, High) => 0x2236,
        (Mps::Two, Medium) => 0x2220,
        (Mps::Two, Low) => 0x222B,
        (Mps::Four, High) => 0x2334,
        (Mps::Four, Medium) => 0x2322,
        (Mps::Four, Low) => 0x2329,
        (Mps::Ten, High) => 0x2737,
        (Mps::Ten, Medium) => 0x2721,
        (Mps::Ten, Low) => 0x272A,
    }
}

/// One converted measurement.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Measurement {
    /// Temperature in degrees Celsius.
    pub temperature: f32,
    /// Relative humidity in percent.
    pub humidity: f32,
}

/// Snapshot of the chip's status register.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Status(pub u16);

impl Status {
    /// At least one alert is pending.
    pub fn alert_pending(self) -> bool {
        self.0 & 0x8000 != 0
    }

    /// The heater is currently on.
    pub fn heater_on(self) -> bool {
        self.0 & 0x2000 != 0
    }

    /// Humidity tracking alert.
    pub fn rh_alert(self) -> bool {
        self.0 & 0x0800 != 0
    }

    /// Temperature tracking alert.
    pub fn t_alert(self) -> bool {
        self.0 & 0x0400 != 0
    }

    /// A reset occurred since the status was last cleared.
    pub fn reset_detected(self) -> bool {
        self.0 & 0x0010 != 0
    }

    /// The last command was not executed.
    pub fn command_error(self) -> bool {
        self.0 & 0x0002 != 0
    }

    /// The last write had a checksum error.
    pub fn checksum_error(self) -> bool {
        self.0 & 0x0001 != 0
    }
}

/// SHT3x driver over an I2C bus and a delay provider.
pub struct Sht3x<I2C, D> {
    i2c: I2C,
    delay: D,
    address: u8,
}

impl<I2C, D, E> Sht3x<I2C, D>
where
    I2C: I2c<Error = E>,
    D: DelayNs,
{
    /// Creates the driver for the sensor at `address` ([`ADDR_DEFAULT`]
    /// or [`ADDR_ALT`]).
    pub fn new(i2c: I2C, delay: D, address: u8) -> Self {
        Self {
            i2c,
            delay,
            address,
        }
    }

    /// Releases the bus, consuming the driver.
    pub fn release(self) -> I2C {
        self.i2c
    }

    /// Runs one single-shot measurement, blocking for the conversion time.
    pub fn measure(&mut self, repeatability: Repeatability) -> Result<Measurement, Error<E>> {
        self.command(repeatability.single_shot_command())?;
        self.delay.delay_ms(repeatability.duration_ms());
        self.read_measurement()
    }

    /// Starts periodic acquisition at the given rate. Use [`fetch`] to
    /// collect results and [`stop_periodic`] to return to idle.
    ///
    /// [`fetch`]: Self::fetch
    /// [`stop_periodic`]: Self::stop_periodic
    pub fn start_periodic(&mut self, mps: Mps, rep: Repeatability) -> Result<(), Error<E>> {
        self.command(periodic_command(mps, rep))
    }

    /// Enables the accelerated response time feature (4 Hz sampling).
    /// Only meaningful while periodic mode is active.
    pub fn start_art(&mut self) -> Result<(), Error<E>> {
        self.command(CMD_ART)
    }

    /// Fetches the latest result from periodic mode.
    pub fn fetch(&mut self) -> Result<Measurement, Error<E>> {
        self.command(CMD_FETCH)?;
        self.read_measurement()
    }

    /// Stops periodic acquisition.
    pub fn stop_periodic(&mut self) -> Result<(), Error<E>> {
        self.command(CMD_BREAK)?;
        // The datasheet asks for 1 ms before the next command.
        self.delay.delay_ms(1);
        Ok(())
    }

    /// Issues a soft reset and waits out the reset time.
    pub fn soft_reset(&mut self) -> Result<(), Error<E>> {
        self.command(CMD_SOFT_RESET)?;
        self.delay.delay_ms(2);
        Ok(())
    }

    /// Switches the built-in heater, used to plausibility-check the
    /// humidity reading.
    pub fn set_heater(&mut self, on: bool) -> Result<(), Error<E>> {
        self.command(if on { CMD_HEATER_ON } else { CMD_HEATER_OFF })
    }

    /// Reads the status register.
    pub fn status(&mut self) -> Result<Status, Error<E>> {
        self.command(CMD_READ_STATUS)?;
        let mut buf = [0u8; 3];
        self.i2c.read(self.address, &mut buf).map_err(Error::I2c)?;
        let word = word_checked(&buf)?;
        Ok(Status(word))
    }

    /// Clears the alert and reset flags in the status register.
    pub fn clear_status(&mut self) -> Result<(), Error<E>> {
        self.command(CMD_CLEAR_STATUS)
    }

    /// Reads the chip's unique serial number.
    pub fn serial_number(&mut self) -> Result<u32, Error<E>> {
        self.command(CMD_READ_SERIAL)?;
        self.delay.delay_us(500);
        let mut buf = [0u8; 6];
        self.i2c.read(self.address, &mut buf).map_err(Error::I2c)?;
        let high = word_checked(&buf[0..3])?;
        let low = word_checked(&buf[3..6])?;
        Ok((u32::from(high) << 16) | u32::from(low))
    }

    fn command(&mut self, cmd: u16) -> Result<(), Error<E>> {
        self.i2c
            .write(self.address, &cmd.to_be_bytes())
            .map_err(Error::I2c)
    }

    fn read_measurement(&mut self) -> Result<Measurement, Error<E>> {
        let mut buf = [0u8; 6];
        self.i2c.read(self.address, &mut buf).map_err(Error::I2c)?;
        let raw_t = word_checked(&buf[0..3])?;
        let raw_rh = word_checked(&buf[3..6])?;
        Ok(Measurement {
            temperature: convert_temperature(raw_t),
            humidity: convert_humidity(raw_rh),
        })
    }
}

fn convert_temperature(raw: u16) -> f32 {
    -45.0 + 175.0 * f32::from(raw) / 65536.0
}

fn convert_humidity(raw: u16) -> f32 {
    100.0 * f32::from(raw) / 65536.0
}

/// Extracts a big-endian word from a `[msb, lsb, crc]` slice, verifying
/// the checksum.
fn word_checked<E>(buf: &[u8]) -> Result<u16, Error<E>> {
    if crc8(&buf[0..2]) != buf[2] {
        return Err(Error::Crc);
    }
    Ok(u16::from_be_bytes([buf[0], buf[1]]))
}

/// CRC-8 with polynomial 0x31 and init 0xFF, as used by Sensirion parts.
fn crc8(data: &[u8]) -> u8 {
    let mut crc: u8 = 0xFF;
    for &byte in data {
        crc ^= byte;
        for _ in 0..8 {
            if crc & 0x80 != 0 {
                crc = (crc << 1) ^ 0x31;
            } else {
                crc <<= 1;
            }
        }
    }
    crc
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal_mock::eh1::delay::NoopDelay;
    use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction as I2cTransaction};

    // =========================================================================
    // CRC and conversion math
    // =========================================================================

    #[test]
    fn crc8_datasheet_vector() {
        // The datasheet example: CRC(0xBEEF) = 0x92
        assert_eq!(crc8(&[0xBE, 0xEF]), 0x92);
    }

    #[test]
    fn conversion_midscale() {
        // raw 0x8000 is exactly half scale
        assert_eq!(convert_temperature(0x8000), 42.5);
        assert_eq!(convert_humidity(0x8000), 50.0);
    }

    #[test]
    fn conversion_extremes() {
        assert_eq!(convert_temperature(0), -45.0);
        assert_eq!(convert_humidity(0), 0.0);
    }

    // =========================================================================
    // Bus behavior
    // =========================================================================

    #[test]
    fn single_shot_measurement() {
        // raw 0x8000 for both words; CRC(0x80, 0x00) = 0xA2
        let expectations = [
            I2cTransaction::write(ADDR_DEFAULT, vec![0x24, 0x00]),
            I2cTransaction::read(ADDR_DEFAULT, vec![0x80, 0x00, 0xA2, 0x80, 0x00, 0xA2]),
        ];
        let mut sensor = Sht3x::new(I2cMock::new(&expectations), NoopDelay, ADDR_DEFAULT);

        let m = sensor.measure(Repeatability::High).unwrap();
        assert_eq!(m.temperature, 42.5);
        assert_eq!(m.humidity, 50.0);

        sensor.release().done();
    }

    #[test]
    fn corrupted_word_is_rejected() {
        let expectations = [
            I2cTransaction::write(ADDR_DEFAULT, vec![0x24, 0x00]),
            I2cTransaction::read(ADDR_DEFAULT, vec![0x80, 0x00, 0x00, 0x80, 0x00, 0xA2]),
        ];
        let mut sensor = Sht3x::new(I2cMock::new(&expectations), NoopDelay, ADDR_DEFAULT);

        assert_eq!(sensor.measure(Repeatability::High), Err(Error::Crc));

        sensor.release().done();
    }

    #[test]
    fn periodic_start_fetch_stop() {
        let expectations = [
            I2cTransaction::write(ADDR_DEFAULT, vec![0x21, 0x30]),
            I2cTransaction::write(ADDR_DEFAULT, vec![0xE0, 0x00]),
            I2cTransaction::read(ADDR_DEFAULT, vec![0x80, 0x00, 0xA2, 0x80, 0x00, 0xA2]),
            I2cTransaction::write(ADDR_DEFAULT, vec![0x30, 0x93]),
        ];
        let mut sensor = Sht3x::new(I2cMock::new(&expectations), NoopDelay, ADDR_DEFAULT);

        sensor
            .start_periodic(Mps::One, Repeatability::High)
            .unwrap();
        let m = sensor.fetch().unwrap();
        assert_eq!(m.temperature, 42.5);
        sensor.stop_periodic().unwrap();

        sensor.release().done();
    }

    #[test]
    fn status_flags_decode() {
        let status = Status(0x8010);
        assert!(status.alert_pending());
        assert!(status.reset_detected());
        assert!(!status.heater_on());
        assert!(!status.command_error());
    }

    #[test]
    fn i2c_error_is_propagated() {
        use embedded_hal::i2c::ErrorKind;
        let expectations =
            [I2cTransaction::write(ADDR_DEFAULT, vec![0x24, 0x00]).with_error(ErrorKind::Other)];
        let mut sensor = Sht3x::new(I2cMock::new(&expectations), NoopDelay, ADDR_DEFAULT);

        assert!(matches!(
            sensor.measure(Repeatability::High),
            Err(Error::I2c(ErrorKind::Other))
        ));

        sensor.release().done();
    }

    #[test]
    fn alternate_address_is_used_on_the_bus() {
        let expectations = [I2cTransaction::write(ADDR_ALT, vec![0x30, 0xA2])];
        let mut sensor = Sht3x::new(I2cMock::new(&expectations), NoopDelay, ADDR_ALT);
        sensor.soft_reset().unwrap();
        sensor.release().done();
    }
}
