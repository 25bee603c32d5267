//! Sensor and display drivers, generic over `embedded-hal` 1.0 traits.
//!
//! Each driver owns its bus/pin resources, exposes a typed error enum
//! wrapping the underlying HAL error, and can be exercised against
//! `embedded-hal-mock` in tests.
//!
//! | Driver | Chip | Bus |
//! |--------|------|-----|
//! | [`tm1637`] | TM1637 4-digit seven-segment display | 2-wire (CLK/DIO) |
//! | [`sht3x`] | SHT30/31/35 temperature & humidity | I2C |
//! | [`bh1750`] | BH1750 ambient light | I2C |
//! | [`bmp180`] | BMP180 barometric pressure | I2C |
//! | [`qmc5883`] | QMC5883L magnetometer | I2C |
//! | [`hmc5883`] | HMC5883L magnetometer | I2C |
//! | [`adxl345`] | ADXL345 3-axis accelerometer | I2C |
//! | [`tcs3200`] | TCS3200 color sensor | GPIO + pulse counter |
//!
//! [`compass`] is not a chip driver: it turns magnetometer axes from
//! either 5883 part into a tilt-free compass heading.

pub mod adxl345;
pub mod bh1750;
pub mod bmp180;
pub mod compass;
pub mod hmc5883;
pub mod qmc5883;
pub mod sht3x;
pub mod tcs3200;
pub mod tm1637;
