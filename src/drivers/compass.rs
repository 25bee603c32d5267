//! Compass heading from magnetometer axes.
//!
//! Works with either 5883 part: feed it the horizontal-plane field
//! components and a local magnetic declination, get a heading in degrees
//! clockwise from true north. The sensor must be held level; there is no
//! tilt compensation here.

use libm::atan2f;

/// Local magnetic declination in degrees and arc minutes.
///
/// Look the value up for your location; it is applied so the returned
/// heading references true north instead of magnetic north. Negative
/// `degrees` means a westerly declination; `minutes` always carries the
/// same sign as `degrees`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Declination {
    /// Whole degrees, signed.
    pub degrees: i16,
    /// Arc minutes (0..=59).
    pub minutes: u8,
}

impl Declination {
    /// Creates a declination. Minutes above 59 are clamped.
    pub fn new(degrees: i16, minutes: u8) -> Self {
        Self {
            degrees,
            minutes: minutes.min(59),
        }
    }

    /// The declination as fractional degrees.
    pub fn as_degrees(self) -> f32 {
        let magnitude = f32::from(self.degrees.unsigned_abs()) + f32::from(self.minutes) / 60.0;
        if self.degrees < 0 {
            -magnitude
        } else {
            magnitude
        }
    }
}

/// Heading in degrees, 0..360 clockwise from north.
///
/// `x` points north and `y` east in the sensor frame; pass the Gauss (or
/// raw, the ratio is all that matters) values from a level magnetometer.
pub fn heading_degrees(x: f32, y: f32, declination: Declination) -> f32 {
    let mut heading = atan2f(y, x).to_degrees() + declination.as_degrees();
    while heading < 0.0 {
        heading += 360.0;
    }
    while heading >= 360.0 {
        heading -= 360.0;
    }
    heading
}

const CARDINALS: [&str; 8] = ["N", "NE", "E", "SE", "S", "SW", "W", "NW"];

/// Nearest 8-point cardinal direction for a heading in degrees.
pub fn cardinal(heading: f32) -> &'static str {
    let sector = ((heading + 22.5) / 45.0) as usize % 8;
    CARDINALS[sector]
}
