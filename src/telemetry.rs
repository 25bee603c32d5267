//! Telemetry samples and the plot-server line protocol.
//!
//! The course's PC plot server reads one text line per sample. A line is
//! a comma-separated list of `name:value` pairs, CRLF-terminated:
//!
//! ```text
//! temperature:23.50,humidity:47.20\r\n
//! ```
//!
//! The names become plot legends on the PC side, so they may contain
//! spaces and unit suffixes (`Temperature [C]`), but not `,` or `:`.
//!
//! Everything in this module is `no_std` and allocation-free; samples are
//! bounded by [`MAX_READINGS`] and labels by [`MAX_LABEL`].

use core::fmt::Write as _;

use heapless::{String as HString, Vec as HVec};

/// Maximum number of readings a single sample can carry.
pub const MAX_READINGS: usize = 8;

/// Maximum length of a reading label in bytes.
pub const MAX_LABEL: usize = 32;

/// Maximum length of an encoded line in bytes, CRLF included.
pub const MAX_LINE: usize = 256;

/// Type alias for reading labels.
pub type Label = HString<MAX_LABEL>;

/// Type alias for encoded telemetry lines.
pub type Line = HString<MAX_LINE>;

/// A single named measurement.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Reading {
    /// Plot legend for this value, e.g. `"temperature"`.
    pub label: Label,
    /// The measured value.
    pub value: f32,
}

/// One telemetry sample: an ordered set of named readings.
///
/// # Example
///
/// ```rust
/// use rs_iotlab::telemetry::Sample;
///
/// let mut sample = Sample::new();
/// sample.push("lux", 312.5).unwrap();
/// assert_eq!(sample.encode_line().unwrap().as_str(), "lux:312.50\r\n");
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Sample {
    readings: HVec<Reading, MAX_READINGS>,
}

/// Errors raised while building a sample.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SampleError {
    /// The sample already holds [`MAX_READINGS`] readings.
    TooManyReadings,
    /// The label exceeds [`MAX_LABEL`] bytes.
    LabelTooLong,
}

/// Errors raised while encoding a sample into a line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EncodeError {
    /// The encoded form exceeds [`MAX_LINE`] bytes.
    LineTooLong,
    /// The sample has no readings; an empty line is not a valid frame.
    EmptySample,
}

/// Errors raised while parsing a received line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParseError {
    /// The line was empty after trimming.
    Empty,
    /// A pair had no `:` separator.
    MissingSeparator,
    /// The value part did not parse as a float.
    BadNumber,
    /// More than [`MAX_READINGS`] pairs on one line.
    TooManyReadings,
    /// A label exceeded [`MAX_LABEL`] bytes.
    LabelTooLong,
}

impl Sample {
    /// Creates an empty sample.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a named reading.
    pub fn push(&mut self, label: &str, value: f32) -> Result<(), SampleError> {
        let mut l = Label::new();
        l.push_str(label).map_err(|_| SampleError::LabelTooLong)?;
        self.readings
            .push(Reading { label: l, value })
            .map_err(|_| SampleError::TooManyReadings)
    }

    /// Number of readings in the sample.
    pub fn len(&self) -> usize {
        self.readings.len()
    }

    /// Returns true if the sample holds no readings.
    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    /// Iterates over the readings in insertion order.
    pub fn readings(&self) -> impl Iterator<Item = &Reading> {
        self.readings.iter()
    }

    /// Looks up a reading by label.
    pub fn get(&self, label: &str) -> Option<f32> {
        self.readings
            .iter()
            .find(|r| r.label.as_str() == label)
            .map(|r| r.value)
    }

    /// Encodes the sample as one CRLF-terminated plot-server line.
    ///
    /// Values are rendered with two decimals, which is what the course
    /// plot scripts expect for sensor data.
    pub fn encode_line(&self) -> Result<Line, EncodeError> {
        if self.readings.is_empty() {
            return Err(EncodeError::EmptySample);
        }
        let mut line = Line::new();
        for (i, reading) in self.readings.iter().enumerate() {
            if i > 0 {
                line.push(',').map_err(|_| EncodeError::LineTooLong)?;
            }
            write!(line, "{}:{:.2}", reading.label, reading.value)
                .map_err(|_| EncodeError::LineTooLong)?;
        }
        line.push_str("\r\n").map_err(|_| EncodeError::LineTooLong)?;
        Ok(line)
    }

    /// Parses one received line into a sample.
    ///
    /// Trailing CR/LF and surrounding whitespace are ignored. Labels are
    /// split from values at the first `:`, matching the PC-side parser.
    pub fn parse_line(line: &str) -> Result<Self, ParseError> {
        let line = line.trim();
        if line.is_empty() {
            return Err(ParseError::Empty);
        }

        let mut sample = Sample::new();
        for pair in line.split(',') {
            let (label, value) = pair.split_once(':').ok_or(ParseError::MissingSeparator)?;
            let value: f32 = value.trim().parse().map_err(|_| ParseError::BadNumber)?;
            sample.push(label.trim(), value).map_err(|e| match e {
                SampleError::TooManyReadings => ParseError::TooManyReadings,
                SampleError::LabelTooLong => ParseError::LabelTooLong,
            })?;
        }
        Ok(sample)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // Encoding
    // =========================================================================

    #[test]
    fn encode_single_reading() {
        let mut s = Sample::new();
        s.push("temperature", 23.5).unwrap();
        assert_eq!(s.encode_line().unwrap().as_str(), "temperature:23.50\r\n");
    }

    #[test]
    fn encode_multiple_readings_preserves_order() {
        let mut s = Sample::new();
        s.push("temperature", 23.5).unwrap();
        s.push("humidity", 47.2).unwrap();
        s.push("pressure", 1013.25).unwrap();
        assert_eq!(
            s.encode_line().unwrap().as_str(),
            "temperature:23.50,humidity:47.20,pressure:1013.25\r\n"
        );
    }

    #[test]
    fn encode_negative_value() {
        let mut s = Sample::new();
        s.push("temperature", -4.25).unwrap();
        assert_eq!(s.encode_line().unwrap().as_str(), "temperature:-4.25\r\n");
    }

    #[test]
    fn encode_empty_sample_is_an_error() {
        assert_eq!(Sample::new().encode_line(), Err(EncodeError::EmptySample));
    }

    #[test]
    fn labels_may_carry_units() {
        let mut s = Sample::new();
        s.push("Temperature [C]", 21.0).unwrap();
        assert_eq!(
            s.encode_line().unwrap().as_str(),
            "Temperature [C]:21.00\r\n"
        );
    }

    // =========================================================================
    // Building
    // =========================================================================

    #[test]
    fn push_rejects_overlong_label() {
        let mut s = Sample::new();
        let long = "x".repeat(MAX_LABEL + 1);
        assert_eq!(s.push(&long, 1.0), Err(SampleError::LabelTooLong));
    }

    #[test]
    fn push_rejects_overflow() {
        let mut s = Sample::new();
        for i in 0..MAX_READINGS {
            s.push("r", i as f32).unwrap();
        }
        assert_eq!(s.push("r", 0.0), Err(SampleError::TooManyReadings));
    }

    #[test]
    fn get_by_label() {
        let mut s = Sample::new();
        s.push("lux", 312.5).unwrap();
        s.push("temperature", 21.0).unwrap();
        assert_eq!(s.get("lux"), Some(312.5));
        assert_eq!(s.get("missing"), None);
    }

    // =========================================================================
    // Parsing
    // =========================================================================

    #[test]
    fn parse_round_trip() {
        let mut s = Sample::new();
        s.push("temperature", 23.5).unwrap();
        s.push("humidity", 47.25).unwrap();
        let line = s.encode_line().unwrap();
        let parsed = Sample::parse_line(&line).unwrap();
        assert_eq!(parsed, s);
    }

    #[test]
    fn parse_tolerates_whitespace() {
        let parsed = Sample::parse_line("  temperature : 23.5 , humidity : 47.2 \r\n").unwrap();
        assert_eq!(parsed.get("temperature"), Some(23.5));
        assert_eq!(parsed.get("humidity"), Some(47.2));
    }

    #[test]
    fn parse_empty_line() {
        assert_eq!(Sample::parse_line("\r\n"), Err(ParseError::Empty));
    }

    #[test]
    fn parse_missing_separator() {
        assert_eq!(
            Sample::parse_line("temperature 23.5\r\n"),
            Err(ParseError::MissingSeparator)
        );
    }

    #[test]
    fn parse_bad_number() {
        assert_eq!(
            Sample::parse_line("temperature:warm\r\n"),
            Err(ParseError::BadNumber)
        );
    }

    #[test]
    fn parse_splits_label_at_first_colon_only() {
        let parsed = Sample::parse_line("time 12:30\r\n");
        // "time 12" / "30" - valid per the PC parser, value is 30
        assert_eq!(parsed.unwrap().get("time 12"), Some(30.0));
    }

    #[test]
    fn parse_too_many_readings() {
        let line = (0..MAX_READINGS + 1)
            .map(|i| alloc::format!("r{}:1.0", i))
            .collect::<alloc::vec::Vec<_>>()
            .join(",");
        assert_eq!(Sample::parse_line(&line), Err(ParseError::TooManyReadings));
    }

    // =========================================================================
    // Serde (optional)
    // =========================================================================

    #[cfg(feature = "serde")]
    #[test]
    fn sample_serializes_to_json() {
        let mut s = Sample::new();
        s.push("lux", 312.5).unwrap();
        let json = serde_json::to_string(&s).unwrap();
        assert!(json.contains("\"lux\""));
        let back: Sample = serde_json::from_str(&json).unwrap();
        assert_eq!(back, s);
    }
}
