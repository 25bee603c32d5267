//! Telemetry source abstraction for the streaming services.

use crate::telemetry::Sample;

/// A source of telemetry samples.
///
/// The streaming services pull one [`Sample`] per tick from a source and
/// put it on the wire. Implementing this trait is how a concrete sensor
/// setup (an SHT3x on a bus, a mix of sensors, a replayed log) plugs into
/// [`stream_samples`].
///
/// # Example
///
/// ```rust
/// use rs_iotlab::traits::SampleSource;
/// use rs_iotlab::telemetry::Sample;
///
/// struct Constant;
///
/// impl SampleSource for Constant {
///     type Error = core::convert::Infallible;
///
///     fn sample(&mut self) -> Result<Sample, Self::Error> {
///         let mut s = Sample::new();
///         s.push("temperature", 21.0).unwrap();
///         Ok(s)
///     }
/// }
/// ```
///
/// [`stream_samples`]: crate::services::stream_samples
pub trait SampleSource {
    /// Error type for sampling operations.
    type Error;

    /// Take one measurement and return it as a sample.
    fn sample(&mut self) -> Result<Sample, Self::Error>;
}
