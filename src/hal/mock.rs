//! Mock implementations for testing without hardware.
//!
//! Test doubles for the crate's own traits, so stations and drivers can
//! be exercised on desktop. I2C, pins, and delays are mocked by
//! `embedded-hal-mock` instead; these cover what that crate cannot know
//! about.
//!
//! # Available Mocks
//!
//! | Mock | Trait | Purpose |
//! |------|-------|---------|
//! | [`MockPulseCounter`] | [`PulseCounter`] | Queued edge counts |
//! | [`MockSampleSource`] | [`SampleSource`] | Queued telemetry samples |
//! | [`MockDisplay`] | [`ReadoutDisplay`] | Tracks render calls |
//!
//! [`PulseCounter`]: crate::traits::PulseCounter
//! [`SampleSource`]: crate::traits::SampleSource
//! [`ReadoutDisplay`]: crate::traits::ReadoutDisplay

use core::convert::Infallible;

use alloc::string::String;
use alloc::vec::Vec;

use crate::telemetry::Sample;
use crate::traits::{PulseCounter, ReadoutDisplay, SampleSource};

// ============================================================================
// Pulse Counter Mock
// ============================================================================

/// Mock pulse counter for testing frequency-based drivers.
///
/// Queue the count each gate window should observe; every
/// [`count`](PulseCounter::count) call consumes one queued value. Call
/// [`done`](MockPulseCounter::done) at the end of the test to assert
/// the queue was drained.
///
/// # Example
///
/// ```rust
/// use rs_iotlab::hal::MockPulseCounter;
/// use rs_iotlab::traits::PulseCounter;
///
/// let mut counter = MockPulseCounter::new(&[500, 120]);
/// counter.reset().unwrap();
/// assert_eq!(counter.count().unwrap(), 500);
/// counter.reset().unwrap();
/// assert_eq!(counter.count().unwrap(), 120);
/// assert_eq!(counter.reset_count, 2);
/// counter.done();
/// ```
#[derive(Debug, Default)]
pub struct MockPulseCounter {
    counts: Vec<u32>,
    next: usize,
    /// Number of times `reset` was called.
    pub reset_count: usize,
}

impl MockPulseCounter {
    /// Creates a mock with the given queue of gate counts.
    pub fn new(counts: &[u32]) -> Self {
        Self {
            counts: counts.to_vec(),
            next: 0,
            reset_count: 0,
        }
    }

    /// Asserts that every queued count was consumed.
    pub fn done(&self) {
        assert_eq!(
            self.next,
            self.counts.len(),
            "MockPulseCounter: {} queued count(s) not consumed",
            self.counts.len() - self.next
        );
    }
}

impl PulseCounter for MockPulseCounter {
    type Error = Infallible;

    fn reset(&mut self) -> Result<(), Infallible> {
        self.reset_count += 1;
        Ok(())
    }

    fn count(&mut self) -> Result<u32, Infallible> {
        let value = self
            .counts
            .get(self.next)
            .copied()
            .unwrap_or_else(|| panic!("MockPulseCounter: count() called with no queued value"));
        self.next += 1;
        Ok(value)
    }
}

// ============================================================================
// Sample Source Mock
// ============================================================================

/// Mock telemetry source with a queue of prepared samples.
///
/// # Example
///
/// ```rust
/// use rs_iotlab::hal::MockSampleSource;
/// use rs_iotlab::telemetry::Sample;
/// use rs_iotlab::traits::SampleSource;
///
/// let mut sample = Sample::new();
/// sample.push("temperature", 21.0).unwrap();
///
/// let mut source = MockSampleSource::new();
/// source.queue(sample.clone());
///
/// assert_eq!(source.sample().unwrap(), sample);
/// assert_eq!(source.sample_count, 1);
/// ```
#[derive(Debug, Default)]
pub struct MockSampleSource {
    queue: Vec<Sample>,
    /// Number of times `sample` was called.
    pub sample_count: usize,
}

impl MockSampleSource {
    /// Creates an empty mock source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues one sample to be returned.
    pub fn queue(&mut self, sample: Sample) {
        self.queue.push(sample);
    }

    /// Queues several samples, returned in order.
    pub fn queue_all(&mut self, samples: &[Sample]) {
        self.queue.extend_from_slice(samples);
    }

    /// Remaining queued samples.
    pub fn remaining(&self) -> usize {
        self.queue.len()
    }
}

impl SampleSource for MockSampleSource {
    type Error = Infallible;

    fn sample(&mut self) -> Result<Sample, Infallible> {
        self.sample_count += 1;
        if self.queue.is_empty() {
            panic!("MockSampleSource: sample() called with no queued sample");
        }
        Ok(self.queue.remove(0))
    }
}

// ============================================================================
// Display Mock
// ============================================================================

/// Mock readout display for testing station rendering.
///
/// # Example
///
/// ```rust
/// use rs_iotlab::hal::MockDisplay;
/// use rs_iotlab::traits::ReadoutDisplay;
///
/// let mut display = MockDisplay::new();
/// display.init().unwrap();
/// assert!(display.initialized);
/// assert_eq!(display.sample_count, 0);
/// ```
#[derive(Debug, Default)]
pub struct MockDisplay {
    /// The last sample that was rendered.
    pub last_sample: Option<Sample>,
    /// Number of times `show_sample` was called.
    pub sample_count: usize,
    /// Last message shown via `show_message`.
    pub last_message: Option<(String, Option<String>)>,
    /// Whether `init` was called.
    pub initialized: bool,
}

impl MockDisplay {
    /// Creates a new mock display.
    pub fn new() -> Self {
        Self::default()
    }
}

impl ReadoutDisplay for MockDisplay {
    type Error = Infallible;

    fn init(&mut self) -> Result<(), Infallible> {
        self.initialized = true;
        Ok(())
    }

    fn clear(&mut self) -> Result<(), Infallible> {
        self.last_sample = None;
        Ok(())
    }

    fn show_sample(&mut self, sample: &Sample) -> Result<(), Infallible> {
        self.last_sample = Some(sample.clone());
        self.sample_count += 1;
        Ok(())
    }

    fn show_message(&mut self, line1: &str, line2: Option<&str>) -> Result<(), Infallible> {
        self.last_message = Some((line1.into(), line2.map(Into::into)));
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // MockPulseCounter Tests
    // =========================================================================

    #[test]
    fn pulse_counter_returns_queued_values_in_order() {
        let mut counter = MockPulseCounter::new(&[10, 20, 30]);
        assert_eq!(counter.count().unwrap(), 10);
        assert_eq!(counter.count().unwrap(), 20);
        assert_eq!(counter.count().unwrap(), 30);
        counter.done();
    }

    #[test]
    fn pulse_counter_tracks_resets() {
        let mut counter = MockPulseCounter::new(&[]);
        counter.reset().unwrap();
        counter.reset().unwrap();
        assert_eq!(counter.reset_count, 2);
        counter.done();
    }

    #[test]
    #[should_panic(expected = "no queued value")]
    fn pulse_counter_panics_when_drained() {
        let mut counter = MockPulseCounter::new(&[]);
        let _ = counter.count();
    }

    #[test]
    #[should_panic(expected = "not consumed")]
    fn pulse_counter_done_flags_leftovers() {
        let counter = MockPulseCounter::new(&[1]);
        counter.done();
    }

    // =========================================================================
    // MockSampleSource Tests
    // =========================================================================

    #[test]
    fn sample_source_fifo_order() {
        let mut a = Sample::new();
        a.push("t", 1.0).unwrap();
        let mut b = Sample::new();
        b.push("t", 2.0).unwrap();

        let mut source = MockSampleSource::new();
        source.queue_all(&[a.clone(), b.clone()]);
        assert_eq!(source.remaining(), 2);

        assert_eq!(source.sample().unwrap(), a);
        assert_eq!(source.sample().unwrap(), b);
        assert_eq!(source.sample_count, 2);
        assert_eq!(source.remaining(), 0);
    }

    // =========================================================================
    // MockDisplay Tests
    // =========================================================================

    #[test]
    fn display_records_samples() {
        let mut sample = Sample::new();
        sample.push("lux", 300.0).unwrap();

        let mut display = MockDisplay::new();
        display.init().unwrap();
        display.show_sample(&sample).unwrap();

        assert!(display.initialized);
        assert_eq!(display.sample_count, 1);
        assert_eq!(display.last_sample.as_ref(), Some(&sample));
    }

    #[test]
    fn display_clear_drops_the_sample() {
        let mut sample = Sample::new();
        sample.push("lux", 300.0).unwrap();

        let mut display = MockDisplay::new();
        display.show_sample(&sample).unwrap();
        display.clear().unwrap();
        assert!(display.last_sample.is_none());
    }

    #[test]
    fn display_records_messages() {
        let mut display = MockDisplay::new();
        display.show_message("WiFi up", Some("192.168.1.7")).unwrap();

        let (line1, line2) = display.last_message.as_ref().unwrap();
        assert_eq!(line1, "WiFi up");
        assert_eq!(line2.as_deref(), Some("192.168.1.7"));
    }
}
