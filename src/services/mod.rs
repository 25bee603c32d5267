//! Networked telemetry services (requires the `net` feature).
//!
//! Two halves of the course's plotting pipeline:
//!
//! - [`PlotServer`]: the PC side. Accepts one station at a time, greets
//!   it, and parses the line protocol into [`Sample`]s for a callback.
//! - [`stream_samples`]: the station side. Connects out, then pulls one
//!   sample per tick from a [`SampleSource`] and puts it on the wire.
//!
//! Both ends speak the format in [`crate::telemetry`].
//!
//! [`Sample`]: crate::telemetry::Sample
//! [`SampleSource`]: crate::traits::SampleSource

pub mod plot;
pub mod stream;

pub use plot::*;
pub use stream::*;
