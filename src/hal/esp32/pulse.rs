//! PCNT-backed pulse counting for ESP32.
//!
//! The ESP32's pulse counter peripheral counts edges in hardware, which
//! is what makes gated frequency measurement (TCS3200) practical without
//! interrupt handlers.

use esp_idf_hal::pcnt::{
    PcntChannel, PcntChannelConfig, PcntControlMode, PcntCountMode, PcntDriver, PinIndex,
};
use esp_idf_sys::EspError;

use crate::traits::PulseCounter;

/// Rising-edge counter on a PCNT unit.
///
/// The hardware counter is 16 bits; [`count`](PulseCounter::count) is
/// valid as long as one gate window sees fewer than `i16::MAX` edges.
/// At the TCS3200's 20% scaling and a 100 ms gate that leaves plenty of
/// headroom.
///
/// # Example
///
/// ```ignore
/// use esp_idf_hal::pcnt::PcntDriver;
/// use esp_idf_hal::gpio::AnyInputPin;
/// use rs_iotlab::hal::esp32::Esp32Pulse;
///
/// let pcnt = PcntDriver::new(
///     peripherals.pcnt0,
///     Some(peripherals.pins.gpio4),
///     Option::<AnyInputPin>::None,
///     Option::<AnyInputPin>::None,
///     Option::<AnyInputPin>::None,
/// )?;
/// let counter = Esp32Pulse::new(pcnt)?;
/// ```
pub struct Esp32Pulse<'d> {
    pcnt: PcntDriver<'d>,
}

impl<'d> Esp32Pulse<'d> {
    /// Configures channel 0 of the given PCNT unit to count rising
    /// edges on its first signal pin and starts it paused at zero.
    pub fn new(mut pcnt: PcntDriver<'d>) -> Result<Self, EspError> {
        pcnt.channel_config(
            PcntChannel::Channel0,
            PinIndex::Pin0,
            PinIndex::Pin1,
            &PcntChannelConfig {
                lctrl_mode: PcntControlMode::Keep,
                hctrl_mode: PcntControlMode::Keep,
                pos_mode: PcntCountMode::Increment,
                neg_mode: PcntCountMode::Hold,
                counter_h_lim: i16::MAX,
                counter_l_lim: 0,
            },
        )?;
        pcnt.counter_pause()?;
        pcnt.counter_clear()?;
        Ok(Self { pcnt })
    }
}

impl PulseCounter for Esp32Pulse<'_> {
    type Error = EspError;

    fn reset(&mut self) -> Result<(), EspError> {
        self.pcnt.counter_pause()?;
        self.pcnt.counter_clear()?;
        self.pcnt.counter_resume()
    }

    fn count(&mut self) -> Result<u32, EspError> {
        // The counter never goes below the low limit of 0.
        Ok(self.pcnt.get_counter_value()?.max(0) as u32)
    }
}
