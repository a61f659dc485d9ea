//! Baud-rate strobe generator.
//!
//! Both strobes come from the same divider so transmit and receive stay tied
//! to one configured baud rate. The transmit strobe fires once per bit
//! period. The receive strobe fires half a bit period after the receiver
//! becomes active, which puts every sample in the middle of its bit because
//! activation is phase-locked to the detected start edge.
//!
//! Each counter is held at zero while its `active` input is low, so an idle
//! engine never carries a stale phase into the next frame.

use crate::config::{UartConfig, OVERSAMPLE};
use crate::error::ConfigError;

/// Registered strobe outputs, visible to the shift engines on the tick after
/// they were computed.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct Strobes {
    pub tx: bool,
    pub rx: bool,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct TimingGen {
    sysclk_factor: u32,
    /// Last count of a bit period, `16 * factor - 1`.
    period_end: u32,
    /// Receive sampling point, `8 * factor - 1`.
    sample_point: u32,
    tx_counter: u32,
    rx_counter: u32,
    strobes: Strobes,
}

impl TimingGen {
    pub fn new(config: &UartConfig) -> Result<Self, ConfigError> {
        let sysclk_factor = config.sysclk_factor()?;
        // `sysclk_factor()` guarantees factor * 16 <= system_clock_hz.
        let period = sysclk_factor * OVERSAMPLE;
        Ok(Self {
            sysclk_factor,
            period_end: period - 1,
            sample_point: period / 2 - 1,
            tx_counter: 0,
            rx_counter: 0,
            strobes: Strobes::default(),
        })
    }

    #[inline]
    pub fn sysclk_factor(&self) -> u32 {
        self.sysclk_factor
    }

    /// Strobes currently presented to the shift engines.
    #[inline]
    pub fn strobes(&self) -> Strobes {
        self.strobes
    }

    #[inline]
    pub fn tx_counter(&self) -> u32 {
        self.tx_counter
    }

    #[inline]
    pub fn rx_counter(&self) -> u32 {
        self.rx_counter
    }

    /// Advance the divider by one clock and return the strobes that will be
    /// visible on the next tick.
    pub fn tick(&mut self, tx_active: bool, rx_active: bool) -> Strobes {
        let prev = *self;
        let mut next = Self {
            tx_counter: 0,
            rx_counter: 0,
            strobes: Strobes::default(),
            ..prev
        };

        if tx_active {
            if prev.tx_counter == prev.period_end {
                next.strobes.tx = true;
            } else {
                next.tx_counter = prev.tx_counter + 1;
            }
        }

        if rx_active {
            next.strobes.rx = prev.rx_counter == prev.sample_point;
            if prev.rx_counter != prev.period_end {
                next.rx_counter = prev.rx_counter + 1;
            }
        }

        *self = next;
        next.strobes
    }

    /// Return to the power-on state, keeping the divider.
    pub fn reset(&mut self) {
        self.tx_counter = 0;
        self.rx_counter = 0;
        self.strobes = Strobes::default();
    }
}
