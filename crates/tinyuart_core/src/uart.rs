use crate::config::UartConfig;
use crate::error::ConfigError;
use crate::shift_in::ShiftIn;
use crate::shift_out::ShiftOut;
use crate::status::Status;
use crate::timing::{Strobes, TimingGen};

/// Inputs sampled by the core on one clock.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Pins {
    /// Receive line level.
    pub rx: bool,
    /// Request to load `out_data` into the transmitter.
    pub write: bool,
    /// Request to consume the received byte.
    pub read: bool,
    pub out_data: u8,
}

impl Default for Pins {
    fn default() -> Self {
        Self {
            rx: crate::MARK,
            write: false,
            read: false,
            out_data: 0,
        }
    }
}

impl Pins {
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn with_rx(mut self, rx: bool) -> Self {
        self.rx = rx;
        self
    }

    pub fn with_write(mut self, out_data: u8) -> Self {
        self.write = true;
        self.out_data = out_data;
        self
    }

    pub fn with_read(mut self) -> Self {
        self.read = true;
        self
    }
}

/// Transmitter, receiver and baud timing wired together.
///
/// The timing generator's `active` inputs come from the engines themselves:
/// transmit timing runs while a frame is in flight, receive timing while a
/// frame is being received. Its strobes drive the engines' shift inputs.
#[derive(Clone, Debug)]
pub struct UartCore {
    config: UartConfig,
    timing: TimingGen,
    shift_out: ShiftOut,
    shift_in: ShiftIn,
    cycles: u64,
}

impl UartCore {
    pub fn new(config: UartConfig) -> Result<Self, ConfigError> {
        let timing = TimingGen::new(&config)?;
        log::info!(
            "uart: {} Hz / {} baud, divider {}, actual {:.1} baud ({:+.0} ppm)",
            config.system_clock_hz,
            config.baud_rate,
            timing.sysclk_factor(),
            config.actual_baud_rate(timing.sysclk_factor()),
            config.baud_error_ppm()?,
        );
        Ok(Self {
            config,
            timing,
            shift_out: ShiftOut::new(),
            shift_in: ShiftIn::new(),
            cycles: 0,
        })
    }

    /// Return every register to its power-on value. Configuration is kept.
    pub fn reset(&mut self) {
        self.timing.reset();
        self.shift_out = ShiftOut::new();
        self.shift_in = ShiftIn::new();
        self.cycles = 0;
    }

    /// Advance the whole core by one system clock.
    pub fn tick(&mut self, pins: Pins) {
        // Every wire between blocks is taken from the pre-tick registers
        // before any block is advanced.
        let strobes = self.timing.strobes();
        let tx_active = !self.shift_out.empty();
        let rx_active = self.shift_in.busy();

        self.shift_out.tick(pins.write, pins.out_data, strobes.tx);
        self.shift_in.tick(pins.rx, pins.read, strobes.rx);
        self.timing.tick(tx_active, rx_active);

        self.cycles = self.cycles.wrapping_add(1);
    }

    #[inline]
    pub fn config(&self) -> &UartConfig {
        &self.config
    }

    #[inline]
    pub fn sysclk_factor(&self) -> u32 {
        self.timing.sysclk_factor()
    }

    /// Clock ticks since power-on or the last reset.
    #[inline]
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    #[inline]
    pub fn tx(&self) -> bool {
        self.shift_out.tx()
    }

    #[inline]
    pub fn in_data(&self) -> u8 {
        self.shift_in.in_data()
    }

    #[inline]
    pub fn tx_empty(&self) -> bool {
        self.shift_out.empty()
    }

    #[inline]
    pub fn rx_empty(&self) -> bool {
        self.shift_in.empty()
    }

    #[inline]
    pub fn tx_overrun(&self) -> bool {
        self.shift_out.overrun()
    }

    #[inline]
    pub fn rx_overrun(&self) -> bool {
        self.shift_in.overrun()
    }

    #[inline]
    pub fn rx_busy(&self) -> bool {
        self.shift_in.busy()
    }

    /// Strobes the shift engines will see on the next tick.
    #[inline]
    pub fn strobes(&self) -> Strobes {
        self.timing.strobes()
    }

    pub fn status(&self) -> Status {
        let mut status = Status::empty();
        status.set(Status::TX_EMPTY, self.tx_empty());
        status.set(Status::RX_EMPTY, self.rx_empty());
        status.set(Status::TX_OVERRUN, self.tx_overrun());
        status.set(Status::RX_OVERRUN, self.rx_overrun());
        status.set(Status::RX_BUSY, self.rx_busy());
        status
    }

    pub fn timing(&self) -> &TimingGen {
        &self.timing
    }

    pub fn shift_out(&self) -> &ShiftOut {
        &self.shift_out
    }

    pub fn shift_in(&self) -> &ShiftIn {
        &self.shift_in
    }
}
