use anyhow::{bail, Context, Result};
use tinyuart_core::{Pins, UartConfig, UartCore};

use crate::trace::Trace;

/// A core with its transmit line wired straight into its receive line.
pub struct Loopback {
    core: UartCore,
    trace: Option<Trace>,
}

impl Loopback {
    pub fn new(config: UartConfig) -> Result<Self> {
        let core = UartCore::new(config).context("invalid UART configuration")?;
        Ok(Self { core, trace: None })
    }

    pub fn core(&self) -> &UartCore {
        &self.core
    }

    /// Start recording a sample per clock from now on.
    pub fn enable_trace(&mut self) {
        self.trace.get_or_insert_with(Trace::new);
    }

    pub fn trace(&self) -> Option<&Trace> {
        self.trace.as_ref()
    }

    pub fn take_trace(&mut self) -> Option<Trace> {
        self.trace.take()
    }

    /// One clock. `pins.rx` is replaced by the current transmit level.
    pub fn tick(&mut self, pins: Pins) {
        let rx = self.core.tx();
        if let Some(trace) = self.trace.as_mut() {
            trace.record(&self.core, rx);
        }
        self.core.tick(pins.with_rx(rx));
    }

    pub fn step(&mut self) {
        self.tick(Pins::idle());
    }

    pub fn run(&mut self, ticks: u64) {
        for _ in 0..ticks {
            self.step();
        }
    }

    /// Step idle clocks until `done` holds, at most `max_ticks` of them.
    /// Returns how many clocks were stepped.
    pub fn run_until(&mut self, max_ticks: u64, mut done: impl FnMut(&UartCore) -> bool) -> Option<u64> {
        for n in 0..max_ticks {
            if done(&self.core) {
                return Some(n);
            }
            self.step();
        }
        done(&self.core).then_some(max_ticks)
    }

    /// One clock with the write request asserted.
    pub fn write(&mut self, byte: u8) {
        self.tick(Pins::idle().with_write(byte));
    }

    /// One clock with the read request asserted. Returns the byte that was
    /// latched before the read.
    pub fn read(&mut self) -> u8 {
        let byte = self.core.in_data();
        self.tick(Pins::idle().with_read());
        byte
    }

    /// Send `byte` once the transmitter is free and read it back.
    pub fn transfer(&mut self, byte: u8) -> Result<u8> {
        let budget = self.frame_budget();
        if self.run_until(budget, |core| core.tx_empty()).is_none() {
            bail!("transmitter still busy after {budget} clocks");
        }
        self.write(byte);
        if self.run_until(budget, |core| !core.rx_empty()).is_none() {
            bail!("{byte:#04x} not received within {budget} clocks");
        }
        if self.core.rx_overrun() {
            log::warn!("loopback: receive overrun while sending {byte:#04x}");
        }
        Ok(self.read())
    }

    /// Generous upper bound on the clocks one frame can take.
    pub fn frame_budget(&self) -> u64 {
        u64::from(self.core.sysclk_factor()) * 16 * 12
    }
}
