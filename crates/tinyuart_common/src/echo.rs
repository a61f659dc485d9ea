use anyhow::{Context, Result};
use tinyuart_core::{Pins, UartConfig, UartCore};

/// Echo device: every received byte is written straight back out.
///
/// `out_data` is wired to `in_data`. The write and read requests are
/// registers set on the clock after the receiver reports a byte. Because the
/// receiver's `empty` flag is itself registered, both requests stay high for
/// two clocks per byte: the first load is accepted, the second raises
/// `tx_overrun` until the next byte is echoed.
pub struct Echo {
    core: UartCore,
    write: bool,
    read: bool,
}

impl Echo {
    pub fn new(config: UartConfig) -> Result<Self> {
        let core = UartCore::new(config).context("invalid UART configuration")?;
        Ok(Self {
            core,
            write: false,
            read: false,
        })
    }

    pub fn core(&self) -> &UartCore {
        &self.core
    }

    /// One clock with `rx` on the receive line. Returns the transmit level
    /// driven during that clock.
    pub fn tick(&mut self, rx: bool) -> bool {
        let tx = self.core.tx();
        let pins = Pins {
            rx,
            write: self.write,
            read: self.read,
            out_data: self.core.in_data(),
        };
        let respond = !self.core.rx_empty();
        self.core.tick(pins);
        self.write = respond;
        self.read = respond;
        tx
    }
}
