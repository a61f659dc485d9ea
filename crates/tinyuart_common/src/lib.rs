//! Benches that drive a [`UartCore`](tinyuart_core::UartCore) clock by clock.

mod echo;
mod line;
mod loopback;
mod trace;

pub use echo::Echo;
pub use line::LineDriver;
pub use loopback::Loopback;
pub use trace::{Sample, Trace};

/// Bits of one frame, LSB first as they appear on the wire: start, data,
/// stop.
pub fn frame_bits(byte: u8) -> [bool; 10] {
    let mut bits = [tinyuart_core::MARK; 10];
    bits[0] = tinyuart_core::SPACE;
    for (i, bit) in bits[1..9].iter_mut().enumerate() {
        *bit = byte & (1 << i) != 0;
    }
    bits
}
