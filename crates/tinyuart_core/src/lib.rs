//! Cycle-accurate model of a small UART core.
//!
//! The core is three register blocks advanced in lockstep by
//! [`UartCore::tick`]: a transmit shift engine, a receive shift engine with
//! an input synchronizer, and a baud-rate strobe generator shared by both.
//! Every block computes its next state from the registers as they stood at
//! the start of the tick, the same way synchronous logic latches on a clock
//! edge.

pub mod config;
pub mod error;
pub mod shift_in;
pub mod shift_out;
pub mod status;
pub mod timing;
mod uart;

pub use config::UartConfig;
pub use error::ConfigError;
pub use shift_in::ShiftIn;
pub use shift_out::ShiftOut;
pub use status::Status;
pub use timing::{Strobes, TimingGen};
pub use uart::{Pins, UartCore};

/// Line level of a mark / idle bit.
pub const MARK: bool = true;
/// Line level of a space bit, and of the start bit.
pub const SPACE: bool = false;

#[cfg(test)]
mod tests;
