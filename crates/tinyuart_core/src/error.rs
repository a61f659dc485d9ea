use thiserror::Error;

/// Rejected clock/baud combinations.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    #[error("system clock frequency must be non-zero")]
    ZeroClock,
    #[error("baud rate must be non-zero")]
    ZeroBaudRate,
    #[error("clock divider {factor} is below 2: {system_clock_hz} Hz is too slow for {baud_rate} baud")]
    FactorTooSmall {
        factor: u32,
        system_clock_hz: u32,
        baud_rate: u32,
    },
}
