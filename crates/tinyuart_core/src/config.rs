use typed_builder::TypedBuilder;

use crate::error::ConfigError;

/// Oversampling ratio of the receive side. The transmit side divides by the
/// same amount so both engines run at one configured baud rate.
pub const OVERSAMPLE: u32 = 16;

/// Bits in one frame on the wire: start, 8 data bits, stop.
pub const FRAME_BITS: u32 = 10;

/// Clock and baud rate fixed for the lifetime of a core.
#[derive(TypedBuilder, Copy, Clone, Debug, Eq, PartialEq)]
pub struct UartConfig {
    #[builder(default = 12_000_000)]
    pub system_clock_hz: u32,
    #[builder(default = 19_200)]
    pub baud_rate: u32,
}

impl Default for UartConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl UartConfig {
    pub fn new(system_clock_hz: u32, baud_rate: u32) -> Self {
        Self {
            system_clock_hz,
            baud_rate,
        }
    }

    /// System clock cycles per oversample period,
    /// `floor(system_clock_hz / (baud_rate * 16))`.
    ///
    /// A factor of 1 cannot place the receive strobe at a distinct
    /// mid-bit count, so anything below 2 is rejected.
    pub fn sysclk_factor(&self) -> Result<u32, ConfigError> {
        if self.system_clock_hz == 0 {
            return Err(ConfigError::ZeroClock);
        }
        if self.baud_rate == 0 {
            return Err(ConfigError::ZeroBaudRate);
        }
        let divisor = u64::from(self.baud_rate) * u64::from(OVERSAMPLE);
        let factor = (u64::from(self.system_clock_hz) / divisor) as u32;
        if factor < 2 {
            return Err(ConfigError::FactorTooSmall {
                factor,
                system_clock_hz: self.system_clock_hz,
                baud_rate: self.baud_rate,
            });
        }
        Ok(factor)
    }

    /// Baud rate the integer divider really produces for `factor`.
    pub fn actual_baud_rate(&self, factor: u32) -> f64 {
        f64::from(self.system_clock_hz) / (f64::from(factor) * f64::from(OVERSAMPLE))
    }

    /// Signed deviation of the produced baud rate from the requested one,
    /// in parts per million.
    pub fn baud_error_ppm(&self) -> Result<f64, ConfigError> {
        let factor = self.sysclk_factor()?;
        let requested = f64::from(self.baud_rate);
        Ok((self.actual_baud_rate(factor) - requested) / requested * 1e6)
    }

    /// Clock ticks one bit occupies on the wire.
    pub fn bit_ticks(&self) -> Result<u64, ConfigError> {
        Ok(u64::from(self.sysclk_factor()?) * u64::from(OVERSAMPLE))
    }

    /// Clock ticks one whole frame occupies on the wire.
    pub fn frame_ticks(&self) -> Result<u64, ConfigError> {
        Ok(self.bit_ticks()? * u64::from(FRAME_BITS))
    }
}
