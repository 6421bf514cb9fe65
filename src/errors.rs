//! Error types for engine configuration
//!
//! The engine itself has no fatal path: bad samples abort only the current
//! cycle's calibration update and the engine always reports *some* IAQ and
//! accuracy tier. The only fallible surface is configuration, so the error
//! type here covers exactly that.
//!
//! Design constraints, shared with the rest of the crate:
//!
//! 1. **Small and Copy**: errors are returned from setters that may run in
//!    hot paths on embedded targets; all data is inline, no heap.
//! 2. **Actionable**: each variant carries the offending values so the caller
//!    can log or correct them without further queries.
//! 3. **Never partial**: a setter that returns an error has left the prior
//!    configuration fully active.

use thiserror_no_std::Error;

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration rejected; the engine keeps its previous settings
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Stage timings out of order after clamping to minimums
    #[error("timings out of order: init {init_ms}ms, burnin {burnin_ms}ms, decay {decay_ms}ms")]
    InvalidTimings {
        /// Requested initialization duration (ms)
        init_ms: u64,
        /// Requested burn-in duration (ms)
        burnin_ms: u64,
        /// Requested decay interval (ms)
        decay_ms: u64,
    },

    /// Gas resistance limits outside the accepted window or inverted
    #[error("resistance limits invalid: min {min_ohms}ohm, max {max_ohms}ohm")]
    InvalidResistanceLimits {
        /// Requested lower limit (Ω)
        min_ohms: u32,
        /// Requested upper limit (Ω)
        max_ohms: u32,
    },

    /// Donchian lookback outside 2..=capacity
    #[error("lookback {periods} outside 2..={capacity}")]
    InvalidLookback {
        /// Requested lookback length
        periods: usize,
        /// Compile-time channel capacity
        capacity: usize,
    },
}

#[cfg(feature = "defmt")]
impl defmt::Format for ConfigError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::InvalidTimings { init_ms, burnin_ms, decay_ms } => {
                defmt::write!(fmt, "timings out of order: {}/{}/{} ms", init_ms, burnin_ms, decay_ms)
            }
            Self::InvalidResistanceLimits { min_ohms, max_ohms } => {
                defmt::write!(fmt, "resistance limits invalid: {}..{} ohm", min_ohms, max_ohms)
            }
            Self::InvalidLookback { periods, capacity } => {
                defmt::write!(fmt, "lookback {} outside 2..={}", periods, capacity)
            }
        }
    }
}
