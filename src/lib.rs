//! Self-calibrating relative IAQ engine for MOX gas sensors
//!
//! Turns a noisy, drifting metal-oxide gas-resistance channel plus
//! temperature/humidity into a bounded 0–100 indoor air quality score with a
//! confidence tier, using fixed memory and no ground truth. The score is
//! *relative*: it is calibrated against the sensor's own recent history (the
//! adaptive "gas ceiling"), not against any absolute gas concentration.
//!
//! Key constraints:
//! - `no_std` by default, no heap allocation anywhere
//! - one bounded pass per sensor reading, O(calibration buffer) worst case
//! - transport and measurement cycle stay outside, behind [`traits::RawSampleSource`]
//!
//! ```
//! use iaq_core::{IaqEngine, RawSample};
//!
//! let mut engine = IaqEngine::new();
//!
//! // One call per completed measurement; timestamps drive all stage timing
//! let reading = engine.step(&RawSample {
//!     temperature_c: 21.3,
//!     humidity_pct: 45.0,
//!     gas_resistance_ohms: 120_000.0,
//!     timestamp_ms: 0,
//! });
//!
//! assert_eq!(reading.accuracy.tier(), 0); // still initializing
//! assert_eq!(reading.iaq, 50.0); // neutral until a ceiling exists
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod calibration;
pub mod compensation;
pub mod constants;
pub mod donchian;
pub mod engine;
pub mod errors;
pub mod time;
pub mod traits;

// Public API
pub use calibration::CalibrationStage;
pub use donchian::DonchianChannel;
pub use engine::{IaqAccuracy, IaqEngine, IaqReading, SmoothingConfig};
pub use errors::{ConfigError, ConfigResult};
pub use time::{TimeSource, Timestamp};
pub use traits::{RawSample, RawSampleSource};

/// Crate version string
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_exists() {
        assert!(!VERSION.is_empty());
    }
}
