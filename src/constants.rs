//! Constants for the IAQ engine
//!
//! Centralized, documented numeric values used throughout the crate.
//! Values fall into three groups:
//!
//! - **Physics**: Magnus-formula and vapor-density coefficients used by the
//!   compensation math. These are fixed by the literature, not tunable.
//! - **Calibration defaults**: stage timings, resistance limits, and the
//!   humidity slope factor. These are tunable at runtime through the engine's
//!   configuration setters; the defaults here match a BME680-class sensor
//!   sampled every few seconds in an indoor environment.
//! - **Accuracy tiering**: calibration-spread and uptime thresholds that gate
//!   the confidence tier reported alongside the IAQ score.
//!
//! Always use these constants instead of magic numbers.

// ===== MAGNUS / VAPOR PRESSURE COEFFICIENTS =====

/// Magnus formula coefficient `a` (dimensionless).
///
/// Used for saturation vapor pressure over water and the dew-point inversion.
/// Source: Alduchov & Eskridge (1996), valid -40..50 °C.
pub const MAGNUS_A: f32 = 17.625;

/// Magnus formula coefficient `b` (°C).
///
/// Companion to [`MAGNUS_A`]; appears in the `T / (b + T)` exponent term.
pub const MAGNUS_B_C: f32 = 243.04;

/// Saturation vapor pressure scale factor at 0 °C (hPa).
pub const MAGNUS_SVP_HPA: f32 = 6.112;

/// Specific gas constant for water vapor (J/(kg·K)).
///
/// Converts saturation vapor pressure to saturation vapor density.
pub const WATER_VAPOR_GAS_CONSTANT: f64 = 461.52;

/// Offset from Celsius to Kelvin.
pub const CELSIUS_TO_KELVIN: f64 = 273.15;

// ===== CALIBRATION DEFAULTS =====

/// Number of slots in the gas calibration buffer.
///
/// One hundred high-water readings bound both the memory footprint and the
/// per-write scan cost while averaging out single-sample noise in the ceiling.
pub const GAS_CALIBRATION_POINTS: usize = 100;

/// Default initialization-stage duration (ms).
///
/// The hot plate resistance is highly unstable for the first tens of seconds
/// after power-on; no calibration data is collected during this window.
pub const DEFAULT_INIT_TIME_MS: u64 = 30 * 1000;

/// Default burn-in-stage duration (ms).
///
/// After roughly five minutes the resistance is moderately stable and the
/// high-water buffer collected during burn-in is a usable ceiling estimate.
pub const DEFAULT_BURNIN_TIME_MS: u64 = 5 * 60 * 1000;

/// Default decay interval (ms) for the normal-operation stage.
///
/// If no reading exceeds the ceiling for this long, one forced buffer write
/// lets the ceiling re-adapt downward, tracking sensor drift.
pub const DEFAULT_DECAY_TIME_MS: u64 = 30 * 60 * 1000;

/// Default lower gas resistance limit (Ω) for ceiling calculations.
pub const DEFAULT_GAS_LIMIT_MIN_OHMS: u32 = 100_000;

/// Default upper gas resistance limit (Ω); readings above it are treated as
/// saturation/contamination artifacts and excluded from calibration.
pub const DEFAULT_GAS_LIMIT_MAX_OHMS: u32 = 175_000;

/// Default humidity-compensation slope factor applied inside
/// `exp(slope * absolute_humidity)`.
pub const DEFAULT_SLOPE_FACTOR: f64 = 0.03;

/// Default temperature offset (°C) compensating self-heating of the package.
pub const DEFAULT_TEMPERATURE_OFFSET_C: f32 = -1.5;

/// Neutral IAQ reported before any valid ceiling exists.
pub const NEUTRAL_IAQ: f32 = 50.0;

/// Penalty (ms) added to the stage timer when a contaminated (above-limit)
/// reading arrives during Init or BurnIn, extending the stabilization wait.
pub const STABILIZATION_PENALTY_MS: u64 = 1000;

/// Consecutive higher-lows in gas resistance required to leave Init.
pub const INIT_HIGHER_LOWS: u8 = 3;

/// Compile-time capacity of each smoothing channel.
///
/// Runtime lookbacks are validated against this; 64 samples covers several
/// HVAC duty cycles at typical 3 s polling without a meaningful RAM cost.
pub const MAX_SMOOTHING_PERIODS: usize = 64;

// ===== CONFIGURATION BOUNDS =====

/// Minimum accepted initialization time (ms).
pub const MIN_INIT_TIME_MS: u64 = 1000;

/// Minimum gap (ms) between initialization and burn-in durations.
pub const MIN_BURNIN_GAP_MS: u64 = 1000;

/// Minimum gap (ms) between burn-in duration and decay interval.
pub const MIN_DECAY_GAP_MS: u64 = 60_000;

/// Lowest accepted value (Ω) for the lower gas resistance limit.
pub const GAS_LIMIT_FLOOR_OHMS: u32 = 30_000;

/// Highest accepted value (Ω) for the upper gas resistance limit.
pub const GAS_LIMIT_CEILING_OHMS: u32 = 2_000_000;

// ===== ACCURACY TIERING =====

/// Calibration spread below which tier 2 (moderate) is reported.
pub const ACCURACY_RANGE_MODERATE: f64 = 0.075;

/// Calibration spread below which tier 3 (high) is reported.
pub const ACCURACY_RANGE_HIGH: f64 = 0.035;

/// Calibration spread below which tier 4 (very high) is reported.
pub const ACCURACY_RANGE_VERY_HIGH: f64 = 0.02;

/// Decay intervals survived before tier 3 is reachable.
pub const ACCURACY_UPTIME_HIGH: u32 = 2;

/// Decay intervals survived before tier 4 is reachable.
pub const ACCURACY_UPTIME_VERY_HIGH: u32 = 100;
