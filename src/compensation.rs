//! Temperature, humidity, and gas compensation math
//!
//! ## Physics background
//!
//! All of the derived metrics here come from two standard relations:
//!
//! ### Magnus formula
//!
//! Saturation vapor pressure over water, in hPa:
//!
//! ```text
//! SVP(T) = 6.112 × exp(17.625 × T / (243.04 + T))
//! ```
//!
//! Inverting it with the actual vapor pressure gives the dew point; taking
//! the ratio of actual to saturation pressure at a *shifted* temperature
//! gives the humidity reading corrected for a sensor temperature offset.
//! Because both the dew point and the humidity compensation use the same
//! Magnus transformation, the dew point is identical whether computed from
//! raw or compensated values — so it is only computed from raw ones.
//!
//! ### Saturation vapor density
//!
//! Converting saturation pressure to mass density via the water-vapor gas
//! constant yields the absolute humidity (g/m³) of the air. A MOX gas
//! sensor's resistance drops roughly exponentially with absolute humidity, so
//! the raw resistance is corrected with `exp(slope × absolute_humidity)`
//! before it enters any calibration or scoring step.
//!
//! ## Numeric types
//!
//! Temperature and humidity paths are `f32` like the rest of the sensor
//! stack; the gas path is `f64` because compensated resistances get averaged
//! over a 100-slot buffer where `f32` rounding would show up in the ceiling.
//!
//! All functions are pure and stateless; they use `libm` so the crate stays
//! `no_std`-clean. Inputs are not range-checked — out-of-domain values (e.g.
//! 0% RH into a logarithm) produce non-finite outputs that callers must
//! screen with `is_finite()`.

use crate::constants::{
    CELSIUS_TO_KELVIN, MAGNUS_A, MAGNUS_B_C, MAGNUS_SVP_HPA, WATER_VAPOR_GAS_CONSTANT,
};

/// Magnus exponent term `a·T / (b + T)` shared by every relation here.
#[inline]
fn magnus_gamma(temp_c: f32) -> f32 {
    MAGNUS_A * temp_c / (MAGNUS_B_C + temp_c)
}

/// Saturation vapor pressure (hPa) at `temp_c` (°C).
pub fn saturation_vapor_pressure(temp_c: f32) -> f32 {
    MAGNUS_SVP_HPA * libm::expf(magnus_gamma(temp_c))
}

/// Dew point (°C) from raw temperature (°C) and relative humidity (%RH).
///
/// Magnus-formula inversion. Non-positive humidity has no defined dew point
/// and yields a non-finite result.
pub fn dew_point(temp_c: f32, humidity_pct: f32) -> f32 {
    let gamma = libm::logf(humidity_pct / 100.0) + magnus_gamma(temp_c);
    MAGNUS_B_C * gamma / (MAGNUS_A - gamma)
}

/// Raw temperature (°C) plus the configured signed offset (°C).
#[inline]
pub fn compensated_temperature(temp_c: f32, offset_c: f32) -> f32 {
    temp_c + offset_c
}

/// Relative humidity (%RH) corrected for a temperature offset.
///
/// The actual vapor pressure implied by the raw reading is re-expressed as a
/// relative humidity at the offset temperature:
///
/// ```text
/// RH' = AVP(T, RH) / SVP(T + offset) × 100
/// ```
///
/// A negative offset (sensor reads warm) raises the compensated humidity,
/// since cooler air saturates at a lower vapor pressure.
pub fn compensated_humidity(temp_c: f32, humidity_pct: f32, offset_c: f32) -> f32 {
    let actual_vp = humidity_pct / 100.0 * saturation_vapor_pressure(temp_c);
    let saturation_vp = saturation_vapor_pressure(compensated_temperature(temp_c, offset_c));
    actual_vp / saturation_vp * 100.0
}

/// Saturation vapor density (kg/m³) at `temp_c` (°C).
///
/// Magnus saturation pressure (converted hPa → Pa) over `R_v × T_kelvin`.
pub fn saturation_vapor_density(temp_c: f32) -> f64 {
    let svp_pa = f64::from(saturation_vapor_pressure(temp_c)) * 100.0;
    svp_pa / (WATER_VAPOR_GAS_CONSTANT * (f64::from(temp_c) + CELSIUS_TO_KELVIN))
}

/// Absolute humidity (g/m³) from raw temperature and relative humidity.
pub fn absolute_humidity(temp_c: f32, humidity_pct: f32) -> f64 {
    f64::from(humidity_pct) * 10.0 * saturation_vapor_density(temp_c)
}

/// Gas resistance (Ω) corrected for the exponential impact of humidity.
///
/// `slope_factor` is sensor- and environment-specific; extreme values sit
/// inside an exponential and will produce degenerate (possibly non-finite)
/// results, which the calibration engine screens out per cycle.
pub fn humidity_compensated_gas(gas_ohms: f64, absolute_humidity_g_m3: f64, slope_factor: f64) -> f64 {
    gas_ohms * libm::exp(slope_factor * absolute_humidity_g_m3)
}
