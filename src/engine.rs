//! The IAQ engine: calibration state machine, scoring, and tiering
//!
//! ## Overview
//!
//! [`IaqEngine`] owns every piece of mutable state in the crate and exposes a
//! single entry point, [`step`](IaqEngine::step), invoked exactly once per
//! completed sensor reading. Each step:
//!
//! 1. derives dew point and compensated temperature/humidity (always, in
//!    every stage);
//! 2. gates the raw gas reading against the configured contamination limit;
//! 3. feeds the smoothing channels (from burn-in onward) and computes the
//!    humidity-compensated gas resistance;
//! 4. advances the calibration stage machine and the high-water buffer;
//! 5. scores IAQ against the gas ceiling and assigns an accuracy tier.
//!
//! ## Scoring
//!
//! ```text
//! IAQ = min(100, (compensated_gas / gas_ceiling)² × 100)
//! ```
//!
//! The square steepens the curve near the ceiling: good air reads close to
//! 100 while moderate drops fall off quickly, so real excursions are visually
//! dramatic but the index stays flat near baseline. Before a ceiling exists
//! the score holds at a neutral 50.
//!
//! ## Failure model
//!
//! There is no fatal path. Contaminated readings (above the upper resistance
//! limit) and non-finite compensation results abort only the current cycle's
//! calibration update — prior state, including the last IAQ, is untouched.
//! Rejected configuration leaves the previous configuration fully active.
//!
//! ## Concurrency
//!
//! The engine is a plain single-threaded value: no interior mutability, no
//! locking, every operation bounded by the buffer/channel capacity. Callers
//! must serialize `step` calls per engine; one engine serves one physical
//! sensor.

use crate::calibration::{
    CalibrationBuffer, CalibrationStage, GasCalibrationTimings, InitHysteresis,
};
use crate::compensation;
use crate::constants::{
    ACCURACY_RANGE_HIGH, ACCURACY_RANGE_MODERATE, ACCURACY_RANGE_VERY_HIGH, ACCURACY_UPTIME_HIGH,
    ACCURACY_UPTIME_VERY_HIGH, DEFAULT_GAS_LIMIT_MAX_OHMS, DEFAULT_GAS_LIMIT_MIN_OHMS,
    DEFAULT_SLOPE_FACTOR, DEFAULT_TEMPERATURE_OFFSET_C, GAS_CALIBRATION_POINTS,
    GAS_LIMIT_CEILING_OHMS, GAS_LIMIT_FLOOR_OHMS, MAX_SMOOTHING_PERIODS, NEUTRAL_IAQ,
    STABILIZATION_PENALTY_MS,
};
use crate::donchian::DonchianChannel;
use crate::errors::{ConfigError, ConfigResult};
use crate::time::{elapsed_ms, Timestamp};
use crate::traits::RawSample;

/// Confidence tier accompanying the IAQ score
///
/// Monotone in trust: `Unreliable` during initialization, `Low` during
/// burn-in, then upgraded in normal operation as the calibration population
/// tightens and decay intervals accumulate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum IaqAccuracy {
    /// Sensor still initializing; the IAQ value must not be trusted
    Unreliable,
    /// Burn-in or a freshly settled ceiling
    Low,
    /// Calibration spread below 7.5%
    Moderate,
    /// Spread below 3.5% with at least 2 decay intervals survived
    High,
    /// Spread below 2% with at least 100 decay intervals survived
    VeryHigh,
}

impl IaqAccuracy {
    /// Numeric tier 0..=4
    pub fn tier(self) -> u8 {
        self as u8
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for IaqAccuracy {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "tier {}", *self as u8)
    }
}

/// Smoothing configuration for the three input signals
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SmoothingConfig {
    /// Lookback length shared by all three channels (2..=[`MAX_SMOOTHING_PERIODS`])
    pub periods: usize,
    /// Envelope cap for the temperature channel (°C); 0 disables
    pub range_limit_temperature: f32,
    /// Envelope cap for the humidity channel (%RH); 0 disables
    pub range_limit_humidity: f32,
    /// Envelope cap for the gas channel (Ω); 0 disables
    pub range_limit_gas: f32,
}

/// Optional Donchian smoothing stage, one channel per input signal
///
/// Represented as a tagged variant rather than nullable channels so use
/// sites match once instead of null-checking three times.
#[derive(Debug, Clone)]
enum Smoothing {
    Disabled,
    Enabled {
        temperature: DonchianChannel<MAX_SMOOTHING_PERIODS>,
        humidity: DonchianChannel<MAX_SMOOTHING_PERIODS>,
        gas: DonchianChannel<MAX_SMOOTHING_PERIODS>,
    },
}

/// Output of one engine step, read-only to callers
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IaqReading {
    /// Relative indoor air quality, 0 (bad) to 100 (good)
    pub iaq: f32,
    /// Confidence tier for `iaq`
    pub accuracy: IaqAccuracy,
    /// Current calibration stage
    pub stage: CalibrationStage,
    /// Dispersion of the calibration population, `[0, 1]`
    pub calibration_range: f64,
    /// Offset-compensated temperature (°C)
    pub temperature_c: f32,
    /// Offset-compensated relative humidity (%RH)
    pub humidity_pct: f32,
    /// Dew point (°C) from the raw reading
    pub dew_point_c: f32,
    /// Timestamp of the sample that produced this reading (ms)
    pub timestamp_ms: Timestamp,
}

impl IaqReading {
    /// Calibration spread as a percentage, `(max - min) / max × 100`
    pub fn calibration_spread_pct(&self) -> f32 {
        (self.calibration_range * 100.0) as f32
    }
}

/// Self-calibrating IAQ engine for one MOX gas sensor
///
/// Create once at startup, then call [`step`](IaqEngine::step) for every
/// completed reading. All timing derives from sample timestamps, so the
/// engine is deterministic for a given sample sequence.
#[derive(Debug, Clone)]
pub struct IaqEngine {
    // Configuration
    temperature_offset_c: f32,
    slope_factor: f64,
    gas_limit_min_ohms: u32,
    gas_limit_max_ohms: u32,
    timings: GasCalibrationTimings,
    smoothing: Smoothing,

    // Calibration state
    stage: CalibrationStage,
    stage_started_at: Timestamp,
    started: bool,
    hysteresis: InitHysteresis,
    buffer: CalibrationBuffer<GAS_CALIBRATION_POINTS>,
    last_write_at: Timestamp,
    sensor_uptime: u32,

    // Outputs carried across discarded cycles
    iaq: f32,
    accuracy: IaqAccuracy,
}

impl IaqEngine {
    /// Engine with default configuration (see [`crate::constants`])
    pub fn new() -> Self {
        Self {
            temperature_offset_c: DEFAULT_TEMPERATURE_OFFSET_C,
            slope_factor: DEFAULT_SLOPE_FACTOR,
            gas_limit_min_ohms: DEFAULT_GAS_LIMIT_MIN_OHMS,
            gas_limit_max_ohms: DEFAULT_GAS_LIMIT_MAX_OHMS,
            timings: GasCalibrationTimings::default(),
            smoothing: Smoothing::Disabled,
            stage: CalibrationStage::Init,
            stage_started_at: 0,
            started: false,
            hysteresis: InitHysteresis::default(),
            buffer: CalibrationBuffer::new(),
            last_write_at: 0,
            sensor_uptime: 0,
            iaq: NEUTRAL_IAQ,
            accuracy: IaqAccuracy::Unreliable,
        }
    }

    // ===== Configuration =====

    /// Set stage timings (ms)
    ///
    /// `init` is clamped up to 1 s; the triple is rejected unless
    /// `burnin ≥ init + 1 s` and `decay ≥ burnin + 60 s`. On rejection the
    /// previous timings stay active.
    pub fn set_gas_calibration_timings(
        &mut self,
        init_ms: u64,
        burnin_ms: u64,
        decay_ms: u64,
    ) -> ConfigResult<()> {
        self.timings = GasCalibrationTimings::new(init_ms, burnin_ms, decay_ms)?;
        Ok(())
    }

    /// Set the gas resistance window (Ω) used for calibration
    ///
    /// Accepted only if `min ≥ 30 kΩ`, `max ≤ 2 MΩ`, and `min ≤ max`.
    pub fn set_gas_resistance_limits(&mut self, min_ohms: u32, max_ohms: u32) -> ConfigResult<()> {
        if min_ohms < GAS_LIMIT_FLOOR_OHMS || max_ohms > GAS_LIMIT_CEILING_OHMS || min_ohms > max_ohms
        {
            return Err(ConfigError::InvalidResistanceLimits { min_ohms, max_ohms });
        }
        self.gas_limit_min_ohms = min_ohms;
        self.gas_limit_max_ohms = max_ohms;
        Ok(())
    }

    /// Set the temperature offset (°C), a signed delta added to raw readings
    /// and used in the humidity compensation
    pub fn set_temperature_offset(&mut self, degrees_c: f32) {
        self.temperature_offset_c = degrees_c;
    }

    /// Set the temperature offset as a Fahrenheit delta
    ///
    /// The offset is itself a delta, so only the scale converts: `°F × 5/9`.
    pub fn set_temperature_offset_f(&mut self, degrees_f: f32) {
        self.set_temperature_offset(degrees_f * 5.0 / 9.0);
    }

    /// Set the humidity-compensation slope factor
    ///
    /// Sits inside an exponential; extreme values produce degenerate
    /// compensation that the per-cycle finiteness screen will then discard.
    // TODO: bound slope_factor once a sane range is established across sensors
    pub fn set_slope_factor(&mut self, slope_factor: f64) {
        self.slope_factor = slope_factor;
    }

    /// Enable Donchian smoothing of the three input signals
    ///
    /// Channels start empty and are fed only from burn-in onward, keeping
    /// unstable initialization readings out of the envelopes.
    pub fn enable_smoothing(&mut self, config: SmoothingConfig) -> ConfigResult<()> {
        let temperature =
            DonchianChannel::with_range_limit(config.periods, config.range_limit_temperature)?;
        let humidity =
            DonchianChannel::with_range_limit(config.periods, config.range_limit_humidity)?;
        let gas = DonchianChannel::with_range_limit(config.periods, config.range_limit_gas)?;
        self.smoothing = Smoothing::Enabled { temperature, humidity, gas };
        Ok(())
    }

    /// Disable smoothing; subsequent cycles use raw values
    pub fn disable_smoothing(&mut self) {
        self.smoothing = Smoothing::Disabled;
    }

    // ===== Read-only state =====

    /// Latest IAQ score, 0..=100 (neutral 50 before any valid ceiling)
    pub fn iaq(&self) -> f32 {
        self.iaq
    }

    /// Latest accuracy tier
    pub fn accuracy(&self) -> IaqAccuracy {
        self.accuracy
    }

    /// Current calibration stage
    pub fn stage(&self) -> CalibrationStage {
        self.stage
    }

    /// Current gas ceiling (Ω, humidity-compensated); 0 while unknown
    pub fn gas_ceiling(&self) -> f64 {
        self.buffer.gas_ceiling()
    }

    /// Dispersion of the calibration population, `[0, 1]`
    pub fn calibration_range(&self) -> f64 {
        self.buffer.calibration_range()
    }

    /// Decay intervals survived in normal operation
    pub fn sensor_uptime(&self) -> u32 {
        self.sensor_uptime
    }

    // ===== Per-cycle processing =====

    /// Process one completed reading and return the derived metrics
    ///
    /// Must be called exactly once per measurement, with nondecreasing
    /// timestamps (wraparound of the underlying counter is tolerated).
    pub fn step(&mut self, sample: &RawSample) -> IaqReading {
        let now = sample.timestamp_ms;
        if !self.started {
            self.started = true;
            self.stage_started_at = now;
            self.last_write_at = now;
            self.hysteresis.reset();
        }

        // Stage-independent derived metrics, computed every cycle
        let dew_point_c = compensation::dew_point(sample.temperature_c, sample.humidity_pct);
        let temperature_c =
            compensation::compensated_temperature(sample.temperature_c, self.temperature_offset_c);
        let humidity_pct = compensation::compensated_humidity(
            sample.temperature_c,
            sample.humidity_pct,
            self.temperature_offset_c,
        );

        // Saturation/contamination artifacts never enter calibration; before
        // normal operation they also extend the stabilization wait.
        if sample.gas_resistance_ohms > self.gas_limit_max_ohms as f32 {
            if self.stage < CalibrationStage::Normal {
                self.stage_started_at =
                    self.stage_started_at.wrapping_add(STABILIZATION_PENALTY_MS);
            }
            return self.reading(temperature_c, humidity_pct, dew_point_c, now);
        }

        // Smoothing joins at burn-in so startup transients never seed the envelopes
        let smooth = self.stage >= CalibrationStage::BurnIn;
        let (cal_temp, cal_hum, cal_gas) = match (&mut self.smoothing, smooth) {
            (Smoothing::Enabled { temperature, humidity, gas }, true) => {
                temperature.track(sample.temperature_c);
                humidity.track(sample.humidity_pct);
                gas.track(sample.gas_resistance_ohms);
                (temperature.average(), humidity.average(), gas.average())
            }
            _ => (sample.temperature_c, sample.humidity_pct, sample.gas_resistance_ohms),
        };

        let abs_humidity = compensation::absolute_humidity(cal_temp, cal_hum);
        let compensated_gas = compensation::humidity_compensated_gas(
            f64::from(cal_gas),
            abs_humidity,
            self.slope_factor,
        );
        let compensated_min = compensation::humidity_compensated_gas(
            f64::from(self.gas_limit_min_ohms),
            abs_humidity,
            self.slope_factor,
        );
        if !compensated_gas.is_finite() || !compensated_min.is_finite() {
            return self.reading(temperature_c, humidity_pct, dew_point_c, now);
        }

        let elapsed = elapsed_ms(now, self.stage_started_at);
        match self.stage {
            CalibrationStage::Init => {
                self.hysteresis.observe(sample.gas_resistance_ohms);
                if elapsed >= self.timings.init_ms && self.hysteresis.settled() {
                    self.advance_stage(CalibrationStage::BurnIn, now);
                }
            }
            CalibrationStage::BurnIn => {
                if elapsed >= self.timings.burnin_ms && self.buffer.is_full() {
                    self.advance_stage(CalibrationStage::Normal, now);
                } else {
                    // Floor transient lows so the population stays high-water
                    let value = compensated_gas.max(compensated_min);
                    if self.buffer.is_full() {
                        self.buffer.replace_smallest(value);
                    } else {
                        self.buffer.append(value);
                    }
                    self.last_write_at = now;
                }
            }
            CalibrationStage::Normal => {
                if compensated_gas > compensated_min {
                    if compensated_gas > self.buffer.gas_ceiling() {
                        // Ceiling ratchets upward on genuinely higher readings
                        self.buffer.replace_smallest(compensated_gas);
                        self.last_write_at = now;
                    } else if elapsed_ms(now, self.last_write_at) >= self.timings.decay_ms {
                        // No new highs for a whole interval: let the ceiling re-adapt
                        self.buffer.force_replace_smallest(compensated_gas);
                        self.last_write_at = now;
                        self.sensor_uptime = self.sensor_uptime.saturating_add(1);
                    }
                }
            }
        }

        let ceiling = self.buffer.gas_ceiling();
        if ceiling > 0.0 {
            let ratio = compensated_gas / ceiling;
            let quality = (ratio * ratio * 100.0) as f32;
            self.iaq = quality.min(100.0);
        }
        self.accuracy = self.tier();

        self.reading(temperature_c, humidity_pct, dew_point_c, now)
    }

    fn advance_stage(&mut self, next: CalibrationStage, now: Timestamp) {
        #[cfg(feature = "log")]
        log::info!("gas calibration stage {:?} -> {:?}", self.stage, next);
        self.stage = next;
        self.stage_started_at = now;
        self.last_write_at = now;
    }

    /// Accuracy tier, re-evaluated from scratch every cycle
    ///
    /// Upgrades in normal operation are independent threshold checks from the
    /// same baseline; the assigned tier is the highest threshold satisfied.
    fn tier(&self) -> IaqAccuracy {
        match self.stage {
            CalibrationStage::Init => IaqAccuracy::Unreliable,
            CalibrationStage::BurnIn => IaqAccuracy::Low,
            CalibrationStage::Normal => {
                let range = self.buffer.calibration_range();
                let mut accuracy = IaqAccuracy::Low;
                if range < ACCURACY_RANGE_MODERATE {
                    accuracy = IaqAccuracy::Moderate;
                }
                if range < ACCURACY_RANGE_HIGH && self.sensor_uptime >= ACCURACY_UPTIME_HIGH {
                    accuracy = IaqAccuracy::High;
                }
                if range < ACCURACY_RANGE_VERY_HIGH
                    && self.sensor_uptime >= ACCURACY_UPTIME_VERY_HIGH
                {
                    accuracy = IaqAccuracy::VeryHigh;
                }
                accuracy
            }
        }
    }

    fn reading(
        &self,
        temperature_c: f32,
        humidity_pct: f32,
        dew_point_c: f32,
        timestamp_ms: Timestamp,
    ) -> IaqReading {
        IaqReading {
            iaq: self.iaq,
            accuracy: self.accuracy,
            stage: self.stage,
            calibration_range: self.buffer.calibration_range(),
            temperature_c,
            humidity_pct,
            dew_point_c,
            timestamp_ms,
        }
    }
}

impl Default for IaqEngine {
    fn default() -> Self {
        Self::new()
    }
}
