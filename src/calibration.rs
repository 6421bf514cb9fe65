//! Gas calibration state: high-water buffer, stages, timings
//!
//! ## The calibration problem
//!
//! A MOX gas channel has no absolute scale: the resistance for "clean air"
//! differs per unit, drifts over hours and days, and depends on humidity and
//! sampling cadence. The engine therefore calibrates against the sensor's own
//! history — it maintains a *gas ceiling*, the mean of the highest compensated
//! readings recently observed, and scores air quality relative to it.
//!
//! ## High-water buffer
//!
//! [`CalibrationBuffer`] holds a fixed number of `f64` compensated readings.
//! Unlike a sliding window it is deliberately *not* chronological once full:
//! new readings only displace the **smallest** populated entry, so the buffer
//! converges on the best readings seen (the high-water population) instead of
//! the most recent ones. Two derived statistics are recomputed after every
//! write:
//!
//! - `gas_ceiling` — arithmetic mean of populated entries, the "good air"
//!   reference for scoring;
//! - `calibration_range` — `(max - min) / max` of populated entries, a
//!   unitless dispersion in `[0, 1]`; lower means a more trustworthy ceiling.
//!
//! Slots start at a 0.0 sentinel ("not yet populated"); real compensated
//! resistances are always positive.
//!
//! ## Stages
//!
//! Calibration moves strictly forward through [`CalibrationStage`]:
//! `Init` (resistance still falling after power-on, nothing collected) →
//! `BurnIn` (collecting the high-water population) → `Normal` (ceiling
//! ratchets up on new highs and decays on a timer). The transition *out of*
//! `Init` is gated both by elapsed time and by the hysteresis detector below
//! confirming that the resistance has stopped falling.

use crate::constants::{
    DEFAULT_BURNIN_TIME_MS, DEFAULT_DECAY_TIME_MS, DEFAULT_INIT_TIME_MS, INIT_HIGHER_LOWS,
    MIN_BURNIN_GAP_MS, MIN_DECAY_GAP_MS, MIN_INIT_TIME_MS,
};
use crate::errors::{ConfigError, ConfigResult};

/// Stage of the gas calibration state machine, strictly forward-progressing
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CalibrationStage {
    /// Post-power-on settling; no calibration data is collected
    Init,
    /// Resistance moderately stable; high-water population being collected
    BurnIn,
    /// Terminal stage; ceiling ratchets up and decays on a timer
    Normal,
}

#[cfg(feature = "defmt")]
impl defmt::Format for CalibrationStage {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::Init => defmt::write!(fmt, "init"),
            Self::BurnIn => defmt::write!(fmt, "burn-in"),
            Self::Normal => defmt::write!(fmt, "normal"),
        }
    }
}

/// Validated stage timing configuration (all milliseconds)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GasCalibrationTimings {
    /// Minimum time spent in `Init`
    pub init_ms: u64,
    /// Minimum time spent in `BurnIn`
    pub burnin_ms: u64,
    /// Decay interval during `Normal`
    pub decay_ms: u64,
}

impl Default for GasCalibrationTimings {
    fn default() -> Self {
        Self {
            init_ms: DEFAULT_INIT_TIME_MS,
            burnin_ms: DEFAULT_BURNIN_TIME_MS,
            decay_ms: DEFAULT_DECAY_TIME_MS,
        }
    }
}

impl GasCalibrationTimings {
    /// Validate a timing triple
    ///
    /// `init` is clamped up to its 1 s floor; the triple is then rejected
    /// unless `burnin ≥ init + 1 s` and `decay ≥ burnin + 60 s`. Rejection is
    /// all-or-nothing — a failed call leaves nothing half-applied.
    pub fn new(init_ms: u64, burnin_ms: u64, decay_ms: u64) -> ConfigResult<Self> {
        let init = init_ms.max(MIN_INIT_TIME_MS);
        if burnin_ms < init + MIN_BURNIN_GAP_MS || decay_ms < burnin_ms + MIN_DECAY_GAP_MS {
            return Err(ConfigError::InvalidTimings { init_ms, burnin_ms, decay_ms });
        }
        Ok(Self { init_ms: init, burnin_ms, decay_ms })
    }
}

/// Detector for "gas resistance has stopped falling"
///
/// After power-on the hot plate resistance decays toward its operating point.
/// The detector tracks the last local minimum: a new minimum resets the
/// counter, a sample above it counts as a higher-low. Three consecutive
/// higher-lows are taken as the resistance having bottomed out.
#[derive(Debug, Clone, Copy, Default)]
pub struct InitHysteresis {
    last_low: f32,
    higher_lows: u8,
    primed: bool,
}

impl InitHysteresis {
    /// Fresh detector; also the `Init` entry action
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Feed one raw gas resistance sample
    pub fn observe(&mut self, gas_resistance_ohms: f32) {
        if !self.primed {
            self.last_low = gas_resistance_ohms;
            self.higher_lows = 0;
            self.primed = true;
            return;
        }
        if gas_resistance_ohms < self.last_low {
            self.last_low = gas_resistance_ohms;
            self.higher_lows = 0;
        } else if gas_resistance_ohms > self.last_low {
            self.higher_lows = self.higher_lows.saturating_add(1);
        }
    }

    /// True once enough consecutive higher-lows have been observed
    pub fn settled(&self) -> bool {
        self.higher_lows >= INIT_HIGHER_LOWS
    }
}

/// Fixed-capacity high-water buffer of compensated gas readings
#[derive(Debug, Clone)]
pub struct CalibrationBuffer<const K: usize> {
    /// Slots; 0.0 is the "not yet populated" sentinel
    data: [f64; K],
    /// Next slot for sequential append
    write_index: usize,
    /// Populated slot count, saturating at K
    len: usize,
    /// Mean of populated entries
    gas_ceiling: f64,
    /// (max - min) / max of populated entries
    calibration_range: f64,
}

impl<const K: usize> CalibrationBuffer<K> {
    /// Empty buffer; ceiling 0 (unknown), range 1 (wide open)
    pub const fn new() -> Self {
        Self {
            data: [0.0; K],
            write_index: 0,
            len: 0,
            gas_ceiling: 0.0,
            calibration_range: 1.0,
        }
    }

    /// Sequential append, overwriting the oldest slot once wrapped
    pub fn append(&mut self, value: f64) {
        self.data[self.write_index] = value;
        self.write_index = (self.write_index + 1) % K;
        if self.len < K {
            self.len += 1;
        }
        self.recompute();
    }

    /// Replace the minimum-valued populated entry if `value` exceeds it
    ///
    /// Returns whether a write occurred. This is the high-water retention
    /// policy: transient lows never displace established good readings.
    pub fn replace_smallest(&mut self, value: f64) -> bool {
        match self.smallest_index() {
            None => {
                self.append(value);
                true
            }
            Some(idx) => {
                if value > self.data[idx] {
                    self.data[idx] = value;
                    self.recompute();
                    true
                } else {
                    false
                }
            }
        }
    }

    /// Replace the minimum-valued populated entry unconditionally
    ///
    /// The decay path uses this so the ceiling can re-adapt downward even
    /// when the current reading sits below the whole population.
    pub fn force_replace_smallest(&mut self, value: f64) {
        match self.smallest_index() {
            None => self.append(value),
            Some(idx) => {
                self.data[idx] = value;
                self.recompute();
            }
        }
    }

    /// Mean of populated entries; 0 while empty
    pub fn gas_ceiling(&self) -> f64 {
        self.gas_ceiling
    }

    /// Dispersion of populated entries in `[0, 1]`; 1 while empty
    pub fn calibration_range(&self) -> f64 {
        self.calibration_range
    }

    /// Populated entry count
    pub fn len(&self) -> usize {
        self.len
    }

    /// True before any write
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// True once every slot holds a reading
    pub fn is_full(&self) -> bool {
        self.len == K
    }

    fn smallest_index(&self) -> Option<usize> {
        let mut smallest: Option<usize> = None;
        for (i, &d) in self.data.iter().enumerate() {
            if d > 0.0 && smallest.map_or(true, |s| d < self.data[s]) {
                smallest = Some(i);
            }
        }
        smallest
    }

    fn recompute(&mut self) {
        let mut sum = 0.0;
        let mut count = 0u32;
        let mut min = 0.0f64;
        let mut max = 0.0f64;
        for &d in self.data.iter() {
            if d > 0.0 {
                sum += d;
                count += 1;
                if count == 1 {
                    min = d;
                    max = d;
                } else {
                    min = min.min(d);
                    max = max.max(d);
                }
            }
        }
        if count > 0 {
            let mean = sum / f64::from(count);
            if mean.is_finite() {
                self.gas_ceiling = mean;
            }
            if max > 0.0 {
                self.calibration_range = (max - min) / max;
            }
        }
    }
}

impl<const K: usize> Default for CalibrationBuffer<K> {
    fn default() -> Self {
        Self::new()
    }
}
