//! End-to-end scenarios for the calibration state machine
//!
//! These tests drive a full engine lifecycle with synthetic samples stamped
//! from a [`FixedClock`]: initialization hysteresis, burn-in collection,
//! normal-operation ratcheting and decay, and the accuracy tiering that rides
//! on top. Short stage timings keep the sample counts manageable; nothing
//! here sleeps.

use iaq_core::{
    compensation,
    time::{FixedClock, TimeSource},
    CalibrationStage, IaqAccuracy, IaqEngine, RawSample, RawSampleSource, SmoothingConfig,
};

const TEMP_C: f32 = 21.0;
const HUMIDITY_PCT: f32 = 45.0;
const STEP_MS: u64 = 500;

fn sample(gas_ohms: f32, clock: &FixedClock) -> RawSample {
    RawSample {
        temperature_c: TEMP_C,
        humidity_pct: HUMIDITY_PCT,
        gas_resistance_ohms: gas_ohms,
        timestamp_ms: clock.now(),
    }
}

/// Step once and advance the clock by one polling interval
fn poll(engine: &mut IaqEngine, clock: &mut FixedClock, gas_ohms: f32) -> iaq_core::IaqReading {
    let reading = engine.step(&sample(gas_ohms, clock));
    clock.advance(STEP_MS);
    reading
}

/// Humidity-compensated resistance for the fixed test climate
fn compensated(gas_ohms: f64) -> f64 {
    let abs_humidity = compensation::absolute_humidity(TEMP_C, HUMIDITY_PCT);
    compensation::humidity_compensated_gas(gas_ohms, abs_humidity, 0.03)
}

/// Drive a fresh engine through Init (hysteresis) into BurnIn
fn engine_in_burnin() -> (IaqEngine, FixedClock) {
    let mut engine = IaqEngine::new();
    engine.set_gas_calibration_timings(1000, 3000, 63_000).unwrap();
    let mut clock = FixedClock::new(0);

    // Resistance still falling: every new minimum resets the detector
    for gas in [60_000.0, 58_000.0, 55_000.0] {
        let r = poll(&mut engine, &mut clock, gas);
        assert_eq!(r.stage, CalibrationStage::Init);
        assert_eq!(r.accuracy, IaqAccuracy::Unreliable);
    }
    // Three consecutive higher-lows with the init time already elapsed
    for gas in [56_000.0, 57_000.0] {
        let r = poll(&mut engine, &mut clock, gas);
        assert_eq!(r.stage, CalibrationStage::Init);
    }
    let r = poll(&mut engine, &mut clock, 58_000.0);
    assert_eq!(r.stage, CalibrationStage::BurnIn, "exits on the 3rd higher-low");
    (engine, clock)
}

/// Continue through BurnIn (100 buffer writes) into Normal at a steady
/// 120 kΩ baseline. Also returns the Normal-entry timestamp.
fn engine_in_normal() -> (IaqEngine, FixedClock, u64) {
    let (mut engine, mut clock) = engine_in_burnin();
    for _ in 0..100 {
        let r = poll(&mut engine, &mut clock, 120_000.0);
        assert_eq!(r.stage, CalibrationStage::BurnIn);
        assert_eq!(r.accuracy, IaqAccuracy::Low);
    }
    // Buffer full and burn-in time elapsed: next cycle transitions
    let normal_entry = clock.now();
    let r = poll(&mut engine, &mut clock, 120_000.0);
    assert_eq!(r.stage, CalibrationStage::Normal);
    (engine, clock, normal_entry)
}

#[test]
fn stages_progress_monotonically() {
    let (mut engine, mut clock, _) = engine_in_normal();
    // Normal is terminal: nothing sends the machine backwards
    for gas in [40_000.0, 500_000.0, 120_000.0, 90_000.0] {
        let r = poll(&mut engine, &mut clock, gas);
        assert_eq!(r.stage, CalibrationStage::Normal);
    }
}

#[test]
fn init_waits_for_both_time_and_hysteresis() {
    let mut engine = IaqEngine::new();
    engine.set_gas_calibration_timings(10_000, 15_000, 80_000).unwrap();
    let mut clock = FixedClock::new(0);

    // Hysteresis satisfied long before the init time
    for gas in [60_000.0, 55_000.0, 56_000.0, 57_000.0, 58_000.0] {
        let r = poll(&mut engine, &mut clock, gas);
        assert_eq!(r.stage, CalibrationStage::Init);
    }
    // Still before 10 s: stays in Init despite three higher-lows
    clock.set(9000);
    let r = poll(&mut engine, &mut clock, 58_500.0);
    assert_eq!(r.stage, CalibrationStage::Init);
    // First sample past the init time exits
    clock.set(10_500);
    let r = poll(&mut engine, &mut clock, 59_000.0);
    assert_eq!(r.stage, CalibrationStage::BurnIn);
}

#[test]
fn burnin_accumulates_a_high_water_ceiling() {
    let (mut engine, mut clock) = engine_in_burnin();
    // Alternate good and poor readings; the floor keeps transient lows out
    for i in 0..100 {
        let gas = if i % 2 == 0 { 130_000.0 } else { 60_000.0 };
        poll(&mut engine, &mut clock, gas);
    }
    poll(&mut engine, &mut clock, 130_000.0);
    assert_eq!(engine.stage(), CalibrationStage::Normal);

    // Poor readings were floored at the compensated lower limit, so the
    // ceiling sits between the floor and the good readings
    let ceiling = engine.gas_ceiling();
    assert!(ceiling > compensated(100_000.0));
    assert!(ceiling <= compensated(130_000.0));
}

#[test]
fn ceiling_only_ratchets_up_until_decay() {
    let (mut engine, mut clock, normal_entry) = engine_in_normal();
    let ceiling = engine.gas_ceiling();

    // Strictly decreasing readings below the ceiling: no writes before the
    // decay interval (63 s) elapses
    let mut gas = 118_000.0;
    while clock.now() < normal_entry + 63_000 {
        poll(&mut engine, &mut clock, gas);
        assert_eq!(engine.gas_ceiling(), ceiling, "ceiling moved before decay");
        gas -= 50.0;
    }

    // First cycle past the interval: exactly one forced write re-adapts it
    poll(&mut engine, &mut clock, gas);
    let decayed = engine.gas_ceiling();
    assert!(decayed < ceiling);
    assert_eq!(engine.sensor_uptime(), 1);
    gas -= 50.0;

    // One replace-smallest of one slot out of 100: a small, single move
    assert!(decayed > ceiling * 0.98);

    // And only one: the next cycle starts a fresh interval
    poll(&mut engine, &mut clock, gas);
    assert_eq!(engine.gas_ceiling(), decayed);
    assert_eq!(engine.sensor_uptime(), 1);
}

#[test]
fn new_high_readings_raise_the_ceiling() {
    let (mut engine, mut clock, _) = engine_in_normal();
    let ceiling = engine.gas_ceiling();

    for _ in 0..50 {
        poll(&mut engine, &mut clock, 140_000.0);
    }
    assert!(engine.gas_ceiling() > ceiling);
}

#[test]
fn iaq_stays_bounded() {
    let (mut engine, mut clock, _) = engine_in_normal();
    for gas in [30_000.0, 60_000.0, 120_000.0, 150_000.0, 174_000.0] {
        let r = poll(&mut engine, &mut clock, gas);
        assert!((0.0..=100.0).contains(&r.iaq), "IAQ {} for {gas}", r.iaq);
    }
    // At the ceiling the quadratic score saturates
    let r = poll(&mut engine, &mut clock, 160_000.0);
    assert_eq!(r.iaq, 100.0);
}

#[test]
fn iaq_falls_quadratically_below_the_ceiling() {
    let (mut engine, mut clock, _) = engine_in_normal();
    // Ceiling formed from a steady 120 kΩ baseline; half the compensated
    // resistance scores a quarter of the scale
    let r_half = poll(&mut engine, &mut clock, 60_000.0);
    assert!((r_half.iaq - 25.0).abs() < 1.0, "IAQ {}", r_half.iaq);

    let r_full = poll(&mut engine, &mut clock, 120_000.0);
    assert!(r_full.iaq > 95.0);
}

#[test]
fn accuracy_tiers_track_range_and_uptime() {
    let (mut engine, mut clock, _) = engine_in_normal();

    // Identical burn-in population: zero spread, but no decay intervals yet
    assert_eq!(engine.calibration_range(), 0.0);
    let r = poll(&mut engine, &mut clock, 120_000.0);
    assert_eq!(r.accuracy, IaqAccuracy::Moderate);

    // Ride through two decay intervals at the baseline; the forced writes
    // replace like with like, keeping the spread at zero
    for _ in 0..2 {
        clock.advance(63_000);
        poll(&mut engine, &mut clock, 120_000.0);
    }
    assert_eq!(engine.sensor_uptime(), 2);
    let r = poll(&mut engine, &mut clock, 120_000.0);
    assert_eq!(r.accuracy, IaqAccuracy::High);

    // Tier 4 additionally needs 100 decay intervals
    assert!(r.accuracy < IaqAccuracy::VeryHigh);
}

#[test]
fn saturated_readings_never_enter_calibration() {
    let (mut engine, mut clock, _) = engine_in_normal();
    let ceiling = engine.gas_ceiling();
    let iaq = engine.iaq();

    for _ in 0..20 {
        let r = poll(&mut engine, &mut clock, 1_000_000.0);
        // Calibration untouched, previous score carried
        assert_eq!(engine.gas_ceiling(), ceiling);
        assert_eq!(r.iaq, iaq);
    }
}

#[test]
fn smoothing_channels_start_empty_at_burnin() {
    let mut engine = IaqEngine::new();
    engine.set_gas_calibration_timings(1000, 3000, 63_000).unwrap();
    engine
        .enable_smoothing(SmoothingConfig {
            periods: 4,
            range_limit_temperature: 0.0,
            range_limit_humidity: 0.0,
            range_limit_gas: 0.0,
        })
        .unwrap();
    let mut clock = FixedClock::new(0);

    // Wild Init readings must not seed the channels
    for gas in [170_000.0, 40_000.0, 35_000.0, 36_000.0, 37_000.0, 38_000.0] {
        poll(&mut engine, &mut clock, gas);
    }
    assert_eq!(engine.stage(), CalibrationStage::BurnIn);

    // First burn-in sample: the channel holds exactly one value, so the
    // buffer write equals that sample's compensated resistance
    poll(&mut engine, &mut clock, 120_000.0);
    let expected = compensated(120_000.0);
    assert!((engine.gas_ceiling() - expected).abs() < 1.0);
}

/// Scripted acquisition source: each `begin_measurement` arms one sample,
/// `read` reports `WouldBlock` once before delivering it.
struct ScriptedSensor {
    script: Vec<RawSample>,
    next: usize,
    armed: bool,
    polls: u8,
}

impl RawSampleSource for ScriptedSensor {
    type Error = ();

    fn begin_measurement(&mut self) -> Result<(), ()> {
        if self.next >= self.script.len() {
            return Err(());
        }
        self.armed = true;
        self.polls = 0;
        Ok(())
    }

    fn read(&mut self) -> nb::Result<RawSample, ()> {
        if !self.armed {
            return Err(nb::Error::Other(()));
        }
        if self.polls == 0 {
            self.polls = 1;
            return Err(nb::Error::WouldBlock);
        }
        self.armed = false;
        let sample = self.script[self.next];
        self.next += 1;
        Ok(sample)
    }
}

#[test]
fn engine_runs_from_a_sample_source() {
    let mut clock = FixedClock::new(0);
    let script: Vec<RawSample> = [60_000.0f32, 58_000.0, 55_000.0, 56_000.0]
        .iter()
        .map(|&gas| {
            let s = sample(gas, &clock);
            clock.advance(STEP_MS);
            s
        })
        .collect();
    let mut sensor = ScriptedSensor { script, next: 0, armed: false, polls: 0 };
    let mut engine = IaqEngine::new();

    let mut readings = 0;
    while sensor.begin_measurement().is_ok() {
        let sample = loop {
            match sensor.read() {
                Ok(s) => break s,
                Err(nb::Error::WouldBlock) => continue,
                Err(nb::Error::Other(())) => panic!("bus fault"),
            }
        };
        let r = engine.step(&sample);
        assert_eq!(r.stage, CalibrationStage::Init);
        readings += 1;
    }
    assert_eq!(readings, 4);
}
