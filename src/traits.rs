//! Core types and seams toward the sensor hardware
//!
//! The engine deliberately knows nothing about I2C/SPI buses, register maps,
//! oversampling, or measurement latency. It consumes completed readings as
//! [`RawSample`] values and exposes [`RawSampleSource`] as the capability a
//! transport adapter implements. This is composition where the original
//! firmware designs used driver-class inheritance: the adapter owns the bus,
//! the engine owns the algorithm, and the only contract between them is the
//! sample struct.
//!
//! ## Acquisition protocol
//!
//! MOX sensors need tens to hundreds of milliseconds between triggering a
//! measurement and data being ready, so the source trait is non-blocking in
//! the `nb` style:
//!
//! 1. `begin_measurement()` — program and trigger one measurement cycle.
//! 2. `read()` — returns `Err(nb::Error::WouldBlock)` until the cycle
//!    completes, then the finished [`RawSample`].
//!
//! The caller decides whether to spin, sleep, or schedule around
//! `WouldBlock`; the engine never waits.

use crate::time::Timestamp;

/// One completed sensor reading, as delivered by the acquisition layer
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RawSample {
    /// Ambient temperature (°C), uncompensated
    pub temperature_c: f32,
    /// Relative humidity (%RH), uncompensated
    pub humidity_pct: f32,
    /// Gas sensor hot-plate resistance (Ω)
    pub gas_resistance_ohms: f32,
    /// Monotonic acquisition timestamp (ms); drives all stage timing
    pub timestamp_ms: Timestamp,
}

/// Capability implemented by a transport adapter that produces [`RawSample`]s
pub trait RawSampleSource {
    /// Transport-specific error (bus fault, CRC failure, ...)
    type Error;

    /// Trigger one measurement cycle
    fn begin_measurement(&mut self) -> Result<(), Self::Error>;

    /// Fetch the completed sample, or `WouldBlock` while measuring
    fn read(&mut self) -> nb::Result<RawSample, Self::Error>;
}
