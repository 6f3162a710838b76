//! Capability traits for the hardware this crate orchestrates.
//!
//! Register-level chip drivers live outside this crate; anything that can
//! satisfy these contracts plugs into the aggregator and the background
//! reader. Fast sensors are read synchronously (their latency is negligible
//! against the publish interval); the particulate sensor is async because a
//! single read can take on the order of a second.

use async_trait::async_trait;

use super::error::{ParticulateError, SensorError};
use super::reading::ParticulateReading;

/// Raw climate sample, uncompensated, straight from the driver.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawClimate {
    pub temperature: f64,
    pub pressure: f64,
    pub humidity: f64,
}

/// Raw gas resistances in ohms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawGas {
    pub oxidising: f64,
    pub reducing: f64,
    pub nh3: f64,
}

/// Ambient light sensor (LTR-559 class).
pub trait LightSensor: Send {
    fn read_lux(&mut self) -> Result<f64, SensorError>;
}

/// Temperature / pressure / humidity sensor (BME280 class).
pub trait ClimateSensor: Send {
    fn read_climate(&mut self) -> Result<RawClimate, SensorError>;
}

/// MICS6814 analogue gas front-end.
pub trait GasSensor: Send {
    fn read_gas(&mut self) -> Result<RawGas, SensorError>;
}

/// Host CPU temperature in degrees Celsius, sampled right before each
/// climate read to compensate for board self-heating.
pub trait CpuThermal: Send {
    fn cpu_temperature(&mut self) -> Result<f64, SensorError>;
}

/// Serial particulate sensor (PMS5003 class): slow, occasionally flaky, and
/// only ever touched by the background reader.
#[async_trait]
pub trait ParticulateSensor: Send + 'static {
    /// Blocks (asynchronously) until the sensor delivers a frame or fails.
    async fn read(&mut self) -> Result<ParticulateReading, ParticulateError>;

    /// Power-cycles the sensor after a recoverable fault.
    async fn reset(&mut self);
}
