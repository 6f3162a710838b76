//! The fixed-shape records published each cycle.

use serde::{Deserialize, Serialize};

/// One publish cycle's worth of measurements, serialized as a flat JSON
/// object. Temperatures are CPU-compensated degrees Celsius, pressure is hPa,
/// humidity is %RH, illuminance is lux and the gas channels are kΩ.
///
/// The particulate block is present only when a particulate sensor was
/// detected at startup and has produced at least one successful reading;
/// otherwise its keys never appear in the payload.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    pub temperature: f64,
    pub pressure: f64,
    pub humidity: f64,
    pub lux: f64,
    pub oxidising: f64,
    pub reducing: f64,
    pub nh3: f64,
    #[serde(flatten)]
    pub particulate: Option<ParticulateReading>,
}

/// Latest successful frame from the particulate sensor: mass concentrations
/// in µg/m³ (`pm*`) and particle counts per 0.1 L of air per size bucket
/// (`pl*`, bucket lower bound in µm).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticulateReading {
    pub pm1: u32,
    pub pm25: u32,
    pub pm10: u32,
    pub pl03: u32,
    pub pl05: u32,
    pub pl1: u32,
    pub pl25: u32,
    pub pl5: u32,
    pub pl10: u32,
}
