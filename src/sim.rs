//! Deterministic simulated sensors.
//!
//! Stand-ins for the Enviro+ drivers, useful on machines without the board
//! and for end-to-end runs against a real broker. Values follow slow sine
//! waves around plausible baselines so dashboards show movement; the
//! simulated particulate sensor paces itself like the real PMS5003 and
//! throws an occasional read timeout.

use std::time::Duration;

use async_trait::async_trait;

use crate::core::{
    error::{ParticulateError, SensorError},
    reading::ParticulateReading,
    sensors::{ClimateSensor, GasSensor, LightSensor, ParticulateSensor, RawClimate, RawGas},
};

fn phase(tick: u64, period: u64) -> f64 {
    (tick % period) as f64 / period as f64 * std::f64::consts::TAU
}

/// Simulated ambient light, drifting around indoor levels.
pub struct SimLight {
    tick: u64,
}

impl LightSensor for SimLight {
    fn read_lux(&mut self) -> Result<f64, SensorError> {
        self.tick += 1;
        Ok(120.0 + 40.0 * phase(self.tick, 360).sin())
    }
}

/// Simulated climate sensor around room conditions.
pub struct SimClimate {
    tick: u64,
}

impl ClimateSensor for SimClimate {
    fn read_climate(&mut self) -> Result<RawClimate, SensorError> {
        self.tick += 1;
        Ok(RawClimate {
            temperature: 24.0 + 1.5 * phase(self.tick, 600).sin(),
            pressure: 1013.0 + 4.0 * phase(self.tick, 900).sin(),
            humidity: 45.0 + 8.0 * phase(self.tick, 720).cos(),
        })
    }
}

/// Simulated gas front-end, in ohms like the real driver.
pub struct SimGas {
    tick: u64,
}

impl GasSensor for SimGas {
    fn read_gas(&mut self) -> Result<RawGas, SensorError> {
        self.tick += 1;
        Ok(RawGas {
            oxidising: 21_000.0 + 2_000.0 * phase(self.tick, 300).sin(),
            reducing: 450_000.0 + 30_000.0 * phase(self.tick, 420).cos(),
            nh3: 150_000.0 + 10_000.0 * phase(self.tick, 540).sin(),
        })
    }
}

/// Fast-sensor bank produced by [`fast_sensors`].
pub struct FastBank {
    pub light: SimLight,
    pub climate: SimClimate,
    pub gas: SimGas,
}

/// Brings up the simulated fast sensors. Never fails, but keeps the same
/// shape as a real hardware bring-up would.
pub fn fast_sensors() -> Result<FastBank, SensorError> {
    Ok(FastBank {
        light: SimLight { tick: 0 },
        climate: SimClimate { tick: 0 },
        gas: SimGas { tick: 0 },
    })
}

/// Simulated PMS5003. One frame takes most of a second, like the real
/// sensor, and roughly every fiftieth read times out.
pub struct SimParticulate {
    tick: u64,
}

impl SimParticulate {
    pub fn new() -> Self {
        Self { tick: 0 }
    }
}

impl Default for SimParticulate {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ParticulateSensor for SimParticulate {
    async fn read(&mut self) -> Result<ParticulateReading, ParticulateError> {
        self.tick += 1;
        tokio::time::sleep(Duration::from_millis(800)).await;

        if self.tick % 50 == 0 {
            return Err(ParticulateError::ReadTimeout);
        }

        let swing = (phase(self.tick, 240).sin() * 3.0) as i64;
        let bump = |base: i64| (base + swing).max(0) as u32;
        Ok(ParticulateReading {
            pm1: bump(4),
            pm25: bump(7),
            pm10: bump(9),
            pl03: bump(540),
            pl05: bump(160),
            pl1: bump(35),
            pl25: bump(6),
            pl5: bump(2),
            pl10: bump(1),
        })
    }

    async fn reset(&mut self) {
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fast_sensors_stay_in_plausible_ranges() {
        let mut bank = fast_sensors().unwrap();
        for _ in 0..1000 {
            let lux = bank.light.read_lux().unwrap();
            assert!((0.0..=400.0).contains(&lux));

            let climate = bank.climate.read_climate().unwrap();
            assert!((20.0..=28.0).contains(&climate.temperature));
            assert!((1000.0..=1025.0).contains(&climate.pressure));
            assert!((30.0..=60.0).contains(&climate.humidity));

            let gas = bank.gas.read_gas().unwrap();
            assert!(gas.oxidising > 0.0 && gas.reducing > 0.0 && gas.nh3 > 0.0);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn particulate_frames_arrive_with_an_occasional_timeout() {
        let mut sensor = SimParticulate::new();
        let mut timeouts = 0;
        for _ in 0..100 {
            match sensor.read().await {
                Ok(frame) => assert!(frame.pm25 <= frame.pl03),
                Err(ParticulateError::ReadTimeout) => timeouts += 1,
                Err(other) => panic!("unexpected fault: {other}"),
            }
        }
        assert_eq!(timeouts, 2);
    }
}
