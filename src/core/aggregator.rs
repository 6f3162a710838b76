//! Per-cycle aggregation of the fast sensors with the cached particulate
//! data.
//!
//! Fast reads are synchronous and assumed reliable; there are no retries
//! here. A failure propagates to the publish loop, which logs it and skips
//! the cycle.

use tracing::trace;

use super::error::CycleError;
use super::publisher::SampleSource;
use super::reading::SensorReading;
use super::sensors::{ClimateSensor, CpuThermal, GasSensor, LightSensor};
use super::slot::SlotReader;

/// Compensation factor for board self-heating (Enviro+ tuning).
const COMP_FACTOR: f64 = 2.25;
/// Gas resistances arrive in ohms and are published in kΩ.
const OHMS_PER_KILOHM: f64 = 1000.0;

/// Owns the fast sensors and the reader half of the particulate slot, and
/// produces one [`SensorReading`] per publish cycle.
pub struct Aggregator<L, C, G, T> {
    light: L,
    climate: C,
    gas: G,
    thermal: T,
    slot: SlotReader,
}

impl<L, C, G, T> Aggregator<L, C, G, T>
where
    L: LightSensor,
    C: ClimateSensor,
    G: GasSensor,
    T: CpuThermal,
{
    pub fn new(light: L, climate: C, gas: G, thermal: T, slot: SlotReader) -> Self {
        Self {
            light,
            climate,
            gas,
            thermal,
            slot,
        }
    }
}

impl<L, C, G, T> SampleSource for Aggregator<L, C, G, T>
where
    L: LightSensor,
    C: ClimateSensor,
    G: GasSensor,
    T: CpuThermal,
{
    fn sample(&mut self) -> Result<SensorReading, CycleError> {
        let lux = self.light.read_lux()?;

        // Sampled immediately before the climate read so the compensation
        // tracks the board's current self-heating.
        let cpu_temp = self.thermal.cpu_temperature()?;
        let climate = self.climate.read_climate()?;
        let compensated =
            climate.temperature - ((cpu_temp - climate.temperature) / COMP_FACTOR);

        let gas = self.gas.read_gas()?;

        // Non-blocking: absent simply means no particulate keys this cycle.
        let particulate = self.slot.latest();

        trace!(lux, cpu_temp, raw_temp = climate.temperature, "Sampled fast sensors");

        Ok(SensorReading {
            temperature: round_to(compensated, 2),
            pressure: round_to(climate.pressure, 2),
            humidity: round_to(climate.humidity, 1),
            lux: round_to(lux, 2),
            oxidising: round_to(gas.oxidising / OHMS_PER_KILOHM, 4),
            reducing: round_to(gas.reducing / OHMS_PER_KILOHM, 4),
            nh3: round_to(gas.nh3 / OHMS_PER_KILOHM, 4),
            particulate,
        })
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::SensorError;
    use crate::core::reading::ParticulateReading;
    use crate::core::sensors::{RawClimate, RawGas};
    use crate::core::slot::slot;

    struct FixedLight(f64);
    impl LightSensor for FixedLight {
        fn read_lux(&mut self) -> Result<f64, SensorError> {
            Ok(self.0)
        }
    }

    struct FixedClimate(RawClimate);
    impl ClimateSensor for FixedClimate {
        fn read_climate(&mut self) -> Result<RawClimate, SensorError> {
            Ok(self.0)
        }
    }

    struct FailingClimate;
    impl ClimateSensor for FailingClimate {
        fn read_climate(&mut self) -> Result<RawClimate, SensorError> {
            Err(SensorError::Device {
                sensor: "bme280",
                reason: "no response".into(),
            })
        }
    }

    struct FixedGas(RawGas);
    impl GasSensor for FixedGas {
        fn read_gas(&mut self) -> Result<RawGas, SensorError> {
            Ok(self.0)
        }
    }

    struct FixedThermal(f64);
    impl CpuThermal for FixedThermal {
        fn cpu_temperature(&mut self) -> Result<f64, SensorError> {
            Ok(self.0)
        }
    }

    fn fixed_aggregator(
        cpu_temp: f64,
        raw_temp: f64,
        slot_reader: SlotReader,
    ) -> Aggregator<FixedLight, FixedClimate, FixedGas, FixedThermal> {
        Aggregator::new(
            FixedLight(151.339),
            FixedClimate(RawClimate {
                temperature: raw_temp,
                pressure: 1012.512,
                humidity: 48.27,
            }),
            FixedGas(RawGas {
                oxidising: 12_345.6,
                reducing: 450_123.4,
                nh3: 300_900.0,
            }),
            FixedThermal(cpu_temp),
            slot_reader,
        )
    }

    #[test]
    fn temperature_is_cpu_compensated() {
        let (_writer, reader) = slot();
        let mut agg = fixed_aggregator(48.0, 24.0, reader);

        let reading = agg.sample().unwrap();
        // 24 - ((48 - 24) / 2.25) = 13.3333..., rounded to 2 dp.
        assert_eq!(reading.temperature, 13.33);
    }

    #[test]
    fn values_are_rounded_per_field() {
        let (_writer, reader) = slot();
        // cpu == raw means no compensation offset.
        let mut agg = fixed_aggregator(24.0, 24.0, reader);

        let reading = agg.sample().unwrap();
        assert_eq!(reading.temperature, 24.0);
        assert_eq!(reading.pressure, 1012.51);
        assert_eq!(reading.humidity, 48.3);
        assert_eq!(reading.lux, 151.34);
        assert_eq!(reading.oxidising, 12.3456);
        assert_eq!(reading.reducing, 450.1234);
        assert_eq!(reading.nh3, 300.9);
    }

    #[test]
    fn absent_particulate_stays_absent_across_cycles() {
        let (_writer, reader) = slot();
        let mut agg = fixed_aggregator(40.0, 22.0, reader);

        for _ in 0..5 {
            assert!(agg.sample().unwrap().particulate.is_none());
        }
    }

    #[test]
    fn cached_particulate_is_merged_once_present() {
        let (writer, reader) = slot();
        let mut agg = fixed_aggregator(40.0, 22.0, reader);

        assert!(agg.sample().unwrap().particulate.is_none());

        writer.store(ParticulateReading {
            pm1: 2,
            pm25: 8,
            pm10: 11,
            pl03: 220,
            pl05: 61,
            pl1: 12,
            pl25: 2,
            pl5: 0,
            pl10: 0,
        });

        let reading = agg.sample().unwrap();
        assert_eq!(reading.particulate.unwrap().pm25, 8);
    }

    #[test]
    fn fast_sensor_failure_propagates() {
        let (_writer, reader) = slot();
        let mut agg = Aggregator::new(
            FixedLight(100.0),
            FailingClimate,
            FixedGas(RawGas {
                oxidising: 1.0,
                reducing: 1.0,
                nh3: 1.0,
            }),
            FixedThermal(45.0),
            reader,
        );

        assert!(matches!(agg.sample(), Err(CycleError::Sensor(_))));
    }
}
