//! Host identity and thermal probes.
//!
//! Everything here reads the Raspberry Pi's procfs and sysfs surfaces: the
//! board serial from `/proc/cpuinfo`, the primary MAC from
//! `/sys/class/net` and the CPU temperature from the thermal zone. Each
//! function takes the real path by default and a custom root in tests.

use std::{fs, path::PathBuf};

use tracing::warn;

use crate::core::{error::SensorError, sensors::CpuThermal};

/// Used when the board serial cannot be read, so topics stay stable.
pub const FALLBACK_SERIAL: &str = "0000000000000000";

const CPUINFO_PATH: &str = "/proc/cpuinfo";
const NET_CLASS_PATH: &str = "/sys/class/net";
const THERMAL_ZONE_PATH: &str = "/sys/class/thermal/thermal_zone0/temp";

/// Returns the board serial from `/proc/cpuinfo`, or [`FALLBACK_SERIAL`]
/// when the file is unreadable or carries no `Serial` line.
pub fn serial_number() -> String {
    match fs::read_to_string(CPUINFO_PATH) {
        Ok(cpuinfo) => parse_serial(&cpuinfo).unwrap_or_else(|| {
            warn!("No serial found in {CPUINFO_PATH}, using fallback");
            FALLBACK_SERIAL.to_string()
        }),
        Err(err) => {
            warn!("Could not read {CPUINFO_PATH}: {err}, using fallback serial");
            FALLBACK_SERIAL.to_string()
        }
    }
}

fn parse_serial(cpuinfo: &str) -> Option<String> {
    cpuinfo.lines().find_map(|line| {
        let (key, value) = line.split_once(':')?;
        if key.trim() == "Serial" {
            let serial = value.trim();
            (!serial.is_empty()).then(|| serial.to_string())
        } else {
            None
        }
    })
}

/// Returns the MAC of the first real network interface, if any.
///
/// Interfaces are scanned in name order; the loopback device and interfaces
/// with an all-zero or missing address are skipped.
pub fn mac_address() -> Option<String> {
    mac_address_from(NET_CLASS_PATH)
}

fn mac_address_from(net_class: &str) -> Option<String> {
    let mut entries: Vec<PathBuf> = fs::read_dir(net_class)
        .ok()?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .collect();
    entries.sort();

    for entry in entries {
        if entry.file_name().is_some_and(|name| name == "lo") {
            continue;
        }
        let Ok(address) = fs::read_to_string(entry.join("address")) else {
            continue;
        };
        let address = address.trim();
        if address.is_empty() || address == "00:00:00:00:00:00" {
            continue;
        }
        return Some(address.to_string());
    }
    None
}

/// CPU temperature probe backed by the kernel's thermal zone.
pub struct SysfsCpuThermal {
    zone_path: PathBuf,
}

impl SysfsCpuThermal {
    pub fn new() -> Self {
        Self::at(THERMAL_ZONE_PATH.into())
    }

    pub fn at(zone_path: PathBuf) -> Self {
        Self { zone_path }
    }
}

impl Default for SysfsCpuThermal {
    fn default() -> Self {
        Self::new()
    }
}

impl CpuThermal for SysfsCpuThermal {
    fn cpu_temperature(&mut self) -> Result<f64, SensorError> {
        let raw = fs::read_to_string(&self.zone_path).map_err(|source| SensorError::FileRead {
            path: self.zone_path.display().to_string(),
            source,
        })?;
        let millidegrees: f64 = raw.trim().parse().map_err(|err| SensorError::Parse {
            what: "CPU temperature",
            location: self.zone_path.display().to_string(),
            reason: format!("{err}: {:?}", raw.trim()),
        })?;
        Ok(millidegrees / 1000.0)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    #[test]
    fn serial_is_extracted_from_cpuinfo() {
        let cpuinfo = "processor\t: 0\nmodel name\t: ARMv7\n\
                       Hardware\t: BCM2835\nSerial\t\t: 00000000abcdef01\nModel\t: Pi 3\n";
        assert_eq!(parse_serial(cpuinfo), Some("00000000abcdef01".to_string()));
    }

    #[test]
    fn cpuinfo_without_serial_yields_none() {
        assert_eq!(parse_serial("processor\t: 0\nmodel name\t: x86_64\n"), None);
        assert_eq!(parse_serial("Serial\t\t:\n"), None);
    }

    #[test]
    fn mac_scan_skips_loopback_and_nil_addresses() {
        let dir = TempDir::new().unwrap();
        for (iface, address) in [
            ("dummy0", "00:00:00:00:00:00"),
            ("eth0", "b8:27:eb:01:02:03"),
            ("lo", "00:00:00:00:00:00"),
        ] {
            let iface_dir = dir.path().join(iface);
            fs::create_dir(&iface_dir).unwrap();
            fs::write(iface_dir.join("address"), format!("{address}\n")).unwrap();
        }

        assert_eq!(
            mac_address_from(dir.path().to_str().unwrap()),
            Some("b8:27:eb:01:02:03".to_string())
        );
    }

    #[test]
    fn mac_scan_with_no_usable_interface_yields_none() {
        let dir = TempDir::new().unwrap();
        let lo = dir.path().join("lo");
        fs::create_dir(&lo).unwrap();
        fs::write(lo.join("address"), "00:00:00:00:00:00\n").unwrap();

        assert_eq!(mac_address_from(dir.path().to_str().unwrap()), None);
    }

    #[test]
    fn thermal_zone_millidegrees_become_degrees() {
        let dir = TempDir::new().unwrap();
        let zone = dir.path().join("temp");
        fs::write(&zone, "48250\n").unwrap();

        let mut probe = SysfsCpuThermal::at(zone);
        assert_eq!(probe.cpu_temperature().unwrap(), 48.25);
    }

    #[test]
    fn unreadable_thermal_zone_is_a_file_error() {
        let mut probe = SysfsCpuThermal::at("/nonexistent/thermal/temp".into());
        assert!(matches!(
            probe.cpu_temperature(),
            Err(SensorError::FileRead { .. })
        ));
    }

    #[test]
    fn garbage_thermal_zone_is_a_parse_error() {
        let dir = TempDir::new().unwrap();
        let zone = dir.path().join("temp");
        fs::write(&zone, "not a number\n").unwrap();

        let mut probe = SysfsCpuThermal::at(zone);
        assert!(matches!(
            probe.cpu_temperature(),
            Err(SensorError::Parse { .. })
        ));
    }
}
