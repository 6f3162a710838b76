//! Home Assistant MQTT discovery.
//!
//! A one-shot announcer that publishes one retained descriptor per metric so
//! a Home Assistant instance can auto-create the matching entities. Each
//! message is independent and idempotent; ordering across metrics does not
//! matter, and republishing an identical descriptor is a no-op for the
//! consumer.

use serde::Serialize;
use tracing::{debug, error, info};

use crate::config::mqtt::MqttConfig;

use super::publisher::Publisher;

/// Static metadata for one published metric.
pub struct Metric {
    /// Short id suffix used in the unique id and the config topic.
    pub id: &'static str,
    /// Key of this metric's value in the state payload.
    pub value_key: &'static str,
    /// Home Assistant device class, where one exists.
    pub device_class: Option<&'static str>,
    pub name: &'static str,
    pub unit: &'static str,
}

/// Metrics every Enviro+ carries.
pub const FIXED_METRICS: &[Metric] = &[
    Metric {
        id: "lux",
        value_key: "lux",
        device_class: Some("illuminance"),
        name: "Brightness",
        unit: "lx",
    },
    Metric {
        id: "temp",
        value_key: "temperature",
        device_class: Some("temperature"),
        name: "Temperature",
        unit: "°C",
    },
    Metric {
        id: "humidity",
        value_key: "humidity",
        device_class: Some("humidity"),
        name: "Humidity",
        unit: "%",
    },
    Metric {
        id: "pressure",
        value_key: "pressure",
        device_class: Some("pressure"),
        name: "Pressure",
        unit: "hPa",
    },
    Metric {
        id: "oxidising",
        value_key: "oxidising",
        device_class: None,
        name: "Oxidising Gas",
        unit: "kΩ",
    },
    Metric {
        id: "reducing",
        value_key: "reducing",
        device_class: None,
        name: "Reducing Gas",
        unit: "kΩ",
    },
    Metric {
        id: "nh3",
        value_key: "nh3",
        device_class: None,
        name: "Ammonia Gas",
        unit: "kΩ",
    },
];

/// Metrics announced only when a particulate sensor was detected.
pub const PARTICULATE_METRICS: &[Metric] = &[
    Metric {
        id: "pm1",
        value_key: "pm1",
        device_class: Some("pm1"),
        name: "PM1",
        unit: "µg/m³",
    },
    Metric {
        id: "pm25",
        value_key: "pm25",
        device_class: Some("pm25"),
        name: "PM2.5",
        unit: "µg/m³",
    },
    Metric {
        id: "pm10",
        value_key: "pm10",
        device_class: Some("pm10"),
        name: "PM10",
        unit: "µg/m³",
    },
    Metric {
        id: "pl03",
        value_key: "pl03",
        device_class: None,
        name: "Particles >0.3um",
        unit: "#/0.1L",
    },
    Metric {
        id: "pl05",
        value_key: "pl05",
        device_class: None,
        name: "Particles >0.5um",
        unit: "#/0.1L",
    },
    Metric {
        id: "pl1",
        value_key: "pl1",
        device_class: None,
        name: "Particles >1um",
        unit: "#/0.1L",
    },
    Metric {
        id: "pl25",
        value_key: "pl25",
        device_class: None,
        name: "Particles >2.5um",
        unit: "#/0.1L",
    },
    Metric {
        id: "pl5",
        value_key: "pl5",
        device_class: None,
        name: "Particles >5um",
        unit: "#/0.1L",
    },
    Metric {
        id: "pl10",
        value_key: "pl10",
        device_class: None,
        name: "Particles >10um",
        unit: "#/0.1L",
    },
];

/// Identity attached to every descriptor.
pub struct DeviceIdentity {
    pub serial: String,
    /// Hardware network address, when resolvable.
    pub mac: Option<String>,
}

/// Discovery payload with Home Assistant's abbreviated keys.
#[derive(Serialize)]
struct Descriptor<'a> {
    #[serde(rename = "dev_cla", skip_serializing_if = "Option::is_none")]
    device_class: Option<&'a str>,
    name: &'a str,
    #[serde(rename = "unit_of_meas")]
    unit: &'a str,
    #[serde(rename = "val_tpl")]
    value_template: String,
    #[serde(rename = "uniq_id")]
    unique_id: &'a str,
    #[serde(rename = "stat_t")]
    state_topic: &'a str,
    #[serde(rename = "dev", skip_serializing_if = "Option::is_none")]
    device: Option<&'a DeviceBlock>,
}

/// Device-grouping block shared by all descriptors of one device.
#[derive(Serialize)]
struct DeviceBlock {
    ids: String,
    mdl: &'static str,
    mf: &'static str,
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    connections: Option<Vec<(String, String)>>,
}

/// Publishes one retained QoS 1 descriptor per metric to
/// `{discovery_prefix}/sensor/{unique_id}/config`. Runs once, after warmup
/// and before the first publish cycle; no-ops when discovery is disabled.
/// A failed descriptor is logged and the rest are still attempted.
pub async fn announce(
    publisher: &dyn Publisher,
    cfg: &MqttConfig,
    identity: &DeviceIdentity,
    has_particulate: bool,
) {
    if !cfg.discovery {
        debug!("Discovery disabled, skipping announcements");
        return;
    }

    let state_topic = format!("{}/{}", cfg.topic_prefix, identity.serial);
    let device = cfg.discovery_device.then(|| DeviceBlock {
        ids: identity.serial.clone(),
        mdl: "Enviro+ MQTT",
        mf: "Pimoroni",
        name: cfg.discovery_device_name.clone(),
        connections: identity
            .mac
            .clone()
            .map(|mac| vec![("mac".to_string(), mac)]),
    });

    let mut metrics: Vec<&Metric> = FIXED_METRICS.iter().collect();
    if has_particulate {
        metrics.extend(PARTICULATE_METRICS.iter());
    }

    info!(
        "Publishing {} discovery descriptors under {}/sensor",
        metrics.len(),
        cfg.discovery_prefix
    );

    for metric in metrics {
        let unique_id = format!("{}_{}", identity.serial, metric.id);
        let topic = format!("{}/sensor/{}/config", cfg.discovery_prefix, unique_id);
        let payload = Descriptor {
            device_class: metric.device_class,
            name: metric.name,
            unit: metric.unit,
            value_template: format!("{{{{ value_json.{} }}}}", metric.value_key),
            unique_id: &unique_id,
            state_topic: &state_topic,
            device: device.as_ref(),
        };

        if let Err(err) = publisher.publish(&topic, &payload, 1, cfg.discovery_retain).await {
            error!("Failed to publish discovery descriptor {unique_id}: {err}");
        }
    }
}
