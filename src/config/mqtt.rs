//! Broker connection and publishing configuration.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// MQTT connection, publishing and Home Assistant discovery settings.
///
/// `broker` is the only field without a workable default.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct MqttConfig {
    /// Broker hostname or IP address.
    #[validate(length(min = 1, message = "Broker not configured"))]
    pub broker: String,

    /// Broker port.
    pub port: u16,

    /// Optional broker credentials. Both must be set to take effect.
    pub username: Option<String>,
    pub password: Option<String>,

    /// Client identifier. Defaults to `raspi-{serial}` when unset.
    pub client_id: Option<String>,

    /// First topic segment of the state topic, `{topic_prefix}/{serial}`.
    pub topic_prefix: String,

    /// Seconds between publish cycles.
    #[validate(range(min = 1))]
    pub publish_interval: u64,

    /// QoS level for state publishes.
    #[validate(range(max = 2))]
    pub qos: u8,

    /// Whether state publishes are retained.
    pub retain: bool,

    /// Whether to announce entities via Home Assistant MQTT discovery.
    pub discovery: bool,

    /// Whether discovery descriptors are retained.
    pub discovery_retain: bool,

    /// Home Assistant discovery topic prefix.
    pub discovery_prefix: String,

    /// Whether to attach the device-grouping block to descriptors.
    pub discovery_device: bool,

    /// Display name of the device in Home Assistant.
    pub discovery_device_name: String,
}

impl Default for MqttConfig {
    fn default() -> Self {
        MqttConfig {
            broker: String::new(),
            port: 1883,
            username: None,
            password: None,
            client_id: None,
            topic_prefix: "enviroplus".to_string(),
            publish_interval: 5,
            qos: 1,
            retain: false,
            discovery: true,
            discovery_retain: true,
            discovery_prefix: "homeassistant".to_string(),
            discovery_device: true,
            discovery_device_name: "Mystery Pi".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_fails_until_a_broker_is_set() {
        let mut config = MqttConfig::default();
        assert!(config.validate().is_err());

        config.broker = "localhost".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_publish_interval_is_rejected() {
        let config = MqttConfig {
            broker: "localhost".to_string(),
            publish_interval: 0,
            ..MqttConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
