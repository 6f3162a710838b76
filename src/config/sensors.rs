//! Sensor selection configuration.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Which sensors the bridge attempts to bring up.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct SensorConfig {
    /// Whether to probe for a particulate sensor at startup. When disabled
    /// the probe is skipped entirely and readings never carry particulate
    /// fields.
    pub particulate: bool,
}

impl Default for SensorConfig {
    fn default() -> Self {
        SensorConfig { particulate: true }
    }
}
