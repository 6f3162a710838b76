//! Startup warmup timing configuration.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Bounds for the startup warmup phase.
///
/// Startup overlaps the broker connection with sensor settling: the process
/// waits at least `warmup_secs` before publishing, and tolerates a broker
/// that needs up to `connect_grace_secs` beyond that before giving up.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct WarmupConfig {
    /// Minimum seconds to let the sensors settle before the first cycle.
    #[validate(range(min = 1))]
    pub warmup_secs: u64,

    /// Additional seconds granted to a broker that is still connecting once
    /// warmup has elapsed. Startup fails when this also runs out.
    #[validate(range(min = 1))]
    pub connect_grace_secs: u64,
}

impl Default for WarmupConfig {
    fn default() -> Self {
        WarmupConfig {
            warmup_secs: 10,
            connect_grace_secs: 10,
        }
    }
}
