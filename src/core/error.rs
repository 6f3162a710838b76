//! Error taxonomy for the acquisition and publish pipeline.
//!
//! Errors are handled at the lowest feasible layer: particulate faults stay
//! inside the background reader, per-cycle failures are logged and the cycle
//! skipped, and only startup failures that leave the system non-functional
//! terminate the process.

use thiserror::Error;

/// Failure mode of a single particulate sensor read.
#[derive(Debug, Error)]
pub enum ParticulateError {
    /// The sensor produced no frame within the driver's read window.
    /// Transient: retried immediately with no state change.
    #[error("timed out waiting for a particulate frame")]
    ReadTimeout,

    /// The serial line went quiet mid-frame.
    #[error("serial timeout while reading particulate frame")]
    SerialTimeout,

    /// A frame arrived but its checksum did not match.
    #[error("particulate frame checksum mismatch")]
    ChecksumMismatch,
}

impl ParticulateError {
    /// Recoverable-fatal errors warrant a hardware reset before the next
    /// attempt; during the detection probe they mean no sensor is fitted.
    pub fn needs_reset(&self) -> bool {
        matches!(self, Self::SerialTimeout | Self::ChecksumMismatch)
    }
}

/// Failure while reading a fast sensor or the host thermal probe.
#[derive(Debug, Error)]
pub enum SensorError {
    /// Failed to read a file backing a host probe.
    #[error("failed to read file {path}")]
    FileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Data was found but could not be interpreted.
    #[error("failed to parse {what} from {location}: {reason}")]
    Parse {
        what: &'static str,
        location: String,
        reason: String,
    },

    /// The sensor hardware itself reported a failure.
    #[error("{sensor} read failed: {reason}")]
    Device {
        sensor: &'static str,
        reason: String,
    },
}

/// Fatal startup failure. Anything here exits the process non-zero.
#[derive(Debug, Error)]
pub enum StartupError {
    /// The broker never connected within the secondary warmup bound.
    #[error("timed out waiting for the broker connection")]
    Timeout,

    /// The broker connection attempt itself failed.
    #[error("broker connection failed: {0}")]
    Broker(#[from] crate::mqtt::MqttError),

    /// Fast-sensor bring-up failed.
    #[error("sensor bring-up failed: {0}")]
    Sensors(#[from] SensorError),

    /// A startup task panicked or was aborted.
    #[error("startup task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Any failure while producing or publishing one reading. Logged by the
/// publish loop, which then skips the cycle and keeps running.
#[derive(Debug, Error)]
pub enum CycleError {
    #[error("sensor read failed: {0}")]
    Sensor(#[from] SensorError),

    #[error("publish failed: {0}")]
    Publish(#[source] Box<dyn std::error::Error + Send + Sync>),
}
