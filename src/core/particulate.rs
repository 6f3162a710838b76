//! Background ownership of the particulate sensor.
//!
//! The PMS5003 is slow and occasionally corrupts frames, so it never sits on
//! the publish cadence. A single task owns the device, retries forever, and
//! drops each good frame into the shared slot for the aggregator to pick up.
//! The sensor's own read latency paces the loop; there is no sleep between
//! attempts.

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::error::ParticulateError;
use super::sensors::ParticulateSensor;
use super::slot::SlotWriter;

/// Outcome of one read attempt. The retry-forever policy is expressed as
/// explicit transitions so tests can count them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadTransition {
    /// A frame was stored in the shared slot.
    Stored,
    /// The read timed out; retry immediately, slot untouched.
    RetriedTransient,
    /// A recoverable fault triggered a device reset before the next attempt.
    ResetAndRetried,
}

/// Continuous reader task state. Created by [`BackgroundReader::detect`],
/// which doubles as the startup presence probe.
pub struct BackgroundReader<S> {
    sensor: S,
    slot: SlotWriter,
}

impl<S: ParticulateSensor> BackgroundReader<S> {
    /// Probes for the sensor. A recoverable fault at this stage means no
    /// sensor is fitted and the reader is never started; transient timeouts
    /// are retried as in normal operation. On success the probe reading is
    /// stored immediately so even the first publish cycle can carry
    /// particulate data.
    pub async fn detect(mut sensor: S, slot: SlotWriter) -> Option<Self> {
        loop {
            match sensor.read().await {
                Ok(reading) => {
                    info!("Particulate sensor detected");
                    slot.store(reading);
                    return Some(Self { sensor, slot });
                }
                Err(ParticulateError::ReadTimeout) => {
                    debug!("Particulate probe timed out, retrying");
                }
                Err(err) => {
                    info!("No particulate sensor detected ({err})");
                    return None;
                }
            }
        }
    }

    /// One read attempt. Success stores the frame; a transient timeout
    /// leaves the stale slot value visible; a recoverable fault resets the
    /// device before the next attempt. This is the only place the sensor is
    /// ever reset.
    pub async fn step(&mut self) -> ReadTransition {
        match self.sensor.read().await {
            Ok(reading) => {
                debug!(?reading, "Particulate frame stored");
                self.slot.store(reading);
                ReadTransition::Stored
            }
            Err(ParticulateError::ReadTimeout) => {
                debug!("Particulate read timed out, retrying");
                ReadTransition::RetriedTransient
            }
            Err(err) => {
                warn!("Recoverable particulate fault: {err}, resetting sensor");
                self.sensor.reset().await;
                ReadTransition::ResetAndRetried
            }
        }
    }

    /// Runs until cancelled. Never terminates on its own and never raises
    /// out of its task; a mid-read cancellation writes nothing to the slot.
    pub async fn run(mut self, cancel: CancellationToken) {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("Particulate reader cancelled");
                    break;
                }
                _ = self.step() => {}
            }
        }
    }
}
