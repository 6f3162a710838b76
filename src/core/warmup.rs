//! Two-phase startup orchestration.
//!
//! The broker connection, the blocking fast-sensor bring-up and the
//! particulate detection probe all run concurrently. The broker connect is
//! first raced against the warmup deadline; if the deadline wins, a broker
//! taking its time is not fatal yet. Once the sensors are warm a secondary
//! bounded wait applies, and exceeding that one is a fatal startup error.

use std::future::Future;
use std::time::Duration;

use tokio::task;
use tokio::time::{sleep, timeout};
use tracing::{info, warn};

use crate::config::warmup::WarmupConfig;
use crate::mqtt::MqttError;

use super::error::{SensorError, StartupError};
use super::particulate::BackgroundReader;
use super::sensors::ParticulateSensor;
use super::slot::SlotWriter;

/// Everything warmup hands back once the system is ready to go live.
pub struct Online<B, F, S> {
    /// Connected broker client.
    pub broker: B,
    /// Initialised fast-sensor bank.
    pub sensors: F,
    /// Background reader for the particulate sensor, if one was detected.
    pub particulate: Option<BackgroundReader<S>>,
}

/// Brings the system online. `connect` resolves when the broker has
/// acknowledged the connection; `init_sensors` performs the blocking
/// hardware bring-up and runs on a worker thread; `particulate`, when
/// present, is probed for an actual device. A missing particulate sensor is
/// not an error.
pub async fn bring_online<B, F, S, Fut>(
    cfg: &WarmupConfig,
    connect: Fut,
    init_sensors: impl FnOnce() -> Result<F, SensorError> + Send + 'static,
    particulate: Option<S>,
    slot: SlotWriter,
) -> Result<Online<B, F, S>, StartupError>
where
    B: Send + 'static,
    F: Send + 'static,
    S: ParticulateSensor,
    Fut: Future<Output = Result<B, MqttError>> + Send + 'static,
{
    let mut connect_task = task::spawn(connect);
    let sensors_task = task::spawn_blocking(init_sensors);
    let detect_task = task::spawn(async move {
        match particulate {
            Some(sensor) => BackgroundReader::detect(sensor, slot).await,
            None => None,
        }
    });

    info!("Waiting for sensors to warm up");
    let mut broker = None;
    tokio::select! {
        res = &mut connect_task => broker = Some(res??),
        _ = sleep(Duration::from_secs(cfg.warmup_secs)) => {}
    }

    let sensors = sensors_task.await??;
    let particulate = detect_task.await?;

    let broker = match broker {
        Some(broker) => broker,
        None => {
            info!("Sensors are warm, waiting for the broker connection");
            match timeout(
                Duration::from_secs(cfg.connect_grace_secs),
                &mut connect_task,
            )
            .await
            {
                Ok(res) => res??,
                Err(_) => {
                    warn!("Timed out waiting for the broker connection");
                    connect_task.abort();
                    return Err(StartupError::Timeout);
                }
            }
        }
    };

    info!("Sensors are warm, going live");
    Ok(Online {
        broker,
        sensors,
        particulate,
    })
}
