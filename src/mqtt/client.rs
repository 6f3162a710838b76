use std::{
    error::Error,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use async_trait::async_trait;
use rumqttc::{AsyncClient, ConnectReturnCode, Event, MqttOptions, Packet, QoS};
use tracing::{debug, info, trace, warn};

use super::MqttError;
use crate::{config::mqtt::MqttConfig, core::publisher::Publisher};

/// Capacity of the client's outgoing request channel.
const REQUEST_CAP: usize = 10;

/// Keep-alive interval the broker uses to detect a dead client.
const KEEP_ALIVE: Duration = Duration::from_secs(60);

/// Handle to a live broker connection.
///
/// Cloning is cheap; all clones share the same underlying connection and
/// event loop task.
#[derive(Clone)]
pub struct MqttLink {
    client: AsyncClient,
    /// Set when a clean disconnect was requested, so the event loop task
    /// knows the following connection error is expected.
    closing: Arc<AtomicBool>,
}

/// Dials the broker and waits for its ConnAck.
///
/// Returns once the broker accepted the session. Connection errors and
/// refusal codes surface as [`MqttError`]; the caller decides how long it is
/// willing to wait. On success a background task keeps polling the event
/// loop for the lifetime of the process.
pub async fn connect(cfg: &MqttConfig, client_id: &str) -> Result<MqttLink, MqttError> {
    let mut opts = MqttOptions::new(client_id, cfg.broker.clone(), cfg.port);
    opts.set_keep_alive(KEEP_ALIVE);
    if let (Some(username), Some(password)) = (&cfg.username, &cfg.password) {
        opts.set_credentials(username.clone(), password.clone());
    }

    let (client, mut event_loop) = AsyncClient::new(opts, REQUEST_CAP);

    debug!("Connecting to {}:{} as {client_id}", cfg.broker, cfg.port);
    loop {
        match event_loop.poll().await? {
            Event::Incoming(Packet::ConnAck(ack)) => {
                if ack.code != ConnectReturnCode::Success {
                    return Err(MqttError::Refused(ack.code));
                }
                info!("Connected to MQTT broker at {}:{}", cfg.broker, cfg.port);
                break;
            }
            event => trace!("Pre-connect event: {event:?}"),
        }
    }

    let closing = Arc::new(AtomicBool::new(false));
    let closing_flag = closing.clone();
    tokio::spawn(async move {
        loop {
            match event_loop.poll().await {
                Ok(event) => trace!("MQTT event: {event:?}"),
                Err(_) if closing_flag.load(Ordering::SeqCst) => break,
                Err(err) => {
                    warn!("MQTT connection error: {err}");
                    tokio::time::sleep(Duration::from_secs(1)).await;
                }
            }
        }
        debug!("MQTT event loop stopped");
    });

    Ok(MqttLink { client, closing })
}

fn to_qos(level: u8) -> Result<QoS, MqttError> {
    match level {
        0 => Ok(QoS::AtMostOnce),
        1 => Ok(QoS::AtLeastOnce),
        2 => Ok(QoS::ExactlyOnce),
        other => Err(MqttError::InvalidQos(other)),
    }
}

impl MqttLink {
    /// Serializes `payload` as JSON and hands it to the broker.
    pub async fn publish_json(
        &self,
        topic: &str,
        payload: &(dyn erased_serde::Serialize + Send + Sync),
        qos: u8,
        retain: bool,
    ) -> Result<(), Box<dyn Error + Send + Sync>> {
        let bytes = serde_json::to_vec(payload)?;
        self.client
            .publish(topic, to_qos(qos)?, retain, bytes)
            .await
            .map_err(MqttError::from)?;
        Ok(())
    }

    /// Requests a clean disconnect from the broker.
    pub async fn close(&self) -> Result<(), MqttError> {
        self.closing.store(true, Ordering::SeqCst);
        self.client.disconnect().await?;
        Ok(())
    }
}

#[async_trait]
impl Publisher for MqttLink {
    async fn publish(
        &self,
        topic: &str,
        payload: &(dyn erased_serde::Serialize + Send + Sync),
        qos: u8,
        retain: bool,
    ) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.publish_json(topic, payload, qos, retain).await
    }

    async fn disconnect(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.close().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qos_levels_map_to_protocol_values() {
        assert!(matches!(to_qos(0), Ok(QoS::AtMostOnce)));
        assert!(matches!(to_qos(1), Ok(QoS::AtLeastOnce)));
        assert!(matches!(to_qos(2), Ok(QoS::ExactlyOnce)));
    }

    #[test]
    fn out_of_range_qos_is_rejected() {
        assert!(matches!(to_qos(3), Err(MqttError::InvalidQos(3))));
        assert!(matches!(to_qos(255), Err(MqttError::InvalidQos(255))));
    }
}
