//! MQTT transport built on rumqttc.
//!
//! [`connect`] dials the broker and waits for its ConnAck before handing out
//! an [`MqttLink`]; a background task keeps polling the event loop afterwards
//! so outgoing publishes make progress.

mod client;

pub use client::{connect, MqttLink};

use rumqttc::ConnectReturnCode;
use thiserror::Error;

/// Errors from the broker transport.
#[derive(Error, Debug)]
pub enum MqttError {
    /// The network connection or MQTT handshake failed.
    #[error("Connection error: {0}")]
    Connection(#[from] rumqttc::ConnectionError),

    /// The client request channel rejected a command.
    #[error("Client error: {0}")]
    Client(#[from] rumqttc::ClientError),

    /// The broker answered the handshake with a refusal code.
    #[error("Broker refused the connection: {0:?}")]
    Refused(ConnectReturnCode),

    /// Configured QoS level outside 0..=2.
    #[error("Invalid QoS level: {0}")]
    InvalidQos(u8),
}
