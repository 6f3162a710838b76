use std::{process, sync::Arc, time::Duration};

use enviro_mqtt::{
    config::Config,
    core::{
        aggregator::Aggregator,
        discovery::{self, DeviceIdentity},
        publisher::{PublishLoop, Publisher},
        shutdown::{ShutdownLatch, SignalAction},
        slot, warmup,
    },
    device, logger, mqtt, print_error, sim,
};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Resolves on SIGINT or SIGTERM.
async fn shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = sigterm.recv() => {}
            }
        }
        Err(err) => {
            error!("Failed to install SIGTERM handler: {err}");
            let _ = tokio::signal::ctrl_c().await;
        }
    }
}

#[tokio::main]
async fn main() {
    let cfg = Config::new().unwrap_or_else(|e| {
        print_error!("{}", e);
        process::exit(1);
    });
    logger::init(&cfg.logger).unwrap_or_else(|e| {
        print_error!("Failed to init logger: {}", e);
        process::exit(1);
    });

    info!(
        "Starting enviro-mqtt version {}...",
        env!("CARGO_PKG_VERSION")
    );
    info!("Log level: {}", cfg.logger.level);

    let serial = device::serial_number();
    let client_id = cfg
        .mqtt
        .client_id
        .clone()
        .unwrap_or_else(|| format!("raspi-{serial}"));
    info!("Device serial: {serial}");
    info!(
        "Broker: {}:{}, topic: {}/{serial}, publishing every {}s",
        cfg.mqtt.broker, cfg.mqtt.port, cfg.mqtt.topic_prefix, cfg.mqtt.publish_interval
    );

    // First signal lets the current cycle finish; a second one kills the
    // process outright.
    let cancel = CancellationToken::new();
    {
        let mut latch = ShutdownLatch::new(cancel.clone());
        tokio::spawn(async move {
            loop {
                shutdown_signal().await;
                match latch.fire() {
                    SignalAction::Graceful => info!("Shutdown signal received, finishing up"),
                    SignalAction::Kill => {
                        error!("Killed!");
                        process::exit(1);
                    }
                }
            }
        });
    }

    let (slot_writer, slot_reader) = slot::slot();
    let particulate = cfg.sensors.particulate.then(sim::SimParticulate::new);

    let mqtt_cfg = cfg.mqtt.clone();
    let connect_id = client_id.clone();
    let online = warmup::bring_online(
        &cfg.warmup,
        async move { mqtt::connect(&mqtt_cfg, &connect_id).await },
        sim::fast_sensors,
        particulate,
        slot_writer,
    )
    .await
    .unwrap_or_else(|e| {
        error!("Startup failed: {e}");
        process::exit(1);
    });

    let has_particulate = online.particulate.is_some();
    if let Some(reader) = online.particulate {
        tokio::spawn(reader.run(cancel.child_token()));
    }

    let link = Arc::new(online.broker);
    discovery::announce(
        &*link,
        &cfg.mqtt,
        &DeviceIdentity {
            serial: serial.clone(),
            mac: device::mac_address(),
        },
        has_particulate,
    )
    .await;

    let bank = online.sensors;
    let aggregator = Aggregator::new(
        bank.light,
        bank.climate,
        bank.gas,
        device::SysfsCpuThermal::new(),
        slot_reader,
    );

    PublishLoop::new(
        link.clone() as Arc<dyn Publisher>,
        aggregator,
        format!("{}/{serial}", cfg.mqtt.topic_prefix),
        cfg.mqtt.qos,
        cfg.mqtt.retain,
        Duration::from_secs(cfg.mqtt.publish_interval),
    )
    .run(cancel.clone())
    .await;

    info!("Shutdown complete");
}
