//! The publish loop: one reading per interval, cooperatively cancellable.
//!
//! Each cycle samples the aggregator, serializes the reading and publishes
//! it. A failed cycle is logged and skipped; the loop only ever exits on
//! cancellation, after which it attempts a graceful broker disconnect
//! bounded by a short timeout.

use std::sync::Arc;
use std::time::Duration;

use erased_serde::Serialize;
use tokio::time::{sleep, timeout};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use super::error::CycleError;
use super::reading::SensorReading;

/// How long a graceful disconnect may take before shutdown proceeds
/// without it.
const DISCONNECT_TIMEOUT: Duration = Duration::from_secs(2);

/// Sink for serialized payloads. Implemented by the MQTT link and by test
/// doubles.
#[async_trait::async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(
        &self,
        topic: &str,
        payload: &(dyn Serialize + Send + Sync),
        qos: u8,
        retain: bool,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    /// Graceful disconnect. Callers bound this with a timeout.
    async fn disconnect(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// Source of per-cycle readings. The aggregator implements this; tests swap
/// in scripted sources.
pub trait SampleSource: Send {
    fn sample(&mut self) -> Result<SensorReading, CycleError>;
}

/// Drives the fixed publish cadence until the cancellation token fires.
pub struct PublishLoop<S> {
    publisher: Arc<dyn Publisher>,
    source: S,
    topic: String,
    qos: u8,
    retain: bool,
    interval: Duration,
}

impl<S: SampleSource> PublishLoop<S> {
    pub fn new(
        publisher: Arc<dyn Publisher>,
        source: S,
        topic: String,
        qos: u8,
        retain: bool,
        interval: Duration,
    ) -> Self {
        Self {
            publisher,
            source,
            topic,
            qos,
            retain,
            interval,
        }
    }

    async fn cycle(&mut self) -> Result<(), CycleError> {
        let reading = self.source.sample()?;
        self.publisher
            .publish(&self.topic, &reading, self.qos, self.retain)
            .await
            .map_err(CycleError::Publish)?;
        debug!("Published reading to {}", self.topic);
        Ok(())
    }

    /// Runs until the token is cancelled. The per-cycle sleep races the stop
    /// signal; whichever completes first wins. On exit the broker disconnect
    /// is attempted but never blocks shutdown for more than
    /// [`DISCONNECT_TIMEOUT`].
    pub async fn run(mut self, cancel: CancellationToken) {
        info!(
            "Publishing to {} every {}s",
            self.topic,
            self.interval.as_secs()
        );

        loop {
            if let Err(err) = self.cycle().await {
                error!("Skipping cycle: {err}");
            }

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = sleep(self.interval) => {}
            }
        }

        info!("Publish loop stopping, disconnecting from broker");
        match timeout(DISCONNECT_TIMEOUT, self.publisher.disconnect()).await {
            Ok(Ok(())) => debug!("Broker disconnected"),
            Ok(Err(err)) => error!("Broker disconnect failed: {err}"),
            Err(_) => error!("Timed out trying to disconnect"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Instant;

    use tracing_test::traced_test;

    use super::*;
    use crate::core::error::SensorError;

    #[derive(Default)]
    struct MockPublisher {
        publish_count: AtomicUsize,
        disconnect_count: AtomicUsize,
        last_payload: Mutex<Option<String>>,
        slow_disconnect: bool,
    }

    #[async_trait::async_trait]
    impl Publisher for MockPublisher {
        async fn publish(
            &self,
            _topic: &str,
            payload: &(dyn Serialize + Send + Sync),
            _qos: u8,
            _retain: bool,
        ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
            self.publish_count.fetch_add(1, Ordering::SeqCst);
            let json = serde_json::to_string(payload).unwrap();
            *self.last_payload.lock().unwrap() = Some(json);
            Ok(())
        }

        async fn disconnect(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
            self.disconnect_count.fetch_add(1, Ordering::SeqCst);
            if self.slow_disconnect {
                sleep(Duration::from_secs(60)).await;
            }
            Ok(())
        }
    }

    /// Yields a fixed reading, optionally failing on scripted cycles.
    struct ScriptedSource {
        cycle: usize,
        fail_on: Vec<usize>,
    }

    impl ScriptedSource {
        fn reliable() -> Self {
            Self {
                cycle: 0,
                fail_on: Vec::new(),
            }
        }

        fn failing_on(fail_on: Vec<usize>) -> Self {
            Self { cycle: 0, fail_on }
        }
    }

    impl SampleSource for ScriptedSource {
        fn sample(&mut self) -> Result<SensorReading, CycleError> {
            self.cycle += 1;
            if self.fail_on.contains(&self.cycle) {
                return Err(SensorError::Device {
                    sensor: "bme280",
                    reason: "bus glitch".into(),
                }
                .into());
            }
            Ok(SensorReading {
                temperature: 21.0,
                pressure: 1013.0,
                humidity: 45.0,
                lux: 100.0,
                oxidising: 12.0,
                reducing: 450.0,
                nh3: 300.0,
                particulate: None,
            })
        }
    }

    fn publish_loop(
        publisher: Arc<MockPublisher>,
        source: ScriptedSource,
        interval: Duration,
    ) -> PublishLoop<ScriptedSource> {
        PublishLoop::new(
            publisher,
            source,
            "enviro/0000000000000000".into(),
            1,
            false,
            interval,
        )
    }

    #[tokio::test]
    async fn publishes_on_the_configured_cadence() {
        let publisher = Arc::new(MockPublisher::default());
        let cancel = CancellationToken::new();
        let run = publish_loop(
            publisher.clone(),
            ScriptedSource::reliable(),
            Duration::from_millis(30),
        )
        .run(cancel.clone());
        let handle = tokio::spawn(run);

        sleep(Duration::from_millis(100)).await;
        cancel.cancel();
        handle.await.unwrap();

        assert!(publisher.publish_count.load(Ordering::SeqCst) >= 3);
        let payload = publisher.last_payload.lock().unwrap().clone().unwrap();
        assert!(payload.contains("\"temperature\":21.0"));
        assert!(!payload.contains("pm25"));
    }

    #[tokio::test]
    #[traced_test]
    async fn a_failed_cycle_does_not_stop_the_loop() {
        let publisher = Arc::new(MockPublisher::default());
        let cancel = CancellationToken::new();
        let run = publish_loop(
            publisher.clone(),
            ScriptedSource::failing_on(vec![1]),
            Duration::from_millis(20),
        )
        .run(cancel.clone());
        let handle = tokio::spawn(run);

        sleep(Duration::from_millis(90)).await;
        cancel.cancel();
        handle.await.unwrap();

        assert!(logs_contain("Skipping cycle"));
        // Cycle 1 failed but later cycles still published.
        assert!(publisher.publish_count.load(Ordering::SeqCst) >= 2);
    }

    #[tokio::test]
    async fn cancellation_triggers_a_graceful_disconnect() {
        let publisher = Arc::new(MockPublisher::default());
        let cancel = CancellationToken::new();
        let run = publish_loop(
            publisher.clone(),
            ScriptedSource::reliable(),
            Duration::from_secs(3600),
        )
        .run(cancel.clone());
        let handle = tokio::spawn(run);

        sleep(Duration::from_millis(50)).await;
        cancel.cancel();
        handle.await.unwrap();

        assert_eq!(publisher.disconnect_count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    #[traced_test]
    async fn a_hung_disconnect_never_blocks_shutdown() {
        let publisher = Arc::new(MockPublisher {
            slow_disconnect: true,
            ..Default::default()
        });
        let cancel = CancellationToken::new();
        cancel.cancel();

        let start = Instant::now();
        publish_loop(
            publisher,
            ScriptedSource::reliable(),
            Duration::from_secs(3600),
        )
        .run(cancel)
        .await;

        assert!(start.elapsed() < Duration::from_secs(10));
        assert!(logs_contain("Timed out trying to disconnect"));
    }
}
