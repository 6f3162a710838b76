//! enviro-mqtt — Enviro+ environmental sensor bridge for MQTT
//!
//! This crate reads the Pimoroni Enviro+ sensor suite on a Raspberry Pi
//! (light, climate, gas and optionally a PMS5003 particulate sensor),
//! folds every cycle into a single flat JSON reading and publishes it to an
//! MQTT broker, announcing its entities via Home Assistant discovery. It is
//! designed for long-running operation with graceful shutdown support and
//! configurable logging.
//!
//! ## Modules
//!
//! * `config` — Configuration structures, loading, validation, and defaults.
//!   Supports TOML configuration files with validation via the `validator`
//!   crate.
//!
//! * `core` — Core runtime components:
//!   - Warmup orchestration for broker and sensors
//!   - Background particulate reader and latest-value slot
//!   - Per-cycle sensor aggregation and compensation
//!   - Publish loop and Home Assistant discovery
//!
//! * `device` — Host identity (board serial, MAC) and the sysfs CPU
//!   temperature probe.
//!
//! * `mqtt` — rumqttc-based broker transport.
//!
//! * `sim` — Deterministic simulated sensor drivers for machines without
//!   the board.
//!
//! * `logger` — Centralized logging initialization using `tracing`.
//!   Supports console output in multiple formats (compact, pretty, JSON)
//!   and optional systemd journald integration.

pub mod config;
pub mod core;
pub mod device;
pub mod logger;
pub mod mqtt;
pub mod sim;
