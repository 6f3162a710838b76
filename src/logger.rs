//! Logging initialization.
//!
//! Builds the global `tracing` subscriber from [`LoggerConfig`]: a console
//! layer in the configured format plus an optional systemd journald layer.
//! `RUST_LOG` overrides the configured level when set.

use std::io;

use thiserror::Error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter, Layer};
use validator::{Validate, ValidationErrors};

use crate::{
    config::logger::{LogFormat, LoggerConfig},
    print_info,
};

/// Errors that can occur during logger initialization.
#[derive(Error, Debug)]
pub enum LoggerError {
    /// Validation errors from the logger configuration struct.
    #[error("Logger configuration validation error: {0}")]
    Validation(#[from] ValidationErrors),

    /// Journald socket could not be opened.
    #[error("Failed to initialize journald logger: {0}")]
    Journald(#[from] io::Error),
}

/// Initializes the global `tracing` subscriber. Must be called once at
/// startup before any tracing macros are used.
pub fn init(config: &LoggerConfig) -> Result<(), LoggerError> {
    config.validate()?;

    let mut layers = Vec::new();

    let console_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.level));
    layers.push(console_layer(config, console_filter));

    // Journald layer (Linux/systemd only)
    if let Some(journald) = config.journald.as_ref().filter(|j| j.enabled) {
        let journald_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&config.level));

        let layer = tracing_journald::layer()?.with_syslog_identifier(journald.identifier.clone());
        layers.push(layer.with_filter(journald_filter).boxed());
        print_info!(
            "Systemd journald logger initialized with identifier: {}",
            journald.identifier
        );
    }

    tracing_subscriber::registry().with(layers).init();
    Ok(())
}

fn console_layer(
    config: &LoggerConfig,
    filter: EnvFilter,
) -> Box<dyn Layer<tracing_subscriber::Registry> + Send + Sync> {
    let writer = io::stdout;
    match config.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_ansi(config.ansi_colors)
            .with_writer(writer)
            .with_filter(filter)
            .boxed(),
        LogFormat::Pretty => fmt::layer()
            .pretty()
            .with_ansi(config.ansi_colors)
            .with_writer(writer)
            .with_filter(filter)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_target(false)
            .with_ansi(config.ansi_colors)
            .with_writer(writer)
            .with_filter(filter)
            .boxed(),
    }
}
