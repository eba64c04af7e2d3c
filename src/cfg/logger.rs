// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use tracing_appender::{
    non_blocking::WorkerGuard,
    rolling::{RollingFileAppender, Rotation},
};
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, writer::BoxMakeWriter},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Debug, Deserialize, Clone)]
struct LoggerFile {
    logger: LoggerConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "lowercase")]
enum Output {
    Stdout,
    Stderr,
    File,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(rename_all = "lowercase")]
enum Format {
    #[default]
    Plain,
    Json,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "lowercase")]
enum RotationFreq {
    Minutely,
    Hourly,
    Daily,
    Never,
}

#[derive(Debug, Deserialize, Clone)]
struct LogFileConfig {
    path: String,
    #[serde(default)]
    rotation_frequency: Option<RotationFreq>,
}

#[derive(Debug, Deserialize, Clone)]
struct LoggerConfig {
    level: String,
    output: Output,
    #[serde(default)]
    format: Format,
    file: Option<LogFileConfig>,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            output: Output::Stderr,
            format: Format::Plain,
            file: None,
        }
    }
}

/// Installs the global subscriber from a YAML config; a missing config file
/// falls back to plain stderr logging at info. The returned guard must live
/// as long as the process keeps logging.
pub fn init_logger(config_path: &str) -> Result<WorkerGuard> {
    let config = match fs::read_to_string(config_path) {
        Ok(content) => {
            serde_yaml::from_str::<LoggerFile>(&content)
                .with_context(|| format!("failed to parse logger config {config_path}"))?
                .logger
        },
        Err(_) => LoggerConfig::default(),
    };

    let (writer, guard) = make_writer(&config)?;

    let env_filter = EnvFilter::try_new(&config.level)
        .or_else(|_| EnvFilter::try_from_default_env())
        .context("failed to parse log level from config or env")?;

    let registry = tracing_subscriber::registry().with(env_filter);
    match config.format {
        Format::Plain => {
            let layer = fmt::layer().with_writer(writer).with_ansi(false);
            registry
                .with(layer)
                .try_init()
                .map_err(|err| anyhow!("set subscriber: {err}"))?;
        },
        Format::Json => {
            let layer = fmt::layer().with_writer(writer).with_ansi(false).json();
            registry
                .with(layer)
                .try_init()
                .map_err(|err| anyhow!("set subscriber: {err}"))?;
        },
    }

    Ok(guard)
}

/// Minimal stderr logger for the CLI: `RUST_LOG` controls the level,
/// defaulting to info.
pub fn init_cli_logger() -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .map_err(|err| anyhow!("set subscriber: {err}"))
}

fn make_writer(config: &LoggerConfig) -> Result<(BoxMakeWriter, WorkerGuard)> {
    Ok(match config.output {
        Output::Stdout => {
            let (w, g) = tracing_appender::non_blocking(std::io::stdout());
            (BoxMakeWriter::new(w), g)
        },
        Output::Stderr => {
            let (w, g) = tracing_appender::non_blocking(std::io::stderr());
            (BoxMakeWriter::new(w), g)
        },
        Output::File => {
            let fcfg = config
                .file
                .clone()
                .context("logger.file is required for output=file")?;
            let path = PathBuf::from(&fcfg.path);
            let dir = path.parent().unwrap_or_else(|| Path::new(""));

            let rotation = match fcfg.rotation_frequency.unwrap_or(RotationFreq::Never) {
                RotationFreq::Minutely => Rotation::MINUTELY,
                RotationFreq::Hourly => Rotation::HOURLY,
                RotationFreq::Daily => Rotation::DAILY,
                RotationFreq::Never => Rotation::NEVER,
            };

            let appender = RollingFileAppender::new(
                rotation,
                dir,
                path.file_name().unwrap_or_default(),
            );
            let (w, g) = tracing_appender::non_blocking(appender);
            (BoxMakeWriter::new(w), g)
        },
    })
}
