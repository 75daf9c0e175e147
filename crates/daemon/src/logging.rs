//! Logging setup: stdout (pretty or JSON), optional rolling file, optional OTLP

use crate::config::{LogConfig, LogFormat};
use crate::telemetry::{self, Telemetry};
use anyhow::{Context, Result};
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt};
use tracing_subscriber::{EnvFilter, Layer, Registry};

const DEFAULT_FILTER: &str = "walkin=info";

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Keeps the file writer and the exporter alive until shutdown
pub struct LogGuard {
    _file: Option<WorkerGuard>,
    telemetry: Telemetry,
}

impl LogGuard {
    /// Flush exporters; the file writer flushes on drop
    pub fn shutdown(self) {
        self.telemetry.shutdown();
    }
}

pub fn init(config: &LogConfig) -> Result<LogGuard> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(DEFAULT_FILTER))
        .context("invalid log filter")?;

    let mut layers: Vec<BoxedLayer> = vec![stdout_layer(config.format)];

    let file_guard = match &config.file {
        Some(path) => {
            let (layer, guard) = file_layer(config.format, path)?;
            layers.push(layer);
            Some(guard)
        }
        None => None,
    };

    let (otel_layer, telemetry) = telemetry::layer()?;
    if let Some(layer) = otel_layer {
        layers.push(layer);
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(env_filter)
        .try_init()
        .context("logging already initialized")?;

    Ok(LogGuard {
        _file: file_guard,
        telemetry,
    })
}

fn stdout_layer(format: LogFormat) -> BoxedLayer {
    match format {
        LogFormat::Json => fmt::layer().json().boxed(),
        LogFormat::Pretty => fmt::layer().pretty().boxed(),
    }
}

fn file_layer(format: LogFormat, path: &Path) -> Result<(BoxedLayer, WorkerGuard)> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let prefix = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("walkin.log");
    std::fs::create_dir_all(dir)
        .with_context(|| format!("cannot create log directory {}", dir.display()))?;

    let appender = tracing_appender::rolling::daily(dir, prefix);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let layer = match format {
        LogFormat::Json => fmt::layer().json().with_writer(writer).boxed(),
        LogFormat::Pretty => fmt::layer().with_ansi(false).with_writer(writer).boxed(),
    };
    Ok((layer, guard))
}
