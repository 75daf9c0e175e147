//! OpenTelemetry export (cargo feature `telemetry`)
//!
//! Enabled at runtime by `OTEL_EXPORTER_OTLP_ENDPOINT`, for example:
//!
//! ```text
//! OTEL_EXPORTER_OTLP_ENDPOINT=http://localhost:4318/v1/traces \
//! OTEL_SERVICE_NAME=walkin-dev \
//!     walkin-queued
//! ```

use anyhow::Result;
use tracing_subscriber::{Layer, Registry};

/// Exporter handle; flushed on shutdown
#[derive(Default)]
pub struct Telemetry {
    #[cfg(feature = "telemetry")]
    provider: Option<opentelemetry_sdk::trace::TracerProvider>,
}

impl Telemetry {
    pub fn shutdown(self) {
        #[cfg(feature = "telemetry")]
        {
            if let Some(provider) = self.provider {
                if let Err(e) = provider.shutdown() {
                    eprintln!("OpenTelemetry shutdown failed: {}", e);
                }
            }
        }
    }
}

type OtelLayer = Option<Box<dyn Layer<Registry> + Send + Sync>>;

/// Build the tracing layer if an endpoint is configured.
///
/// Runs before the subscriber exists, so problems go to stderr.
pub fn layer() -> Result<(OtelLayer, Telemetry)> {
    let Ok(endpoint) = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT") else {
        return Ok((None, Telemetry::default()));
    };

    build(&endpoint)
}

#[cfg(feature = "telemetry")]
fn build(endpoint: &str) -> Result<(OtelLayer, Telemetry)> {
    use opentelemetry::trace::TracerProvider as _;
    use opentelemetry::KeyValue;
    use opentelemetry_otlp::WithExportConfig;
    use opentelemetry_sdk::{runtime, trace::TracerProvider, Resource};

    let service_name =
        std::env::var("OTEL_SERVICE_NAME").unwrap_or_else(|_| "walkin-queued".to_string());

    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_http()
        .with_endpoint(endpoint)
        .build()?;
    let provider = TracerProvider::builder()
        .with_batch_exporter(exporter, runtime::Tokio)
        .with_resource(Resource::new(vec![KeyValue::new(
            "service.name",
            service_name.clone(),
        )]))
        .build();

    let tracer = provider.tracer(service_name);
    let layer = tracing_opentelemetry::layer().with_tracer(tracer).boxed();
    Ok((
        Some(layer),
        Telemetry {
            provider: Some(provider),
        },
    ))
}

#[cfg(not(feature = "telemetry"))]
fn build(endpoint: &str) -> Result<(OtelLayer, Telemetry)> {
    eprintln!(
        "OTEL_EXPORTER_OTLP_ENDPOINT={} is set but the 'telemetry' feature is not enabled",
        endpoint
    );
    Ok((None, Telemetry::default()))
}
