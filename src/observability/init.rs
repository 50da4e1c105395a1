//! Tracing subscriber setup.

use super::tracer;
use crate::domain::{ListingError, Result};
use crate::Config;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry_sdk::resource::Resource;
use std::path::PathBuf;
use tracing_opentelemetry::OpenTelemetryLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Service and scope name attached to every exported span.
const SERVICE_NAME: &str = "erp-listing";

/// Name of the trace file inside the data directory.
const TRACE_FILE: &str = "erp-listing-otlp.json";

/// Installs the global subscriber exporting spans to the data directory.
///
/// The filter comes from `RUST_LOG` when set, otherwise from
/// `config.trace_level` (default `info`). Calling it again after a subscriber
/// is installed leaves the first one in place.
///
/// Returns the path of the trace file.
///
/// # Errors
///
/// Returns [`ListingError::Io`] if the data directory cannot be created.
pub fn init_tracing(config: &Config) -> Result<PathBuf> {
    let level = config.trace_level.as_deref().unwrap_or("info");
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let data_dir = crate::infrastructure::get_data_dir();
    std::fs::create_dir_all(&data_dir).map_err(ListingError::Io)?;

    let resource = Resource::new(vec![
        opentelemetry::KeyValue::new("service.name", SERVICE_NAME),
        opentelemetry::KeyValue::new("service.version", env!("CARGO_PKG_VERSION")),
    ]);

    let trace_file = data_dir.join(TRACE_FILE);
    let provider = tracer::file_tracer_provider(&trace_file, resource, SERVICE_NAME);
    let otel_layer = OpenTelemetryLayer::new(provider.tracer(SERVICE_NAME));
    opentelemetry::global::set_tracer_provider(provider);

    if tracing_subscriber::registry()
        .with(filter)
        .with(otel_layer)
        .try_init()
        .is_err()
    {
        tracing::debug!("tracing subscriber already installed");
    }

    Ok(trace_file)
}
