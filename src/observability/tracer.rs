//! Span exporter writing OTLP JSON lines, and the provider built around it.

use super::file_writer::RotatingFile;
use super::span_formatter::OtlpEncoder;
use futures_util::future::{self, BoxFuture, FutureExt};
use opentelemetry::trace::TraceError;
use opentelemetry_sdk::export::trace::{ExportResult, SpanData, SpanExporter};
use opentelemetry_sdk::resource::Resource;
use opentelemetry_sdk::trace::{Config as TraceConfig, TracerProvider};
use std::path::Path;

/// One exported batch per line of the trace file.
///
/// Shutting down drops the file; later exports fail.
#[derive(Debug)]
struct JsonLinesExporter {
    output: Option<RotatingFile>,
    encoder: OtlpEncoder,
}

impl JsonLinesExporter {
    fn new(trace_file: &Path, resource: &Resource, scope: &'static str) -> Self {
        Self {
            output: Some(RotatingFile::new(trace_file)),
            encoder: OtlpEncoder::new(resource, scope),
        }
    }

    fn write_batch(&self, batch: &[SpanData]) -> ExportResult {
        let output = self
            .output
            .as_ref()
            .ok_or_else(|| TraceError::from("trace file exporter is shut down"))?;
        let line = self.encoder.encode_batch(batch).to_string();
        output.write_line(&line).map_err(|e| {
            TraceError::from(format!("writing {}: {e}", output.path().display()))
        })
    }
}

impl SpanExporter for JsonLinesExporter {
    fn export(&mut self, batch: Vec<SpanData>) -> BoxFuture<'static, ExportResult> {
        future::ready(self.write_batch(&batch)).boxed()
    }

    fn shutdown(&mut self) {
        self.output = None;
    }

    // The resource is encoded when the exporter is built.
    fn set_resource(&mut self, _resource: &Resource) {}
}

/// Builds a provider that writes each finished span to `trace_file` as soon
/// as it ends.
pub fn file_tracer_provider(trace_file: &Path, resource: Resource, scope: &'static str) -> TracerProvider {
    let exporter = JsonLinesExporter::new(trace_file, &resource, scope);

    TracerProvider::builder()
        .with_config(TraceConfig::default().with_resource(resource))
        .with_simple_exporter(exporter)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use opentelemetry::KeyValue;

    #[test]
    fn exports_one_line_per_batch_until_shutdown() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("spans.json");
        let resource = Resource::new(vec![KeyValue::new("service.name", "erp-listing")]);
        let mut exporter = JsonLinesExporter::new(&path, &resource, "erp-listing");

        exporter.export(Vec::new()).now_or_never().unwrap().unwrap();
        exporter.export(Vec::new()).now_or_never().unwrap().unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written.lines().count(), 2);
        let first: serde_json::Value = serde_json::from_str(written.lines().next().unwrap()).unwrap();
        assert_eq!(first["resourceSpans"][0]["scopeSpans"][0]["scope"]["name"], "erp-listing");

        exporter.shutdown();
        assert!(exporter.export(Vec::new()).now_or_never().unwrap().is_err());
    }
}
