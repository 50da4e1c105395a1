//! OpenTelemetry tracing with file-based export.
//!
//! ```text
//! tracing spans → tracing-opentelemetry → OpenTelemetry SDK → JsonLinesExporter → JSON lines
//! ```
//!
//! Spans land in `<data dir>/erp-listing-otlp.json` in OTLP JSON format, one
//! batch per line, rotated at 10 MB with three backups. Worker messages carry
//! a [`TraceContext`](crate::worker::TraceContext), so fetches started from a
//! view show up under the span of the event that requested them.
//!
//! # Modules
//!
//! - `init`: Subscriber setup
//! - `tracer`: Tracer provider with the JSON lines exporter
//! - `span_formatter`: OTLP JSON encoding
//! - `file_writer`: Size-rotated trace file

mod file_writer;
mod init;
mod span_formatter;
mod tracer;

pub use init::init_tracing;
