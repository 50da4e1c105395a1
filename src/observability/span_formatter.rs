//! OTLP JSON encoding of exported spans.
//!
//! Each exported batch becomes one OTLP `resourceSpans` document, so the
//! trace file can be replayed into any OTLP collector line by line.

use opentelemetry::trace::{Event, Link, SpanContext, SpanId, SpanKind, Status};
use opentelemetry::{Array, KeyValue, Value};
use opentelemetry_sdk::export::trace::SpanData;
use opentelemetry_sdk::resource::Resource;
use serde_json::{json, Value as JsonValue};
use std::time::{SystemTime, UNIX_EPOCH};

/// Encodes span batches for one service and instrumentation scope.
pub struct OtlpEncoder {
    resource_attributes: Vec<JsonValue>,
    scope: &'static str,
}

impl OtlpEncoder {
    /// The resource attributes are encoded once, up front.
    pub fn new(resource: &Resource, scope: &'static str) -> Self {
        let resource_attributes = resource
            .iter()
            .map(|(key, value)| attribute(key.as_str(), value))
            .collect();
        Self {
            resource_attributes,
            scope,
        }
    }

    /// `{ resourceSpans: [{ resource, scopeSpans: [{ scope, spans }] }] }`
    pub fn encode_batch(&self, batch: &[SpanData]) -> JsonValue {
        json!({
            "resourceSpans": [{
                "resource": { "attributes": self.resource_attributes },
                "scopeSpans": [{
                    "scope": { "name": self.scope },
                    "spans": batch.iter().map(span).collect::<Vec<_>>(),
                }],
            }],
        })
    }
}

impl std::fmt::Debug for OtlpEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OtlpEncoder")
            .field("scope", &self.scope)
            .field("resource_attributes", &self.resource_attributes.len())
            .finish()
    }
}

fn span(data: &SpanData) -> JsonValue {
    let mut encoded = ids(&data.span_context);
    let parent = if data.parent_span_id == SpanId::INVALID {
        String::new()
    } else {
        format!("{:016x}", data.parent_span_id)
    };

    encoded["parentSpanId"] = json!(parent);
    encoded["name"] = json!(data.name);
    encoded["kind"] = json!(kind_code(&data.span_kind));
    encoded["startTimeUnixNano"] = json!(unix_nanos(data.start_time));
    encoded["endTimeUnixNano"] = json!(unix_nanos(data.end_time));
    encoded["attributes"] = attributes(&data.attributes);
    encoded["droppedAttributesCount"] = json!(data.dropped_attributes_count);
    encoded["events"] = data.events.iter().map(event).collect();
    encoded["links"] = data.links.iter().map(link).collect();
    encoded["status"] = status(&data.status);
    encoded
}

/// Hex `traceId` and `spanId` of a span or link.
fn ids(context: &SpanContext) -> JsonValue {
    json!({
        "traceId": format!("{:032x}", context.trace_id()),
        "spanId": format!("{:016x}", context.span_id()),
    })
}

fn event(event: &Event) -> JsonValue {
    json!({
        "timeUnixNano": unix_nanos(event.timestamp),
        "name": event.name,
        "attributes": attributes(&event.attributes),
    })
}

fn link(link: &Link) -> JsonValue {
    let mut encoded = ids(&link.span_context);
    encoded["attributes"] = attributes(&link.attributes);
    encoded
}

const fn kind_code(kind: &SpanKind) -> u8 {
    match kind {
        SpanKind::Internal => 1,
        SpanKind::Server => 2,
        SpanKind::Client => 3,
        SpanKind::Producer => 4,
        SpanKind::Consumer => 5,
    }
}

fn status(status: &Status) -> JsonValue {
    match status {
        Status::Unset => json!({ "code": 0, "message": "" }),
        Status::Ok => json!({ "code": 1, "message": "" }),
        Status::Error { description } => json!({ "code": 2, "message": description.to_string() }),
    }
}

fn attributes(pairs: &[KeyValue]) -> JsonValue {
    pairs.iter().map(|kv| attribute(kv.key.as_str(), &kv.value)).collect()
}

fn attribute(key: &str, value: &Value) -> JsonValue {
    json!({ "key": key, "value": any_value(value) })
}

/// OTLP `AnyValue`. 64-bit integers are strings in OTLP JSON.
fn any_value(value: &Value) -> JsonValue {
    match value {
        Value::Bool(b) => json!({ "boolValue": b }),
        Value::I64(i) => json!({ "intValue": i.to_string() }),
        Value::F64(f) => json!({ "doubleValue": f }),
        Value::String(s) => json!({ "stringValue": s.as_str() }),
        Value::Array(array) => json!({ "arrayValue": { "values": array_values(array) } }),
    }
}

#[allow(unreachable_patterns)]
fn array_values(array: &Array) -> Vec<JsonValue> {
    match array {
        Array::Bool(items) => items.iter().map(|b| json!({ "boolValue": b })).collect(),
        Array::I64(items) => items.iter().map(|i| json!({ "intValue": i.to_string() })).collect(),
        Array::F64(items) => items.iter().map(|f| json!({ "doubleValue": f })).collect(),
        Array::String(items) => items.iter().map(|s| json!({ "stringValue": s.as_str() })).collect(),
        _ => vec![json!({ "stringValue": format!("{array:?}") })],
    }
}

fn unix_nanos(time: SystemTime) -> String {
    time.duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_batch_carries_resource_and_scope() {
        let resource = Resource::new(vec![KeyValue::new("service.name", "erp-listing")]);
        let encoder = OtlpEncoder::new(&resource, "erp-listing");

        let doc = encoder.encode_batch(&[]);
        let resource_spans = &doc["resourceSpans"][0];

        let attrs = resource_spans["resource"]["attributes"].as_array().unwrap();
        assert!(attrs.iter().any(|attr| attr["key"] == "service.name"
            && attr["value"]["stringValue"] == "erp-listing"));
        assert_eq!(resource_spans["scopeSpans"][0]["scope"]["name"], "erp-listing");
        assert_eq!(resource_spans["scopeSpans"][0]["spans"], json!([]));
    }

    #[test]
    fn values_use_otlp_shapes() {
        assert_eq!(any_value(&Value::I64(42)), json!({ "intValue": "42" }));
        assert_eq!(
            any_value(&Value::Array(Array::Bool(vec![true, false]))),
            json!({ "arrayValue": { "values": [{ "boolValue": true }, { "boolValue": false }] } })
        );
        assert_eq!(
            status(&Status::error("timeout")),
            json!({ "code": 2, "message": "timeout" })
        );
        assert_eq!(kind_code(&SpanKind::Client), 3);
        assert_eq!(unix_nanos(UNIX_EPOCH), "0");
    }
}
