//! Fetch worker message types.
//!
//! Listing views never talk to the cache directly: they post a
//! [`WorkerMessage`] and receive a [`WorkerResponse`] as an event. Messages
//! carry the trace context of the span that posted them so the worker's spans
//! join the same trace.

use crate::cache::ListPage;
use crate::domain::{FetchFailure, Mutation, QueryParams, ResourceKey};
use serde::{Deserialize, Serialize};

/// Distributed tracing context carried across the task boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceContext {
    /// OpenTelemetry trace ID as a hex string.
    pub trace_id: String,

    /// Parent span ID for linking spans across tasks.
    pub parent_span_id: String,
}

impl TraceContext {
    /// Captures the OpenTelemetry ids of the current span.
    ///
    /// Returns `None` when no OpenTelemetry layer is installed or the span
    /// context is invalid.
    pub fn from_current() -> Option<Self> {
        use opentelemetry::trace::TraceContextExt;
        use tracing_opentelemetry::OpenTelemetrySpanExt;

        let otel_context = tracing::Span::current().context();
        let span_ref = otel_context.span();
        let span_context = span_ref.span_context();

        if !span_context.is_valid() {
            return None;
        }

        let context = Self {
            trace_id: format!("{:032x}", span_context.trace_id()),
            parent_span_id: format!("{:016x}", span_context.span_id()),
        };
        tracing::trace!(
            trace_id = %context.trace_id,
            parent_span_id = %context.parent_span_id,
            "capturing trace context"
        );
        Some(context)
    }

    /// Rebuilds a remote OpenTelemetry context from the captured ids.
    #[must_use]
    pub fn to_otel_context(&self) -> Option<opentelemetry::Context> {
        use opentelemetry::trace::{
            SpanContext, SpanId, TraceContextExt, TraceFlags, TraceId, TraceState,
        };

        let trace_id = TraceId::from_hex(&self.trace_id).ok()?;
        let span_id = SpanId::from_hex(&self.parent_span_id).ok()?;
        let span_context = SpanContext::new(
            trace_id,
            span_id,
            TraceFlags::SAMPLED,
            true,
            TraceState::default(),
        );

        Some(opentelemetry::Context::new().with_remote_span_context(span_context))
    }
}

/// Generates `WorkerMessage` constructors that attach the current trace context.
macro_rules! worker_message_builders {
    (
        $(
            $builder_name:ident($variant:ident { $($field:ident: $ty:ty),* $(,)? })
        ),* $(,)?
    ) => {
        impl WorkerMessage {
            $(
                #[doc = concat!("Create a ", stringify!($variant), " message with current trace context")]
                #[must_use]
                pub fn $builder_name($($field: $ty),*) -> Self {
                    Self::$variant {
                        $($field,)*
                        trace_context: TraceContext::from_current(),
                    }
                }
            )*
        }
    };
}

worker_message_builders! {
    fetch_list(FetchList { resource: ResourceKey, params: QueryParams, page_size: usize }),
    mutate(Mutate { resource: ResourceKey, mutation: Mutation }),
}

/// Work posted by a listing view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WorkerMessage {
    /// Read one page through the list cache.
    FetchList {
        resource: ResourceKey,
        params: QueryParams,
        /// Used to derive `page_count`.
        page_size: usize,

        #[serde(skip_serializing_if = "Option::is_none")]
        trace_context: Option<TraceContext>,
    },

    /// Apply a mutation; the cache invalidates the resource on success.
    Mutate {
        resource: ResourceKey,
        mutation: Mutation,

        #[serde(skip_serializing_if = "Option::is_none")]
        trace_context: Option<TraceContext>,
    },
}

impl WorkerMessage {
    /// Trace context attached to the message.
    #[must_use]
    pub const fn trace_context(&self) -> Option<&TraceContext> {
        match self {
            Self::FetchList { trace_context, .. } | Self::Mutate { trace_context, .. } => {
                trace_context.as_ref()
            }
        }
    }

    /// Short name for span fields.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::FetchList { .. } => "fetch_list",
            Self::Mutate { .. } => "mutate",
        }
    }
}

/// Outcome reported back to the listing view.
///
/// List responses echo the [`QueryParams`] they were requested with; the view
/// compares them with its latest request to drop out-of-order answers.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkerResponse {
    /// A page was read.
    ListLoaded {
        resource: ResourceKey,
        params: QueryParams,
        result: ListPage,
    },

    /// Reading a page failed.
    ListFailed {
        resource: ResourceKey,
        params: QueryParams,
        error: FetchFailure,
    },

    /// The mutation succeeded and the resource was invalidated.
    MutationApplied {
        resource: ResourceKey,
        mutation: Mutation,
        /// Stored record for create and update.
        record: Option<serde_json::Value>,
    },

    /// The mutation failed; the cache was left untouched.
    MutationFailed {
        resource: ResourceKey,
        mutation: Mutation,
        error: FetchFailure,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builders_leave_trace_context_empty_without_otel_layer() {
        let message = WorkerMessage::fetch_list(
            ResourceKey::new("positions"),
            QueryParams::default(),
            10,
        );
        assert_eq!(message.kind(), "fetch_list");
        assert!(message.trace_context().is_none());
    }

    #[test]
    fn trace_context_rebuilds_remote_parent() {
        use opentelemetry::trace::TraceContextExt;

        let context = TraceContext {
            trace_id: "4bf92f3577b34da6a3ce929d0e0e4736".into(),
            parent_span_id: "00f067aa0ba902b7".into(),
        };
        let otel = context.to_otel_context().unwrap();
        let span = otel.span();
        let span_context = span.span_context();
        assert!(span_context.is_remote());
        assert_eq!(format!("{:016x}", span_context.span_id()), context.parent_span_id);

        let bad = TraceContext {
            trace_id: "not-hex".into(),
            parent_span_id: "00f067aa0ba902b7".into(),
        };
        assert!(bad.to_otel_context().is_none());
    }
}
