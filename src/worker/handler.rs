//! Fetch worker.
//!
//! Runs each [`WorkerMessage`] against the shared list cache on a Tokio task
//! and turns the outcome into a [`WorkerResponse`]. The worker never touches
//! view state; it only reports.

use crate::cache::RemoteListCache;
use crate::domain::FetchFailure;
use crate::worker::{WorkerMessage, WorkerResponse};
use tracing::Instrument;
use tracing_opentelemetry::OpenTelemetrySpanExt;

/// Executes worker messages against a [`RemoteListCache`].
#[derive(Debug, Clone)]
pub struct ListingWorker {
    cache: RemoteListCache,
}

impl ListingWorker {
    #[must_use]
    pub const fn new(cache: RemoteListCache) -> Self {
        Self { cache }
    }

    /// Cache the worker reads through.
    #[must_use]
    pub const fn cache(&self) -> &RemoteListCache {
        &self.cache
    }

    /// Processes one message.
    ///
    /// The span is parented on the message's trace context when present.
    pub async fn handle_message(&self, message: WorkerMessage) -> WorkerResponse {
        let span = tracing::debug_span!("worker_handle_message", kind = message.kind());
        if let Some(parent) = message.trace_context().and_then(|ctx| ctx.to_otel_context()) {
            span.set_parent(parent);
        }

        self.dispatch(message).instrument(span).await
    }

    async fn dispatch(&self, message: WorkerMessage) -> WorkerResponse {
        match message {
            WorkerMessage::FetchList {
                resource,
                params,
                page_size,
                ..
            } => match self.cache.fetch_list(&resource, &params, page_size).await {
                Ok(result) => {
                    tracing::debug!(rows = result.results.len(), count = result.count, "page loaded");
                    WorkerResponse::ListLoaded {
                        resource,
                        params,
                        result,
                    }
                }
                Err(e) => {
                    tracing::debug!(error = %e, "page load failed");
                    WorkerResponse::ListFailed {
                        resource,
                        params,
                        error: FetchFailure::from(e),
                    }
                }
            },

            WorkerMessage::Mutate {
                resource, mutation, ..
            } => match self.cache.apply(&resource, &mutation).await {
                Ok(record) => {
                    tracing::debug!(op = mutation.verb(), "mutation applied");
                    WorkerResponse::MutationApplied {
                        resource,
                        mutation,
                        record,
                    }
                }
                Err(e) => {
                    tracing::debug!(op = mutation.verb(), error = %e, "mutation failed");
                    WorkerResponse::MutationFailed {
                        resource,
                        mutation,
                        error: FetchFailure::from(e),
                    }
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Mutation, QueryParams, ResourceKey};
    use crate::transport::MemoryTransport;
    use serde_json::json;
    use std::sync::Arc;

    fn worker() -> (ListingWorker, Arc<MemoryTransport>) {
        let transport = Arc::new(MemoryTransport::new());
        transport.seed(
            "positions",
            vec![
                json!({ "id": 1, "code": "CLK", "name": "Clerk" }),
                json!({ "id": 2, "code": "MGR", "name": "Manager" }),
            ],
        );
        let cache = RemoteListCache::new(transport.clone());
        (ListingWorker::new(cache), transport)
    }

    #[tokio::test]
    async fn fetch_echoes_params() {
        let (worker, _) = worker();
        let params: QueryParams = [("page", "1"), ("page_size", "10")].into_iter().collect();

        let response = worker
            .handle_message(WorkerMessage::fetch_list(
                ResourceKey::new("positions"),
                params.clone(),
                10,
            ))
            .await;

        match response {
            WorkerResponse::ListLoaded {
                params: echoed,
                result,
                ..
            } => {
                assert_eq!(echoed, params);
                assert_eq!(result.count, 2);
                assert_eq!(result.page_count, 1);
            }
            other => panic!("unexpected response: {other:?}"),
        }
    }

    #[tokio::test]
    async fn failed_mutation_reports_status() {
        let (worker, transport) = worker();
        transport.fail_next("positions", 400, "Code already exists.");

        let response = worker
            .handle_message(WorkerMessage::mutate(
                ResourceKey::new("positions"),
                Mutation::Create {
                    body: json!({ "code": "CLK", "name": "Clerk II" }),
                },
            ))
            .await;

        match response {
            WorkerResponse::MutationFailed { error, .. } => {
                assert_eq!(error.status, Some(400));
                assert_eq!(error.message, "Code already exists.");
            }
            other => panic!("unexpected response: {other:?}"),
        }
    }
}
