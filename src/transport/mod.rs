//! REST boundary of the listing engine.
//!
//! [`ListTransport`] is the seam between the list cache and the paginated
//! collection endpoints. [`HttpTransport`] speaks HTTP through `reqwest`;
//! [`MemoryTransport`] serves seeded collections for offline use and tests.

pub mod http;
pub mod memory;

pub use http::HttpTransport;
pub use memory::MemoryTransport;

use crate::domain::{ListResponse, Mutation, QueryParams, ResourceKey, Result};
use async_trait::async_trait;
use serde_json::Value;

/// Access to the paginated collection endpoints of one backend.
///
/// Every method maps to one endpoint:
///
/// | Method       | Endpoint                        |
/// |--------------|---------------------------------|
/// | `fetch_page` | `GET /<resource>/?<params>`     |
/// | `create`     | `POST /<resource>/`             |
/// | `update`     | `PUT /<resource>/<id>/`         |
/// | `delete`     | `DELETE /<resource>/<id>/`      |
#[async_trait]
pub trait ListTransport: Send + Sync {
    /// Fetches one page of `resource`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ListingError::Status`] for non-2xx answers,
    /// [`crate::ListingError::Transport`] when the request cannot be sent and
    /// [`crate::ListingError::Decode`] when the body is not `{ count, results }`.
    async fn fetch_page(&self, resource: &ResourceKey, params: &QueryParams)
        -> Result<ListResponse<Value>>;

    /// Creates a record and returns the stored representation.
    ///
    /// # Errors
    ///
    /// Same as [`ListTransport::fetch_page`].
    async fn create(&self, resource: &ResourceKey, body: &Value) -> Result<Value>;

    /// Replaces record `id` and returns the stored representation.
    ///
    /// # Errors
    ///
    /// Same as [`ListTransport::fetch_page`].
    async fn update(&self, resource: &ResourceKey, id: &str, body: &Value) -> Result<Value>;

    /// Deletes record `id`.
    ///
    /// # Errors
    ///
    /// Same as [`ListTransport::fetch_page`].
    async fn delete(&self, resource: &ResourceKey, id: &str) -> Result<()>;

    /// Dispatches a [`Mutation`] to the matching endpoint.
    ///
    /// Returns the stored record for create and update, `None` for delete.
    ///
    /// # Errors
    ///
    /// Propagates the error of the underlying call.
    async fn apply(&self, resource: &ResourceKey, mutation: &Mutation) -> Result<Option<Value>> {
        match mutation {
            Mutation::Create { body } => self.create(resource, body).await.map(Some),
            Mutation::Update { id, body } => self.update(resource, id, body).await.map(Some),
            Mutation::Delete { id } => self.delete(resource, id).await.map(|()| None),
        }
    }
}
