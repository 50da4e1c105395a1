//! Background fetch worker.
//!
//! Listing views post messages instead of awaiting the cache themselves, so
//! the event handler stays synchronous and testable. Responses come back as
//! events on the view's channel.
//!
//! - `messages`: Request/response protocol with trace context propagation
//! - `handler`: Message processing against the list cache

pub mod handler;
pub mod messages;

pub use handler::ListingWorker;
pub use messages::{TraceContext, WorkerMessage, WorkerResponse};
