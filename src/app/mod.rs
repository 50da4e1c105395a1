//! Application layer of a listing view.
//!
//! Sits between the front end (`main.rs`, or any embedding UI) and the
//! store/cache/worker layers, following a unidirectional data flow:
//!
//! ```text
//! User Input → Events → handle_event → State Mutations → Actions → Side Effects
//!                           ↑                                        ↓
//!                           └──── SearchSettled / WorkerResponse ────┘
//! ```
//!
//! # Modules
//!
//! - [`actions`]: Side effect commands emitted by the event handler
//! - [`handler`]: Event processing and state transitions
//! - [`state`]: Listing state and view model computation
//! - [`status`]: Load status and notifications
//! - [`controller`]: Action executor owning the worker tasks and debounce timer

pub mod actions;
pub mod controller;
pub mod handler;
pub mod state;
pub mod status;

pub use actions::Action;
pub use controller::ListingController;
pub use handler::{handle_event, Event};
pub use state::ListingState;
pub use status::{LoadStatus, Notification, NotificationKind};
