//! Infrastructure layer for timers and filesystem locations.

pub mod debounce;
pub mod paths;

pub use debounce::{Debouncer, DEFAULT_QUIET_PERIOD};
pub use paths::{expand_tilde, get_data_dir};
