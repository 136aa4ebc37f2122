//! Messenger abstractions used by the relay handlers.

pub mod port;
pub mod throttled;
pub mod types;
