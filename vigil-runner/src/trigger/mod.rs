//! Trigger layer
//!
//! Deferred tasks leave their remaining wait here. The runtime owns the
//! concurrency; each trigger owns a single job handle.

pub mod runtime;
pub mod status;

pub use runtime::{TriggerDelivery, TriggerRuntime};
pub use status::StatusTrigger;
