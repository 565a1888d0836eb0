//! Core domain types
//!
//! The structures shared by the executor, the deferral path and the trigger
//! runtime. Everything that may cross a process boundary is serde-enabled.

pub mod deferral;
pub mod job;
pub mod poll;
pub mod task;
