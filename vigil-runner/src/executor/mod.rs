//! Execution layer
//!
//! The polling state machine and the controller that decides whether it runs
//! in the current call or behind a trigger.

pub mod deferral;
pub mod polling;

pub use deferral::DeferralController;
pub use polling::{ExecutorState, PollStep, PollingExecutor};
