//! Vigil Core
//!
//! Core types and pure logic for polling remote jobs to completion.
//!
//! This crate contains:
//! - Domain types: job handles, status snapshots, poll configuration, deferral state
//! - Status classification for each supported remote service
//! - The task error taxonomy

pub mod classifier;
pub mod domain;
pub mod error;

pub use domain::deferral::{DeferralState, TriggerEvent, TriggerKind};
pub use domain::job::{JobHandle, JobState, RawStatus, ServiceKind, StatusSnapshot};
pub use domain::poll::PollConfig;
pub use domain::task::{Outcome, TaskContext};
pub use error::{FailureCode, Result, TaskError};
