//! Vigil Runner
//!
//! Waits for remote jobs on behalf of workflow tasks.
//!
//! Architecture:
//! - Configuration: trigger runtime tunables from environment or defaults
//! - Executor: the polling state machine and the deferral decision
//! - Triggers: out-of-process polling for suspended tasks
//! - Operators: the tasks the engine schedules
//!
//! A task either polls its job to completion in the calling task, or returns
//! `Outcome::Suspend` before the first status check. The engine then hands the
//! deferral state to the trigger runtime and later resumes the task with the
//! single event the trigger delivers.

pub mod config;
pub mod executor;
pub mod logging;
pub mod operators;
pub mod trigger;

pub use config::RuntimeConfig;
pub use executor::{DeferralController, ExecutorState, PollStep, PollingExecutor};
pub use operators::{GetExecutionOutputOperator, StartExecutionOperator, StepSensor, Task};
pub use trigger::{StatusTrigger, TriggerDelivery, TriggerRuntime};
