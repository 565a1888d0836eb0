//! Vigil remote job client
//!
//! The capability the executor needs from a remote execution service:
//! submit a job, then ask for its status. Concrete service bindings implement
//! [`RemoteJobClient`] and are injected into the executor; nothing here holds
//! a global session.
//!
//! # Example
//!
//! ```no_run
//! use vigil_client::{RemoteJobClient, StartRequest};
//!
//! async fn submit(client: &dyn RemoteJobClient) -> vigil_client::Result<()> {
//!     let handle = client
//!         .start(&StartRequest::new("arn:aws:states:us-east-1:000000000000:stateMachine:sm"))
//!         .await?;
//!     let status = client.describe(&handle).await?;
//!     println!("{} is {}", handle, status.state);
//!     Ok(())
//! }
//! ```

pub mod documents;
pub mod error;
pub mod memory;

// Re-export commonly used types
pub use error::{ClientError, Result};
pub use memory::InMemoryJobClient;

use async_trait::async_trait;
use vigil_core::{JobHandle, RawStatus};

/// Request to start a state machine execution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartRequest {
    pub state_machine_arn: String,
    /// Execution name, generated by the service when absent
    pub name: Option<String>,
    /// JSON input document
    pub input: Option<String>,
}

impl StartRequest {
    pub fn new(state_machine_arn: impl Into<String>) -> Self {
        Self {
            state_machine_arn: state_machine_arn.into(),
            name: None,
            input: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_input(mut self, input: impl Into<String>) -> Self {
        self.input = Some(input.into());
        self
    }
}

/// Remote execution service
///
/// Implementations must not retry internally; the executor decides what a
/// failed call means.
#[async_trait]
pub trait RemoteJobClient: Send + Sync {
    /// Submits a job and returns its handle
    ///
    /// Fails with [`ClientError::StartRejected`] when the service refuses it.
    async fn start(&self, request: &StartRequest) -> Result<JobHandle>;

    /// Fetches the current status document of a job
    ///
    /// Fails with [`ClientError::NotFound`] when the handle is unknown.
    async fn describe(&self, handle: &JobHandle) -> Result<RawStatus>;
}
