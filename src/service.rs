//! High-level control-plane operations over a [`Transport`].
//!
//! Every mutation enqueues an operation on the platform; the flows here
//! submit it, poll it to a terminal status and then re-assemble the resource
//! by walking its links. Nothing is cached between calls and nothing is
//! rolled back when a later step fails.

mod app;
mod backup;
mod database;
mod operation;

use std::sync::Arc;

use crate::api::{HttpTransport, Transport};
use crate::config::ClientConfig;
use crate::error::{DeployError, Result};
use crate::links::LinkResolver;
use crate::poller::{OperationPoller, PollPolicy};

/// Control-plane client for apps, databases and operations.
pub struct DeployService<T: ?Sized = dyn Transport> {
    transport: Arc<T>,
    poll: PollPolicy,
}

impl DeployService<HttpTransport> {
    /// Create a service talking HTTP with the given configuration.
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        let transport = HttpTransport::new(config)?;
        Ok(Self::new(Arc::new(transport), config.poll.clone()))
    }

    /// Create a service from `APTIBLE_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_config(&ClientConfig::from_env()?)
    }
}

impl<T: Transport + ?Sized> DeployService<T> {
    pub fn new(transport: Arc<T>, poll: PollPolicy) -> Self {
        Self { transport, poll }
    }

    /// Block until the operation is terminal.
    ///
    /// `Ok(false)` means the platform reports the operation as failed; that is
    /// an expected outcome, not an error.
    pub async fn wait_for_operation(&self, operation_id: i64) -> Result<bool> {
        OperationPoller::new(&*self.transport, &self.poll)
            .wait_for_operation(operation_id)
            .await
    }

    fn links(&self) -> LinkResolver<'_, T> {
        LinkResolver::new(&*self.transport)
    }

    /// Poll and turn a platform-side failure into [`DeployError::OperationFailed`].
    async fn require_success(&self, operation_id: i64) -> Result<()> {
        if self.wait_for_operation(operation_id).await? {
            Ok(())
        } else {
            Err(DeployError::OperationFailed { operation_id })
        }
    }
}

/// Operation ID from a submit response.
fn submitted_operation_id(id: Option<i64>) -> Result<i64> {
    id.ok_or(DeployError::IncompleteResource {
        resource: "operation",
        field: "id",
    })
}
