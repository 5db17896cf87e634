//! Drives an operation to a terminal status.

use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::api::{Fetched, Transport};
use crate::error::{DeployError, Result};
use crate::models::OperationStatus;

/// Bounds and pacing for [`OperationPoller`].
#[derive(Debug, Clone, PartialEq)]
pub struct PollPolicy {
    /// Delay between two status checks.
    pub interval: Duration,
    /// Maximum number of status checks.
    pub max_attempts: u32,
    /// Optional wall-clock bound. A status check still in flight when it
    /// expires is abandoned, and no sleep is started that would end past it.
    pub timeout: Option<Duration>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            max_attempts: 900,
            timeout: None,
        }
    }
}

impl PollPolicy {
    pub fn new(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_attempts,
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Polls an operation by ID until it succeeds, fails or the policy bound is hit.
pub struct OperationPoller<'a, T: ?Sized> {
    transport: &'a T,
    policy: &'a PollPolicy,
}

impl<'a, T: Transport + ?Sized> OperationPoller<'a, T> {
    pub fn new(transport: &'a T, policy: &'a PollPolicy) -> Self {
        Self { transport, policy }
    }

    /// Wait for the operation to reach a terminal status.
    ///
    /// Returns `Ok(true)` when it succeeded and `Ok(false)` when the platform
    /// reports it failed. A transport error aborts polling immediately and a
    /// missed bound yields [`DeployError::PollTimeout`]; no status check is
    /// issued after either.
    pub async fn wait_for_operation(&self, operation_id: i64) -> Result<bool> {
        let started = Instant::now();
        let max_attempts = self.policy.max_attempts.max(1);

        for attempt in 1..=max_attempts {
            let status = match self.policy.timeout {
                Some(timeout) => {
                    let remaining = timeout.saturating_sub(started.elapsed());
                    tokio::time::timeout(remaining, self.fetch_status(operation_id))
                        .await
                        .map_err(|_| DeployError::PollTimeout {
                            operation_id,
                            attempts: attempt,
                        })??
                }
                None => self.fetch_status(operation_id).await?,
            };
            debug!(operation_id, attempt, %status, "polled operation");

            if status.is_terminal() {
                let succeeded = status == OperationStatus::Succeeded;
                if succeeded {
                    info!(operation_id, attempt, "operation succeeded");
                } else {
                    warn!(operation_id, attempt, "operation failed");
                }
                return Ok(succeeded);
            }
            if let OperationStatus::Unknown(raw) = &status {
                warn!(operation_id, status = %raw, "unrecognized operation status");
            }

            if attempt == max_attempts {
                break;
            }
            if let Some(timeout) = self.policy.timeout {
                if started.elapsed() + self.policy.interval > timeout {
                    return Err(DeployError::PollTimeout {
                        operation_id,
                        attempts: attempt,
                    });
                }
            }
            tokio::time::sleep(self.policy.interval).await;
        }

        Err(DeployError::PollTimeout {
            operation_id,
            attempts: max_attempts,
        })
    }

    async fn fetch_status(&self, operation_id: i64) -> Result<OperationStatus> {
        match self.transport.get_operation(operation_id).await? {
            Fetched::Found(payload) => {
                let status = payload.status.ok_or(DeployError::IncompleteResource {
                    resource: "operation",
                    field: "status",
                })?;
                Ok(OperationStatus::from(status.as_str()))
            }
            Fetched::NotFound => Err(DeployError::NotFound {
                resource: "operation",
                id: operation_id,
            }),
        }
    }
}
