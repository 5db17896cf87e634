//! Operation and environment accessors, and the SSH portal flow.

use tracing::{info, instrument};

use super::DeployService;
use crate::api::wire::SshPortalConnectionRequest;
use crate::api::{Fetched, Transport};
use crate::error::{DeployError, Result};
use crate::links::{environment_from_payload, extract_id, require, ResourceKind};
use crate::models::{
    Environment, Operation, OperationResource, OperationStatus, OperationType,
    SshPortalConnection,
};

impl<T: Transport + ?Sized> DeployService<T> {
    /// Fetch an operation and resolve the resource it acts on.
    ///
    /// For apps and databases the resource's handle is looked up; a resource
    /// that has since been deleted leaves the handle empty, any other lookup
    /// failure is returned.
    #[instrument(skip(self))]
    pub async fn get_operation(&self, id: i64) -> Result<Operation> {
        let payload = match self.transport.get_operation(id).await? {
            Fetched::Found(payload) => payload,
            Fetched::NotFound => {
                return Err(DeployError::NotFound {
                    resource: "operation",
                    id,
                })
            }
        };

        let resource = match &payload.links.resource {
            Some(link) => Some(self.resolve_operation_resource(&link.href).await?),
            None => None,
        };
        let environment_id = match &payload.links.account {
            Some(link) => Some(extract_id(&link.href)?),
            None => None,
        };

        Ok(Operation {
            id: payload.id.unwrap_or(id),
            operation_type: payload
                .operation_type
                .as_deref()
                .map(OperationType::from)
                .ok_or(DeployError::IncompleteResource {
                    resource: "operation",
                    field: "type",
                })?,
            status: payload
                .status
                .as_deref()
                .map(OperationStatus::from)
                .ok_or(DeployError::IncompleteResource {
                    resource: "operation",
                    field: "status",
                })?,
            resource,
            environment_id,
            stack_id: None,
            created_at: payload.created_at,
            ssh: None,
        })
    }

    async fn resolve_operation_resource(&self, href: &str) -> Result<OperationResource> {
        let (kind, id) = ResourceKind::from_href(href)?;

        let resource = match kind {
            ResourceKind::App => OperationResource::App {
                id,
                handle: match self.transport.get_app(id).await? {
                    Fetched::Found(app) => Some(app.handle.ok_or(
                        DeployError::IncompleteResource {
                            resource: "app",
                            field: "handle",
                        },
                    )?),
                    Fetched::NotFound => None,
                },
            },
            ResourceKind::Database => OperationResource::Database {
                id,
                handle: match self.transport.get_database(id).await? {
                    Fetched::Found(database) => Some(database.handle.ok_or(
                        DeployError::IncompleteResource {
                            resource: "database",
                            field: "handle",
                        },
                    )?),
                    Fetched::NotFound => None,
                },
            },
            other => OperationResource::Other {
                kind: other.collection().to_string(),
                id,
            },
        };
        Ok(resource)
    }

    /// Fetch an environment with its stack ID.
    #[instrument(skip(self))]
    pub async fn get_environment(&self, id: i64) -> Result<Environment> {
        match self.transport.get_environment(id).await? {
            Fetched::Found(payload) => environment_from_payload(id, payload),
            Fetched::NotFound => Err(DeployError::NotFound {
                resource: "environment",
                id,
            }),
        }
    }

    /// Request an SSH portal certificate for a running operation.
    ///
    /// The platform issues a certificate rather than a resource; the returned
    /// operation is re-fetched and carries the certificate along with the
    /// stack the portal lives on.
    #[instrument(skip(self, public_key))]
    pub async fn create_ssh_portal_connection(
        &self,
        environment_id: i64,
        operation_id: i64,
        public_key: &str,
    ) -> Result<Operation> {
        let environment = self.get_environment(environment_id).await?;

        let request = SshPortalConnectionRequest {
            ssh_public_key: public_key.to_string(),
        };
        let payload = self
            .transport
            .create_ssh_portal_connection(operation_id, &request)
            .await?;

        let operation_link = require(
            payload.links.operation.as_ref(),
            "ssh portal connection",
            "_links.operation",
        )?;
        let certificate = payload
            .ssh_certificate_body
            .ok_or(DeployError::IncompleteResource {
                resource: "ssh portal connection",
                field: "ssh_certificate_body",
            })?;

        let mut operation = self.get_operation(extract_id(&operation_link.href)?).await?;
        info!(
            operation_id = operation.id,
            stack_id = environment.stack_id,
            "ssh portal connection issued"
        );

        operation.environment_id = Some(environment.id);
        operation.stack_id = Some(environment.stack_id);
        if operation.created_at.is_none() {
            operation.created_at = payload.created_at;
        }
        operation.ssh = Some(SshPortalConnection {
            certificate,
            user: payload.ssh_user.unwrap_or_default(),
            pty: payload.ssh_pty.unwrap_or(false),
        });
        Ok(operation)
    }
}
