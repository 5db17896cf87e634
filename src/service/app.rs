//! App assembly and lifecycle flows.

use std::collections::BTreeMap;

use tracing::{info, instrument};

use super::{submitted_operation_id, DeployService};
use crate::api::wire::{AppCreateRequest, AppPayload, HandleUpdateRequest, OperationRequest};
use crate::api::{Fetched, Transport};
use crate::error::{DeployError, Result};
use crate::links::{extract_id, require, service_from_payload};
use crate::models::{
    App, AppUpdates, Operation, OperationResource, OperationStatus, OperationType,
    DOCKER_IMAGE_ENV_KEY,
};

/// Mandatory scalar fields of an app payload.
struct AppFields {
    handle: String,
    git_repo: String,
}

fn app_fields(payload: &AppPayload) -> Result<AppFields> {
    let handle = payload
        .handle
        .clone()
        .ok_or(DeployError::IncompleteResource {
            resource: "app",
            field: "handle",
        })?;
    let git_repo = payload
        .git_repo
        .clone()
        .ok_or(DeployError::IncompleteResource {
            resource: "app",
            field: "git_repo",
        })?;
    Ok(AppFields { handle, git_repo })
}

impl<T: Transport + ?Sized> DeployService<T> {
    /// List the apps of an environment without resolving their links.
    #[instrument(skip(self))]
    pub async fn list_apps(&self, environment_id: i64) -> Result<Vec<App>> {
        let payloads = self.transport.list_apps(environment_id).await?;

        payloads
            .iter()
            .map(|payload| {
                let id = payload.id.ok_or(DeployError::IncompleteResource {
                    resource: "app",
                    field: "id",
                })?;
                let fields = app_fields(payload)?;
                Ok(App {
                    id,
                    handle: fields.handle,
                    git_repo: fields.git_repo,
                    environment_id,
                    ..App::default()
                })
            })
            .collect()
    }

    /// Fetch an app and resolve its environment, configuration and services.
    ///
    /// A 404 yields `App { id, deleted: true, .. }` and no error.
    #[instrument(skip(self))]
    pub async fn get_app(&self, id: i64) -> Result<App> {
        let payload = match self.transport.get_app(id).await? {
            Fetched::Found(payload) => payload,
            Fetched::NotFound => {
                info!(app_id = id, "app not found, treating as deleted");
                return Ok(App::deleted(id));
            }
        };

        let fields = app_fields(&payload)?;
        let account = require(payload.links.account.as_ref(), "app", "_links.account")?;
        let environment_id = extract_id(&account.href)?;

        let env = match &payload.links.current_configuration {
            Some(link) => Some(self.links().resolve_configuration(&link.href).await?.env),
            None => None,
        };

        let services = payload
            .embedded
            .services
            .into_iter()
            .map(|service| service_from_payload(service, id, environment_id))
            .collect::<Result<Vec<_>>>()?;

        Ok(App {
            id,
            handle: fields.handle,
            git_repo: fields.git_repo,
            environment_id,
            deleted: false,
            env,
            services,
        })
    }

    /// Create an app in an environment and return it fully assembled.
    ///
    /// Apps need no provisioning step; the first deploy provisions them.
    #[instrument(skip(self))]
    pub async fn create_app(&self, environment_id: i64, handle: &str) -> Result<App> {
        let request = AppCreateRequest {
            handle: handle.to_string(),
        };
        let created = self.transport.create_app(environment_id, &request).await?;
        let id = created.id.ok_or(DeployError::IncompleteResource {
            resource: "app",
            field: "id",
        })?;
        info!(app_id = id, "app created");

        self.get_app(id).await
    }

    /// Rename an app. This is a direct update, no operation is enqueued.
    #[instrument(skip(self))]
    pub async fn update_app(&self, id: i64, updates: AppUpdates) -> Result<App> {
        if let Some(handle) = updates.handle {
            self.transport
                .update_app(id, &HandleUpdateRequest { handle })
                .await?;
        }
        self.get_app(id).await
    }

    /// Push a configuration and wait for it to roll out.
    ///
    /// The operation is a `deploy` when the map names a Docker image and a
    /// `configure` otherwise.
    #[instrument(skip(self, env))]
    pub async fn deploy_app(&self, id: i64, env: BTreeMap<String, String>) -> Result<App> {
        let operation_type = if env.contains_key(DOCKER_IMAGE_ENV_KEY) {
            OperationType::Deploy
        } else {
            OperationType::Configure
        };
        let request = OperationRequest {
            env: Some(env),
            ..OperationRequest::new(operation_type)
        };

        let submitted = self.transport.create_app_operation(id, &request).await?;
        let operation_id = submitted_operation_id(submitted.id)?;
        info!(app_id = id, operation_id, operation_type = %request.operation_type, "submitted app operation");

        self.require_success(operation_id).await?;
        self.get_app(id).await
    }

    /// Submit an operation against an app without waiting for it.
    ///
    /// Pass the returned ID to [`DeployService::wait_for_operation`].
    #[instrument(skip(self))]
    pub async fn app_operation(&self, id: i64, operation_type: OperationType) -> Result<Operation> {
        let app = self.get_app(id).await?;
        if app.deleted {
            return Err(DeployError::NotFound { resource: "app", id });
        }

        let request = OperationRequest::new(operation_type);
        let payload = self.transport.create_app_operation(id, &request).await?;
        let operation_id = submitted_operation_id(payload.id)?;

        Ok(Operation {
            id: operation_id,
            operation_type: payload
                .operation_type
                .as_deref()
                .map(OperationType::from)
                .unwrap_or(request.operation_type),
            status: payload
                .status
                .as_deref()
                .map(OperationStatus::from)
                .unwrap_or(OperationStatus::Queued),
            resource: Some(OperationResource::App {
                id,
                handle: Some(app.handle),
            }),
            environment_id: Some(app.environment_id),
            stack_id: None,
            created_at: payload.created_at,
            ssh: None,
        })
    }

    /// Deprovision an app.
    ///
    /// Returns the poll result: `Ok(false)` when the platform reports the
    /// deprovision as failed.
    #[instrument(skip(self))]
    pub async fn delete_app(&self, id: i64) -> Result<bool> {
        let request = OperationRequest::new(OperationType::Deprovision);
        let submitted = self.transport.create_app_operation(id, &request).await?;
        let operation_id = submitted_operation_id(submitted.id)?;
        info!(app_id = id, operation_id, "submitted deprovision");

        self.wait_for_operation(operation_id).await
    }
}
