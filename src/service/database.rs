//! Database assembly and lifecycle flows.

use tracing::{debug, info, instrument};

use super::{submitted_operation_id, DeployService};
use crate::api::wire::{
    DatabaseCreateRequest, DatabasePayload, HandleUpdateRequest, OperationRequest,
};
use crate::api::{Fetched, Transport};
use crate::error::{DeployError, Result};
use crate::links::{extract_id, require};
use crate::models::{
    Database, DatabaseCreateAttrs, DatabaseUpdates, Operation, OperationResource,
    OperationStatus, OperationType,
};

/// Mandatory scalar fields of a database payload.
struct DatabaseFields {
    handle: String,
    database_type: String,
    default_connection: String,
}

fn database_fields(payload: &DatabasePayload) -> Result<DatabaseFields> {
    let missing = |field| DeployError::IncompleteResource {
        resource: "database",
        field,
    };

    Ok(DatabaseFields {
        default_connection: payload
            .connection_url
            .clone()
            .ok_or_else(|| missing("connection_url"))?,
        database_type: payload
            .database_type
            .clone()
            .ok_or_else(|| missing("type"))?,
        handle: payload.handle.clone().ok_or_else(|| missing("handle"))?,
    })
}

impl<T: Transport + ?Sized> DeployService<T> {
    /// Fetch a database and resolve its environment, service, disk and image.
    ///
    /// A 404 yields `Database { id, deleted: true, .. }` and no error.
    #[instrument(skip(self))]
    pub async fn get_database(&self, id: i64) -> Result<Database> {
        let payload = match self.transport.get_database(id).await? {
            Fetched::Found(payload) => payload,
            Fetched::NotFound => {
                info!(database_id = id, "database not found, treating as deleted");
                return Ok(Database::deleted(id));
            }
        };

        let fields = database_fields(&payload)?;
        let links = &payload.links;

        let account = require(links.account.as_ref(), "database", "_links.account")?;
        let environment_id = extract_id(&account.href)?;

        let service_link = require(links.service.as_ref(), "database", "_links.service")?;
        let service = self
            .links()
            .resolve_service(&service_link.href, id, environment_id)
            .await?;

        let disk_link = require(links.disk.as_ref(), "database", "_links.disk")?;
        let disk = self.links().resolve_disk(&disk_link.href).await?;

        let initialize_from_id = match &links.initialize_from {
            Some(link) => Some(extract_id(&link.href)?),
            None => None,
        };
        let database_image = match &links.database_image {
            Some(link) => Some(self.links().resolve_image(&link.href).await?),
            None => None,
        };

        let connection_urls = payload
            .embedded
            .database_credentials
            .iter()
            .flatten()
            .filter_map(|credential| credential.connection_url.clone())
            .collect();

        Ok(Database {
            id,
            handle: fields.handle,
            database_type: fields.database_type,
            default_connection: fields.default_connection,
            connection_urls,
            container_size: service.container_memory_limit_mb,
            disk_size: disk.size,
            environment_id,
            initialize_from_id,
            service: Some(service),
            disk: Some(disk),
            database_image,
            deleted: false,
        })
    }

    /// Create a database, provision it and return it fully assembled.
    ///
    /// A failure after the create call leaves the remote record in place.
    #[instrument(skip(self, attrs), fields(handle = %attrs.handle))]
    pub async fn create_database(
        &self,
        environment_id: i64,
        attrs: DatabaseCreateAttrs,
    ) -> Result<Database> {
        let request = DatabaseCreateRequest {
            handle: attrs.handle,
            database_type: attrs.database_type,
            database_image_id: attrs.database_image_id,
        };
        let created = self
            .transport
            .create_database(environment_id, &request)
            .await?;
        let database_id = created.id.ok_or(DeployError::IncompleteResource {
            resource: "database",
            field: "id",
        })?;
        info!(database_id, "database created, provisioning");

        let provision = OperationRequest {
            container_size: Some(attrs.container_size),
            disk_size: Some(attrs.disk_size),
            ..OperationRequest::new(OperationType::Provision)
        };
        let submitted = self
            .transport
            .create_database_operation(database_id, &provision)
            .await?;
        let operation_id = submitted_operation_id(submitted.id)?;

        self.require_success(operation_id).await?;
        self.get_database(database_id).await
    }

    /// Apply updates to a database.
    ///
    /// A new handle is set directly. Sizes go out with a `restart` operation
    /// and only when they meet the platform minimums; smaller values are
    /// dropped from the request.
    #[instrument(skip(self))]
    pub async fn update_database(&self, id: i64, updates: DatabaseUpdates) -> Result<Database> {
        if let Some(handle) = updates.handle.clone() {
            self.transport
                .update_database(id, &HandleUpdateRequest { handle })
                .await?;
        }

        let request = OperationRequest {
            container_size: updates.effective_container_size(),
            disk_size: updates.effective_disk_size(),
            ..OperationRequest::new(OperationType::Restart)
        };
        if request.container_size.is_none() && updates.container_size.is_some() {
            debug!(database_id = id, "container size below minimum, omitted");
        }
        if request.disk_size.is_none() && updates.disk_size.is_some() {
            debug!(database_id = id, "disk size below minimum, omitted");
        }

        let submitted = self
            .transport
            .create_database_operation(id, &request)
            .await?;
        let operation_id = submitted_operation_id(submitted.id)?;

        self.require_success(operation_id).await?;
        self.get_database(id).await
    }

    /// Deprovision a database.
    ///
    /// Returns the poll result: `Ok(false)` when the platform reports the
    /// deprovision as failed.
    #[instrument(skip(self))]
    pub async fn delete_database(&self, id: i64) -> Result<bool> {
        let request = OperationRequest::new(OperationType::Deprovision);
        let submitted = self
            .transport
            .create_database_operation(id, &request)
            .await?;
        let operation_id = submitted_operation_id(submitted.id)?;
        info!(database_id = id, operation_id, "submitted deprovision");

        self.wait_for_operation(operation_id).await
    }

    /// One page of a database's operations, without resolving
    /// their resource handles.
    #[instrument(skip(self))]
    pub async fn list_database_operations(&self, id: i64, page: u32) -> Result<Vec<Operation>> {
        let payloads = self.transport.list_database_operations(id, page).await?;

        payloads
            .into_iter()
            .map(|payload| {
                let operation_id = submitted_operation_id(payload.id)?;
                let environment_id = match &payload.links.account {
                    Some(link) => Some(extract_id(&link.href)?),
                    None => None,
                };
                Ok(Operation {
                    id: operation_id,
                    operation_type: payload
                        .operation_type
                        .as_deref()
                        .map(OperationType::from)
                        .unwrap_or_else(|| OperationType::Other(String::new())),
                    status: payload
                        .status
                        .as_deref()
                        .map(OperationStatus::from)
                        .unwrap_or_else(|| OperationStatus::Unknown(String::new())),
                    resource: Some(OperationResource::Database {
                        id,
                        handle: None,
                    }),
                    environment_id,
                    stack_id: None,
                    created_at: payload.created_at,
                    ssh: None,
                })
            })
            .collect()
    }
}
