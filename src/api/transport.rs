//! The boundary between the control-plane core and whatever talks HTTP.

use async_trait::async_trait;

use crate::api::wire::{
    AppCreateRequest, AppPayload, BackupPayload, ConfigurationPayload, DatabaseCreateRequest,
    DatabaseImagePayload, DatabasePayload, DiskPayload, EnvironmentPayload, HandleUpdateRequest,
    OperationPayload, OperationRequest, ServicePayload, SshPortalConnectionPayload,
    SshPortalConnectionRequest,
};
use crate::error::Result;

/// Outcome of a fetch-by-ID.
///
/// A 404 is a tag, not an error, so callers that soft-delete can branch on
/// it without inspecting status codes.
#[derive(Debug, Clone, PartialEq)]
pub enum Fetched<T> {
    Found(T),
    NotFound,
}

impl<T> Fetched<T> {
    pub fn found(self) -> Option<T> {
        match self {
            Fetched::Found(value) => Some(value),
            Fetched::NotFound => None,
        }
    }
}

/// Authenticated access to the platform's resource endpoints.
///
/// Fetches return [`Fetched::NotFound`] for a 404. Every other failure,
/// including a 404 on a list or submit call, is an error classified as
/// [`crate::DeployError::Authentication`] for a 401 and
/// [`crate::DeployError::Http`] otherwise.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get_app(&self, id: i64) -> Result<Fetched<AppPayload>>;
    async fn list_apps(&self, environment_id: i64) -> Result<Vec<AppPayload>>;
    async fn create_app(&self, environment_id: i64, request: &AppCreateRequest)
        -> Result<AppPayload>;
    async fn update_app(&self, id: i64, request: &HandleUpdateRequest) -> Result<()>;
    async fn create_app_operation(
        &self,
        app_id: i64,
        request: &OperationRequest,
    ) -> Result<OperationPayload>;

    async fn get_database(&self, id: i64) -> Result<Fetched<DatabasePayload>>;
    async fn create_database(
        &self,
        environment_id: i64,
        request: &DatabaseCreateRequest,
    ) -> Result<DatabasePayload>;
    async fn update_database(&self, id: i64, request: &HandleUpdateRequest) -> Result<()>;
    async fn create_database_operation(
        &self,
        database_id: i64,
        request: &OperationRequest,
    ) -> Result<OperationPayload>;
    async fn list_database_operations(
        &self,
        database_id: i64,
        page: u32,
    ) -> Result<Vec<OperationPayload>>;
    async fn list_backups(&self, database_id: i64) -> Result<Vec<BackupPayload>>;

    async fn get_operation(&self, id: i64) -> Result<Fetched<OperationPayload>>;
    async fn create_ssh_portal_connection(
        &self,
        operation_id: i64,
        request: &SshPortalConnectionRequest,
    ) -> Result<SshPortalConnectionPayload>;

    async fn get_service(&self, id: i64) -> Result<Fetched<ServicePayload>>;
    async fn get_disk(&self, id: i64) -> Result<Fetched<DiskPayload>>;
    async fn get_database_image(&self, id: i64) -> Result<Fetched<DatabaseImagePayload>>;
    async fn get_configuration(&self, id: i64) -> Result<Fetched<ConfigurationPayload>>;
    async fn get_environment(&self, id: i64) -> Result<Fetched<EnvironmentPayload>>;
}
