//! In-process entities assembled from platform payloads.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Smallest container size (MB) the platform accepts on a resize.
pub const MIN_CONTAINER_SIZE_MB: i64 = 512;

/// Smallest disk size (GB) the platform accepts on a resize.
pub const MIN_DISK_SIZE_GB: i64 = 10;

/// Environment variable whose presence turns a configure into a deploy.
pub const DOCKER_IMAGE_ENV_KEY: &str = "APTIBLE_DOCKER_IMAGE";

/// Application hosted in an environment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct App {
    pub id: i64,
    pub handle: String,
    pub git_repo: String,
    pub environment_id: i64,
    pub deleted: bool,
    /// Environment map of the current configuration, if one is linked.
    #[serde(default)]
    pub env: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub services: Vec<Service>,
}

impl App {
    /// An app the platform reports as gone.
    pub fn deleted(id: i64) -> Self {
        Self {
            id,
            deleted: true,
            ..Self::default()
        }
    }
}

/// Fields that can be changed on an app without an operation.
#[derive(Debug, Clone, Default)]
pub struct AppUpdates {
    pub handle: Option<String>,
}

/// Managed database hosted in an environment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Database {
    pub id: i64,
    pub handle: String,
    pub database_type: String,
    pub default_connection: String,
    #[serde(default)]
    pub connection_urls: Vec<String>,
    /// Memory limit of the backing service, in MB.
    pub container_size: i64,
    /// Size of the backing disk, in GB.
    pub disk_size: i64,
    pub environment_id: i64,
    #[serde(default)]
    pub initialize_from_id: Option<i64>,
    #[serde(default)]
    pub service: Option<Service>,
    #[serde(default)]
    pub disk: Option<Disk>,
    #[serde(default)]
    pub database_image: Option<DatabaseImage>,
    pub deleted: bool,
}

impl Database {
    /// A database the platform reports as gone.
    pub fn deleted(id: i64) -> Self {
        Self {
            id,
            deleted: true,
            ..Self::default()
        }
    }
}

/// Attributes for creating and provisioning a database.
#[derive(Debug, Clone)]
pub struct DatabaseCreateAttrs {
    pub handle: String,
    pub database_type: String,
    pub container_size: i64,
    pub disk_size: i64,
    pub database_image_id: Option<i64>,
}

/// Requested changes to a database.
///
/// Sizes below [`MIN_CONTAINER_SIZE_MB`] / [`MIN_DISK_SIZE_GB`] are left out
/// of the restart request.
#[derive(Debug, Clone, Default)]
pub struct DatabaseUpdates {
    pub container_size: Option<i64>,
    pub disk_size: Option<i64>,
    pub handle: Option<String>,
}

impl DatabaseUpdates {
    pub fn effective_container_size(&self) -> Option<i64> {
        self.container_size.filter(|size| *size >= MIN_CONTAINER_SIZE_MB)
    }

    pub fn effective_disk_size(&self) -> Option<i64> {
        self.disk_size.filter(|size| *size >= MIN_DISK_SIZE_GB)
    }
}

/// Compute footprint of an app or database.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub id: i64,
    #[serde(default)]
    pub handle: Option<String>,
    pub container_count: i64,
    #[serde(default)]
    pub container_profile: Option<String>,
    pub container_memory_limit_mb: i64,
    #[serde(default)]
    pub process_type: Option<String>,
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default)]
    pub resource_type: Option<String>,
    pub resource_id: i64,
    pub environment_id: i64,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Persistent volume backing a database.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Disk {
    pub id: i64,
    /// Size in GB.
    pub size: i64,
    #[serde(default)]
    pub filesystem: Option<String>,
    #[serde(default)]
    pub provisioned_iops: Option<i64>,
}

/// Image a database runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatabaseImage {
    pub id: i64,
    #[serde(default)]
    pub database_type: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub docker_repo: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// App configuration snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Configuration {
    pub id: i64,
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

/// Logical grouping owning apps and databases.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Environment {
    pub id: i64,
    pub handle: String,
    pub stack_id: i64,
}

/// Point-in-time snapshot of a database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Backup {
    pub id: i64,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub region: Option<String>,
    pub manual: bool,
    /// Backup this one was copied from, for cross-region copies.
    #[serde(default)]
    pub copied_from_id: Option<i64>,
}

/// Kind of platform work an operation performs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OperationType {
    Provision,
    Deploy,
    Configure,
    Restart,
    Deprovision,
    Execute,
    Backup,
    Reload,
    Scale,
    SshPortalConnection,
    Other(String),
}

impl OperationType {
    pub fn as_str(&self) -> &str {
        match self {
            OperationType::Provision => "provision",
            OperationType::Deploy => "deploy",
            OperationType::Configure => "configure",
            OperationType::Restart => "restart",
            OperationType::Deprovision => "deprovision",
            OperationType::Execute => "execute",
            OperationType::Backup => "backup",
            OperationType::Reload => "reload",
            OperationType::Scale => "scale",
            OperationType::SshPortalConnection => "ssh_portal_connection",
            OperationType::Other(raw) => raw,
        }
    }
}

impl From<&str> for OperationType {
    fn from(value: &str) -> Self {
        match value {
            "provision" => OperationType::Provision,
            "deploy" => OperationType::Deploy,
            "configure" => OperationType::Configure,
            "restart" => OperationType::Restart,
            "deprovision" => OperationType::Deprovision,
            "execute" => OperationType::Execute,
            "backup" => OperationType::Backup,
            "reload" => OperationType::Reload,
            "scale" => OperationType::Scale,
            "ssh_portal_connection" | "ssh-portal-connection" => {
                OperationType::SshPortalConnection
            }
            other => OperationType::Other(other.to_string()),
        }
    }
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for OperationType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for OperationType {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(OperationType::from(raw.as_str()))
    }
}

/// Operation lifecycle status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationStatus {
    Queued,
    Running,
    Succeeded,
    Failed,
    /// A status this client does not know; treated as still in progress.
    Unknown(String),
}

impl OperationStatus {
    /// Check if this is a terminal status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OperationStatus::Succeeded | OperationStatus::Failed)
    }

    pub fn as_str(&self) -> &str {
        match self {
            OperationStatus::Queued => "queued",
            OperationStatus::Running => "running",
            OperationStatus::Succeeded => "succeeded",
            OperationStatus::Failed => "failed",
            OperationStatus::Unknown(raw) => raw,
        }
    }
}

impl From<&str> for OperationStatus {
    fn from(value: &str) -> Self {
        match value {
            "queued" => OperationStatus::Queued,
            "running" => OperationStatus::Running,
            "succeeded" => OperationStatus::Succeeded,
            "failed" => OperationStatus::Failed,
            other => OperationStatus::Unknown(other.to_string()),
        }
    }
}

impl fmt::Display for OperationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for OperationStatus {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for OperationStatus {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(OperationStatus::from(raw.as_str()))
    }
}

/// Resource an operation acts on, resolved once when the operation is fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OperationResource {
    App { id: i64, handle: Option<String> },
    Database { id: i64, handle: Option<String> },
    Other { kind: String, id: i64 },
}

impl OperationResource {
    pub fn id(&self) -> i64 {
        match self {
            OperationResource::App { id, .. }
            | OperationResource::Database { id, .. }
            | OperationResource::Other { id, .. } => *id,
        }
    }

    /// Handle of the resource; `None` when it was deleted or has no handle.
    pub fn handle(&self) -> Option<&str> {
        match self {
            OperationResource::App { handle, .. } | OperationResource::Database { handle, .. } => {
                handle.as_deref()
            }
            OperationResource::Other { .. } => None,
        }
    }
}

/// Credentials issued for an SSH portal session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SshPortalConnection {
    pub certificate: String,
    pub user: String,
    pub pty: bool,
}

/// Asynchronous unit of platform work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    pub id: i64,
    pub operation_type: OperationType,
    pub status: OperationStatus,
    #[serde(default)]
    pub resource: Option<OperationResource>,
    #[serde(default)]
    pub environment_id: Option<i64>,
    #[serde(default)]
    pub stack_id: Option<i64>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub ssh: Option<SshPortalConnection>,
}

impl Operation {
    pub fn handle(&self) -> Option<&str> {
        self.resource.as_ref().and_then(OperationResource::handle)
    }
}
