//! Wire payloads exchanged with the platform API.
//!
//! Every field the platform may omit is an `Option`; mandatory fields are
//! checked once per entity by the assemblers in [`crate::service`].

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::models::OperationType;

/// Read an explicit JSON `null` as the field's default.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// HAL relationship reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub href: String,
}

impl Link {
    pub fn new(href: impl Into<String>) -> Self {
        Self { href: href.into() }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppLinks {
    #[serde(default)]
    pub account: Option<Link>,
    #[serde(default)]
    pub current_configuration: Option<Link>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppEmbedded {
    #[serde(default, deserialize_with = "null_as_default")]
    pub services: Vec<ServicePayload>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppPayload {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub handle: Option<String>,
    #[serde(default)]
    pub git_repo: Option<String>,
    #[serde(rename = "_links", default, deserialize_with = "null_as_default")]
    pub links: AppLinks,
    #[serde(rename = "_embedded", default, deserialize_with = "null_as_default")]
    pub embedded: AppEmbedded,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatabaseLinks {
    #[serde(default)]
    pub account: Option<Link>,
    #[serde(default)]
    pub service: Option<Link>,
    #[serde(default)]
    pub disk: Option<Link>,
    #[serde(default)]
    pub initialize_from: Option<Link>,
    #[serde(default)]
    pub database_image: Option<Link>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatabaseCredentialPayload {
    #[serde(default)]
    pub connection_url: Option<String>,
    #[serde(rename = "type", default)]
    pub credential_type: Option<String>,
    #[serde(default)]
    pub default: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatabaseEmbedded {
    /// The platform may return `null` entries in this list, or `null` for it.
    #[serde(default, deserialize_with = "null_as_default")]
    pub database_credentials: Vec<Option<DatabaseCredentialPayload>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatabasePayload {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub handle: Option<String>,
    #[serde(rename = "type", default)]
    pub database_type: Option<String>,
    #[serde(default)]
    pub connection_url: Option<String>,
    #[serde(rename = "_links", default, deserialize_with = "null_as_default")]
    pub links: DatabaseLinks,
    #[serde(rename = "_embedded", default, deserialize_with = "null_as_default")]
    pub embedded: DatabaseEmbedded,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServicePayload {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub handle: Option<String>,
    #[serde(default)]
    pub container_count: Option<i64>,
    #[serde(default)]
    pub instance_class: Option<String>,
    #[serde(default)]
    pub container_memory_limit_mb: Option<i64>,
    #[serde(default)]
    pub process_type: Option<String>,
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default)]
    pub resource_type: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiskPayload {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub size: Option<i64>,
    #[serde(default)]
    pub filesystem: Option<String>,
    #[serde(default)]
    pub provisioned_iops: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatabaseImagePayload {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(rename = "type", default)]
    pub database_type: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub docker_repo: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigurationPayload {
    #[serde(default)]
    pub id: Option<i64>,
    /// Values may be strings, numbers or `null`.
    #[serde(default)]
    pub env: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnvironmentLinks {
    #[serde(default)]
    pub stack: Option<Link>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnvironmentPayload {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub handle: Option<String>,
    #[serde(rename = "_links", default, deserialize_with = "null_as_default")]
    pub links: EnvironmentLinks,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OperationLinks {
    #[serde(default)]
    pub resource: Option<Link>,
    #[serde(default)]
    pub account: Option<Link>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OperationPayload {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(rename = "type", default)]
    pub operation_type: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub handle: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(rename = "_links", default, deserialize_with = "null_as_default")]
    pub links: OperationLinks,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BackupEmbedded {
    #[serde(default)]
    pub copied_from: Option<Box<BackupPayload>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BackupPayload {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub aws_region: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub manual: Option<bool>,
    #[serde(rename = "_embedded", default, deserialize_with = "null_as_default")]
    pub embedded: BackupEmbedded,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SshPortalConnectionLinks {
    #[serde(default)]
    pub operation: Option<Link>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SshPortalConnectionPayload {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub ssh_certificate_body: Option<String>,
    #[serde(default)]
    pub ssh_user: Option<String>,
    #[serde(default)]
    pub ssh_pty: Option<bool>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(rename = "_links", default, deserialize_with = "null_as_default")]
    pub links: SshPortalConnectionLinks,
}

/// Body for creating an app.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppCreateRequest {
    pub handle: String,
}

/// Body for creating a database record (before provisioning).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatabaseCreateRequest {
    pub handle: String,
    #[serde(rename = "type")]
    pub database_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_image_id: Option<i64>,
}

/// Body for a direct, synchronous rename.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HandleUpdateRequest {
    pub handle: String,
}

/// Body for submitting an operation against an app or database.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperationRequest {
    #[serde(rename = "type")]
    pub operation_type: OperationType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub env: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container_size: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disk_size: Option<i64>,
}

impl OperationRequest {
    pub fn new(operation_type: OperationType) -> Self {
        Self {
            operation_type,
            env: None,
            container_size: None,
            disk_size: None,
        }
    }
}

/// Body for requesting an SSH portal certificate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SshPortalConnectionRequest {
    pub ssh_public_key: String,
}
