//! Resolution of HAL relationship links.
//!
//! Payloads reference related resources by URL. [`extract_id`] turns such a
//! URL into the numeric ID it ends with; [`LinkResolver`] additionally fetches
//! the referenced resource and maps it into an entity. Resolution never
//! retries.

use url::Url;

use crate::api::wire::{
    ConfigurationPayload, DatabaseImagePayload, DiskPayload, EnvironmentPayload, Link,
    ServicePayload,
};
use crate::api::{Fetched, Transport};
use crate::error::{DeployError, Result};
use crate::models::{Configuration, DatabaseImage, Disk, Environment, Service};

/// Parse the trailing numeric path segment of an href.
///
/// Accepts absolute URLs and bare paths. A trailing slash, query string or
/// fragment is ignored.
pub fn extract_id(href: &str) -> Result<i64> {
    let (_, id) = split_href(href)?;
    Ok(id)
}

fn split_href(href: &str) -> Result<(Option<String>, i64)> {
    let url = match Url::parse(href) {
        Ok(url) => url,
        Err(url::ParseError::RelativeUrlWithoutBase) => Url::parse("http://localhost/")
            .and_then(|base| base.join(href))
            .map_err(|_| DeployError::MalformedLink(href.to_string()))?,
        Err(_) => return Err(DeployError::MalformedLink(href.to_string())),
    };

    let segments: Vec<&str> = url
        .path_segments()
        .map(|segments| segments.filter(|s| !s.is_empty()).collect())
        .unwrap_or_default();

    let (last, rest) = segments
        .split_last()
        .ok_or_else(|| DeployError::MalformedLink(href.to_string()))?;

    if last.is_empty() || !last.bytes().all(|b| b.is_ascii_digit()) {
        return Err(DeployError::MalformedLink(href.to_string()));
    }
    let id = last
        .parse()
        .map_err(|_| DeployError::MalformedLink(href.to_string()))?;

    Ok((rest.last().map(|segment| segment.to_string()), id))
}

/// Resource collection a link points into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceKind {
    App,
    Database,
    Environment,
    Service,
    Disk,
    DatabaseImage,
    Configuration,
    Operation,
    Stack,
    Backup,
    Other(String),
}

impl ResourceKind {
    fn from_collection(collection: &str) -> Self {
        match collection {
            "apps" => ResourceKind::App,
            "databases" => ResourceKind::Database,
            "accounts" => ResourceKind::Environment,
            "services" => ResourceKind::Service,
            "disks" => ResourceKind::Disk,
            "database_images" => ResourceKind::DatabaseImage,
            "configurations" => ResourceKind::Configuration,
            "operations" => ResourceKind::Operation,
            "stacks" => ResourceKind::Stack,
            "backups" => ResourceKind::Backup,
            other => ResourceKind::Other(other.to_string()),
        }
    }

    /// Collection segment as it appears in hrefs.
    pub fn collection(&self) -> &str {
        match self {
            ResourceKind::App => "apps",
            ResourceKind::Database => "databases",
            ResourceKind::Environment => "accounts",
            ResourceKind::Service => "services",
            ResourceKind::Disk => "disks",
            ResourceKind::DatabaseImage => "database_images",
            ResourceKind::Configuration => "configurations",
            ResourceKind::Operation => "operations",
            ResourceKind::Stack => "stacks",
            ResourceKind::Backup => "backups",
            ResourceKind::Other(collection) => collection,
        }
    }

    /// Classify an href by the collection segment preceding its ID.
    pub fn from_href(href: &str) -> Result<(ResourceKind, i64)> {
        let (collection, id) = split_href(href)?;
        let kind = collection
            .as_deref()
            .map(ResourceKind::from_collection)
            .unwrap_or_else(|| ResourceKind::Other(String::new()));
        Ok((kind, id))
    }
}

/// Require a link the payload must carry.
pub(crate) fn require<'a>(
    link: Option<&'a Link>,
    resource: &'static str,
    field: &'static str,
) -> Result<&'a Link> {
    link.ok_or(DeployError::IncompleteResource { resource, field })
}

/// Dereferences links into typed sub-resources through a [`Transport`].
pub struct LinkResolver<'a, T: ?Sized> {
    transport: &'a T,
}

impl<'a, T: Transport + ?Sized> LinkResolver<'a, T> {
    pub fn new(transport: &'a T) -> Self {
        Self { transport }
    }

    /// Resolve the service backing the resource `resource_id` in `environment_id`.
    pub async fn resolve_service(
        &self,
        href: &str,
        resource_id: i64,
        environment_id: i64,
    ) -> Result<Service> {
        let id = extract_id(href)?;
        let payload = wrap(href, self.transport.get_service(id).await, "service", id)?;
        service_from_payload(payload, resource_id, environment_id)
            .map_err(|e| wrap_error(href, e))
    }

    pub async fn resolve_disk(&self, href: &str) -> Result<Disk> {
        let id = extract_id(href)?;
        let payload: DiskPayload = wrap(href, self.transport.get_disk(id).await, "disk", id)?;
        let size = payload.size.ok_or_else(|| {
            wrap_error(
                href,
                DeployError::IncompleteResource {
                    resource: "disk",
                    field: "size",
                },
            )
        })?;

        Ok(Disk {
            id: payload.id.unwrap_or(id),
            size,
            filesystem: payload.filesystem,
            provisioned_iops: payload.provisioned_iops,
        })
    }

    pub async fn resolve_image(&self, href: &str) -> Result<DatabaseImage> {
        let id = extract_id(href)?;
        let payload: DatabaseImagePayload = wrap(
            href,
            self.transport.get_database_image(id).await,
            "database image",
            id,
        )?;

        Ok(DatabaseImage {
            id: payload.id.unwrap_or(id),
            database_type: payload.database_type,
            version: payload.version,
            docker_repo: payload.docker_repo,
            description: payload.description,
        })
    }

    pub async fn resolve_configuration(&self, href: &str) -> Result<Configuration> {
        let id = extract_id(href)?;
        let payload: ConfigurationPayload = wrap(
            href,
            self.transport.get_configuration(id).await,
            "configuration",
            id,
        )?;

        let env = payload
            .env
            .into_iter()
            .filter_map(|(key, value)| match value {
                serde_json::Value::Null => None,
                serde_json::Value::String(s) => Some((key, s)),
                other => Some((key, other.to_string())),
            })
            .collect();

        Ok(Configuration {
            id: payload.id.unwrap_or(id),
            env,
        })
    }
}

fn wrap<P>(href: &str, fetched: Result<Fetched<P>>, resource: &'static str, id: i64) -> Result<P> {
    match fetched {
        Ok(Fetched::Found(payload)) => Ok(payload),
        Ok(Fetched::NotFound) => Err(wrap_error(href, DeployError::NotFound { resource, id })),
        Err(err) => Err(wrap_error(href, err)),
    }
}

fn wrap_error(href: &str, err: DeployError) -> DeployError {
    DeployError::LinkResolution {
        href: href.to_string(),
        source: Box::new(err),
    }
}

/// Map a service payload; `container_memory_limit_mb` is mandatory.
pub(crate) fn service_from_payload(
    payload: ServicePayload,
    resource_id: i64,
    environment_id: i64,
) -> Result<Service> {
    let id = payload.id.ok_or(DeployError::IncompleteResource {
        resource: "service",
        field: "id",
    })?;
    let container_memory_limit_mb =
        payload
            .container_memory_limit_mb
            .ok_or(DeployError::IncompleteResource {
                resource: "service",
                field: "container_memory_limit_mb",
            })?;

    Ok(Service {
        id,
        handle: payload.handle,
        container_count: payload.container_count.unwrap_or_default(),
        container_profile: payload.instance_class,
        container_memory_limit_mb,
        process_type: payload.process_type,
        command: payload.command,
        resource_type: payload.resource_type,
        resource_id,
        environment_id,
        created_at: payload.created_at,
    })
}

pub(crate) fn environment_from_payload(id: i64, payload: EnvironmentPayload) -> Result<Environment> {
    let handle = payload.handle.ok_or(DeployError::IncompleteResource {
        resource: "environment",
        field: "handle",
    })?;
    let stack = require(payload.links.stack.as_ref(), "environment", "_links.stack")?;

    Ok(Environment {
        id: payload.id.unwrap_or(id),
        handle,
        stack_id: extract_id(&stack.href)?,
    })
}
