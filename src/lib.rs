//! Control-plane client for Aptible Deploy.
//!
//! Every mutating call against the platform enqueues an *operation*. The
//! flows in [`DeployService`] submit it, poll it until the platform reports a
//! terminal status and then re-fetch the resource, following the HAL links
//! in its payload to assemble the full view (environment, service, disk,
//! image, configuration).
//!
//! A resource the platform answers 404 for is returned with `deleted: true`
//! rather than as an error.
//!
//! # Example
//!
//! ```no_run
//! use aptible_control::{DatabaseCreateAttrs, DeployService};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let service = DeployService::from_env()?;
//!
//! let db = service
//!     .create_database(
//!         42,
//!         DatabaseCreateAttrs {
//!             handle: "db1".to_string(),
//!             database_type: "postgresql".to_string(),
//!             container_size: 1024,
//!             disk_size: 20,
//!             database_image_id: None,
//!         },
//!     )
//!     .await?;
//! println!("{} is reachable at {}", db.handle, db.default_connection);
//!
//! if !service.delete_database(db.id).await? {
//!     eprintln!("deprovision failed on the platform");
//! }
//! # Ok(())
//! # }
//! ```

pub mod api;
mod config;
mod error;
pub mod links;
mod models;
mod poller;
mod service;

pub use api::{Fetched, HttpTransport, Transport};
pub use config::ClientConfig;
pub use error::{DeployError, Result};
pub use links::{extract_id, LinkResolver, ResourceKind};
pub use models::{
    App, AppUpdates, Backup, Configuration, Database, DatabaseCreateAttrs, DatabaseImage,
    DatabaseUpdates, Disk, Environment, Operation, OperationResource, OperationStatus,
    OperationType, Service, SshPortalConnection, DOCKER_IMAGE_ENV_KEY, MIN_CONTAINER_SIZE_MB,
    MIN_DISK_SIZE_GB,
};
pub use poller::{OperationPoller, PollPolicy};
pub use service::DeployService;
