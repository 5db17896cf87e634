//! Scripted in-memory transport shared by the integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use aptible_control::api::wire::{
    AppCreateRequest, AppPayload, BackupPayload, ConfigurationPayload, DatabaseCreateRequest,
    DatabaseImagePayload, DatabasePayload, DiskPayload, EnvironmentPayload, HandleUpdateRequest,
    OperationPayload, OperationRequest, ServicePayload, SshPortalConnectionPayload,
    SshPortalConnectionRequest,
};
use aptible_control::{DeployError, DeployService, Fetched, PollPolicy, Result, Transport};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};

pub const API: &str = "https://api.aptible.com";

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Transport answering from canned JSON keyed by request path.
///
/// Fetch keys look like `"GET /databases/7"`, submit keys like
/// `"POST /databases/7/operations"`. Unknown fetch paths answer 404.
#[derive(Default)]
pub struct MockTransport {
    resources: Mutex<HashMap<String, Value>>,
    failures: Mutex<HashMap<String, u16>>,
    responses: Mutex<HashMap<String, Value>>,
    statuses: Mutex<HashMap<i64, VecDeque<&'static str>>>,
    calls: Mutex<Vec<String>>,
    submissions: Mutex<Vec<(String, Value)>>,
    operation_delay: Duration,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` for `GET <path>`.
    pub fn with_resource(self, path: &str, body: Value) -> Self {
        self.resources
            .lock()
            .unwrap()
            .insert(format!("GET {}", path), body);
        self
    }

    /// Fail `key` (e.g. `"GET /apps/1"`) with the given HTTP status.
    pub fn with_failure(self, key: &str, status: u16) -> Self {
        self.failures.lock().unwrap().insert(key.to_string(), status);
        self
    }

    /// Answer the submit `key` (e.g. `"POST /accounts/42/databases"`) with `body`.
    pub fn with_response(self, key: &str, body: Value) -> Self {
        self.responses
            .lock()
            .unwrap()
            .insert(key.to_string(), body);
        self
    }

    /// Script the statuses returned by successive `GET /operations/<id>`.
    /// The last status repeats forever.
    pub fn with_statuses(self, operation_id: i64, statuses: &[&'static str]) -> Self {
        self.statuses
            .lock()
            .unwrap()
            .insert(operation_id, statuses.iter().copied().collect());
        self
    }

    /// Delay every `GET /operations/<id>` by `delay`.
    pub fn with_operation_delay(mut self, delay: Duration) -> Self {
        self.operation_delay = delay;
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, key: &str) -> usize {
        self.calls().iter().filter(|call| call.as_str() == key).count()
    }

    /// Body of the last submit sent to `key`.
    pub fn submitted(&self, key: &str) -> Option<Value> {
        self.submissions
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, body)| body.clone())
    }

    fn record(&self, key: &str) -> Result<()> {
        self.calls.lock().unwrap().push(key.to_string());
        match self.failures.lock().unwrap().get(key) {
            Some(401) => Err(DeployError::Authentication),
            Some(status) => Err(DeployError::Http {
                status: *status,
                body: "scripted failure".to_string(),
            }),
            None => Ok(()),
        }
    }

    fn fetch<T: DeserializeOwned>(&self, path: String) -> Result<Fetched<T>> {
        let key = format!("GET {}", path);
        self.record(&key)?;
        match self.resources.lock().unwrap().get(&key) {
            Some(body) => Ok(Fetched::Found(serde_json::from_value(body.clone())?)),
            None => Ok(Fetched::NotFound),
        }
    }

    fn fetch_list<T: DeserializeOwned>(&self, path: String) -> Result<Vec<T>> {
        match self.fetch::<Vec<T>>(path.clone())? {
            Fetched::Found(items) => Ok(items),
            Fetched::NotFound => Err(DeployError::Http {
                status: 404,
                body: path,
            }),
        }
    }

    fn submit<B: Serialize, T: DeserializeOwned>(&self, key: String, body: &B) -> Result<T> {
        self.record(&key)?;
        self.submissions
            .lock()
            .unwrap()
            .push((key.clone(), serde_json::to_value(body)?));
        match self.responses.lock().unwrap().get(&key) {
            Some(body) => Ok(serde_json::from_value(body.clone())?),
            None => Err(DeployError::Http {
                status: 500,
                body: format!("no scripted response for {}", key),
            }),
        }
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn get_app(&self, id: i64) -> Result<Fetched<AppPayload>> {
        self.fetch(format!("/apps/{}", id))
    }

    async fn list_apps(&self, environment_id: i64) -> Result<Vec<AppPayload>> {
        self.fetch_list(format!("/accounts/{}/apps", environment_id))
    }

    async fn create_app(
        &self,
        environment_id: i64,
        request: &AppCreateRequest,
    ) -> Result<AppPayload> {
        self.submit(format!("POST /accounts/{}/apps", environment_id), request)
    }

    async fn update_app(&self, id: i64, request: &HandleUpdateRequest) -> Result<()> {
        self.record(&format!("PUT /apps/{}", id))?;
        self.submissions
            .lock()
            .unwrap()
            .push((format!("PUT /apps/{}", id), serde_json::to_value(request)?));
        Ok(())
    }

    async fn create_app_operation(
        &self,
        app_id: i64,
        request: &OperationRequest,
    ) -> Result<OperationPayload> {
        self.submit(format!("POST /apps/{}/operations", app_id), request)
    }

    async fn get_database(&self, id: i64) -> Result<Fetched<DatabasePayload>> {
        self.fetch(format!("/databases/{}", id))
    }

    async fn create_database(
        &self,
        environment_id: i64,
        request: &DatabaseCreateRequest,
    ) -> Result<DatabasePayload> {
        self.submit(
            format!("POST /accounts/{}/databases", environment_id),
            request,
        )
    }

    async fn update_database(&self, id: i64, request: &HandleUpdateRequest) -> Result<()> {
        self.record(&format!("PUT /databases/{}", id))?;
        self.submissions.lock().unwrap().push((
            format!("PUT /databases/{}", id),
            serde_json::to_value(request)?,
        ));
        Ok(())
    }

    async fn create_database_operation(
        &self,
        database_id: i64,
        request: &OperationRequest,
    ) -> Result<OperationPayload> {
        self.submit(
            format!("POST /databases/{}/operations", database_id),
            request,
        )
    }

    async fn list_database_operations(
        &self,
        database_id: i64,
        page: u32,
    ) -> Result<Vec<OperationPayload>> {
        self.fetch_list(format!(
            "/databases/{}/operations?page={}",
            database_id, page
        ))
    }

    async fn list_backups(&self, database_id: i64) -> Result<Vec<BackupPayload>> {
        self.fetch_list(format!("/databases/{}/backups", database_id))
    }

    async fn get_operation(&self, id: i64) -> Result<Fetched<OperationPayload>> {
        if !self.operation_delay.is_zero() {
            tokio::time::sleep(self.operation_delay).await;
        }
        let scripted = {
            let mut statuses = self.statuses.lock().unwrap();
            statuses.get_mut(&id).map(|queue| {
                if queue.len() > 1 {
                    queue.pop_front().unwrap_or("running")
                } else {
                    queue.front().copied().unwrap_or("running")
                }
            })
        };

        match scripted {
            Some(status) => {
                self.record(&format!("GET /operations/{}", id))?;
                Ok(Fetched::Found(serde_json::from_value(json!({
                    "id": id,
                    "type": "provision",
                    "status": status,
                }))?))
            }
            None => self.fetch(format!("/operations/{}", id)),
        }
    }

    async fn create_ssh_portal_connection(
        &self,
        operation_id: i64,
        request: &SshPortalConnectionRequest,
    ) -> Result<SshPortalConnectionPayload> {
        self.submit(
            format!("POST /operations/{}/ssh_portal_connections", operation_id),
            request,
        )
    }

    async fn get_service(&self, id: i64) -> Result<Fetched<ServicePayload>> {
        self.fetch(format!("/services/{}", id))
    }

    async fn get_disk(&self, id: i64) -> Result<Fetched<DiskPayload>> {
        self.fetch(format!("/disks/{}", id))
    }

    async fn get_database_image(&self, id: i64) -> Result<Fetched<DatabaseImagePayload>> {
        self.fetch(format!("/database_images/{}", id))
    }

    async fn get_configuration(&self, id: i64) -> Result<Fetched<ConfigurationPayload>> {
        self.fetch(format!("/configurations/{}", id))
    }

    async fn get_environment(&self, id: i64) -> Result<Fetched<EnvironmentPayload>> {
        self.fetch(format!("/accounts/{}", id))
    }
}

/// Service over `transport` that polls without delay.
pub fn service(
    transport: MockTransport,
    max_attempts: u32,
) -> (DeployService<MockTransport>, Arc<MockTransport>) {
    let transport = Arc::new(transport);
    let service = DeployService::new(
        transport.clone(),
        PollPolicy::new(Duration::ZERO, max_attempts),
    );
    (service, transport)
}

pub fn link(path: &str) -> Value {
    json!({ "href": format!("{}{}", API, path) })
}

/// Database payload linking to environment 42, service 11 and disk 12.
pub fn database_json(id: i64, handle: &str) -> Value {
    json!({
        "id": id,
        "handle": handle,
        "type": "postgresql",
        "connection_url": format!("postgresql://aptible:secret@{}.aptible.in:5432/db", handle),
        "_links": {
            "account": link("/accounts/42"),
            "service": link("/services/11"),
            "disk": link("/disks/12"),
        },
        "_embedded": {
            "database_credentials": [
                { "connection_url": format!("postgresql://aptible:secret@{}.aptible.in:5432/db", handle), "type": "postgresql", "default": true },
                null,
            ]
        }
    })
}

pub fn service_json(id: i64, memory_mb: i64) -> Value {
    json!({
        "id": id,
        "handle": "db1",
        "container_count": 1,
        "instance_class": "m5",
        "container_memory_limit_mb": memory_mb,
        "process_type": "database",
    })
}

pub fn disk_json(id: i64, size: i64) -> Value {
    json!({ "id": id, "size": size, "filesystem": "ext4" })
}

/// Transport serving database `id` and its service and disk.
pub fn with_database(transport: MockTransport, id: i64, handle: &str) -> MockTransport {
    transport
        .with_resource(&format!("/databases/{}", id), database_json(id, handle))
        .with_resource("/services/11", service_json(11, 1024))
        .with_resource("/disks/12", disk_json(12, 20))
}

pub fn app_json(id: i64, handle: &str) -> Value {
    json!({
        "id": id,
        "handle": handle,
        "git_repo": format!("git@beta.aptible.com:env/{}.git", handle),
        "_links": {
            "account": link("/accounts/42"),
        },
        "_embedded": {
            "services": [
                {
                    "id": 31,
                    "handle": "web",
                    "container_count": 2,
                    "instance_class": "m5",
                    "container_memory_limit_mb": 512,
                    "process_type": "web",
                    "command": "bundle exec puma",
                    "resource_type": "App",
                    "created_at": "2024-03-01T12:00:00Z"
                }
            ]
        }
    })
}
