//! Platform REST API client with connection pooling.

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::api::transport::{Fetched, Transport};
use crate::api::wire::{
    AppCreateRequest, AppPayload, BackupPayload, ConfigurationPayload, DatabaseCreateRequest,
    DatabaseImagePayload, DatabasePayload, DiskPayload, EnvironmentPayload, HandleUpdateRequest,
    OperationPayload, OperationRequest, ServicePayload, SshPortalConnectionPayload,
    SshPortalConnectionRequest,
};
use crate::config::ClientConfig;
use crate::error::{DeployError, Result};

const HAL_JSON: &str = "application/hal+json";

/// [`Transport`] over HTTPS with a persistent connection pool.
pub struct HttpTransport {
    client: Client,
    root_url: String,
    token: String,
}

impl HttpTransport {
    /// Create a new transport from the given configuration.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = Client::builder()
            .pool_max_idle_per_host(5)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| DeployError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            root_url: config.api_root_url.trim_end_matches('/').to_string(),
            token: config.access_token.clone(),
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}{}", self.root_url, path))
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Accept", HAL_JSON)
    }

    /// GET a single resource; a 404 becomes [`Fetched::NotFound`].
    async fn fetch<T: DeserializeOwned>(&self, path: &str) -> Result<Fetched<T>> {
        debug!(path, "GET");
        let response = self.request(Method::GET, path).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(Fetched::NotFound);
        }
        let response = check_status(response).await?;
        Ok(Fetched::Found(parse_body(response).await?))
    }

    /// GET a HAL collection and return the items under `_embedded.<key>`.
    async fn fetch_list<T: DeserializeOwned>(&self, path: &str, key: &str) -> Result<Vec<T>> {
        debug!(path, "GET");
        let response = self.request(Method::GET, path).send().await?;
        let response = check_status(response).await?;
        let mut body: Value = parse_body(response).await?;

        match body
            .get_mut("_embedded")
            .and_then(|embedded| embedded.get_mut(key))
        {
            Some(Value::Null) | None => Ok(Vec::new()),
            Some(items) => Ok(serde_json::from_value(items.take())?),
        }
    }

    async fn send_json<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<Response> {
        debug!(%method, path, "submit");
        let response = self
            .request(method, path)
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await?;
        check_status(response).await
    }

    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let response = self.send_json(Method::POST, path, body).await?;
        parse_body(response).await
    }

    async fn put<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<()> {
        self.send_json(Method::PUT, path, body).await?;
        Ok(())
    }
}

/// Map a non-success status to the error taxonomy.
async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(classify(status, body))
}

fn classify(status: StatusCode, body: String) -> DeployError {
    match status {
        StatusCode::UNAUTHORIZED => DeployError::Authentication,
        _ => DeployError::Http {
            status: status.as_u16(),
            body: body.chars().take(300).collect(),
        },
    }
}

async fn parse_body<T: DeserializeOwned>(response: Response) -> Result<T> {
    let text = response.text().await?;
    serde_json::from_str(&text).map_err(|e| {
        DeployError::Serialization(format!(
            "{} | Raw: {}",
            e,
            text.chars().take(300).collect::<String>()
        ))
    })
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get_app(&self, id: i64) -> Result<Fetched<AppPayload>> {
        self.fetch(&format!("/apps/{}", id)).await
    }

    async fn list_apps(&self, environment_id: i64) -> Result<Vec<AppPayload>> {
        self.fetch_list(&format!("/accounts/{}/apps", environment_id), "apps")
            .await
    }

    async fn create_app(
        &self,
        environment_id: i64,
        request: &AppCreateRequest,
    ) -> Result<AppPayload> {
        self.post(&format!("/accounts/{}/apps", environment_id), request)
            .await
    }

    async fn update_app(&self, id: i64, request: &HandleUpdateRequest) -> Result<()> {
        self.put(&format!("/apps/{}", id), request).await
    }

    async fn create_app_operation(
        &self,
        app_id: i64,
        request: &OperationRequest,
    ) -> Result<OperationPayload> {
        self.post(&format!("/apps/{}/operations", app_id), request)
            .await
    }

    async fn get_database(&self, id: i64) -> Result<Fetched<DatabasePayload>> {
        self.fetch(&format!("/databases/{}", id)).await
    }

    async fn create_database(
        &self,
        environment_id: i64,
        request: &DatabaseCreateRequest,
    ) -> Result<DatabasePayload> {
        self.post(&format!("/accounts/{}/databases", environment_id), request)
            .await
    }

    async fn update_database(&self, id: i64, request: &HandleUpdateRequest) -> Result<()> {
        self.put(&format!("/databases/{}", id), request).await
    }

    async fn create_database_operation(
        &self,
        database_id: i64,
        request: &OperationRequest,
    ) -> Result<OperationPayload> {
        self.post(&format!("/databases/{}/operations", database_id), request)
            .await
    }

    async fn list_database_operations(
        &self,
        database_id: i64,
        page: u32,
    ) -> Result<Vec<OperationPayload>> {
        self.fetch_list(
            &format!("/databases/{}/operations?page={}", database_id, page),
            "operations",
        )
        .await
    }

    async fn list_backups(&self, database_id: i64) -> Result<Vec<BackupPayload>> {
        self.fetch_list(&format!("/databases/{}/backups", database_id), "backups")
            .await
    }

    async fn get_operation(&self, id: i64) -> Result<Fetched<OperationPayload>> {
        self.fetch(&format!("/operations/{}", id)).await
    }

    async fn create_ssh_portal_connection(
        &self,
        operation_id: i64,
        request: &SshPortalConnectionRequest,
    ) -> Result<SshPortalConnectionPayload> {
        self.post(
            &format!("/operations/{}/ssh_portal_connections", operation_id),
            request,
        )
        .await
    }

    async fn get_service(&self, id: i64) -> Result<Fetched<ServicePayload>> {
        self.fetch(&format!("/services/{}", id)).await
    }

    async fn get_disk(&self, id: i64) -> Result<Fetched<DiskPayload>> {
        self.fetch(&format!("/disks/{}", id)).await
    }

    async fn get_database_image(&self, id: i64) -> Result<Fetched<DatabaseImagePayload>> {
        self.fetch(&format!("/database_images/{}", id)).await
    }

    async fn get_configuration(&self, id: i64) -> Result<Fetched<ConfigurationPayload>> {
        self.fetch(&format!("/configurations/{}", id)).await
    }

    async fn get_environment(&self, id: i64) -> Result<Fetched<EnvironmentPayload>> {
        self.fetch(&format!("/accounts/{}", id)).await
    }
}
