use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::config::ConsoleConfig;
use crate::errors::{ErrorResponse, ServiceError};
use crate::gateway::{AllocationGateway, IntakeGateway, VerificationGateway};
use crate::models::{
    AddLotRequest, AddLotResponse, AllocationRequest, AssignItemsResponse,
    AvailableItemsResponse, ItemHistoryResponse, LotSummary, MaterialType, ScanVerifyRequest,
    ScanVerifyResponse, TaskItemsResponse,
};
use crate::session::{LoginRequest, LoginResponse};

/// Plain `{message}` acknowledgement returned by mutating endpoints.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiMessage {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Serialize)]
struct PrintItemBody<'a> {
    task_id: &'a str,
}

#[derive(Serialize)]
struct PrintAllBody {
    show_printed: bool,
}

/// Typed client for the inventory REST API.
#[derive(Clone, Debug)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(config: &ConsoleConfig) -> Result<Self, ServiceError> {
        Self::with_base_url(&config.api_base_url, config.request_timeout())
    }

    pub fn with_base_url(base_url: &str, timeout: Duration) -> Result<Self, ServiceError> {
        let mut base_url = Url::parse(base_url.trim())?;
        // keep any path prefix when joining relative endpoints
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("lot-console/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ServiceError::ConfigError(e.to_string()))?;

        Ok(Self {
            http,
            base_url,
            token: None,
        })
    }

    /// Attaches the bearer token sent with every subsequent request.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    fn endpoint(&self, path: &str) -> Result<Url, ServiceError> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, ServiceError> {
        let url = self.endpoint(path)?;
        let builder = self.http.request(method, url);
        Ok(match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        })
    }

    async fn dispatch(&self, builder: RequestBuilder) -> Result<reqwest::Response, ServiceError> {
        let response = builder.send().await.map_err(|e| {
            warn!(error = %e, "Request failed before a response arrived");
            ServiceError::from(e)
        })?;

        let status = response.status();
        if status.is_success() {
            debug!(status = status.as_u16(), url = %response.url(), "Request succeeded");
            return Ok(response);
        }

        let body = response.json::<ErrorResponse>().await.ok();
        let err = ServiceError::from_response(status.as_u16(), body.as_ref());
        warn!(status = status.as_u16(), error = %err, "Request rejected by server");
        Err(err)
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
    ) -> Result<T, ServiceError> {
        let response = self.dispatch(builder).await?;
        Ok(response.json::<T>().await?)
    }

    async fn send_bytes(&self, builder: RequestBuilder) -> Result<Bytes, ServiceError> {
        let response = self.dispatch(builder).await?;
        Ok(response.bytes().await?)
    }

    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginResponse, ServiceError> {
        let body = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        self.send_json(self.request(Method::POST, "auth/login")?.json(&body))
            .await
    }

    #[instrument(skip(self))]
    pub async fn material_types(&self) -> Result<Vec<MaterialType>, ServiceError> {
        self.send_json(self.request(Method::GET, "api/material_types")?)
            .await
    }

    #[instrument(skip(self))]
    pub async fn lots(&self) -> Result<Vec<LotSummary>, ServiceError> {
        self.send_json(self.request(Method::GET, "api/lots")?).await
    }

    #[instrument(skip(self))]
    pub async fn task_items(&self, task_id: &str) -> Result<TaskItemsResponse, ServiceError> {
        let path = format!("api/tasks/{}/items", task_id);
        self.send_json(self.request(Method::GET, &path)?).await
    }

    #[instrument(skip(self))]
    pub async fn remove_task_item(
        &self,
        task_id: &str,
        item_id: &str,
    ) -> Result<ApiMessage, ServiceError> {
        let path = format!("api/tasks/{}/items/{}/remove", task_id, item_id);
        self.send_json(self.request(Method::DELETE, &path)?).await
    }

    /// Renders the label PDF for one item.
    #[instrument(skip(self))]
    pub async fn print_item_label(&self, item_id: &str, task_id: &str) -> Result<Bytes, ServiceError> {
        let path = format!("api/items/{}/print", item_id);
        let body = PrintItemBody { task_id };
        self.send_bytes(self.request(Method::POST, &path)?.json(&body))
            .await
    }

    /// Renders one PDF with the labels of every item in a task.
    #[instrument(skip(self))]
    pub async fn print_task_labels(
        &self,
        task_id: &str,
        show_printed: bool,
    ) -> Result<Bytes, ServiceError> {
        let path = format!("api/tasks/{}/print-all", task_id);
        let body = PrintAllBody { show_printed };
        self.send_bytes(self.request(Method::POST, &path)?.json(&body))
            .await
    }

    #[instrument(skip(self))]
    pub async fn item_history(&self, item_id: &str) -> Result<ItemHistoryResponse, ServiceError> {
        let path = format!("api/item/{}/history", item_id);
        self.send_json(self.request(Method::GET, &path)?).await
    }
}

#[async_trait]
impl IntakeGateway for ApiClient {
    #[instrument(skip(self, request), fields(material_type_id = %request.material_type_id))]
    async fn add_lot(&self, request: &AddLotRequest) -> Result<AddLotResponse, ServiceError> {
        self.send_json(self.request(Method::POST, "api/add_lot")?.json(request))
            .await
    }
}

#[async_trait]
impl AllocationGateway for ApiClient {
    #[instrument(skip(self))]
    async fn available_items(
        &self,
        task_id: &str,
        material_type_id: Option<&str>,
    ) -> Result<AvailableItemsResponse, ServiceError> {
        let path = format!("api/tasks/{}/items/available", task_id);
        let mut builder = self.request(Method::GET, &path)?;
        if let Some(material_type_id) = material_type_id {
            builder = builder.query(&[("material_type_id", material_type_id)]);
        }
        self.send_json(builder).await
    }

    #[instrument(skip(self, request), fields(assignments = request.assignments.len()))]
    async fn assign_items(
        &self,
        task_id: &str,
        request: &AllocationRequest,
    ) -> Result<AssignItemsResponse, ServiceError> {
        let path = format!("api/tasks/{}/items/assign", task_id);
        self.send_json(self.request(Method::POST, &path)?.json(request))
            .await
    }
}

#[async_trait]
impl VerificationGateway for ApiClient {
    #[instrument(skip(self))]
    async fn verify_scan(
        &self,
        request: &ScanVerifyRequest,
    ) -> Result<ScanVerifyResponse, ServiceError> {
        self.send_json(self.request(Method::POST, "api/scan_item_verify")?.json(request))
            .await
    }
}
