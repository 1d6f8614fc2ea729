//! Client for the MissionControl event broker service API.

use std::time::Duration;

use async_trait::async_trait;
use clustermgr_api::{ApiError, Envelope, EventBrokerService, SERVICES_PATH, ServiceOperation};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::ProviderConfig;
use crate::error::{ProviderError, Result};
use crate::model::{ServiceDescriptor, ServiceStatus};

/// Identity and initial status of a freshly created service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedService {
    pub id: String,
    pub status: ServiceStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    /// The service did not exist. Treated as success by callers.
    AlreadyGone,
}

/// The remote calls the reconciler needs.
#[async_trait]
pub trait ServiceClient: Send + Sync {
    /// Submit a create request. Returns as soon as the backend accepted it.
    async fn create(&self, desired: &ServiceDescriptor) -> Result<CreatedService>;

    /// Fetch the full representation, or `None` if the service does not exist.
    async fn get(&self, id: &str) -> Result<Option<ServiceDescriptor>>;

    /// Apply the mutable attributes of `desired` in place.
    async fn update(&self, id: &str, desired: &ServiceDescriptor) -> Result<ServiceStatus>;

    async fn delete(&self, id: &str) -> Result<DeleteOutcome>;
}

/// Status carried by update responses. Tolerates both a full service and a
/// bare operation record.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StateAck {
    #[serde(default)]
    creation_state: Option<ServiceStatus>,
}

/// `ServiceClient` over HTTP.
#[derive(Clone)]
pub struct HttpServiceClient {
    http: reqwest::Client,
    base_url: String,
    bearer_token: Option<String>,
}

impl std::fmt::Debug for HttpServiceClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpServiceClient")
            .field("base_url", &self.base_url)
            .field("bearer_token", &self.bearer_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl HttpServiceClient {
    pub fn new(host: &str, bearer_token: Option<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(60))
            .build()?;

        Ok(Self {
            http,
            base_url: normalize_base_url(host)?,
            bearer_token: bearer_token.filter(|t| !t.is_empty()),
        })
    }

    pub fn from_config(config: &ProviderConfig) -> Result<Self> {
        Self::new(&config.host, config.bearer_token.clone())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let req = self
            .http
            .request(method, format!("{}{}", self.base_url, path));
        match &self.bearer_token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    fn service_url(id: &str) -> Result<String> {
        if id.is_empty() {
            return Err(ProviderError::Validation(
                "service identity must not be empty".to_string(),
            ));
        }
        Ok(clustermgr_api::service_path(id))
    }
}

/// Accept `host`, `host:port` or a full URL. Plain hosts default to https.
fn normalize_base_url(host: &str) -> Result<String> {
    let host = host.trim().trim_end_matches('/');
    if host.is_empty() {
        return Err(ProviderError::Config("host must not be empty".to_string()));
    }
    if host.contains("://") {
        Ok(host.to_string())
    } else {
        Ok(format!("https://{}", host))
    }
}

/// Turn a non-success response into the matching error.
async fn error_for(response: Response) -> ProviderError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ApiError>(&body)
        .map(|e| e.error)
        .unwrap_or_else(|_| {
            if body.is_empty() {
                status.to_string()
            } else {
                body
            }
        });

    match status {
        StatusCode::NOT_FOUND => ProviderError::NotFound(message),
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
            ProviderError::Validation(message)
        }
        _ => ProviderError::transport(Some(status.as_u16()), message),
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    if !response.status().is_success() {
        return Err(error_for(response).await);
    }
    let status = response.status().as_u16();
    let envelope: Envelope<T> = response.json().await.map_err(|e| {
        ProviderError::transport(Some(status), format!("invalid response body: {}", e))
    })?;
    Ok(envelope.data)
}

#[async_trait]
impl ServiceClient for HttpServiceClient {
    async fn create(&self, desired: &ServiceDescriptor) -> Result<CreatedService> {
        let body = desired.to_create_request();
        debug!(name = %body.name, "POST {}", SERVICES_PATH);

        let response = self
            .request(Method::POST, SERVICES_PATH)
            .json(&body)
            .send()
            .await?;
        let op: ServiceOperation = decode(response).await?;

        Ok(CreatedService {
            id: op.resource_id,
            status: op.creation_state,
        })
    }

    async fn get(&self, id: &str) -> Result<Option<ServiceDescriptor>> {
        let path = Self::service_url(id)?;
        debug!(id = %id, "GET {}", path);

        let response = self.request(Method::GET, &path).send().await?;
        match decode::<EventBrokerService>(response).await {
            Ok(svc) => Ok(Some(svc.into())),
            Err(ProviderError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn update(&self, id: &str, desired: &ServiceDescriptor) -> Result<ServiceStatus> {
        let path = Self::service_url(id)?;
        debug!(id = %id, "PATCH {}", path);

        let response = self
            .request(Method::PATCH, &path)
            .json(&desired.to_update_request())
            .send()
            .await?;
        let ack: StateAck = decode(response).await?;

        Ok(ack.creation_state.unwrap_or(ServiceStatus::Pending))
    }

    async fn delete(&self, id: &str) -> Result<DeleteOutcome> {
        let path = Self::service_url(id)?;
        debug!(id = %id, "DELETE {}", path);

        let response = self.request(Method::DELETE, &path).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(DeleteOutcome::AlreadyGone);
        }
        if !response.status().is_success() {
            return Err(error_for(response).await);
        }
        Ok(DeleteOutcome::Deleted)
    }
}
