//! Request and response bodies.
//!
//! Field names follow the MissionControl JSON schema (camelCase). Every
//! response is wrapped in an [`Envelope`].

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// Envelope
// =============================================================================

/// Response envelope: `{"data": {...}, "meta": {"additionalProp": {}}}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub data: T,
    #[serde(default)]
    pub meta: Meta,
}

impl<T> Envelope<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            meta: Meta::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Meta {
    #[serde(rename = "additionalProp", default)]
    pub additional_prop: serde_json::Map<String, serde_json::Value>,
}

/// Error body returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
    pub code: u32,
}

// =============================================================================
// Status
// =============================================================================

/// Provisioning state of a service (`creationState` on the wire).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServiceStatus {
    Pending,
    Completed,
    Failed,
    /// Any state this client does not know about.
    #[serde(other)]
    Unknown,
}

impl ServiceStatus {
    pub fn is_completed(&self) -> bool {
        matches!(self, ServiceStatus::Completed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceStatus::Pending => "PENDING",
            ServiceStatus::Completed => "COMPLETED",
            ServiceStatus::Failed => "FAILED",
            ServiceStatus::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Requests
// =============================================================================

/// Body of `POST /eventBrokerServices`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateServiceRequest {
    pub name: String,
    pub service_class_id: String,
    pub datacenter_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub msg_vpn_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_broker_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_router_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_spool_usage: Option<i32>,
}

/// Body of `PATCH /eventBrokerServices/{id}`. Only mutable attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateServiceRequest {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_spool_usage: Option<i32>,
}

// =============================================================================
// Responses
// =============================================================================

/// Operation accepted by `POST` (HTTP 202).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceOperation {
    /// Identifier of the operation, not of the service.
    pub id: String,
    pub resource_id: String,
    pub name: String,
    pub created_time: DateTime<Utc>,
    pub creation_state: ServiceStatus,
}

/// Operation accepted by `DELETE` (HTTP 202).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteOperation {
    pub id: String,
    pub resource_id: String,
    pub name: String,
    pub created_time: DateTime<Utc>,
    pub status: ServiceStatus,
}

/// Full service representation returned by `GET` and `PATCH`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventBrokerService {
    pub id: String,
    pub name: String,
    pub service_class_id: String,
    pub datacenter_id: String,
    pub created_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_time: Option<DateTime<Utc>>,
    pub creation_state: ServiceStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_broker_service_version: Option<String>,
    #[serde(default)]
    pub broker: BrokerDetails,
}

impl EventBrokerService {
    /// The first message VPN; the API provisions exactly one.
    pub fn primary_msg_vpn(&self) -> Option<&MsgVpnDetails> {
        self.broker.msg_vpns.first()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrokerDetails {
    #[serde(default)]
    pub cluster: ClusterDetails,
    #[serde(default)]
    pub msg_vpns: Vec<MsgVpnDetails>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_spool_usage: Option<i32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_router_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MsgVpnDetails {
    pub msg_vpn_name: String,
    /// Only rendered once the service is `COMPLETED`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_login_credential: Option<LoginCredential>,
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginCredential {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for LoginCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginCredential")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}
