//! Wire schema for the MissionControl event broker service API.
//!
//! Shared by the provider's HTTP client and the fake server so both sides
//! agree on request bodies, the response envelope and status values.

pub mod types;
pub mod validation;

pub use types::{
    ApiError, BrokerDetails, ClusterDetails, CreateServiceRequest, DeleteOperation, Envelope,
    EventBrokerService, LoginCredential, Meta, MsgVpnDetails, ServiceOperation, ServiceStatus,
    UpdateServiceRequest,
};
pub use validation::SchemaError;

/// Collection path for event broker services.
pub const SERVICES_PATH: &str = "/api/v2/missionControl/eventBrokerServices";

/// Path of a single event broker service.
pub fn service_path(id: &str) -> String {
    format!("{}/{}", SERVICES_PATH, id)
}
