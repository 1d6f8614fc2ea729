//! Service descriptor: the resource under management.
//!
//! The same type carries desired state (as read from configuration, with
//! backend-assigned fields unset) and current state (as read back from the
//! API). Serialized field names are the resource attribute names.

use chrono::{DateTime, Utc};
use clustermgr_api::{CreateServiceRequest, EventBrokerService, UpdateServiceRequest};
use serde::{Deserialize, Serialize};

pub use clustermgr_api::{LoginCredential as ServiceCredentials, ServiceStatus};

use crate::error::{ProviderError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceDescriptor {
    /// Backend-assigned identity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "serviceclass_id")]
    pub service_class_id: String,
    pub name: String,
    pub datacenter_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub msg_vpn_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_router_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_broker_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_spool_usage: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ServiceStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_time: Option<DateTime<Utc>>,
    /// Populated once the service is COMPLETED.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials: Option<ServiceCredentials>,
}

impl ServiceDescriptor {
    /// Desired state with only the required attributes set.
    pub fn new(
        name: impl Into<String>,
        service_class_id: impl Into<String>,
        datacenter_id: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            service_class_id: service_class_id.into(),
            name: name.into(),
            datacenter_id: datacenter_id.into(),
            msg_vpn_name: None,
            cluster_name: None,
            custom_router_name: None,
            event_broker_version: None,
            max_spool_usage: None,
            status: None,
            created_time: None,
            updated_time: None,
            credentials: None,
        }
    }

    /// The identity, or a validation error for a service that was never created.
    pub fn identity(&self) -> Result<&str> {
        self.id
            .as_deref()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| ProviderError::Validation("service has no identity".to_string()))
    }

    pub fn is_completed(&self) -> bool {
        self.status.is_some_and(|s| s.is_completed())
    }

    /// Check the attributes the backend requires for creation.
    pub fn validate(&self) -> Result<()> {
        self.to_create_request().validate()?;
        Ok(())
    }

    pub fn to_create_request(&self) -> CreateServiceRequest {
        CreateServiceRequest {
            name: self.name.clone(),
            service_class_id: self.service_class_id.clone(),
            datacenter_id: self.datacenter_id.clone(),
            msg_vpn_name: self.msg_vpn_name.clone(),
            event_broker_version: self.event_broker_version.clone(),
            custom_router_name: self.custom_router_name.clone(),
            cluster_name: self.cluster_name.clone(),
            max_spool_usage: self.max_spool_usage,
        }
    }

    /// Body for an in-place update: the mutable attributes only.
    pub fn to_update_request(&self) -> UpdateServiceRequest {
        UpdateServiceRequest {
            name: self.name.clone(),
            max_spool_usage: self.max_spool_usage,
        }
    }

    /// Adopt backend-filled values for optional attributes left unset.
    ///
    /// The backend picks defaults for an omitted message VPN, cluster name,
    /// router name and spool size, so an unset desired value means "whatever
    /// the service has". The broker version is left alone: a null desired
    /// version is handled by the immutability policy.
    pub fn with_computed_defaults(mut self, current: &ServiceDescriptor) -> Self {
        if self.msg_vpn_name.is_none() {
            self.msg_vpn_name = current.msg_vpn_name.clone();
        }
        if self.cluster_name.is_none() {
            self.cluster_name = current.cluster_name.clone();
        }
        if self.custom_router_name.is_none() {
            self.custom_router_name = current.custom_router_name.clone();
        }
        if self.max_spool_usage.is_none() {
            self.max_spool_usage = current.max_spool_usage;
        }
        self
    }
}

impl From<EventBrokerService> for ServiceDescriptor {
    fn from(svc: EventBrokerService) -> Self {
        let (msg_vpn_name, credentials) = match svc.broker.msg_vpns.into_iter().next() {
            Some(vpn) => (Some(vpn.msg_vpn_name), vpn.service_login_credential),
            None => (None, None),
        };
        let completed = svc.creation_state.is_completed();

        Self {
            id: Some(svc.id),
            service_class_id: svc.service_class_id,
            name: svc.name,
            datacenter_id: svc.datacenter_id,
            msg_vpn_name,
            cluster_name: svc.broker.cluster.name,
            custom_router_name: svc.broker.cluster.primary_router_name,
            event_broker_version: svc.event_broker_service_version,
            max_spool_usage: svc.broker.max_spool_usage,
            status: Some(svc.creation_state),
            created_time: Some(svc.created_time),
            updated_time: svc.updated_time,
            // Credentials are meaningless until provisioning completed.
            credentials: credentials.filter(|_| completed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clustermgr_api::{BrokerDetails, ClusterDetails, MsgVpnDetails};
    use serde_json::json;

    fn service(state: ServiceStatus) -> EventBrokerService {
        EventBrokerService {
            id: "svc-1".to_string(),
            name: "ocs-prov-test".to_string(),
            service_class_id: "ENTERPRISE_250_STANDALONE".to_string(),
            datacenter_id: "aks-germanywestcentral".to_string(),
            created_time: Utc::now(),
            updated_time: None,
            creation_state: state,
            event_broker_service_version: Some("10.8.1.152-7".to_string()),
            broker: BrokerDetails {
                cluster: ClusterDetails {
                    name: Some("cluster-a".to_string()),
                    primary_router_name: Some("router-a".to_string()),
                },
                msg_vpns: vec![MsgVpnDetails {
                    msg_vpn_name: "vpn-a".to_string(),
                    service_login_credential: Some(ServiceCredentials {
                        username: "u".to_string(),
                        password: "p".to_string(),
                    }),
                }],
                max_spool_usage: Some(20),
            },
        }
    }

    #[test]
    fn test_from_completed_service() {
        let desc = ServiceDescriptor::from(service(ServiceStatus::Completed));
        assert_eq!(desc.id.as_deref(), Some("svc-1"));
        assert_eq!(desc.msg_vpn_name.as_deref(), Some("vpn-a"));
        assert_eq!(desc.cluster_name.as_deref(), Some("cluster-a"));
        assert_eq!(desc.custom_router_name.as_deref(), Some("router-a"));
        assert_eq!(desc.event_broker_version.as_deref(), Some("10.8.1.152-7"));
        assert_eq!(desc.max_spool_usage, Some(20));
        assert!(desc.is_completed());
        assert_eq!(desc.credentials.unwrap().username, "u");
    }

    #[test]
    fn test_from_pending_service_drops_credentials() {
        let desc = ServiceDescriptor::from(service(ServiceStatus::Pending));
        assert!(!desc.is_completed());
        assert!(desc.credentials.is_none());
    }

    #[test]
    fn test_attribute_names() {
        let desired: ServiceDescriptor = serde_json::from_value(json!({
            "serviceclass_id": "ENTERPRISE_250_STANDALONE",
            "name": "ocs-prov-test",
            "datacenter_id": "aks-germanywestcentral",
            "max_spool_usage": 25
        }))
        .unwrap();
        assert_eq!(desired.service_class_id, "ENTERPRISE_250_STANDALONE");
        assert_eq!(desired.max_spool_usage, Some(25));
        assert!(desired.id.is_none());
        assert!(desired.status.is_none());

        let value = serde_json::to_value(&desired).unwrap();
        assert!(value.get("id").is_none());
        assert_eq!(value["serviceclass_id"], "ENTERPRISE_250_STANDALONE");
    }

    #[test]
    fn test_identity_required() {
        let desired = ServiceDescriptor::new("n", "c", "d");
        assert!(matches!(
            desired.identity(),
            Err(ProviderError::Validation(_))
        ));

        let current = ServiceDescriptor {
            id: Some("abc".to_string()),
            ..desired
        };
        assert_eq!(current.identity().unwrap(), "abc");
    }

    #[test]
    fn test_validate_required_fields() {
        assert!(ServiceDescriptor::new("n", "c", "d").validate().is_ok());
        assert!(matches!(
            ServiceDescriptor::new("n", "", "d").validate(),
            Err(ProviderError::Validation(_))
        ));
    }

    #[test]
    fn test_update_request_carries_mutable_fields_only() {
        let mut desired = ServiceDescriptor::new("renamed", "c", "d");
        desired.max_spool_usage = Some(30);
        desired.msg_vpn_name = Some("vpn".to_string());

        let req = desired.to_update_request();
        assert_eq!(req.name, "renamed");
        assert_eq!(req.max_spool_usage, Some(30));
    }

    #[test]
    fn test_computed_defaults_skip_version() {
        let current = ServiceDescriptor::from(service(ServiceStatus::Completed));
        let desired = ServiceDescriptor::new("ocs-prov-test", "c", "d").with_computed_defaults(&current);

        assert_eq!(desired.msg_vpn_name.as_deref(), Some("vpn-a"));
        assert_eq!(desired.cluster_name.as_deref(), Some("cluster-a"));
        assert_eq!(desired.max_spool_usage, Some(20));
        assert!(desired.event_broker_version.is_none());
    }
}
