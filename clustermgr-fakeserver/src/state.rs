//! In-memory service store.
//!
//! Each record runs a two-state machine: PENDING after create or update,
//! COMPLETED once a read observes that the completion delay has passed.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use clustermgr_api::{
    BrokerDetails, ClusterDetails, CreateServiceRequest, DeleteOperation, EventBrokerService,
    LoginCredential, MsgVpnDetails, ServiceOperation, ServiceStatus, UpdateServiceRequest,
};
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

/// Time a service stays PENDING after create or update.
pub const DEFAULT_COMPLETION_DELAY: Duration = Duration::from_secs(5);

const DEFAULT_CLUSTER_NAME: &str = "test-cluster1";
const DEFAULT_MSG_VPN_NAME: &str = "test-vpn1";
const DEFAULT_BROKER_VERSION: &str = "1.0.0";
const DEFAULT_ROUTER_NAME: &str = "test-router1";
const DEFAULT_MAX_SPOOL_USAGE: i32 = 20;

/// Fake server settings.
#[derive(Debug, Clone)]
pub struct FakeServerConfig {
    pub completion_delay: Duration,
    /// When set, requests must carry `Authorization: Bearer <token>`.
    pub bearer_token: Option<String>,
    pub credentials: LoginCredential,
}

impl Default for FakeServerConfig {
    fn default() -> Self {
        Self {
            completion_delay: DEFAULT_COMPLETION_DELAY,
            bearer_token: None,
            credentials: LoginCredential {
                username: "client-user".to_string(),
                password: "client-passwd".to_string(),
            },
        }
    }
}

/// Stored state of one event broker service.
#[derive(Debug, Clone)]
pub struct ServiceRecord {
    pub id: String,
    pub name: String,
    pub service_class_id: String,
    pub datacenter_id: String,
    pub state: ServiceStatus,
    pub msg_vpn_name: String,
    pub cluster_name: String,
    pub custom_router_name: String,
    pub event_broker_version: String,
    pub max_spool_usage: i32,
    pub created: DateTime<Utc>,
    pub updated: Option<DateTime<Utc>>,
    pub credentials: LoginCredential,
    /// Start of the current PENDING phase.
    pending_since: Instant,
}

impl ServiceRecord {
    fn new(req: CreateServiceRequest, credentials: LoginCredential) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: req.name,
            service_class_id: req.service_class_id,
            datacenter_id: req.datacenter_id,
            state: ServiceStatus::Pending,
            msg_vpn_name: or_default(req.msg_vpn_name, DEFAULT_MSG_VPN_NAME),
            cluster_name: or_default(req.cluster_name, DEFAULT_CLUSTER_NAME),
            custom_router_name: or_default(req.custom_router_name, DEFAULT_ROUTER_NAME),
            event_broker_version: or_default(req.event_broker_version, DEFAULT_BROKER_VERSION),
            max_spool_usage: req.max_spool_usage.unwrap_or(DEFAULT_MAX_SPOOL_USAGE),
            created: Utc::now(),
            updated: None,
            credentials,
            pending_since: Instant::now(),
        }
    }

    /// Complete provisioning if the record has been pending long enough.
    fn refresh(&mut self, completion_delay: Duration) -> bool {
        if self.state == ServiceStatus::Pending && self.pending_since.elapsed() > completion_delay
        {
            self.state = ServiceStatus::Completed;
            return true;
        }
        false
    }

    fn apply_update(&mut self, req: UpdateServiceRequest) {
        self.name = req.name;
        if let Some(spool) = req.max_spool_usage {
            self.max_spool_usage = spool;
        }
        self.state = ServiceStatus::Pending;
        self.updated = Some(Utc::now());
        self.pending_since = Instant::now();
    }

    /// Full representation. Credentials are only rendered once COMPLETED.
    pub fn to_service(&self) -> EventBrokerService {
        let service_login_credential = self
            .state
            .is_completed()
            .then(|| self.credentials.clone());

        EventBrokerService {
            id: self.id.clone(),
            name: self.name.clone(),
            service_class_id: self.service_class_id.clone(),
            datacenter_id: self.datacenter_id.clone(),
            created_time: self.created,
            updated_time: self.updated,
            creation_state: self.state,
            event_broker_service_version: Some(self.event_broker_version.clone()),
            broker: BrokerDetails {
                cluster: ClusterDetails {
                    name: Some(self.cluster_name.clone()),
                    primary_router_name: Some(self.custom_router_name.clone()),
                },
                msg_vpns: vec![MsgVpnDetails {
                    msg_vpn_name: self.msg_vpn_name.clone(),
                    service_login_credential,
                }],
                max_spool_usage: Some(self.max_spool_usage),
            },
        }
    }

    pub fn to_operation(&self) -> ServiceOperation {
        ServiceOperation {
            id: format!("O{}", self.id),
            resource_id: self.id.clone(),
            name: self.name.clone(),
            created_time: self.created,
            creation_state: self.state,
        }
    }

    pub fn to_delete_operation(&self) -> DeleteOperation {
        DeleteOperation {
            id: format!("O{}", self.id),
            resource_id: self.id.clone(),
            name: self.name.clone(),
            created_time: self.created,
            status: ServiceStatus::Pending,
        }
    }
}

fn or_default(value: Option<String>, default: &str) -> String {
    match value {
        Some(v) if !v.is_empty() => v,
        _ => default.to_string(),
    }
}

/// Identity → record map owned by one server instance.
///
/// Every mutation replaces the stored record while holding the lock, so a
/// read ordered after a mutation's response always observes it.
pub struct ServiceStore {
    records: Mutex<HashMap<String, ServiceRecord>>,
    config: FakeServerConfig,
}

impl ServiceStore {
    pub fn new(config: FakeServerConfig) -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
            config,
        }
    }

    pub fn config(&self) -> &FakeServerConfig {
        &self.config
    }

    pub async fn create(&self, req: CreateServiceRequest) -> ServiceRecord {
        let record = ServiceRecord::new(req, self.config.credentials.clone());
        debug!(id = %record.id, name = %record.name, "Created service");
        self.records
            .lock()
            .await
            .insert(record.id.clone(), record.clone());
        record
    }

    /// Read a record, persisting a PENDING → COMPLETED transition if due.
    pub async fn get(&self, id: &str) -> Option<ServiceRecord> {
        let mut records = self.records.lock().await;
        let record = records.get_mut(id)?;
        if record.refresh(self.config.completion_delay) {
            debug!(id = %id, "Service provisioning completed");
        }
        Some(record.clone())
    }

    pub async fn update(&self, id: &str, req: UpdateServiceRequest) -> Option<ServiceRecord> {
        let mut records = self.records.lock().await;
        let record = records.get_mut(id)?;
        record.apply_update(req);
        debug!(id = %id, name = %record.name, "Updated service");
        Some(record.clone())
    }

    pub async fn delete(&self, id: &str) -> Option<ServiceRecord> {
        let removed = self.records.lock().await.remove(id);
        if removed.is_some() {
            debug!(id = %id, "Deleted service");
        }
        removed
    }

    /// Force a record into a given state, e.g. to simulate a failed provisioning.
    pub async fn set_status(&self, id: &str, status: ServiceStatus) -> bool {
        match self.records.lock().await.get_mut(id) {
            Some(record) => {
                record.state = status;
                true
            }
            None => false,
        }
    }

    pub async fn ids(&self) -> Vec<String> {
        self.records.lock().await.keys().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.lock().await.is_empty()
    }
}
