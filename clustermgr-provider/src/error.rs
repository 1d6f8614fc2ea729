//! Provider error types.

use std::time::Duration;

use clustermgr_api::{SchemaError, ServiceStatus};
use thiserror::Error;

use crate::model::ServiceDescriptor;

/// Errors that can occur while reconciling a service.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Bad or missing input. Never retried.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Network or HTTP-layer failure. The core does not retry.
    #[error("transport error{}: {message}", status.map(|s| format!(" (HTTP {})", s)).unwrap_or_default())]
    Transport {
        status: Option<u16>,
        message: String,
    },

    /// The service does not exist (404).
    #[error("service not found: {0}")]
    NotFound(String),

    /// Polling ran out of time before the service reached a terminal state.
    #[error("timed out after {elapsed:?} waiting for service to complete (last status: {})",
        last_status.map(|s| s.to_string()).unwrap_or_else(|| "none".to_string()))]
    Timeout {
        elapsed: Duration,
        last_status: Option<ServiceStatus>,
        /// Last state observed while polling, for callers that keep waiting manually.
        last_observed: Option<Box<ServiceDescriptor>>,
    },

    /// The caller's cancellation signal fired.
    #[error("operation cancelled")]
    Cancelled,

    /// The backend reported a failed provisioning.
    #[error("provisioning of service {id} ended in state {status}")]
    ProvisioningFailed { id: String, status: ServiceStatus },

    /// A replace deleted the old service but could not create the new one.
    /// Nothing is rolled back; manual remediation is required.
    #[error("replace incomplete: service {deleted_id} was deleted but its replacement could not be created: {source}")]
    ReplaceIncomplete {
        deleted_id: String,
        #[source]
        source: Box<ProviderError>,
    },

    /// Invalid provider configuration.
    #[error("configuration error: {0}")]
    Config(String),
}

impl ProviderError {
    pub fn transport(status: Option<u16>, message: impl Into<String>) -> Self {
        ProviderError::Transport {
            status,
            message: message.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ProviderError::NotFound(_))
    }

    /// Errors after which the remote state needs a human to look at it.
    pub fn requires_remediation(&self) -> bool {
        matches!(self, ProviderError::ReplaceIncomplete { .. })
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        ProviderError::Transport {
            status: e.status().map(|s| s.as_u16()),
            message: e.to_string(),
        }
    }
}

impl From<SchemaError> for ProviderError {
    fn from(e: SchemaError) -> Self {
        ProviderError::Validation(e.to_string())
    }
}

/// Result type for provider operations.
pub type Result<T> = std::result::Result<T, ProviderError>;
