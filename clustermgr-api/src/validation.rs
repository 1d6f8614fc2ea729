//! Request body decoding and validation.

use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::types::{CreateServiceRequest, UpdateServiceRequest};

/// Schema errors for request bodies.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error("Malformed request body: {0}")]
    Malformed(String),

    #[error("Field '{0}' is required")]
    FieldRequired(&'static str),

    #[error("Field '{field}' is invalid: {reason}")]
    InvalidField { field: &'static str, reason: String },
}

pub type Result<T> = std::result::Result<T, SchemaError>;

/// Decode a JSON body into a typed request.
pub fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T> {
    serde_json::from_slice(body).map_err(|e| SchemaError::Malformed(e.to_string()))
}

fn require(field: &'static str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(SchemaError::FieldRequired(field));
    }
    Ok(())
}

fn check_spool(value: Option<i32>) -> Result<()> {
    match value {
        Some(v) if v <= 0 => Err(SchemaError::InvalidField {
            field: "maxSpoolUsage",
            reason: format!("must be positive, got {}", v),
        }),
        _ => Ok(()),
    }
}

impl CreateServiceRequest {
    pub fn validate(&self) -> Result<()> {
        require("name", &self.name)?;
        require("serviceClassId", &self.service_class_id)?;
        require("datacenterId", &self.datacenter_id)?;
        check_spool(self.max_spool_usage)
    }
}

impl UpdateServiceRequest {
    pub fn validate(&self) -> Result<()> {
        require("name", &self.name)?;
        check_spool(self.max_spool_usage)
    }
}
