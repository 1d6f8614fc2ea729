//! Lifecycle reconciler.
//!
//! Drives a service from its current state to the desired state: create,
//! read, update in place or replace, delete. Every mutating call is followed
//! by polling until the backend reports a terminal status.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::client::{DeleteOutcome, ServiceClient};
use crate::error::{ProviderError, Result};
use crate::model::ServiceDescriptor;
use crate::policy::{self, FieldDiff};
use crate::poller::{PollConfig, Poller};

/// What an update did to reach the desired state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateAction {
    /// Nothing differed; no backend call was made.
    Unchanged,
    UpdatedInPlace,
    /// The old service was deleted and a new one created.
    Replaced { previous_id: String },
}

#[derive(Debug, Clone)]
pub struct UpdateOutcome {
    pub service: ServiceDescriptor,
    pub action: UpdateAction,
    pub diff: FieldDiff,
}

pub struct Reconciler {
    client: Arc<dyn ServiceClient>,
    poller: Poller,
    cancel: CancellationToken,
}

impl Reconciler {
    pub fn new(client: Arc<dyn ServiceClient>, poll: PollConfig) -> Self {
        Self::with_cancellation(client, poll, CancellationToken::new())
    }

    /// Create a reconciler whose polling stops when `cancel` fires.
    pub fn with_cancellation(
        client: Arc<dyn ServiceClient>,
        poll: PollConfig,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            client,
            poller: Poller::new(poll, cancel.clone()),
            cancel,
        }
    }

    /// Create a service and wait until it is provisioned.
    pub async fn create(&self, desired: &ServiceDescriptor) -> Result<ServiceDescriptor> {
        desired.validate()?;
        self.ensure_active()?;

        info!(
            name = %desired.name,
            service_class = %desired.service_class_id,
            datacenter = %desired.datacenter_id,
            "Creating service"
        );
        let created = self.client.create(desired).await?;
        info!(id = %created.id, status = %created.status, "Service accepted, waiting for provisioning");

        let service = self.wait_for_completion(&created.id).await?;
        info!(id = %created.id, "Service provisioned");
        Ok(service)
    }

    /// Current state of a service, or `None` if it no longer exists.
    pub async fn read(&self, id: &str) -> Result<Option<ServiceDescriptor>> {
        require_identity(id)?;
        let service = self.client.get(id).await?;
        if service.is_none() {
            debug!(id = %id, "Service not found");
        }
        Ok(service)
    }

    /// Move `current` towards `desired`.
    ///
    /// A difference in any replace-triggering attribute deletes the service
    /// and creates a new one, even when mutable attributes changed too. If the
    /// delete succeeds but the create fails, the old service stays deleted and
    /// `ReplaceIncomplete` is returned.
    ///
    /// `desired` is compared as given. An unset max spool usage is not
    /// compared, since the update body cannot clear it.
    pub async fn update(
        &self,
        desired: &ServiceDescriptor,
        current: &ServiceDescriptor,
    ) -> Result<UpdateOutcome> {
        let id = current.identity()?.to_string();
        let diff = policy::classify(desired, current);
        if !diff.is_unchanged() {
            self.ensure_active()?;
        }

        if diff.requires_replace() {
            desired.validate()?;
            let fields: Vec<&str> = diff
                .replace_triggering()
                .iter()
                .map(|f| f.as_str())
                .collect();
            warn!(
                id = %id,
                fields = %fields.join(", "),
                "Immutable attributes changed, replacing service (existing service will be destroyed)"
            );

            self.delete(&id).await?;
            let service = self.create(desired).await.map_err(|e| {
                ProviderError::ReplaceIncomplete {
                    deleted_id: id.clone(),
                    source: Box::new(e),
                }
            })?;

            info!(previous_id = %id, id = ?service.id, "Service replaced");
            return Ok(UpdateOutcome {
                service,
                action: UpdateAction::Replaced { previous_id: id },
                diff,
            });
        }

        if diff.has_mutable_changes() {
            desired.to_update_request().validate()?;
            let fields: Vec<&str> = diff.mutable().iter().map(|f| f.as_str()).collect();
            info!(id = %id, fields = %fields.join(", "), "Updating service in place");

            let status = self.client.update(&id, desired).await?;
            debug!(id = %id, status = %status, "Update accepted, waiting for completion");

            let service = self.wait_for_completion(&id).await?;
            return Ok(UpdateOutcome {
                service,
                action: UpdateAction::UpdatedInPlace,
                diff,
            });
        }

        debug!(id = %id, "Service is up to date");
        Ok(UpdateOutcome {
            service: current.clone(),
            action: UpdateAction::Unchanged,
            diff,
        })
    }

    /// Delete a service. A service that is already gone counts as deleted.
    pub async fn delete(&self, id: &str) -> Result<()> {
        require_identity(id)?;
        self.ensure_active()?;
        info!(id = %id, "Deleting service");

        match self.client.delete(id).await {
            Ok(DeleteOutcome::Deleted) => info!(id = %id, "Service deleted"),
            Ok(DeleteOutcome::AlreadyGone) => info!(id = %id, "Service already gone"),
            Err(e) if e.is_not_found() => info!(id = %id, "Service already gone"),
            Err(e) => return Err(e),
        }
        Ok(())
    }

    /// Refuse to start a remote mutation once cancellation was requested.
    fn ensure_active(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(ProviderError::Cancelled);
        }
        Ok(())
    }

    async fn wait_for_completion(&self, id: &str) -> Result<ServiceDescriptor> {
        let client = &self.client;
        self.poller
            .poll(|| async move {
                client
                    .get(id)
                    .await?
                    .ok_or_else(|| ProviderError::NotFound(id.to_string()))
            })
            .await
            .map_err(ProviderError::from)
    }
}

fn require_identity(id: &str) -> Result<()> {
    if id.trim().is_empty() {
        return Err(ProviderError::Validation(
            "service identity must not be empty".to_string(),
        ));
    }
    Ok(())
}
