//! Declarative management of MissionControl event broker services.
//!
//! A [`Reconciler`] compares desired and current state, decides between an
//! in-place update and a replace via the immutability [`policy`], issues the
//! remote calls through a [`ServiceClient`] and waits for the backend to
//! finish provisioning with a [`Poller`].

pub mod client;
pub mod config;
pub mod error;
pub mod model;
pub mod poller;
pub mod policy;
pub mod reconciler;

pub use client::{CreatedService, DeleteOutcome, HttpServiceClient, ServiceClient};
pub use config::{ProviderConfig, ProviderSettings, parse_duration};
pub use error::{ProviderError, Result};
pub use model::{ServiceCredentials, ServiceDescriptor, ServiceStatus};
pub use poller::{PollConfig, PollError, Poller, StatusReport};
pub use policy::{FieldChange, FieldDiff, ServiceField, classify};
pub use reconciler::{Reconciler, UpdateAction, UpdateOutcome};
