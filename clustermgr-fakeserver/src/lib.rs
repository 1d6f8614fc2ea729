//! Fake MissionControl API for testing without a live control plane.
//!
//! Services start PENDING and report COMPLETED on the first read after
//! the completion delay has passed.

pub mod error;
pub mod routes;
pub mod server;
pub mod state;

pub use error::FakeServerError;
pub use routes::{AppState, create_router};
pub use server::FakeServer;
pub use state::{DEFAULT_COMPLETION_DELAY, FakeServerConfig, ServiceRecord, ServiceStore};
