//! Fixed-interval status polling.
//!
//! The poller performs no I/O itself: it repeatedly runs a caller-supplied
//! status check until a terminal status is observed, the timeout elapses,
//! the check fails, or the cancellation token fires.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::{ProviderError, Result};
use crate::model::{ServiceDescriptor, ServiceStatus};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(20);
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_secs(30 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    /// Wait between two checks. No backoff, no jitter.
    pub interval: Duration,
    /// Give up once this much time has passed without a terminal status.
    pub timeout: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            timeout: DEFAULT_POLL_TIMEOUT,
        }
    }
}

/// Something a status check observes.
pub trait StatusReport {
    fn status(&self) -> ServiceStatus;
}

impl StatusReport for ServiceStatus {
    fn status(&self) -> ServiceStatus {
        *self
    }
}

impl StatusReport for ServiceDescriptor {
    fn status(&self) -> ServiceStatus {
        self.status.unwrap_or(ServiceStatus::Unknown)
    }
}

/// Why polling stopped without success.
#[derive(Debug)]
pub enum PollError<T> {
    /// The status check itself failed. Not retried.
    Check(ProviderError),
    /// No terminal status before the timeout.
    Timeout { last: T, elapsed: Duration },
    /// The backend reported a failed provisioning.
    Failed(T),
    Cancelled,
}

impl From<PollError<ServiceDescriptor>> for ProviderError {
    fn from(e: PollError<ServiceDescriptor>) -> Self {
        match e {
            PollError::Check(err) => err,
            PollError::Timeout { last, elapsed } => ProviderError::Timeout {
                elapsed,
                last_status: Some(last.status()),
                last_observed: Some(Box::new(last)),
            },
            PollError::Failed(last) => ProviderError::ProvisioningFailed {
                status: last.status(),
                id: last.id.unwrap_or_default(),
            },
            PollError::Cancelled => ProviderError::Cancelled,
        }
    }
}

pub struct Poller {
    config: PollConfig,
    cancel: CancellationToken,
}

impl Poller {
    pub fn new(config: PollConfig, cancel: CancellationToken) -> Self {
        Self { config, cancel }
    }

    /// Run `check` now and then every interval until it reports COMPLETED.
    ///
    /// Returns the observation that reported COMPLETED. A timeout is only
    /// declared after a non-terminal check, so it fires between `timeout`
    /// and `timeout + interval` after the start.
    pub async fn poll<T, F, Fut>(&self, mut check: F) -> std::result::Result<T, PollError<T>>
    where
        T: StatusReport,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let start = Instant::now();
        let mut attempt = 0u32;

        loop {
            if self.cancel.is_cancelled() {
                return Err(PollError::Cancelled);
            }

            attempt += 1;
            let observed = check().await.map_err(PollError::Check)?;
            let status = observed.status();
            let elapsed = start.elapsed();

            match status {
                ServiceStatus::Completed => {
                    debug!(
                        attempt = attempt,
                        elapsed_ms = elapsed.as_millis(),
                        "Reached terminal status"
                    );
                    return Ok(observed);
                }
                ServiceStatus::Failed => {
                    warn!(attempt = attempt, "Backend reported failed provisioning");
                    return Err(PollError::Failed(observed));
                }
                ServiceStatus::Pending | ServiceStatus::Unknown => {}
            }

            if elapsed >= self.config.timeout {
                warn!(
                    attempt = attempt,
                    status = %status,
                    timeout_secs = self.config.timeout.as_secs(),
                    "Timeout waiting for terminal status"
                );
                return Err(PollError::Timeout {
                    last: observed,
                    elapsed,
                });
            }

            debug!(
                attempt = attempt,
                status = %status,
                interval_ms = self.config.interval.as_millis(),
                "Not terminal yet, waiting"
            );

            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Err(PollError::Cancelled),
                _ = tokio::time::sleep(self.config.interval) => {}
            }
        }
    }
}
