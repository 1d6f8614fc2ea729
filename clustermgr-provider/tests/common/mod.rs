//! Shared test utilities for reconciler integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use clustermgr_fakeserver::{FakeServer, FakeServerConfig};
use clustermgr_provider::{
    HttpServiceClient, PollConfig, ProviderSettings, Reconciler, ServiceDescriptor,
};
use tokio_util::sync::CancellationToken;

/// A fake MissionControl API with a reconciler pointed at it.
pub struct TestEnv {
    pub server: FakeServer,
    pub reconciler: Reconciler,
    pub cancel: CancellationToken,
}

impl TestEnv {
    pub async fn spawn(completion_delay: Duration, poll: PollConfig) -> Self {
        Self::spawn_with(
            FakeServerConfig {
                completion_delay,
                ..Default::default()
            },
            None,
            poll,
        )
        .await
    }

    pub async fn spawn_with(
        config: FakeServerConfig,
        token: Option<&str>,
        poll: PollConfig,
    ) -> Self {
        let server = FakeServer::spawn(config)
            .await
            .expect("Failed to start fake server");
        let client = HttpServiceClient::new(&server.base_url(), token.map(str::to_string))
            .expect("Failed to build client");
        let cancel = CancellationToken::new();
        let reconciler = Reconciler::with_cancellation(Arc::new(client), poll, cancel.clone());

        Self {
            server,
            reconciler,
            cancel,
        }
    }

    /// Resolve settings the way the CLI does, with the fake server as host.
    pub fn settings(&self, interval: &str, timeout: &str) -> ProviderSettings {
        ProviderSettings {
            host: Some(self.server.base_url()),
            bearer_token: None,
            polling_interval: Some(interval.to_string()),
            polling_timeout: Some(timeout.to_string()),
        }
    }

    pub async fn shutdown(self) {
        self.server.shutdown().await;
    }
}

pub fn poll(interval_ms: u64, timeout_ms: u64) -> PollConfig {
    PollConfig {
        interval: Duration::from_millis(interval_ms),
        timeout: Duration::from_millis(timeout_ms),
    }
}

pub fn desired() -> ServiceDescriptor {
    ServiceDescriptor::new(
        "ocs-prov-test",
        "ENTERPRISE_250_STANDALONE",
        "aks-germanywestcentral",
    )
}
