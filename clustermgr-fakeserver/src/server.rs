//! Running fake server instance.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::routes::{AppState, create_router};
use crate::state::{FakeServerConfig, ServiceStore};

/// Fake MissionControl API served in the background.
pub struct FakeServer {
    addr: SocketAddr,
    state: Arc<AppState>,
    shutdown_tx: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

impl FakeServer {
    /// Serve on an OS-assigned port on the loopback interface.
    pub async fn spawn(config: FakeServerConfig) -> io::Result<Self> {
        Self::bind(SocketAddr::from(([127, 0, 0, 1], 0)), config).await
    }

    pub async fn bind(addr: SocketAddr, config: FakeServerConfig) -> io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        let addr = listener.local_addr()?;

        let state = Arc::new(AppState {
            store: ServiceStore::new(config),
        });
        let router = create_router(state.clone());

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(async move {
            let result = axum::serve(listener, router)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await;
            if let Err(e) = result {
                error!("Fake server error: {}", e);
            }
        });

        info!(
            addr = %addr,
            completion_delay_ms = state.store.config().completion_delay.as_millis(),
            "Fake server ready"
        );

        Ok(Self {
            addr,
            state,
            shutdown_tx,
            handle,
        })
    }

    /// Host URL to configure clients with.
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn store(&self) -> &ServiceStore {
        &self.state.store
    }

    /// Stop serving and wait for the server task to exit.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(());
        let _ = self.handle.await;
    }
}
