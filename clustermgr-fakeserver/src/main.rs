use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use clustermgr_fakeserver::{FakeServer, FakeServerConfig};
use tokio::signal;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "clustermgr-fakeserver")]
#[command(about = "In-memory MissionControl API for offline testing")]
struct Args {
    /// Listen address
    #[arg(short, long, default_value = "127.0.0.1:8090")]
    listen: SocketAddr,

    /// Seconds a service stays PENDING after create or update
    #[arg(long, default_value = "5")]
    completion_delay: u64,

    /// Require this bearer token on every request
    #[arg(long)]
    bearer_token: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("clustermgr_fakeserver=info".parse()?),
        )
        .init();

    let args = Args::parse();

    let config = FakeServerConfig {
        completion_delay: Duration::from_secs(args.completion_delay),
        bearer_token: args.bearer_token,
        ..Default::default()
    };

    let server = FakeServer::bind(args.listen, config).await?;
    info!("Serving MissionControl fake on {}", server.base_url());

    signal::ctrl_c().await?;
    info!("Shutting down");
    server.shutdown().await;

    Ok(())
}
