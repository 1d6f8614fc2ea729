//! clustermgr: apply event broker service descriptions to MissionControl.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use clustermgr_provider::{
    HttpServiceClient, ProviderSettings, Reconciler, ServiceDescriptor, UpdateAction,
};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "clustermgr", version)]
#[command(about = "Reconcile MissionControl event broker services")]
struct Cli {
    /// MissionControl host or URL [env: MISSIONCONTROL_HOST]
    #[arg(long)]
    host: Option<String>,

    /// Bearer token [env: MISSIONCONTROL_TOKEN]
    #[arg(long)]
    token: Option<String>,

    /// Wait between status checks, e.g. 20s [env: POLLING_INTERVAL_DURATION]
    #[arg(long)]
    polling_interval: Option<String>,

    /// Give up waiting after, e.g. 30m [env: POLLING_TIMEOUT_DURATION]
    #[arg(long)]
    polling_timeout: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create or update a service to match a description
    Apply {
        /// Desired attributes (JSON)
        #[arg(short, long)]
        file: PathBuf,

        /// Last known state (JSON); created if missing
        #[arg(short, long)]
        state: PathBuf,
    },
    /// Show a service
    Read {
        /// Service ID
        id: String,
    },
    /// Delete the service recorded in a state file
    Destroy {
        #[arg(short, long)]
        state: PathBuf,
    },
    /// Delete a service by ID
    Delete {
        /// Service ID
        id: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("clustermgr_provider=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = ProviderSettings {
        host: cli.host,
        bearer_token: cli.token,
        polling_interval: cli.polling_interval,
        polling_timeout: cli.polling_timeout,
    }
    .resolve_from_env()?;

    let client = Arc::new(HttpServiceClient::from_config(&config)?);
    info!(url = %client.base_url(), "Using MissionControl endpoint");
    let cancel = CancellationToken::new();
    let reconciler = Reconciler::with_cancellation(client, config.poll_config(), cancel.clone());

    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling");
            cancel.cancel();
        }
    });

    match cli.command {
        Command::Apply { file, state } => apply(&reconciler, &file, &state).await,
        Command::Read { id } => read(&reconciler, &id).await,
        Command::Destroy { state } => destroy(&reconciler, &state).await,
        Command::Delete { id } => {
            reconciler.delete(&id).await?;
            Ok(())
        }
    }
}

async fn apply(reconciler: &Reconciler, file: &Path, state_path: &Path) -> Result<()> {
    let desired: ServiceDescriptor = read_json(file)
        .await?
        .with_context(|| format!("{} does not exist", file.display()))?;

    let previous: Option<ServiceDescriptor> = read_json(state_path).await?;
    let current = match previous.as_ref().and_then(|s| s.id.as_deref()) {
        Some(id) => {
            let current = reconciler.read(id).await?;
            if current.is_none() {
                warn!(id = %id, "Recorded service no longer exists, creating a new one");
            }
            current
        }
        None => None,
    };

    let service = match current {
        Some(current) => {
            let desired = desired.with_computed_defaults(&current);
            let outcome = reconciler.update(&desired, &current).await?;
            match &outcome.action {
                UpdateAction::Unchanged => info!("No changes"),
                UpdateAction::UpdatedInPlace => info!("Updated in place"),
                UpdateAction::Replaced { previous_id } => {
                    info!(previous_id = %previous_id, "Replaced")
                }
            }
            outcome.service
        }
        None => reconciler.create(&desired).await?,
    };

    write_json(state_path, &service).await?;
    print_service(&service)
}

async fn read(reconciler: &Reconciler, id: &str) -> Result<()> {
    match reconciler.read(id).await? {
        Some(service) => print_service(&service),
        None => bail!("service {} not found", id),
    }
}

async fn destroy(reconciler: &Reconciler, state_path: &Path) -> Result<()> {
    let Some(state) = read_json::<ServiceDescriptor>(state_path).await? else {
        info!(path = %state_path.display(), "No state file, nothing to destroy");
        return Ok(());
    };

    if let Some(id) = state.id.as_deref() {
        reconciler.delete(id).await?;
    }
    tokio::fs::remove_file(state_path)
        .await
        .with_context(|| format!("Failed to remove {}", state_path.display()))?;
    Ok(())
}

async fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    match tokio::fs::read(path).await {
        Ok(bytes) => {
            let value = serde_json::from_slice(&bytes)
                .with_context(|| format!("Failed to parse {}", path.display()))?;
            Ok(Some(value))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e).with_context(|| format!("Failed to read {}", path.display())),
    }
}

async fn write_json(path: &Path, service: &ServiceDescriptor) -> Result<()> {
    let json = serde_json::to_vec_pretty(service)?;
    tokio::fs::write(path, json)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))
}

fn print_service(service: &ServiceDescriptor) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(service)?);
    Ok(())
}
