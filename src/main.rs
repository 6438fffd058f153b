// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

use anyhow::{Context, Result};
use clap::Parser;
use netplane::{
    config::OrchestratorConfig,
    crd::{NetworkAttachmentDefinition, ResourceList},
    objects::{ApiObject, ObjectBatch},
    orchestrator::Orchestrator,
};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

/// Bring up the network controller graph and hold it until signalled.
#[derive(Debug, Parser)]
#[command(name = "netplane", version, about)]
struct Args {
    /// Orchestrator configuration file (YAML). Falls back to `NETPLANE_CONFIG`.
    #[arg(long)]
    config: Option<PathBuf>,

    /// YAML file holding a list of network attachment definitions
    #[arg(long)]
    nads: Option<PathBuf>,
}

fn main() -> Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(4)
        .thread_name("netplane")
        .enable_all()
        .build()?;

    runtime.block_on(async_main(Args::parse()))
}

fn init_logging() {
    // RUST_LOG selects the level (default info); RUST_LOG_FORMAT=json switches to JSON
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let log_format = std::env::var("RUST_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    match log_format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .json()
                .init();
        }
        _ => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .with_ansi(true)
                .compact()
                .init();
        }
    }
}

async fn async_main(args: Args) -> Result<()> {
    init_logging();
    info!("Starting netplane");

    let config = match &args.config {
        Some(path) => OrchestratorConfig::from_file(path)?,
        None => OrchestratorConfig::from_env()?,
    };
    debug!(?config, "Loaded configuration");

    let mut batch = ObjectBatch::new();
    if let Some(path) = &args.nads {
        let nads = load_attachments(path)?;
        info!(count = nads.len(), path = %path.display(), "Loaded attachment definitions");
        batch.push(ApiObject::NetworkAttachmentDefinitionList(
            ResourceList::new(nads),
        ));
    }

    let timeout = config.shutdown_timeout();
    let mut orchestrator = Orchestrator::start(batch, config).await?;
    info!(networks = ?orchestrator.network_names(), "Controllers running");

    if let Err(e) = shutdown_signal().await {
        error!(error = %e, "Failed to wait for shutdown signal");
    }

    info!("Shutdown signal received");
    orchestrator.shutdown_with_timeout(timeout).await?;
    info!("netplane stopped");
    Ok(())
}

/// Read a YAML list of attachment definitions.
fn load_attachments(path: &Path) -> Result<Vec<NetworkAttachmentDefinition>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("reading attachment definitions from {}", path.display()))?;
    if contents.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_yaml::from_str(&contents)
        .with_context(|| format!("parsing attachment definitions in {}", path.display()))
}

/// Resolve on Ctrl-C, or on SIGTERM where available.
async fn shutdown_signal() -> Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate())?;
        tokio::select! {
            result = tokio::signal::ctrl_c() => result?,
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    tokio::signal::ctrl_c().await?;
    Ok(())
}
