//! Strata coordinator binary.

use anyhow::{Context, Result};
use clap::Parser;
use figment::Figment;
use figment::providers::{Env, Format, Toml};
use std::net::SocketAddr;
use std::sync::Arc;
use strata_coordinator::bootstrap::register_configured_shard_nodes;
use strata_coordinator::eviction::spawn_cache_eviction;
use strata_coordinator::{AppState, Coordinator, create_router};
use strata_core::config::{CoordinatorConfig, StorageConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Strata coordinator - shards, caches and reassembles files
#[derive(Parser, Debug)]
#[command(name = "strata-coordinator")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(
        short,
        long,
        env = "STRATA_CONFIG",
        default_value = "config/coordinator.toml"
    )]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Strata coordinator v{}", env!("CARGO_PKG_VERSION"));

    // The file is optional; every setting has a default or an env override.
    let mut figment = Figment::new();
    if std::path::Path::new(&args.config).exists() {
        tracing::info!(config_path = %args.config, "Loading configuration from file");
        figment = figment.merge(Toml::file(&args.config));
    } else {
        tracing::debug!("No config file found at {}", args.config);
    }

    let config: CoordinatorConfig = figment
        .merge(Env::prefixed("STRATA_").split("__"))
        .extract()
        .context("failed to load configuration")?;
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("invalid configuration: {e}"))?;

    strata_coordinator::metrics::register_metrics();
    tracing::info!("Prometheus metrics registered");

    let metadata = strata_metadata::from_config(&config.metadata)
        .await
        .context("failed to initialize metadata store")?;
    metadata
        .health_check()
        .await
        .context("metadata store health check failed")?;
    tracing::info!("Metadata store initialized");

    let registered = register_configured_shard_nodes(metadata.as_ref(), &config.shard_nodes)
        .await
        .context("failed to register configured shard nodes")?;
    if registered > 0 {
        tracing::info!(count = registered, "Configured shard nodes registered");
    }

    let staging = strata_storage::from_config(&StorageConfig::Filesystem {
        path: config.staging.path.clone(),
    })
    .await
    .context("failed to initialize staging area")?;
    staging
        .health_check()
        .await
        .context("staging area health check failed")?;
    tracing::info!(path = %config.staging.path.display(), "Staging area ready");

    let coordinator = Arc::new(
        Coordinator::connect(
            metadata,
            staging,
            &config.shard_client,
            config.cache.ttl(),
        )
        .await
        .context("failed to load shard nodes")?,
    );
    if coordinator.shard_ids().is_empty() {
        tracing::warn!("No active shard nodes registered; uploads will be rejected");
    } else {
        tracing::info!(shards = ?coordinator.shard_ids(), "Shard nodes loaded");
    }

    let eviction = spawn_cache_eviction(coordinator.clone(), config.cache.sweep_interval());

    let addr: SocketAddr = config.server.bind.parse().context("invalid bind address")?;
    let app = create_router(AppState::new(config, coordinator));

    tracing::info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {}", addr))?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    eviction.abort();
    tracing::info!("Coordinator stopped");
    Ok(())
}

/// Resolve on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutdown signal received");
}
