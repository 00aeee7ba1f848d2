//! `run` command implementation.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use contracts::{OutputType, ServiceSettings, SourceSettings, SubscriberSettings, UpdateSource};
use provider::{
    ConsumerHandle, JsonlConsumer, LogConsumer, PatchProvider, PatchProviderBuilder,
    ProviderConfig,
};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use upstream::{DirectorySource, DirectorySourceConfig};

use crate::cli::RunArgs;
use crate::error::CliError;

/// Execute the `run` command
pub async fn run_distributor(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading settings");

    if !args.config.exists() {
        return Err(CliError::config_not_found(args.config.display().to_string()).into());
    }

    let mut settings = config_loader::SettingsLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load settings from {}", args.config.display()))?;

    if let Some(ref cluster) = args.cluster {
        info!(cluster = %cluster, "Overriding cluster name from CLI");
        settings.cluster.name = cluster.clone();
    }
    if let Some(ref source_path) = args.source_path {
        info!(path = %source_path.display(), "Overriding source directory from CLI");
        let SourceSettings::Directory { path, .. } = &mut settings.source;
        *path = source_path.clone();
    }

    info!(
        cluster = %settings.cluster.name,
        supported_kinds = settings.cluster.supported_kinds.len(),
        subscribers = settings.subscribers.len(),
        "Settings loaded"
    );

    if args.metrics_port != 0 {
        observability::init_metrics_only(args.metrics_port)?;
    }

    let source = build_source(&settings)?;
    let provider = PatchProviderBuilder::new(settings.cluster.clone())
        .source(source)
        .config(ProviderConfig {
            queue_capacity: settings.provider.queue_capacity,
            update_buffer: settings.provider.update_buffer,
        })
        .build()
        .context("Failed to create patch provider")?;

    let consumers = settings
        .subscribers
        .iter()
        .map(|subscriber| spawn_consumer(&provider, subscriber))
        .collect::<Result<Vec<_>>>()?;

    if consumers.is_empty() {
        warn!("No subscribers configured - every patch request will be dropped");
    }

    let cancel = CancellationToken::new();
    spawn_shutdown_watcher(cancel.clone(), args.timeout);

    info!("Starting distributor...");
    provider
        .start(cancel)
        .await
        .context("Patch provider failed")?;

    let summary = provider.metrics().summary();
    // Dropping the provider closes every delivery queue so the workers can drain.
    drop(provider);

    for handle in consumers {
        let name = handle.name().to_string();
        let stats = handle.join().await;
        info!(
            consumer = %name,
            applied = stats.applied(),
            failures = stats.failures(),
            "Consumer finished"
        );
    }

    println!("\n{summary}");
    info!("Patch Distributor finished");
    Ok(())
}

fn build_source(settings: &ServiceSettings) -> Result<Arc<dyn UpdateSource>> {
    match &settings.source {
        SourceSettings::Directory {
            path,
            poll_interval_ms,
        } => {
            let config = DirectorySourceConfig::new(path)
                .with_poll_interval(Duration::from_millis(*poll_interval_ms));
            let source = DirectorySource::new(config)
                .with_context(|| format!("Failed to open source directory {}", path.display()))?;
            Ok(Arc::new(source))
        }
    }
}

fn spawn_consumer(
    provider: &PatchProvider,
    subscriber: &SubscriberSettings,
) -> Result<ConsumerHandle> {
    let kind = subscriber.kind.clone();
    let queue = provider.subscribe(kind.clone());

    let handle = match subscriber.output {
        OutputType::Log => ConsumerHandle::spawn(LogConsumer::new(kind), queue),
        OutputType::Jsonl => {
            let path = subscriber
                .path
                .as_ref()
                .ok_or_else(|| CliError::consumer(kind.as_str(), "jsonl output requires a path"))?;
            let consumer = JsonlConsumer::open(&kind, path)
                .map_err(|e| CliError::consumer(kind.as_str(), e.to_string()))?;
            ConsumerHandle::spawn(consumer, queue)
        }
    };

    info!(consumer = %handle.name(), "Consumer subscribed");
    Ok(handle)
}

/// Cancel `token` on Ctrl+C, SIGTERM or after `timeout_secs` (0 = never)
fn spawn_shutdown_watcher(token: CancellationToken, timeout_secs: u64) {
    tokio::spawn(async move {
        let timeout = async {
            if timeout_secs == 0 {
                std::future::pending::<()>().await;
            } else {
                tokio::time::sleep(Duration::from_secs(timeout_secs)).await;
            }
        };

        tokio::select! {
            result = shutdown_signal() => {
                if let Err(e) = result {
                    warn!(error = %e, "Signal handler failed, shutting down");
                } else {
                    warn!("Received shutdown signal, stopping distributor...");
                }
            }
            _ = timeout => {
                info!(timeout_secs, "Timeout reached, stopping distributor...");
            }
        }
        token.cancel();
    });
}

/// Wait for Ctrl+C or SIGTERM
async fn shutdown_signal() -> Result<(), CliError> {
    #[cfg(unix)]
    let terminate = {
        let mut sigterm =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                .map_err(|e| CliError::shutdown(format!("SIGTERM handler: {e}")))?;
        async move {
            sigterm.recv().await;
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            result.map_err(|e| CliError::shutdown(format!("Ctrl+C handler: {e}")))
        }
        _ = terminate => Ok(()),
    }
}
