mod setup;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use rand::Rng;
use reqwest::Client;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use showrunner_core::{
    load_config, validate_config, AcquisitionPipeline, Catalog, CatalogResyncJob,
    ConfigSeriesSync, EpisodeCheckJob, LibraryLayout, MetadataSync, SchedulerService,
    SqliteCatalog,
};

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("showrunner {} starting", VERSION);

    let config_path = std::env::var("SHOWRUNNER_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;
    validate_config(&config).context("Configuration validation failed")?;

    info!("Library root: {:?}", config.library.data_dir);
    info!("Database path: {:?}", config.database.path);

    let catalog: Arc<dyn Catalog> = Arc::new(
        SqliteCatalog::new(&config.database.path).context("Failed to open catalog")?,
    );

    let config_sync = Arc::new(ConfigSeriesSync::new(
        Arc::clone(&catalog),
        config.series.clone(),
    ));
    let missing = config_sync
        .missing_series()
        .context("Failed to read tracked series")?;
    if !missing.is_empty() {
        warn!(
            "{} configured series not in the catalog and will not be acquired until added to {:?}: {}",
            missing.len(),
            config.database.path,
            missing.join(", ")
        );
    }

    let sync: Arc<dyn MetadataSync> = config_sync;
    sync.sync()
        .await
        .context("Initial catalog sync failed")?;

    let client = Client::new();
    let pipeline = Arc::new(AcquisitionPipeline::new(
        Arc::clone(&catalog),
        setup::build_searchers(&config),
        setup::build_dispatcher(&config)?,
        setup::build_notifiers(&config, &client),
        LibraryLayout::new(config.library.data_dir.clone(), config.naming.clone()),
    ));

    let minute = rand::rng().random_range(0..60);
    let scheduler = SchedulerService::new()
        .with_job(CatalogResyncJob::new(
            sync,
            chrono::Duration::hours(config.scheduler.resync_interval_hours as i64),
            Duration::from_secs(config.scheduler.resync_poll_minutes * 60),
        ))
        .with_job(EpisodeCheckJob::new(
            Arc::clone(&pipeline),
            config.scheduler.check_hours.clone(),
            minute,
        ));

    let handles = scheduler.start();
    info!("Scheduler started with {} job(s)", scheduler.job_count());

    shutdown_signal().await;
    info!("Shutting down");

    scheduler.stop();
    for handle in handles {
        let _ = handle.await;
    }

    info!("Shutdown complete");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
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
}
