use std::time::Duration;

use kct_integrations::config::IntegrationsConfig;
use kct_integrations::Integrations;
use kct_sync::catalog::SyncOptions;
use kct_worker::config::WorkerConfig;
use kct_worker::jobs;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// How long running jobs get to finish after a shutdown signal.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "kct_worker=debug,kct_sync=info".into());
    let json_logs = std::env::var("LOG_FORMAT").is_ok_and(|v| v == "json");
    let registry = tracing_subscriber::registry().with(filter);
    if json_logs {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    let config = WorkerConfig::from_env();
    tracing::info!(?config, "Worker starting");

    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = kct_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    kct_db::health_check(&pool)
        .await
        .expect("Database health check failed");

    let integrations = Integrations::from_config(&IntegrationsConfig::from_env())
        .expect("Failed to build integration clients");

    let cancel = CancellationToken::new();
    let mut handles: Vec<JoinHandle<()>> = Vec::new();

    if let Some(source) = &integrations.catalog {
        // Syncs stop between pages on shutdown instead of running to the end.
        let options = SyncOptions {
            cancel: cancel.child_token(),
            ..SyncOptions::from_env()
        };
        if let Some(period) = config.catalog_sync {
            handles.push(tokio::spawn(jobs::catalog_sync::run(
                pool.clone(),
                source.clone(),
                options.clone(),
                period,
                cancel.clone(),
            )));
        }
        if let Some(period) = config.inventory_sync {
            handles.push(tokio::spawn(jobs::inventory_sync::run(
                pool.clone(),
                source.clone(),
                options,
                period,
                cancel.clone(),
            )));
        }
    } else {
        tracing::warn!("Shopify is not configured; catalog and inventory syncs disabled");
    }

    if let Some(period) = config.low_stock_scan {
        handles.push(tokio::spawn(jobs::low_stock::run(pool.clone(), period, cancel.clone())));
    }
    if let Some(period) = config.reservation_sweep {
        handles.push(tokio::spawn(jobs::reservation_sweep::run(
            pool.clone(),
            period,
            cancel.clone(),
        )));
    }

    tracing::info!(jobs = handles.len(), "Worker running");

    shutdown_signal().await;
    cancel.cancel();

    for handle in handles {
        if tokio::time::timeout(SHUTDOWN_GRACE, handle).await.is_err() {
            tracing::warn!("Job did not stop within the grace period");
        }
    }
    pool.close().await;
    tracing::info!("Worker stopped");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("Received SIGINT (Ctrl-C), stopping jobs"),
        () = terminate => tracing::info!("Received SIGTERM, stopping jobs"),
    }
}
