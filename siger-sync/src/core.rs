use std::path::{Path, PathBuf};

use siger_config::shared::{SyncServiceConfig, SyncServiceConfigWithoutSecrets};
use siger_etl::concurrency::shutdown::{ShutdownTx, create_shutdown_channel, request_shutdown};
use siger_etl::pipeline::SyncPipeline;
use siger_etl::report::SyncReport;
use siger_etl::schedule::Scheduler;
use siger_etl::store::postgrest::PostgrestStore;
use tokio::signal::unix::{SignalKind, signal};
use tracing::{debug, error, info, warn};

use crate::config::load_service_config;
use crate::error::ServiceResult;

/// Runs a single sync with `config` against the configured remote store.
pub async fn run_sync(config: SyncServiceConfig) -> ServiceResult<SyncReport> {
    let store = PostgrestStore::new(&config.store)?;
    let pipeline = SyncPipeline::new(config, store);

    Ok(pipeline.run().await)
}

/// Starts the scheduled service and returns once shutdown was requested.
///
/// The configuration is reloaded from `config_dir` before every run, so edits take
/// effect on the next run. The schedule itself is fixed at startup.
pub async fn start_service(config: SyncServiceConfig, config_dir: PathBuf) -> anyhow::Result<()> {
    info!("starting sync service");

    log_config(&config);

    let (shutdown_tx, shutdown_rx) = create_shutdown_channel();
    let shutdown_handle = spawn_shutdown_listener(shutdown_tx)?;

    let scheduler = Scheduler::from_config(&config.schedule);
    let runs = scheduler
        .run(
            || {
                let config_dir = config_dir.clone();
                async move { scheduled_run(&config_dir).await }
            },
            shutdown_rx,
        )
        .await;

    shutdown_handle.abort();
    let _ = shutdown_handle.await;

    info!(runs, "sync service stopped");

    Ok(())
}

/// Performs one scheduled run, logging instead of propagating failures.
async fn scheduled_run(config_dir: &Path) {
    let config = match load_service_config(config_dir) {
        Ok(config) => config,
        Err(err) => {
            error!(error = %err, "configuration reload failed, skipping this run");
            return;
        }
    };

    if let Err(err) = run_sync(config).await {
        error!(error = %err, "sync run could not start");
    }
}

/// Listens for SIGINT and SIGTERM and requests shutdown on the first one.
fn spawn_shutdown_listener(
    shutdown_tx: ShutdownTx,
) -> std::io::Result<tokio::task::JoinHandle<()>> {
    let mut sigterm = signal(SignalKind::terminate())?;

    Ok(tokio::spawn(async move {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("sigint (ctrl+c) received, stopping after the current run");
            }
            _ = sigterm.recv() => {
                info!("sigterm received, stopping after the current run");
            }
        }

        request_shutdown(&shutdown_tx);
    }))
}

/// Logs the configuration with secrets removed.
pub fn log_config(config: &SyncServiceConfig) {
    let config = SyncServiceConfigWithoutSecrets::from(config.clone());

    debug!(
        url = %config.store.url,
        timeout_secs = config.store.timeout_secs,
        page_size = config.store.page_size,
        customer_table = %config.store.tables.customer,
        contract_table = %config.store.tables.contract,
        product_table = %config.store.tables.product,
        "store config"
    );
    debug!(
        path = %config.source.path.display(),
        delimiter = %config.source.delimiter,
        encoding = ?config.source.encoding,
        "source config"
    );
    debug!(
        interval_minutes = config.schedule.interval_minutes,
        run_on_start = config.schedule.run_on_start,
        batch_max_size = config.batch.max_size,
        "schedule config"
    );

    match serde_json::to_string(&config) {
        Ok(rendered) => info!(config = %rendered, "loaded configuration"),
        Err(err) => warn!(error = %err, "could not render configuration"),
    }
}
