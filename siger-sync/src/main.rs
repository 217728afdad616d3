//! SIGER sync service binary.
//!
//! Loads the configuration, initializes logging and keeps the ERP export
//! reconciled with the remote store, either once or on a fixed schedule.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use siger_config::shared::SyncServiceConfig;
use siger_telemetry::tracing::init_tracing;
use tracing::{error, info};

use crate::config::load_service_config;
use crate::core::{log_config, run_sync, start_service};
use crate::error::{ServiceError, ServiceResult};

mod config;
mod core;
mod error;

/// Reconciles the SIGER ERP export with the remote store.
#[derive(Parser, Debug)]
#[command(name = "siger-sync", version)]
#[command(about = "Reconciles the SIGER ERP export with the remote store")]
struct Args {
    /// Directory holding base.yaml and the environment configuration file
    #[arg(long, default_value = "configuration")]
    config_dir: PathBuf,

    /// Run a single sync and exit instead of scheduling
    #[arg(long)]
    once: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprint!("{}", err.render_report());
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> ServiceResult<()> {
    // Configuration errors are fatal before anything is scheduled.
    let config = load_service_config(&args.config_dir)?;

    let _log_flusher =
        init_tracing(env!("CARGO_BIN_NAME"), &config.logging).map_err(ServiceError::config)?;

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(async_main(config, args))
}

async fn async_main(config: SyncServiceConfig, args: Args) -> ServiceResult<()> {
    if args.once {
        log_config(&config);
        let report = run_sync(config).await?;
        info!(success = report.is_success(), "single sync run finished");
        report.into_result()?;

        return Ok(());
    }

    if let Err(err) = start_service(config, args.config_dir).await {
        error!("{err}");
        return Err(err.into());
    }

    Ok(())
}
