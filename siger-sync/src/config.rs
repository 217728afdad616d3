use std::path::Path;

use siger_config::load_config_from_dir;
use siger_config::shared::SyncServiceConfig;

use crate::error::{ServiceError, ServiceResult};

/// Loads and validates the service configuration from `directory`.
pub fn load_service_config(directory: &Path) -> ServiceResult<SyncServiceConfig> {
    let config =
        load_config_from_dir::<SyncServiceConfig>(directory).map_err(ServiceError::config)?;
    config.validate().map_err(ServiceError::config)?;

    Ok(config)
}
