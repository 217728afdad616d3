//! Shared configuration types for the sync service.

mod base;
mod batch;
mod logging;
mod schedule;
mod service;
mod source;
mod store;

pub use base::ValidationError;
pub use batch::BatchConfig;
pub use logging::{LogRotation, LoggingConfig};
pub use schedule::ScheduleConfig;
pub use service::{SyncServiceConfig, SyncServiceConfigWithoutSecrets};
pub use source::{SourceConfig, SourceFilesConfig};
pub use store::{StoreConfig, StoreConfigWithoutSecrets, TablesConfig};
