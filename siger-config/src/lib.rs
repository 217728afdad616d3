//! Configuration for the SIGER sync service.
//!
//! Configuration is layered: a base file, an environment specific file and
//! `APP_`-prefixed environment variables, in increasing order of precedence.

mod environment;
mod load;
pub mod shared;

pub use environment::Environment;
pub use load::{LoadConfigError, load_config_from_dir};
