use std::fmt;
use std::path::{Path, PathBuf};

use rust_cli_config::{Config, File};
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::environment::Environment;

/// Extensions tried, in order, for every configuration layer.
const EXTENSIONS: [&str; 3] = ["yaml", "yml", "json"];

/// Prefix of environment variables overriding configuration keys.
const ENV_PREFIX: &str = "APP";

/// Separator between nested key segments in environment variables (`APP_STORE__URL`).
const ENV_KEY_SEPARATOR: &str = "__";

/// A file layer of the configuration, from lowest to highest precedence.
#[derive(Debug, Clone, Copy)]
enum Layer {
    Base,
    Environment(Environment),
}

impl Layer {
    fn file_stem(self) -> &'static str {
        match self {
            Layer::Base => "base",
            Layer::Environment(environment) => environment.as_str(),
        }
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Layer::Base => f.write_str("base configuration"),
            Layer::Environment(environment) => write!(f, "{environment} environment configuration"),
        }
    }
}

/// Errors raised while assembling the configuration.
#[derive(Debug, Error)]
pub enum LoadConfigError {
    #[error("configuration directory `{0}` does not exist")]
    MissingDirectory(PathBuf),

    #[error("could not locate {layer} in `{directory}`; attempted: {attempted}")]
    MissingFile {
        layer: String,
        directory: PathBuf,
        attempted: String,
    },

    /// A file exists but is not valid for its format.
    #[error("failed to load {layer} from `{path}`: {source}")]
    InvalidFile {
        layer: String,
        path: PathBuf,
        source: rust_cli_config::ConfigError,
    },

    #[error("failed to determine runtime environment: {0}")]
    Environment(#[source] std::io::Error),

    /// The merged layers do not describe the requested type.
    #[error("failed to deserialize configuration: {0}")]
    Deserialization(#[source] rust_cli_config::ConfigError),
}

/// Loads the configuration held in `directory`.
///
/// Layers `base.{yaml,yml,json}`, then the file named after the environment selected
/// by `APP_ENVIRONMENT`, then `APP_`-prefixed environment variables.
pub fn load_config_from_dir<T>(directory: impl AsRef<Path>) -> Result<T, LoadConfigError>
where
    T: DeserializeOwned,
{
    let environment = Environment::load().map_err(LoadConfigError::Environment)?;
    load_layers(directory.as_ref(), environment)
}

fn load_layers<T>(directory: &Path, environment: Environment) -> Result<T, LoadConfigError>
where
    T: DeserializeOwned,
{
    if !directory.is_dir() {
        return Err(LoadConfigError::MissingDirectory(directory.to_path_buf()));
    }

    let mut builder = Config::builder();
    for layer in [Layer::Base, Layer::Environment(environment)] {
        let path = locate(directory, layer)?;
        check_file(&path, layer)?;
        builder = builder.add_source(File::from(path));
    }

    let overrides = rust_cli_config::Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator(ENV_KEY_SEPARATOR);

    builder
        .add_source(overrides)
        .build()
        .and_then(|settings| settings.try_deserialize::<T>())
        .map_err(LoadConfigError::Deserialization)
}

fn locate(directory: &Path, layer: Layer) -> Result<PathBuf, LoadConfigError> {
    let candidates: Vec<PathBuf> = EXTENSIONS
        .iter()
        .map(|extension| directory.join(format!("{}.{extension}", layer.file_stem())))
        .collect();

    if let Some(found) = candidates.iter().find(|path| path.is_file()) {
        return Ok(found.clone());
    }

    Err(LoadConfigError::MissingFile {
        layer: layer.to_string(),
        directory: directory.to_path_buf(),
        attempted: candidates
            .iter()
            .map(|path| format!("`{}`", path.display()))
            .collect::<Vec<_>>()
            .join(", "),
    })
}

/// Parses `path` on its own so that a syntax error names the offending file.
fn check_file(path: &Path, layer: Layer) -> Result<(), LoadConfigError> {
    Config::builder()
        .add_source(File::from(path))
        .build()
        .map(|_| ())
        .map_err(|source| LoadConfigError::InvalidFile {
            layer: layer.to_string(),
            path: path.to_path_buf(),
            source,
        })
}
