use std::path::PathBuf;

use thiserror::Error;

/// Errors from loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IMSTO_CONF not found in environment and no config directory given")]
    MissingConfDir,

    #[error("cannot read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {origin}: {message}")]
    Parse { origin: String, message: String },
}

/// Result alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
