//! CLI error types.

use std::path::PathBuf;
use thiserror::Error;

use crate::config::ConfigError;

/// CLI errors.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// No tool with this id is in the catalog.
    #[error("no tool with id '{id}' in {catalog}")]
    ToolNotFound { id: String, catalog: PathBuf },

    /// `--params` is not valid JSON.
    #[error("invalid --params: {0}")]
    InvalidParams(serde_json::Error),

    /// The data directory could not be determined.
    #[error("no data directory found; set `database` in the config")]
    NoDataDir,

    /// Configuration is invalid or unreadable.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// An error occurred in the catalog layer.
    #[error(transparent)]
    Catalog(#[from] catalog::Error),

    /// An error occurred in the secret store.
    #[error(transparent)]
    Vault(#[from] vault::Error),

    /// Output could not be serialized.
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// An I/O error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
