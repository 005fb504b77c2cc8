//! Catalog error types.

use thiserror::Error;

/// Catalog errors.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// A tool with the same id is already registered.
    #[error("duplicate tool id: {0}")]
    DuplicateTool(String),

    /// The tool configuration violates a catalog invariant.
    #[error("invalid tool {id}: {reason}")]
    InvalidTool { id: String, reason: String },

    /// A provider name that is not supported.
    #[error("unknown provider: {0}")]
    UnknownProvider(String),

    /// Failed to parse a catalog file.
    #[error("failed to parse catalog: {0}")]
    Parse(String),

    /// An I/O error occurred while reading the catalog.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
