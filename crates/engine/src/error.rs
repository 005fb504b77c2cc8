//! Engine error types.

use crate::oauth::OAuthError;
use crate::transport::TransportError;
use crate::validate::ValidationError;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use thiserror::Error;

/// Class of a failed execution, carried on the error outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Caller parameters violate the tool schema.
    Validation,
    /// The tool's own configuration is inconsistent.
    Configuration,
    /// The OAuth backend failed to answer or broke its contract.
    Collaborator,
    /// The external API answered with a non-success status.
    UpstreamApi,
    /// No response was received from the external API.
    UpstreamUnreachable,
}

/// Engine errors.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EngineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    InvalidTool(#[from] catalog::Error),

    #[error("tool configuration error: {0}")]
    Configuration(String),

    #[error("missing path parameter: {0}")]
    MissingPathParameter(String),

    #[error("credential not resolved: {0}")]
    MissingCredential(&'static str),

    #[error(transparent)]
    OAuth(#[from] OAuthError),

    #[error("oauth backend contract violation: {0}")]
    OAuthContract(String),

    #[error("upstream API returned status {status}")]
    UpstreamApi { status: u16, body: Value },

    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::InvalidTool(_)
            | Self::Configuration(_)
            | Self::MissingPathParameter(_)
            | Self::MissingCredential(_) => ErrorKind::Configuration,
            Self::OAuth(_) | Self::OAuthContract(_) => ErrorKind::Collaborator,
            Self::UpstreamApi { .. } => ErrorKind::UpstreamApi,
            Self::Transport(TransportError::InvalidRequest(_)) => ErrorKind::Configuration,
            Self::Transport(_) => ErrorKind::UpstreamUnreachable,
        }
    }

    /// Structured context for the error outcome, when there is any.
    pub fn details(&self) -> Option<Value> {
        match self {
            Self::Validation(err) => Some(json!(err.violations)),
            Self::UpstreamApi { status, body } => Some(json!({ "status": status, "body": body })),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
