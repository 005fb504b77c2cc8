//! Normalized execution outcomes.

use crate::{EngineError, ErrorKind};
use catalog::SecretKey;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Unmet prerequisites the caller must resolve out of band.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetupNeeded {
    pub title: String,
    pub description: String,
    pub required_secret_inputs: Vec<SecretKey>,
    pub required_action_confirmations: Vec<SecretKey>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oauth_authorization_url: Option<String>,
}

/// The result of one tool invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ExecutionOutcome {
    Success {
        data: Value,
    },
    SetupNeeded(SetupNeeded),
    Error {
        kind: ErrorKind,
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        details: Option<Value>,
    },
}

impl ExecutionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// The error kind, for error outcomes.
    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Error { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

impl From<EngineError> for ExecutionOutcome {
    fn from(err: EngineError) -> Self {
        Self::Error {
            kind: err.kind(),
            message: err.to_string(),
            details: err.details(),
        }
    }
}
