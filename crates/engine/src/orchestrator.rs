//! The execution pipeline.

use crate::executor::{execute_request, no_call_result};
use crate::oauth::OAuthBackend;
use crate::outcome::ExecutionOutcome;
use crate::prerequisites::{PrerequisiteResult, check_prerequisites};
use crate::request::build_request;
use crate::transport::HttpTransport;
use crate::validate::validate;
use crate::Result;
use catalog::ToolConfig;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::time::Duration;
use tracing::{Instrument, debug, info, info_span, warn};
use uuid::Uuid;

/// Default timeout for the outbound API call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Engine settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Bound on the outbound API call.
    pub timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Identifies one invocation in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct InvocationId(pub Uuid);

impl InvocationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for InvocationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for InvocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Pipeline stages. Transitions are linear; any stage may finish early.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Validating,
    CheckingPrerequisites,
    BuildingAndExecuting,
    Done,
}

/// Runs declaratively described tools.
///
/// The engine holds no per-invocation state: concurrent calls are
/// independent, including calls for the same tool and user.
pub struct Engine<S, O, T> {
    secrets: S,
    oauth: O,
    transport: T,
    config: EngineConfig,
}

impl<S, O, T> Engine<S, O, T>
where
    S: vault::SecretStore,
    O: OAuthBackend,
    T: HttpTransport,
{
    /// Create an engine with the default configuration.
    pub fn new(secrets: S, oauth: O, transport: T) -> Self {
        Self::with_config(secrets, oauth, transport, EngineConfig::default())
    }

    pub fn with_config(secrets: S, oauth: O, transport: T, config: EngineConfig) -> Self {
        Self {
            secrets,
            oauth,
            transport,
            config,
        }
    }

    /// Execute `tool` for `user_id` with the caller's raw parameters.
    ///
    /// Never fails: every error becomes [`ExecutionOutcome::Error`].
    pub async fn execute(
        &self,
        tool: &ToolConfig,
        user_id: &str,
        raw_params: &Value,
    ) -> ExecutionOutcome {
        let invocation = InvocationId::new();
        let span = info_span!("execute", tool = %tool.id, user = %user_id, %invocation);

        async {
            let outcome = match self.run(tool, user_id, raw_params).await {
                Ok(outcome) => outcome,
                Err(err) => {
                    warn!(kind = ?err.kind(), error = %err, "tool execution failed");
                    err.into()
                }
            };
            if let ExecutionOutcome::SetupNeeded(setup) = &outcome {
                info!(
                    secrets = setup.required_secret_inputs.len(),
                    confirmations = setup.required_action_confirmations.len(),
                    oauth = setup.oauth_authorization_url.is_some(),
                    "setup needed"
                );
            }
            debug!(stage = ?Stage::Done);
            outcome
        }
        .instrument(span)
        .await
    }

    async fn run(
        &self,
        tool: &ToolConfig,
        user_id: &str,
        raw_params: &Value,
    ) -> Result<ExecutionOutcome> {
        debug!(stage = ?Stage::Validating);
        let params = validate(&tool.schema, raw_params)?;

        debug!(stage = ?Stage::CheckingPrerequisites);
        let prerequisites = check_prerequisites(tool, user_id, &self.secrets, &self.oauth).await?;
        let credentials = match prerequisites {
            PrerequisiteResult::Met(credentials) => credentials,
            PrerequisiteResult::Unmet(setup) => return Ok(ExecutionOutcome::SetupNeeded(setup)),
        };

        debug!(stage = ?Stage::BuildingAndExecuting);
        let Some(api) = &tool.api_details else {
            return Ok(ExecutionOutcome::Success {
                data: no_call_result(),
            });
        };
        let request = build_request(tool, api, &params, &credentials)?;
        let data = execute_request(
            &self.transport,
            &request,
            self.config.timeout,
            api.response_pointer.as_deref(),
        )
        .await?;

        Ok(ExecutionOutcome::Success { data })
    }
}
