//! Toolgate engine: executes declaratively described tools.
//!
//! Given a [`catalog::ToolConfig`], a user id and raw caller parameters, the
//! engine produces exactly one [`ExecutionOutcome`] without any
//! tool-specific code.
//!
//! # Pipeline
//!
//! 1. **Validate** the parameters against the tool schema, collecting every
//!    violation.
//! 2. **Check prerequisites**: stored secrets, action confirmations and OAuth
//!    authorization. Anything unmet becomes a `SetupNeeded` outcome before
//!    any network call is made.
//! 3. **Build** the outbound request from the tool's path, query, body and
//!    auth mappings.
//! 4. **Execute** one HTTP call and normalize the response.
//!
//! # Example
//!
//! ```ignore
//! use engine::{Engine, ReqwestTransport, StaticOAuthBackend};
//! use vault::SqliteSecretStore;
//!
//! # async fn example(tool: catalog::ToolConfig) -> Result<(), Box<dyn std::error::Error>> {
//! let engine = Engine::new(
//!     SqliteSecretStore::open("secrets.db")?,
//!     StaticOAuthBackend::default(),
//!     ReqwestTransport::new(),
//! );
//! let outcome = engine
//!     .execute(&tool, "user-1", &serde_json::json!({"to": "a@b.com"}))
//!     .await;
//! println!("{}", serde_json::to_string_pretty(&outcome)?);
//! # Ok(())
//! # }
//! ```

mod credentials;
mod error;
mod executor;
mod oauth;
mod orchestrator;
mod outcome;
mod prerequisites;
mod request;
mod secrets;
mod transport;
mod validate;

#[cfg(test)]
mod testing;

pub use credentials::{Credentials, SecretString};
pub use error::{EngineError, ErrorKind, Result};
pub use executor::{NO_CALL_MESSAGE, execute_request};
pub use oauth::{
    AuthStatus, Authorization, OAuthBackend, OAuthCredential, OAuthError, OAuthGrant,
    OAuthProviderConfig, StaticOAuthBackend, check_authorization,
};
pub use orchestrator::{DEFAULT_TIMEOUT, Engine, EngineConfig, InvocationId, Stage};
pub use outcome::{ExecutionOutcome, SetupNeeded};
pub use prerequisites::{PrerequisiteResult, check_prerequisites};
pub use request::{HttpRequest, build_request};
pub use secrets::{CONFIRMED, ResolvedSecrets, fetch_secrets};
pub use transport::{HttpResponse, HttpTransport, ReqwestTransport, TransportError};
pub use validate::{ValidatedParams, ValidationError, Violation, validate};
