//! Declarative tool definitions.
//!
//! A tool is an external HTTP API operation described entirely by data: who
//! provides it, how it authenticates, which parameters it accepts, and how
//! those parameters map onto the outbound request. The execution engine
//! interprets these definitions; nothing here performs I/O beyond reading a
//! catalog file.

mod catalog;
mod error;
mod tool;

pub use catalog::Catalog;
pub use error::{Error, Result};
pub use tool::{
    ACTION_CONFIRMATION_PREFIX, ApiDetails, ApiKeyDetails, ApiKeyScheme, AuthMethod, HttpMethod,
    ParamMappings, QueryMapping, QueryTransform, SecretKey, ToolConfig, ToolSchema,
    UtilityProvider,
};
