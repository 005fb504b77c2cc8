//! Declarative tool configuration.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

/// Prefix marking a required secret as a one-time action confirmation.
pub const ACTION_CONFIRMATION_PREFIX: &str = "confirm:";

/// Third-party system a tool talks to.
///
/// Also the namespace for the user's secrets and OAuth grants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UtilityProvider {
    Github,
    Gitlab,
    Slack,
    Google,
    Microsoft,
    Linear,
    Notion,
    Jira,
    Asana,
    Stripe,
    Sendgrid,
    Custom,
}

impl UtilityProvider {
    pub const ALL: [Self; 12] = [
        Self::Github,
        Self::Gitlab,
        Self::Slack,
        Self::Google,
        Self::Microsoft,
        Self::Linear,
        Self::Notion,
        Self::Jira,
        Self::Asana,
        Self::Stripe,
        Self::Sendgrid,
        Self::Custom,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Github => "github",
            Self::Gitlab => "gitlab",
            Self::Slack => "slack",
            Self::Google => "google",
            Self::Microsoft => "microsoft",
            Self::Linear => "linear",
            Self::Notion => "notion",
            Self::Jira => "jira",
            Self::Asana => "asana",
            Self::Stripe => "stripe",
            Self::Sendgrid => "sendgrid",
            Self::Custom => "custom",
        }
    }
}

impl fmt::Display for UtilityProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UtilityProvider {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::UnknownProvider(s.to_string()))
    }
}

/// How a tool authenticates against its API.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMethod {
    #[default]
    None,
    ApiKey,
    #[serde(rename = "oauth")]
    OAuth,
}

/// How an API key is injected into the outbound request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiKeyScheme {
    /// `Authorization: Bearer <key>`
    Bearer,
    /// `Authorization: Basic base64(<key>:)`
    BasicUser,
    /// `Authorization: Basic base64(:<key>)`
    BasicPass,
    /// `<header_name>: <key>`
    Header,
}

/// Identifier of a required secret or action confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SecretKey(String);

impl SecretKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this key is a boolean-like user acknowledgment rather than a
    /// secret value.
    pub fn is_action_confirmation(&self) -> bool {
        self.0.starts_with(ACTION_CONFIRMATION_PREFIX)
    }
}

impl fmt::Display for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SecretKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

/// Which secret supplies the API key and how it is sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiKeyDetails {
    pub secret_name: SecretKey,
    pub scheme: ApiKeyScheme,
    /// Header name, used only by [`ApiKeyScheme::Header`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header_name: Option<String>,
}

/// Accepted parameters of a tool.
///
/// Fields missing from `required` are optional even if listed in
/// `properties`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolSchema {
    #[serde(default)]
    pub properties: Map<String, Value>,
    #[serde(default)]
    pub required: Vec<String>,
}

/// HTTP method of a tool's API call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value rewrite applied to a query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryTransform {
    /// Arrays are sent as a single comma-joined value.
    JoinComma,
}

/// Target of a query-mapped parameter.
///
/// Written either as a bare key (`labels = "labels"`) or as a table
/// (`labels = { key = "labels", transform = "join_comma" }`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueryMapping {
    Key(String),
    Detailed {
        key: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        transform: Option<QueryTransform>,
    },
}

impl QueryMapping {
    pub fn key(&self) -> &str {
        match self {
            Self::Key(key) | Self::Detailed { key, .. } => key,
        }
    }

    pub fn transform(&self) -> Option<QueryTransform> {
        match self {
            Self::Key(_) => None,
            Self::Detailed { transform, .. } => *transform,
        }
    }
}

/// Where each parameter goes in the outbound request.
///
/// Every map is keyed by parameter name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamMappings {
    /// Parameter → `{placeholder}` in the path template.
    #[serde(default)]
    pub path: BTreeMap<String, String>,
    /// Parameter → query key (and transform).
    #[serde(default)]
    pub query: BTreeMap<String, QueryMapping>,
    /// Parameter → field of the flat JSON body.
    #[serde(default)]
    pub body: BTreeMap<String, String>,
}

/// The API operation a tool wraps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiDetails {
    pub method: HttpMethod,
    pub base_url: String,
    #[serde(default)]
    pub path_template: String,
    #[serde(default)]
    pub param_mappings: ParamMappings,
    #[serde(default)]
    pub static_headers: BTreeMap<String, String>,
    /// JSON pointer selecting the part of a successful response to return.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_pointer: Option<String>,
}

/// Immutable description of one external tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolConfig {
    pub id: String,
    #[serde(default)]
    pub description: String,
    pub utility_provider: UtilityProvider,
    #[serde(default)]
    pub auth_method: AuthMethod,
    #[serde(default)]
    pub required_secrets: Vec<SecretKey>,
    #[serde(default)]
    pub required_scopes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key_details: Option<ApiKeyDetails>,
    #[serde(default)]
    pub schema: ToolSchema,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_details: Option<ApiDetails>,
}

impl ToolConfig {
    /// Check the invariants every catalog entry must hold.
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(self.invalid("tool id must not be empty"));
        }

        let mut seen = BTreeSet::new();
        if let Some(key) = self.required_secrets.iter().find(|k| !seen.insert(*k)) {
            return Err(self.invalid(format!("required secret '{key}' is listed twice")));
        }

        if self.auth_method != AuthMethod::OAuth && !self.required_scopes.is_empty() {
            return Err(self.invalid("required_scopes is only allowed for oauth tools"));
        }

        match self.auth_method {
            AuthMethod::None => {}
            AuthMethod::OAuth => {
                if self.required_scopes.is_empty() {
                    return Err(self.invalid("oauth tools must declare required_scopes"));
                }
            }
            AuthMethod::ApiKey => {
                let Some(details) = &self.api_key_details else {
                    return Err(self.invalid("api_key tools must declare api_key_details"));
                };
                if !self.required_secrets.contains(&details.secret_name) {
                    return Err(self.invalid(format!(
                        "api key secret '{}' is not listed in required_secrets",
                        details.secret_name
                    )));
                }
                if details.scheme == ApiKeyScheme::Header
                    && details.header_name.as_deref().is_none_or(str::is_empty)
                {
                    return Err(self.invalid("header scheme requires header_name"));
                }
            }
        }

        if let Some(api) = &self.api_details {
            if api.base_url.trim().is_empty() {
                return Err(self.invalid("api_details.base_url must not be empty"));
            }
            for (param, placeholder) in &api.param_mappings.path {
                if !api.path_template.contains(&format!("{{{placeholder}}}")) {
                    return Err(self.invalid(format!(
                        "path parameter '{param}' maps to '{{{placeholder}}}' which is not in the path template"
                    )));
                }
            }
        }

        Ok(())
    }

    fn invalid(&self, reason: impl Into<String>) -> Error {
        Error::InvalidTool {
            id: self.id.clone(),
            reason: reason.into(),
        }
    }
}
