//! Fakes and fixtures shared by the unit tests.

use crate::oauth::{AuthStatus, OAuthBackend, OAuthCredential, OAuthError};
use crate::request::HttpRequest;
use crate::transport::{HttpResponse, HttpTransport, TransportError};
use catalog::{
    ApiDetails, ApiKeyDetails, ApiKeyScheme, AuthMethod, HttpMethod, ParamMappings, SecretKey,
    ToolConfig, ToolSchema, UtilityProvider,
};
use serde_json::{Value, json};
use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use vault::{MemorySecretStore, SecretStore};

/// `send_email`: API key with bearer scheme, body mapping, no path params.
pub fn api_key_tool() -> ToolConfig {
    ToolConfig {
        id: "send_email".into(),
        description: "Send an email".into(),
        utility_provider: UtilityProvider::Sendgrid,
        auth_method: AuthMethod::ApiKey,
        required_secrets: vec![SecretKey::new("api_key")],
        required_scopes: Vec::new(),
        api_key_details: Some(ApiKeyDetails {
            secret_name: SecretKey::new("api_key"),
            scheme: ApiKeyScheme::Bearer,
            header_name: None,
        }),
        schema: ToolSchema {
            properties: json!({
                "to": { "type": "string", "format": "email" },
                "subject": { "type": "string" }
            })
            .as_object()
            .cloned()
            .unwrap_or_default(),
            required: vec!["to".into()],
        },
        api_details: Some(ApiDetails {
            method: HttpMethod::Post,
            base_url: "https://mail.example/api".into(),
            path_template: "/send".into(),
            param_mappings: ParamMappings {
                body: BTreeMap::from([
                    ("to".into(), "recipient".into()),
                    ("subject".into(), "subj".into()),
                ]),
                ..Default::default()
            },
            static_headers: BTreeMap::new(),
            response_pointer: None,
        }),
    }
}

/// `list_repos`: OAuth with one scope and a path parameter.
pub fn oauth_tool() -> ToolConfig {
    ToolConfig {
        id: "list_repos".into(),
        description: "List a user's repositories".into(),
        utility_provider: UtilityProvider::Github,
        auth_method: AuthMethod::OAuth,
        required_secrets: Vec::new(),
        required_scopes: vec!["repo".into()],
        api_key_details: None,
        schema: ToolSchema {
            properties: json!({ "repoOwner": { "type": "string" } })
                .as_object()
                .cloned()
                .unwrap_or_default(),
            required: vec!["repoOwner".into()],
        },
        api_details: Some(ApiDetails {
            method: HttpMethod::Get,
            base_url: "https://api.github.example".into(),
            path_template: "/users/{uid}/repos".into(),
            param_mappings: ParamMappings {
                path: BTreeMap::from([("repoOwner".into(), "uid".into())]),
                ..Default::default()
            },
            static_headers: BTreeMap::from([("Accept".into(), "application/json".into())]),
            response_pointer: None,
        }),
    }
}

type OAuthCall = (String, UtilityProvider, Vec<String>);

enum OAuthScript {
    Status(AuthStatus),
    Fail(String),
    Unused,
}

/// OAuth backend with a fixed answer that records its calls.
pub struct ScriptedOAuth {
    script: OAuthScript,
    calls: Mutex<Vec<OAuthCall>>,
}

impl ScriptedOAuth {
    fn new(script: OAuthScript) -> Self {
        Self {
            script,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn status(status: AuthStatus) -> Self {
        Self::new(OAuthScript::Status(status))
    }

    pub fn authorized(token: &str) -> Self {
        Self::status(AuthStatus {
            has_auth: true,
            authorization_url: None,
            credentials: vec![OAuthCredential {
                access_token: Some(token.into()),
                scopes: Vec::new(),
            }],
        })
    }

    pub fn unauthorized(url: &str) -> Self {
        Self::status(AuthStatus {
            has_auth: false,
            authorization_url: Some(url.into()),
            credentials: Vec::new(),
        })
    }

    pub fn failing(reason: &str) -> Self {
        Self::new(OAuthScript::Fail(reason.into()))
    }

    /// Panics if consulted.
    pub fn unused() -> Self {
        Self::new(OAuthScript::Unused)
    }

    pub fn calls(&self) -> Vec<OAuthCall> {
        self.calls.lock().unwrap().clone()
    }
}

impl OAuthBackend for ScriptedOAuth {
    async fn check_auth(
        &self,
        user_id: &str,
        provider: UtilityProvider,
        scopes: &[String],
    ) -> Result<AuthStatus, OAuthError> {
        self.calls
            .lock()
            .unwrap()
            .push((user_id.to_string(), provider, scopes.to_vec()));
        match &self.script {
            OAuthScript::Status(status) => Ok(status.clone()),
            OAuthScript::Fail(reason) => Err(OAuthError::Unavailable(reason.clone())),
            OAuthScript::Unused => panic!("oauth backend should not be consulted"),
        }
    }
}

enum Reply {
    Response(HttpResponse),
    Unreachable,
    TimedOut,
}

/// Transport returning a canned reply and recording every request.
#[derive(Clone)]
pub struct RecordingTransport {
    reply: Arc<Mutex<VecDeque<Reply>>>,
    requests: Arc<Mutex<Vec<(HttpRequest, Duration)>>>,
}

impl RecordingTransport {
    fn with_reply(reply: Reply) -> Self {
        Self {
            reply: Arc::new(Mutex::new(VecDeque::from([reply]))),
            requests: Arc::default(),
        }
    }

    pub fn responding(status: u16, body: Value) -> Self {
        Self::with_reply(Reply::Response(HttpResponse { status, body }))
    }

    pub fn unreachable() -> Self {
        Self::with_reply(Reply::Unreachable)
    }

    pub fn timing_out() -> Self {
        Self::with_reply(Reply::TimedOut)
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|(r, _)| r.clone())
            .collect()
    }

    pub fn timeouts(&self) -> Vec<Duration> {
        self.requests.lock().unwrap().iter().map(|(_, t)| *t).collect()
    }
}

impl HttpTransport for RecordingTransport {
    async fn send(
        &self,
        request: &HttpRequest,
        timeout: Duration,
    ) -> Result<HttpResponse, TransportError> {
        self.requests.lock().unwrap().push((request.clone(), timeout));
        match self.reply.lock().unwrap().pop_front() {
            Some(Reply::Response(response)) => Ok(response),
            Some(Reply::Unreachable) => Err(TransportError::Unreachable {
                url: request.url.clone(),
                reason: "connection refused".into(),
            }),
            Some(Reply::TimedOut) => Err(TransportError::TimedOut {
                url: request.url.clone(),
                timeout,
            }),
            None => panic!("transport called more than once"),
        }
    }
}

/// Secret store that fails for one key and delegates the rest.
pub struct FlakySecretStore {
    inner: MemorySecretStore,
    failing_key: String,
}

impl FlakySecretStore {
    pub fn new(inner: MemorySecretStore, failing_key: &str) -> Self {
        Self {
            inner,
            failing_key: failing_key.to_string(),
        }
    }
}

impl SecretStore for FlakySecretStore {
    async fn get(&self, user_id: &str, provider: &str, key: &str) -> vault::Result<Option<String>> {
        if key == self.failing_key {
            return Err(vault::Error::Unavailable("backend timeout".into()));
        }
        self.inner.get(user_id, provider, key).await
    }

    async fn set(
        &self,
        user_id: &str,
        provider: &str,
        key: &str,
        value: &str,
    ) -> vault::Result<()> {
        self.inner.set(user_id, provider, key, value).await
    }

    async fn delete(&self, user_id: &str, provider: &str, key: &str) -> vault::Result<bool> {
        self.inner.delete(user_id, provider, key).await
    }
}
