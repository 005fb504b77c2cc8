//! OAuth authorization checks.

use crate::credentials::SecretString;
use crate::{EngineError, Result};
use catalog::UtilityProvider;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::future::Future;
use thiserror::Error;

/// Failures of the OAuth backend itself, as opposed to "not authorized".
#[derive(Debug, Error)]
pub enum OAuthError {
    #[error("oauth backend unavailable: {0}")]
    Unavailable(String),

    #[error("no authorization endpoint configured for {0}")]
    NoAuthorizeUrl(UtilityProvider),
}

/// A credential held by the user for a provider.
#[derive(Debug, Clone, Default)]
pub struct OAuthCredential {
    pub access_token: Option<SecretString>,
    pub scopes: Vec<String>,
}

/// What the OAuth backend reports for a user, provider and scope set.
#[derive(Debug, Clone, Default)]
pub struct AuthStatus {
    pub has_auth: bool,
    pub authorization_url: Option<String>,
    pub credentials: Vec<OAuthCredential>,
}

/// Backend that knows which users have authorized which scopes.
pub trait OAuthBackend: Send + Sync {
    fn check_auth(
        &self,
        user_id: &str,
        provider: UtilityProvider,
        scopes: &[String],
    ) -> impl Future<Output = std::result::Result<AuthStatus, OAuthError>> + Send;
}

/// Result of an authorization check.
#[derive(Debug, Clone)]
pub enum Authorization {
    Authorized { access_token: SecretString },
    Unauthorized { authorization_url: String },
}

/// Ask the backend whether the user has authorized `scopes`.
///
/// Backend failures and contract violations (authorized without a token,
/// unauthorized without a URL) are errors rather than setup guidance.
pub async fn check_authorization<O: OAuthBackend>(
    backend: &O,
    user_id: &str,
    provider: UtilityProvider,
    scopes: &[String],
) -> Result<Authorization> {
    let status = backend.check_auth(user_id, provider, scopes).await?;

    if status.has_auth {
        let access_token = status
            .credentials
            .into_iter()
            .find_map(|c| c.access_token.filter(|t| !t.expose().is_empty()))
            .ok_or_else(|| {
                EngineError::OAuthContract(format!(
                    "{provider} reported authorization without an access token"
                ))
            })?;
        return Ok(Authorization::Authorized { access_token });
    }

    match status.authorization_url {
        Some(authorization_url) if !authorization_url.is_empty() => {
            Ok(Authorization::Unauthorized { authorization_url })
        }
        _ => Err(EngineError::OAuthContract(format!(
            "{provider} reported no authorization and no authorization url"
        ))),
    }
}

/// A pre-granted token for one provider.
#[derive(Debug, Clone, Deserialize)]
pub struct OAuthGrant {
    /// User the grant belongs to; `None` applies to every user.
    #[serde(default)]
    pub user: Option<String>,
    pub access_token: SecretString,
    #[serde(default)]
    pub scopes: Vec<String>,
}

/// OAuth settings for one provider.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OAuthProviderConfig {
    /// Authorization URL template. `{provider}`, `{scopes}` and `{user}` are
    /// replaced with percent-encoded values.
    #[serde(default)]
    pub authorize_url: Option<String>,
    #[serde(default)]
    pub grants: Vec<OAuthGrant>,
}

/// OAuth backend answering from configured grants.
#[derive(Debug, Clone, Default)]
pub struct StaticOAuthBackend {
    providers: BTreeMap<String, OAuthProviderConfig>,
}

impl StaticOAuthBackend {
    /// Build from per-provider settings keyed by provider name.
    pub fn new(providers: BTreeMap<String, OAuthProviderConfig>) -> Self {
        Self { providers }
    }

    fn grant(
        &self,
        user_id: &str,
        provider: UtilityProvider,
        scopes: &[String],
    ) -> Option<&OAuthGrant> {
        self.providers.get(provider.as_str())?.grants.iter().find(|g| {
            g.user.as_deref().is_none_or(|u| u == user_id)
                && scopes.iter().all(|s| g.scopes.contains(s))
        })
    }

    fn authorization_url(
        &self,
        user_id: &str,
        provider: UtilityProvider,
        scopes: &[String],
    ) -> Option<String> {
        let template = self.providers.get(provider.as_str())?.authorize_url.as_deref()?;
        Some(
            template
                .replace("{provider}", &urlencoding::encode(provider.as_str()))
                .replace("{scopes}", &urlencoding::encode(&scopes.join(" ")))
                .replace("{user}", &urlencoding::encode(user_id)),
        )
    }
}

impl OAuthBackend for StaticOAuthBackend {
    async fn check_auth(
        &self,
        user_id: &str,
        provider: UtilityProvider,
        scopes: &[String],
    ) -> std::result::Result<AuthStatus, OAuthError> {
        if let Some(grant) = self.grant(user_id, provider, scopes) {
            return Ok(AuthStatus {
                has_auth: true,
                authorization_url: None,
                credentials: vec![OAuthCredential {
                    access_token: Some(grant.access_token.clone()),
                    scopes: grant.scopes.clone(),
                }],
            });
        }

        let url = self
            .authorization_url(user_id, provider, scopes)
            .ok_or(OAuthError::NoAuthorizeUrl(provider))?;
        Ok(AuthStatus {
            has_auth: false,
            authorization_url: Some(url),
            credentials: Vec::new(),
        })
    }
}
