//! Prerequisite checking: secrets, action confirmations and OAuth.

use crate::credentials::{Credentials, SecretString};
use crate::oauth::{Authorization, OAuthBackend, check_authorization};
use crate::outcome::SetupNeeded;
use crate::secrets::fetch_secrets;
use crate::Result;
use catalog::{AuthMethod, SecretKey, ToolConfig};
use vault::SecretStore;

/// Whether a tool may run for a user.
#[derive(Debug, Clone)]
pub enum PrerequisiteResult {
    Met(Credentials),
    Unmet(SetupNeeded),
}

/// Check every prerequisite of `tool` for `user_id`.
///
/// An unauthorized OAuth tool is reported on its own: the setup response
/// then carries only the authorization URL, even when secrets are missing
/// too.
pub async fn check_prerequisites<S, O>(
    tool: &ToolConfig,
    user_id: &str,
    secrets: &S,
    oauth: &O,
) -> Result<PrerequisiteResult>
where
    S: SecretStore,
    O: OAuthBackend,
{
    tool.validate()?;

    let mut credentials = Credentials::default();
    let mut missing_secrets = Vec::new();
    let mut missing_confirmations = Vec::new();

    if !tool.required_secrets.is_empty() {
        let resolved =
            fetch_secrets(secrets, user_id, tool.utility_provider, &tool.required_secrets).await;

        for key in &tool.required_secrets {
            if resolved.value(key).is_some() {
                continue;
            }
            if key.is_action_confirmation() {
                missing_confirmations.push(key.clone());
            } else {
                missing_secrets.push(key.clone());
            }
        }

        if tool.auth_method == AuthMethod::ApiKey {
            credentials.api_key = tool
                .api_key_details
                .as_ref()
                .and_then(|details| resolved.value(&details.secret_name))
                .map(SecretString::from);
        }
    }

    if tool.auth_method == AuthMethod::OAuth {
        match check_authorization(oauth, user_id, tool.utility_provider, &tool.required_scopes)
            .await?
        {
            Authorization::Unauthorized { authorization_url } => {
                return Ok(PrerequisiteResult::Unmet(oauth_setup(tool, authorization_url)));
            }
            Authorization::Authorized { access_token } => {
                credentials.oauth_token = Some(access_token);
            }
        }
    }

    if missing_secrets.is_empty() && missing_confirmations.is_empty() {
        Ok(PrerequisiteResult::Met(credentials))
    } else {
        Ok(PrerequisiteResult::Unmet(secrets_setup(
            tool,
            missing_secrets,
            missing_confirmations,
        )))
    }
}

fn oauth_setup(tool: &ToolConfig, authorization_url: String) -> SetupNeeded {
    SetupNeeded {
        title: format!("Connect {}", tool.utility_provider),
        description: format!(
            "Authorize access to your {} account ({}) to use {}.",
            tool.utility_provider,
            tool.required_scopes.join(", "),
            tool.id
        ),
        required_secret_inputs: Vec::new(),
        required_action_confirmations: Vec::new(),
        oauth_authorization_url: Some(authorization_url),
    }
}

fn secrets_setup(
    tool: &ToolConfig,
    secrets: Vec<SecretKey>,
    confirmations: Vec<SecretKey>,
) -> SetupNeeded {
    let mut steps = Vec::new();
    if !secrets.is_empty() {
        steps.push(format!("provide {}", list(&secrets)));
    }
    if !confirmations.is_empty() {
        steps.push(format!("confirm {}", list(&confirmations)));
    }

    SetupNeeded {
        title: format!("Set up {}", tool.id),
        description: format!("Before {} can run, {}.", tool.id, steps.join(" and ")),
        required_secret_inputs: secrets,
        required_action_confirmations: confirmations,
        oauth_authorization_url: None,
    }
}

fn list(keys: &[SecretKey]) -> String {
    keys.iter().map(SecretKey::as_str).collect::<Vec<_>>().join(", ")
}
