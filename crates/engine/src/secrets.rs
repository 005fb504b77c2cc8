//! Secret resolution against the secret store.

use catalog::{SecretKey, UtilityProvider};
use futures::future::join_all;
use std::collections::BTreeMap;
use tracing::warn;
use vault::SecretStore;

/// Stored value of an acknowledged action confirmation.
pub const CONFIRMED: &str = "true";

/// Outcome of looking up a set of secrets. `None` marks a key as missing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedSecrets(BTreeMap<SecretKey, Option<String>>);

impl ResolvedSecrets {
    /// The resolved value of a key, if present.
    pub fn value(&self, key: &SecretKey) -> Option<&str> {
        self.0.get(key).and_then(Option::as_deref)
    }

    /// Whether a key was requested and could not be satisfied.
    pub fn is_missing(&self, key: &SecretKey) -> bool {
        matches!(self.0.get(key), Some(None))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Fetch every requested secret for a user.
///
/// Lookups run concurrently and fail independently: a store error or a
/// missing value leaves only that key unresolved. An action confirmation
/// counts as resolved only when its stored value is exactly `"true"`.
pub async fn fetch_secrets<S: SecretStore>(
    store: &S,
    user_id: &str,
    provider: UtilityProvider,
    keys: &[SecretKey],
) -> ResolvedSecrets {
    let lookups = keys.iter().map(|key| async move {
        let value = match store.get(user_id, provider.as_str(), key.as_str()).await {
            Ok(value) => value,
            Err(e) => {
                warn!(%provider, %key, error = %e, "secret lookup failed; treating as missing");
                None
            }
        };
        let value = value.filter(|v| !key.is_action_confirmation() || v == CONFIRMED);
        (key.clone(), value)
    });

    ResolvedSecrets(join_all(lookups).await.into_iter().collect())
}
