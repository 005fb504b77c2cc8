//! Secret store trait and implementations.

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use serde::Serialize;
use std::collections::HashMap;
use std::future::Future;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tokio::sync::RwLock;

/// Key-value storage for per-user secrets.
///
/// Values are addressed by `(user_id, provider, key)`. All three are opaque to
/// the store.
pub trait SecretStore: Send + Sync {
    /// Look up a secret. `Ok(None)` means it was never stored.
    fn get(
        &self,
        user_id: &str,
        provider: &str,
        key: &str,
    ) -> impl Future<Output = Result<Option<String>>> + Send;

    /// Store a secret, replacing any previous value.
    fn set(
        &self,
        user_id: &str,
        provider: &str,
        key: &str,
        value: &str,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Remove a secret. Returns whether anything was removed.
    fn delete(
        &self,
        user_id: &str,
        provider: &str,
        key: &str,
    ) -> impl Future<Output = Result<bool>> + Send;
}

/// Metadata about a stored secret. Never carries the value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SecretEntry {
    pub key: String,
    pub updated_at: DateTime<Utc>,
}

/// SQLite-backed secret store.
pub struct SqliteSecretStore {
    conn: Mutex<Connection>,
}

impl SqliteSecretStore {
    /// Open or create a secret store at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::with_connection(Connection::open(path)?)
    }

    /// Create an in-memory secret store (useful for testing).
    pub fn in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS secrets (
                user_id TEXT NOT NULL,
                provider TEXT NOT NULL,
                key TEXT NOT NULL,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                PRIMARY KEY (user_id, provider, key)
            );
            "#,
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| Error::Unavailable("connection lock poisoned".into()))
    }

    /// Read a secret value.
    pub fn read(&self, user_id: &str, provider: &str, key: &str) -> Result<Option<String>> {
        let value = self
            .conn()?
            .query_row(
                "SELECT value FROM secrets WHERE user_id = ?1 AND provider = ?2 AND key = ?3",
                params![user_id, provider, key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    /// Insert or replace a secret value.
    pub fn write(&self, user_id: &str, provider: &str, key: &str, value: &str) -> Result<()> {
        self.conn()?.execute(
            "INSERT INTO secrets (user_id, provider, key, value, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT (user_id, provider, key)
             DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![user_id, provider, key, value, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    /// Remove a secret value.
    pub fn remove(&self, user_id: &str, provider: &str, key: &str) -> Result<bool> {
        let removed = self.conn()?.execute(
            "DELETE FROM secrets WHERE user_id = ?1 AND provider = ?2 AND key = ?3",
            params![user_id, provider, key],
        )?;
        Ok(removed > 0)
    }

    /// List the keys stored for a user and provider, ordered by key.
    pub fn list_keys(&self, user_id: &str, provider: &str) -> Result<Vec<SecretEntry>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT key, updated_at FROM secrets
             WHERE user_id = ?1 AND provider = ?2 ORDER BY key",
        )?;

        let rows = stmt
            .query_map(params![user_id, provider], |row| {
                let key: String = row.get(0)?;
                let updated_at: String = row.get(1)?;
                Ok((key, updated_at))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        rows.into_iter()
            .map(|(key, updated_at)| -> Result<SecretEntry> {
                Ok(SecretEntry {
                    key,
                    updated_at: DateTime::parse_from_rfc3339(&updated_at)?.with_timezone(&Utc),
                })
            })
            .collect()
    }
}

impl SecretStore for SqliteSecretStore {
    async fn get(&self, user_id: &str, provider: &str, key: &str) -> Result<Option<String>> {
        self.read(user_id, provider, key)
    }

    async fn set(&self, user_id: &str, provider: &str, key: &str, value: &str) -> Result<()> {
        self.write(user_id, provider, key, value)
    }

    async fn delete(&self, user_id: &str, provider: &str, key: &str) -> Result<bool> {
        self.remove(user_id, provider, key)
    }
}

type SecretId = (String, String, String);

fn secret_id(user_id: &str, provider: &str, key: &str) -> SecretId {
    (user_id.to_string(), provider.to_string(), key.to_string())
}

/// In-memory secret store.
#[derive(Debug, Default)]
pub struct MemorySecretStore {
    secrets: RwLock<HashMap<SecretId, String>>,
}

impl MemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a store from `(user_id, provider, key, value)` tuples.
    pub fn with_secrets<'a>(
        entries: impl IntoIterator<Item = (&'a str, &'a str, &'a str, &'a str)>,
    ) -> Self {
        let secrets = entries
            .into_iter()
            .map(|(user, provider, key, value)| (secret_id(user, provider, key), value.to_string()))
            .collect();
        Self {
            secrets: RwLock::new(secrets),
        }
    }
}

impl SecretStore for MemorySecretStore {
    async fn get(&self, user_id: &str, provider: &str, key: &str) -> Result<Option<String>> {
        let secrets = self.secrets.read().await;
        Ok(secrets.get(&secret_id(user_id, provider, key)).cloned())
    }

    async fn set(&self, user_id: &str, provider: &str, key: &str, value: &str) -> Result<()> {
        let mut secrets = self.secrets.write().await;
        secrets.insert(secret_id(user_id, provider, key), value.to_string());
        Ok(())
    }

    async fn delete(&self, user_id: &str, provider: &str, key: &str) -> Result<bool> {
        let mut secrets = self.secrets.write().await;
        Ok(secrets.remove(&secret_id(user_id, provider, key)).is_some())
    }
}
