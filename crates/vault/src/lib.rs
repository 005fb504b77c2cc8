//! Per-user secret storage.
//!
//! Tools declare the secrets and action confirmations they need; this crate
//! holds the values. A secret is addressed by the user it belongs to, the
//! provider it is for, and its key. Values are plain strings; action
//! confirmations are stored as `"true"` once acknowledged.
//!
//! # Example
//!
//! ```no_run
//! use vault::{SecretStore, SqliteSecretStore};
//!
//! # async fn example() -> vault::Result<()> {
//! let store = SqliteSecretStore::open("secrets.db")?;
//! store.set("user-1", "github", "token", "ghp_...").await?;
//!
//! let token = store.get("user-1", "github", "token").await?;
//! assert!(token.is_some());
//! # Ok(())
//! # }
//! ```

mod error;
mod store;

pub use error::{Error, Result};
pub use store::{MemorySecretStore, SecretEntry, SecretStore, SqliteSecretStore};
