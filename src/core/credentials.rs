//! Credential Store
//!
//! Source of the credential snapshot used to sign each request. Reading is
//! an await point: implementations may live behind their own executor or
//! lock, distinct from the network path.

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::types::Credential;

/// Credential source interface.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Current credential snapshot, if the account has one.
    async fn credential(&self) -> Option<Credential>;
}

/// In-memory credential store.
///
/// Readers clone a whole snapshot, so a concurrent update is observed either
/// entirely or not at all. Updates are last-write-wins.
#[derive(Default)]
pub struct InMemoryCredentialStore {
    current: RwLock<Option<Credential>>,
}

impl InMemoryCredentialStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding `credential`.
    pub fn with_credential(credential: impl Into<Credential>) -> Self {
        Self {
            current: RwLock::new(Some(credential.into())),
        }
    }

    /// Replace the stored credential.
    pub async fn set(&self, credential: impl Into<Credential>) {
        *self.current.write().await = Some(credential.into());
    }

    /// Remove the stored credential, e.g. after logout.
    pub async fn clear(&self) {
        *self.current.write().await = None;
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn credential(&self) -> Option<Credential> {
        self.current.read().await.clone()
    }
}
