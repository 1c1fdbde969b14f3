use async_trait::async_trait;
use std::collections::HashMap;

use crate::credential::errors::StorageError;

/// Process-local store; the default for tests and single-process clients
#[derive(Debug, Default)]
pub struct InMemoryCredentialStore {
    pub(super) entry: HashMap<String, String>,
}

/// Store backed by one Redis hash per namespace
#[derive(Debug, Clone)]
pub struct RedisCredentialStore {
    pub(super) client: redis::Client,
    pub(super) namespace: String,
}

/// Persisted key-value storage for credential envelopes.
///
/// Implementations only ever see ciphertext; sealing and opening is done by
/// [`CredentialVault`](crate::CredentialVault).
#[async_trait]
pub trait CredentialStore: Send + Sync + 'static {
    /// Initialize the store. This is called when the store is created.
    async fn init(&self) -> Result<(), StorageError>;

    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing what was there.
    async fn put(&mut self, key: &str, value: String) -> Result<(), StorageError>;

    /// Store several entries in one write, so no reader sees only some of them.
    async fn put_many(&mut self, entries: Vec<(String, String)>) -> Result<(), StorageError>;

    async fn remove(&mut self, key: &str) -> Result<(), StorageError>;

    /// Remove every entry this store holds.
    async fn clear(&mut self) -> Result<(), StorageError>;
}
