use async_trait::async_trait;
use std::collections::HashMap;

use crate::credential::errors::StorageError;

use super::types::{CredentialStore, InMemoryCredentialStore};

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        tracing::info!("Creating new in-memory credential store");
        Self {
            entry: HashMap::new(),
        }
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn init(&self) -> Result<(), StorageError> {
        Ok(()) // Nothing to initialize for in-memory store
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entry.get(key).cloned())
    }

    async fn put(&mut self, key: &str, value: String) -> Result<(), StorageError> {
        self.entry.insert(key.to_string(), value);
        Ok(())
    }

    async fn put_many(&mut self, entries: Vec<(String, String)>) -> Result<(), StorageError> {
        self.entry.extend(entries);
        Ok(())
    }

    async fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.entry.remove(key);
        Ok(())
    }

    async fn clear(&mut self) -> Result<(), StorageError> {
        self.entry.clear();
        Ok(())
    }
}
