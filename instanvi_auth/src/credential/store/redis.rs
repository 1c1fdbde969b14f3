use async_trait::async_trait;
use redis::{self, AsyncCommands};

use crate::credential::errors::StorageError;

use super::types::{CredentialStore, RedisCredentialStore};

const STORE_PREFIX: &str = "credentials";

impl RedisCredentialStore {
    pub fn new(client: redis::Client, namespace: impl Into<String>) -> Self {
        Self {
            client,
            namespace: namespace.into(),
        }
    }

    fn hash_key(&self) -> String {
        format!("{STORE_PREFIX}:{}", self.namespace)
    }
}

#[async_trait]
impl CredentialStore for RedisCredentialStore {
    async fn init(&self) -> Result<(), StorageError> {
        // Verify the connection works
        let _conn = self.client.get_multiplexed_async_connection().await?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let value: Option<String> = conn.hget(self.hash_key(), key).await?;
        Ok(value)
    }

    async fn put(&mut self, key: &str, value: String) -> Result<(), StorageError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let _: () = conn.hset(self.hash_key(), key, value).await?;
        Ok(())
    }

    async fn put_many(&mut self, entries: Vec<(String, String)>) -> Result<(), StorageError> {
        if entries.is_empty() {
            return Ok(());
        }
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        // A single HSET with several fields is applied atomically
        let _: () = conn.hset_multiple(self.hash_key(), &entries).await?;
        Ok(())
    }

    async fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let _: () = conn.hdel(self.hash_key(), key).await?;
        Ok(())
    }

    async fn clear(&mut self) -> Result<(), StorageError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let _: () = conn.del(self.hash_key()).await?;
        Ok(())
    }
}
