use std::env;

use crate::credential::errors::StorageError;

use super::types::{CredentialStore, InMemoryCredentialStore, RedisCredentialStore};

const DEFAULT_NAMESPACE: &str = "default";

/// Build the credential store selected by `CREDENTIAL_STORE_TYPE`.
///
/// `memory` (the default) needs nothing else. `redis` reads
/// `CREDENTIAL_STORE_URL` and the optional `CREDENTIAL_STORE_NAMESPACE`, and
/// verifies the connection before returning.
pub async fn credential_store_from_env() -> Result<Box<dyn CredentialStore>, StorageError> {
    credential_store_from_lookup(|name| env::var(name).ok()).await
}

pub(crate) async fn credential_store_from_lookup<F>(
    lookup: F,
) -> Result<Box<dyn CredentialStore>, StorageError>
where
    F: Fn(&str) -> Option<String>,
{
    let store_type = lookup("CREDENTIAL_STORE_TYPE").unwrap_or_else(|| "memory".to_string());

    tracing::info!("Initializing credential store with type: {}", store_type);

    let store: Box<dyn CredentialStore> = match store_type.trim() {
        "memory" => Box::new(InMemoryCredentialStore::new()),
        "redis" => {
            let url = lookup("CREDENTIAL_STORE_URL").ok_or_else(|| {
                StorageError::Storage("CREDENTIAL_STORE_URL must be set for redis".to_string())
            })?;
            let namespace = lookup("CREDENTIAL_STORE_NAMESPACE")
                .filter(|ns| !ns.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_NAMESPACE.to_string());

            let client = redis::Client::open(url.as_str()).map_err(|e| {
                tracing::error!("Failed to create Redis client: {}", e);
                StorageError::from(e)
            })?;
            let store = RedisCredentialStore::new(client, namespace);
            if let Err(e) = store.init().await {
                tracing::error!("Failed to connect to Redis: {}", e);
                return Err(e);
            }
            Box::new(store)
        }
        other => return Err(StorageError::UnsupportedType(other.to_string())),
    };

    tracing::info!("Connected to credential store: type={}", store_type);

    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[tokio::test]
    async fn test_defaults_to_memory() {
        // Given no store configuration
        let lookup = lookup_from(&[]);

        // When building the store
        let mut store = credential_store_from_lookup(lookup).await.unwrap();

        // Then an in-memory store is usable right away
        store.put("token", "envelope".to_string()).await.unwrap();
        assert_eq!(
            store.get("token").await.unwrap(),
            Some("envelope".to_string())
        );
    }

    #[tokio::test]
    async fn test_unsupported_type() {
        let lookup = lookup_from(&[("CREDENTIAL_STORE_TYPE", "sqlite")]);
        let result = credential_store_from_lookup(lookup).await;
        assert!(matches!(result, Err(StorageError::UnsupportedType(t)) if t == "sqlite"));
    }

    #[tokio::test]
    async fn test_redis_requires_url() {
        let lookup = lookup_from(&[("CREDENTIAL_STORE_TYPE", "redis")]);
        let result = credential_store_from_lookup(lookup).await;
        assert!(matches!(result, Err(StorageError::Storage(msg)) if msg.contains("CREDENTIAL_STORE_URL")));
    }

    #[tokio::test]
    async fn test_redis_unreachable() {
        let lookup = lookup_from(&[
            ("CREDENTIAL_STORE_TYPE", "redis"),
            ("CREDENTIAL_STORE_URL", "redis://127.0.0.1:1"),
        ]);
        let result = credential_store_from_lookup(lookup).await;
        assert!(matches!(result, Err(StorageError::Storage(_))));
    }
}
