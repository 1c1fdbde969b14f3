use std::sync::Arc;
use tokio::sync::Mutex;

use super::cipher::EnvelopeCipher;
use super::errors::CredentialError;
use super::store::{CredentialStore, InMemoryCredentialStore};

/// Storage key of the access token envelope
pub const ACCESS_TOKEN_KEY: &str = "token";
/// Storage key of the refresh token envelope
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";

/// Stored envelopes that belong together
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct CredentialSnapshot {
    pub(crate) access_envelope: Option<String>,
    pub(crate) refresh_envelope: Option<String>,
}

/// Encrypted credential storage shared by every clone.
///
/// Values are sealed before they reach the underlying [`CredentialStore`]
/// and opened after they leave it, so the store only ever holds envelopes.
#[derive(Clone)]
pub struct CredentialVault {
    store: Arc<Mutex<Box<dyn CredentialStore>>>,
    cipher: Arc<EnvelopeCipher>,
}

impl std::fmt::Debug for CredentialVault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialVault")
            .field("cipher", &self.cipher)
            .finish_non_exhaustive()
    }
}

impl CredentialVault {
    pub fn new(store: Box<dyn CredentialStore>, cipher: EnvelopeCipher) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
            cipher: Arc::new(cipher),
        }
    }

    pub fn in_memory(cipher: EnvelopeCipher) -> Self {
        Self::new(Box::new(InMemoryCredentialStore::new()), cipher)
    }

    /// Seal `plaintext` and store the envelope under `key`.
    pub async fn encrypt_and_store(&self, key: &str, plaintext: &str) -> Result<(), CredentialError> {
        let envelope = self.cipher.seal(plaintext)?;
        self.store.lock().await.put(key, envelope).await?;
        tracing::debug!("Stored credential envelope for key: {}", key);
        Ok(())
    }

    /// Store a value that the caller already sealed.
    ///
    /// The envelope must open under one of the configured keys. It is re-sealed
    /// under the primary key before storing, which also migrates envelopes
    /// produced with a previous secret.
    pub async fn store_sealed(&self, key: &str, envelope: &str) -> Result<(), CredentialError> {
        let plaintext = self.cipher.open(envelope)?;
        self.encrypt_and_store(key, &plaintext).await
    }

    /// Read and open the envelope under `key`.
    ///
    /// `Ok(None)` when nothing is stored. An envelope that does not open is an
    /// error; it is never returned as-is.
    pub async fn get_and_decrypt(&self, key: &str) -> Result<Option<String>, CredentialError> {
        let envelope = self.store.lock().await.get(key).await?;
        match envelope {
            Some(envelope) => Ok(Some(self.cipher.open(&envelope)?)),
            None => Ok(None),
        }
    }

    /// Raw envelope under `key`, without opening it
    pub(crate) async fn envelope(&self, key: &str) -> Result<Option<String>, CredentialError> {
        Ok(self.store.lock().await.get(key).await?)
    }

    pub(crate) fn open_envelope(&self, envelope: &str) -> Result<String, CredentialError> {
        Ok(self.cipher.open(envelope)?)
    }

    pub async fn store_credentials(&self, access: &str, refresh: &str) -> Result<(), CredentialError> {
        let entries = vec![
            (ACCESS_TOKEN_KEY.to_string(), self.cipher.seal(access)?),
            (REFRESH_TOKEN_KEY.to_string(), self.cipher.seal(refresh)?),
        ];
        self.store.lock().await.put_many(entries).await?;
        Ok(())
    }

    /// Both envelopes as stored at one instant, read under a single lock
    pub(crate) async fn snapshot(&self) -> Result<CredentialSnapshot, CredentialError> {
        let store = self.store.lock().await;
        Ok(CredentialSnapshot {
            access_envelope: store.get(ACCESS_TOKEN_KEY).await?,
            refresh_envelope: store.get(REFRESH_TOKEN_KEY).await?,
        })
    }

    /// Drop the entry under `key`
    pub async fn remove(&self, key: &str) -> Result<(), CredentialError> {
        self.store.lock().await.remove(key).await?;
        tracing::debug!("Removed credential envelope for key: {}", key);
        Ok(())
    }

    pub async fn access_token(&self) -> Result<Option<String>, CredentialError> {
        self.get_and_decrypt(ACCESS_TOKEN_KEY).await
    }

    pub async fn refresh_token(&self) -> Result<Option<String>, CredentialError> {
        self.get_and_decrypt(REFRESH_TOKEN_KEY).await
    }

    /// Drop every stored credential
    pub async fn clear_all(&self) -> Result<(), CredentialError> {
        self.store.lock().await.clear().await?;
        tracing::debug!("Cleared all stored credentials");
        Ok(())
    }
}
