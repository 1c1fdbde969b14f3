use thiserror::Error;

use crate::utils::UtilError;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CipherError {
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("Encryption failed")]
    Seal,

    /// Wrong key, tampered envelope or truncated data
    #[error("Decryption failed")]
    Open,

    #[error("Malformed envelope: {0}")]
    Envelope(String),
}

impl From<UtilError> for CipherError {
    fn from(err: UtilError) -> Self {
        Self::Envelope(err.to_string())
    }
}

#[derive(Debug, Error, Clone)]
pub enum StorageError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Unsupported store type: {0}")]
    UnsupportedType(String),
}

impl From<redis::RedisError> for StorageError {
    fn from(err: redis::RedisError) -> Self {
        Self::Storage(err.to_string())
    }
}

#[derive(Debug, Error, Clone)]
pub enum CredentialError {
    #[error("Cipher error: {0}")]
    Cipher(#[from] CipherError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}
