//! Encrypted-at-rest credential storage
//!
//! Access and refresh tokens are persisted only as envelopes sealed by
//! [`EnvelopeCipher`]. [`CredentialVault`] is the one place that reads and
//! writes them.

mod cipher;
mod errors;
mod store;
mod vault;

pub use cipher::EnvelopeCipher;
pub use errors::{CipherError, CredentialError, StorageError};
pub use store::{
    CredentialStore, InMemoryCredentialStore, RedisCredentialStore, credential_store_from_env,
};
pub use vault::{ACCESS_TOKEN_KEY, CredentialVault, REFRESH_TOKEN_KEY};
