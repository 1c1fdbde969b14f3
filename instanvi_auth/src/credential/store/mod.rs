mod config;
mod memory;
mod redis;
mod types;

pub use config::credential_store_from_env;
pub use types::{CredentialStore, InMemoryCredentialStore, RedisCredentialStore};
