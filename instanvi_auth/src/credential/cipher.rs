//! Symmetric envelope encryption for stored credentials
//!
//! Envelope layout: `base64url(nonce || ciphertext || tag)` using AES-256-GCM.
//! The 256-bit key is derived from the configured secret with HMAC-SHA256, so
//! secrets of any length can be used.

use hmac::{Hmac, Mac};
use ring::aead::{AES_256_GCM, Aad, LessSafeKey, NONCE_LEN, Nonce, UnboundKey};
use sha2::Sha256;

use crate::utils::{base64url_decode, base64url_encode, fill_random};

use super::errors::CipherError;

type HmacSha256 = Hmac<Sha256>;

const KEY_DERIVATION_LABEL: &[u8] = b"instanvi-auth/credential-envelope/v1";

pub struct EnvelopeCipher {
    primary: LessSafeKey,
    /// Decrypt-only keys from retired secrets, tried in order after `primary`
    previous: Vec<LessSafeKey>,
}

impl std::fmt::Debug for EnvelopeCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnvelopeCipher")
            .field("previous_keys", &self.previous.len())
            .finish_non_exhaustive()
    }
}

impl EnvelopeCipher {
    pub fn new(secret: &str) -> Result<Self, CipherError> {
        Ok(Self {
            primary: derive_key(secret)?,
            previous: Vec::new(),
        })
    }

    /// Also accept envelopes sealed under retired secrets
    pub fn with_previous_secrets<I, S>(mut self, secrets: I) -> Result<Self, CipherError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for secret in secrets {
            self.previous.push(derive_key(secret.as_ref())?);
        }
        Ok(self)
    }

    pub fn seal(&self, plaintext: &str) -> Result<String, CipherError> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        fill_random(&mut nonce_bytes).map_err(|_| CipherError::Seal)?;
        let nonce = Nonce::assume_unique_for_key(nonce_bytes);

        let mut in_out = plaintext.as_bytes().to_vec();
        self.primary
            .seal_in_place_append_tag(nonce, Aad::empty(), &mut in_out)
            .map_err(|_| CipherError::Seal)?;

        let mut envelope = Vec::with_capacity(NONCE_LEN + in_out.len());
        envelope.extend_from_slice(&nonce_bytes);
        envelope.extend_from_slice(&in_out);
        Ok(base64url_encode(&envelope))
    }

    pub fn open(&self, envelope: &str) -> Result<String, CipherError> {
        let payload = base64url_decode(envelope.trim())?;
        if payload.len() < NONCE_LEN + AES_256_GCM.tag_len() {
            return Err(CipherError::Envelope("Envelope too short".to_string()));
        }
        let (nonce_bytes, sealed) = payload.split_at(NONCE_LEN);

        for key in std::iter::once(&self.primary).chain(self.previous.iter()) {
            if let Ok(plaintext) = open_with(key, nonce_bytes, sealed) {
                return String::from_utf8(plaintext)
                    .map_err(|_| CipherError::Envelope("Plaintext is not UTF-8".to_string()));
            }
        }

        Err(CipherError::Open)
    }
}

fn derive_key(secret: &str) -> Result<LessSafeKey, CipherError> {
    if secret.is_empty() {
        return Err(CipherError::InvalidKey("Secret must not be empty".to_string()));
    }

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| CipherError::InvalidKey(e.to_string()))?;
    mac.update(KEY_DERIVATION_LABEL);
    let key_bytes = mac.finalize().into_bytes();

    let unbound = UnboundKey::new(&AES_256_GCM, &key_bytes)
        .map_err(|_| CipherError::InvalidKey("Derived key rejected".to_string()))?;
    Ok(LessSafeKey::new(unbound))
}

fn open_with(key: &LessSafeKey, nonce_bytes: &[u8], sealed: &[u8]) -> Result<Vec<u8>, CipherError> {
    let nonce = Nonce::try_assume_unique_for_key(nonce_bytes).map_err(|_| CipherError::Open)?;
    let mut in_out = sealed.to_vec();
    let plaintext = key
        .open_in_place(nonce, Aad::empty(), &mut in_out)
        .map_err(|_| CipherError::Open)?;
    Ok(plaintext.to_vec())
}
