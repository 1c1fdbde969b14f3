use http::{Method, StatusCode, header::ACCEPT};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Mutex;
use url::Url;

use crate::config::ClientConfig;
use crate::credential::{ACCESS_TOKEN_KEY, CredentialStore, CredentialVault, EnvelopeCipher};

use super::errors::ApiError;
use super::types::RefreshOutcome;

/// Path of the token refresh endpoint, relative to the API base URL
pub const REFRESH_TOKEN_PATH: &str = "/auth/refresh_token/";

const JSON: &str = "application/json";

/// HTTP client for the back-office API.
///
/// Clones share the credential vault and the refresh lock, so concurrent
/// calls from any clone take part in the same single-flight refresh.
#[derive(Clone, Debug)]
pub struct ApiClient {
    pub(super) http: reqwest::Client,
    pub(super) config: Arc<ClientConfig>,
    pub(super) vault: CredentialVault,
    pub(super) refresh_lock: Arc<Mutex<()>>,
}

impl ApiClient {
    pub fn new(config: ClientConfig, vault: CredentialVault) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        tracing::debug!("Creating API client for {}", config.base_url);

        Ok(Self {
            http,
            config: Arc::new(config),
            vault,
            refresh_lock: Arc::new(Mutex::new(())),
        })
    }

    /// Client configured from the environment, storing credentials in `vault`
    pub fn from_env(vault: CredentialVault) -> Result<Self, ApiError> {
        Self::new(ClientConfig::from_env()?, vault)
    }

    /// Client and vault both built from `config`, on top of `store`
    pub fn with_store(
        config: ClientConfig,
        store: Box<dyn CredentialStore>,
    ) -> Result<Self, ApiError> {
        let cipher = EnvelopeCipher::new(&config.secret)?
            .with_previous_secrets(&config.previous_secrets)?;
        Self::new(config, CredentialVault::new(store, cipher))
    }

    pub fn vault(&self) -> &CredentialVault {
        &self.vault
    }

    /// Store freshly issued credentials
    pub async fn login(&self, access_token: &str, refresh_token: &str) -> Result<(), ApiError> {
        self.vault.store_credentials(access_token, refresh_token).await?;
        tracing::info!("Stored credentials after login");
        Ok(())
    }

    pub async fn logout(&self) -> Result<(), ApiError> {
        self.vault.clear_all().await?;
        tracing::info!("Cleared credentials on logout");
        Ok(())
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.request(Method::GET, path, None).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.request(Method::DELETE, path, None).await
    }

    pub async fn post<T, B>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(Method::POST, path, Some(encode_body(body)?))
            .await
    }

    pub async fn put<T, B>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(Method::PUT, path, Some(encode_body(body)?))
            .await
    }

    pub async fn patch<T, B>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(Method::PATCH, path, Some(encode_body(body)?))
            .await
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<T, ApiError> {
        let url = self.endpoint(path)?;

        let (access, sent_with) = self.credentials_for_call().await;
        let response = self
            .send(method.clone(), url.clone(), access.as_deref(), body.as_ref())
            .await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return read_response(response).await;
        }

        tracing::debug!("{} {} answered 401, recovering credentials", method, path);
        let refresh = self.recover(sent_with).await;

        if refresh == RefreshOutcome::Refreshed && self.config.retry_after_refresh {
            tracing::debug!("Retrying {} {} once after refresh", method, path);
            let (access, _) = self.credentials_for_call().await;
            let retried = self
                .send(method, url, access.as_deref(), body.as_ref())
                .await?;
            if retried.status() == StatusCode::UNAUTHORIZED {
                return Err(ApiError::Unauthorized { refresh });
            }
            return read_response(retried).await;
        }

        Err(ApiError::Unauthorized { refresh })
    }

    async fn send(
        &self,
        method: Method,
        url: Url,
        access: Option<&str>,
        body: Option<&Value>,
    ) -> Result<reqwest::Response, ApiError> {
        let mut builder = self.http.request(method, url).header(ACCEPT, JSON);

        if let Some(token) = access {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = body {
            builder = builder.json(body);
        }

        Ok(builder.send().await?)
    }

    /// The decrypted access token and the refresh envelope stored with it.
    ///
    /// Both come from one read of the vault. An access envelope that does not
    /// open is removed; the call then goes out without a token, comes back 401
    /// and takes the refresh path.
    pub(super) async fn credentials_for_call(&self) -> (Option<String>, Option<String>) {
        let snapshot = match self.vault.snapshot().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!("Failed to read stored credentials: {}", e);
                return (None, None);
            }
        };

        let opened = snapshot
            .access_envelope
            .as_deref()
            .map(|envelope| self.vault.open_envelope(envelope));
        let access = match opened {
            Some(Ok(token)) => Some(token),
            Some(Err(e)) => {
                tracing::warn!("Dropping unreadable access token: {}", e);
                if let Err(e) = self.vault.remove(ACCESS_TOKEN_KEY).await {
                    tracing::error!("Failed to remove access token: {}", e);
                }
                None
            }
            None => None,
        };

        (access, snapshot.refresh_envelope)
    }

    /// Join `path` onto the base URL, keeping any path prefix the base carries
    pub(super) fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        let base = self.config.base_url.as_str().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        Ok(Url::parse(&format!("{base}/{path}"))?)
    }
}

fn encode_body<B: Serialize + ?Sized>(body: &B) -> Result<Value, ApiError> {
    serde_json::to_value(body).map_err(|e| ApiError::Encode(e.to_string()))
}

async fn read_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
    let status = response.status();
    let text = response.text().await?;

    if status == StatusCode::OK || status == StatusCode::CREATED {
        let payload = if text.trim().is_empty() { "null" } else { &text };
        return serde_json::from_str(payload).map_err(|e| ApiError::Decode(e.to_string()));
    }

    tracing::debug!("Request failed with status {}", status);
    Err(ApiError::Status { status, body: text })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client_for(base: &str) -> ApiClient {
        let config = ClientConfig::new(Url::parse(base).unwrap(), "client-test-secret");
        let cipher = EnvelopeCipher::new("client-test-secret").unwrap();
        ApiClient::new(config, CredentialVault::in_memory(cipher)).unwrap()
    }

    #[test]
    fn test_endpoint_joins_base_path() {
        // Given a base URL with a path prefix
        let client = client_for("https://api.instanvi.com/v1/");

        // Then relative paths are appended, not substituted
        assert_eq!(
            client.endpoint("/invoices?page=2").unwrap().as_str(),
            "https://api.instanvi.com/v1/invoices?page=2"
        );
        assert_eq!(
            client.endpoint(REFRESH_TOKEN_PATH).unwrap().as_str(),
            "https://api.instanvi.com/v1/auth/refresh_token/"
        );
    }

    #[test]
    fn test_endpoint_without_base_path() {
        let client = client_for("https://api.instanvi.com");
        assert_eq!(
            client.endpoint("payroll/runs").unwrap().as_str(),
            "https://api.instanvi.com/payroll/runs"
        );
    }

    #[test]
    fn test_debug_redacts_secret() {
        let client = client_for("https://api.instanvi.com");
        let debug = format!("{client:?}");
        assert!(!debug.contains("client-test-secret"));
    }

    #[tokio::test]
    async fn test_login_and_logout() {
        let client = client_for("https://api.instanvi.com");

        client.login("access-1", "refresh-1").await.unwrap();
        assert_eq!(
            client.vault().access_token().await.unwrap(),
            Some("access-1".to_string())
        );

        client.logout().await.unwrap();
        assert_eq!(client.vault().access_token().await.unwrap(), None);
        assert_eq!(client.vault().refresh_token().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_unreadable_access_token_is_dropped() {
        // Given a vault whose access envelope was sealed under another secret
        let foreign = CredentialVault::in_memory(EnvelopeCipher::new("other").unwrap());
        foreign.store_credentials("a", "r").await.unwrap();
        let envelope = foreign.envelope(ACCESS_TOKEN_KEY).await.unwrap().unwrap();

        let client = client_for("https://api.instanvi.com");
        let mut store = crate::InMemoryCredentialStore::new();
        store.put(ACCESS_TOKEN_KEY, envelope).await.unwrap();
        let client = ApiClient {
            vault: CredentialVault::new(
                Box::new(store),
                EnvelopeCipher::new("client-test-secret").unwrap(),
            ),
            ..client
        };

        // When reading credentials for a call
        let (access, refresh) = client.credentials_for_call().await;

        // Then no token is attached rather than failing the call
        assert_eq!(access, None);
        assert_eq!(refresh, None);

        // And the unreadable envelope is gone from the store
        assert_eq!(client.vault.envelope(ACCESS_TOKEN_KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_credentials_for_call_pairs_tokens() {
        // Given a logged-in client
        let client = client_for("https://api.instanvi.com");
        client.login("access-1", "refresh-1").await.unwrap();

        // When reading credentials for a call
        let (access, refresh) = client.credentials_for_call().await;

        // Then the refresh envelope is the one stored alongside the access token
        assert_eq!(access, Some("access-1".to_string()));
        let refresh = refresh.unwrap();
        assert_eq!(client.vault.open_envelope(&refresh).unwrap(), "refresh-1");
        assert_eq!(
            client.vault.envelope(crate::REFRESH_TOKEN_KEY).await.unwrap(),
            Some(refresh)
        );
    }
}
