use http::header::ACCEPT;

use crate::credential::REFRESH_TOKEN_KEY;

use super::errors::ApiError;
use super::interceptor::{ApiClient, REFRESH_TOKEN_PATH};
use super::types::{RefreshOutcome, RefreshRequest, RefreshResponse};

impl ApiClient {
    /// Try to replace the stored credentials after a 401.
    ///
    /// Without a stored refresh token nothing happens. Otherwise the refresh
    /// endpoint is called once, bounded by the refresh timeout; any failure
    /// clears every stored credential.
    ///
    /// With single-flight enabled, concurrent callers that observed the same
    /// refresh token wait for the first one and share its result.
    pub async fn recover_from_unauthorized(&self) -> RefreshOutcome {
        self.recover(None).await
    }

    /// `sent_with` is the refresh envelope current when the failed call was
    /// sent; when it is gone or replaced by now, another call already handled
    /// the 401.
    pub(super) async fn recover(&self, sent_with: Option<String>) -> RefreshOutcome {
        let current = match self.vault.envelope(REFRESH_TOKEN_KEY).await {
            Ok(Some(envelope)) => envelope,
            Ok(None) => {
                tracing::debug!("No refresh token stored, skipping refresh");
                return RefreshOutcome::Skipped;
            }
            Err(e) => {
                tracing::error!("Failed to read refresh token: {}", e);
                return self.discard_credentials().await;
            }
        };

        if !self.config.single_flight_refresh {
            return self.refresh_with(&current).await;
        }

        let observed = sent_with.unwrap_or(current);
        let _guard = self.refresh_lock.lock().await;

        // Someone else may have finished a refresh while we waited
        match self.vault.envelope(REFRESH_TOKEN_KEY).await {
            Ok(Some(latest)) if latest != observed => {
                tracing::debug!("Refresh token already rotated by a concurrent call");
                RefreshOutcome::Refreshed
            }
            Ok(Some(_)) => self.refresh_with(&observed).await,
            Ok(None) => {
                tracing::debug!("Credentials were cleared by a concurrent refresh");
                RefreshOutcome::Failed
            }
            Err(e) => {
                tracing::error!("Failed to read refresh token: {}", e);
                self.discard_credentials().await
            }
        }
    }

    async fn refresh_with(&self, envelope: &str) -> RefreshOutcome {
        let exchange = self.exchange_refresh_token(envelope);
        match tokio::time::timeout(self.config.refresh_timeout, exchange).await {
            Ok(Ok(())) => {
                tracing::info!("Refreshed stored credentials");
                RefreshOutcome::Refreshed
            }
            Ok(Err(e)) => {
                tracing::warn!("Token refresh failed: {}", e);
                self.discard_credentials().await
            }
            Err(_) => {
                tracing::warn!(
                    "Token refresh timed out after {:?}",
                    self.config.refresh_timeout
                );
                self.discard_credentials().await
            }
        }
    }

    async fn exchange_refresh_token(&self, envelope: &str) -> Result<(), ApiError> {
        let refresh_token = self.vault.open_envelope(envelope)?;
        let url = self.endpoint(REFRESH_TOKEN_PATH)?;

        let response = self
            .http
            .post(url)
            .header(ACCEPT, "application/json")
            .json(&RefreshRequest {
                refresh_token: &refresh_token,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status { status, body });
        }

        let tokens: RefreshResponse = response
            .json()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))?;

        self.vault
            .store_credentials(&tokens.access_token, &tokens.refresh_token)
            .await?;
        Ok(())
    }

    async fn discard_credentials(&self) -> RefreshOutcome {
        if let Err(e) = self.vault.clear_all().await {
            tracing::error!("Failed to clear credentials: {}", e);
        }
        RefreshOutcome::Failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use crate::credential::{
        CredentialStore, CredentialVault, EnvelopeCipher, InMemoryCredentialStore,
    };
    use url::Url;

    fn offline_client() -> ApiClient {
        // Nothing listens on port 1, so any refresh attempt fails fast
        let config = ClientConfig::new(Url::parse("http://127.0.0.1:1").unwrap(), "refresh-secret");
        let cipher = EnvelopeCipher::new("refresh-secret").unwrap();
        ApiClient::new(config, CredentialVault::in_memory(cipher)).unwrap()
    }

    #[tokio::test]
    async fn test_skipped_without_refresh_token() {
        // Given only an access token
        let client = offline_client();
        client
            .vault
            .encrypt_and_store(crate::ACCESS_TOKEN_KEY, "access-1")
            .await
            .unwrap();

        // When recovering
        let outcome = client.recover_from_unauthorized().await;

        // Then nothing is attempted and the access token is left alone
        assert_eq!(outcome, RefreshOutcome::Skipped);
        assert_eq!(
            client.vault.access_token().await.unwrap(),
            Some("access-1".to_string())
        );
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_clears_credentials() {
        let client = offline_client();
        client.login("access-1", "refresh-1").await.unwrap();

        let outcome = client.recover_from_unauthorized().await;

        assert_eq!(outcome, RefreshOutcome::Failed);
        assert_eq!(client.vault.access_token().await.unwrap(), None);
        assert_eq!(client.vault.refresh_token().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_rotated_since_send_is_refreshed_without_network() {
        // Given a call sent with the first pair of credentials
        let client = offline_client();
        client.login("access-0", "refresh-0").await.unwrap();
        let (access, sent_with) = client.credentials_for_call().await;
        assert_eq!(access, Some("access-0".to_string()));

        // And a newer pair stored before its 401 is handled
        client.login("access-1", "refresh-1").await.unwrap();

        // When recovering for that call
        let outcome = client.recover(sent_with).await;

        // Then the newer pair counts as the refresh; the offline endpoint is never hit
        assert_eq!(outcome, RefreshOutcome::Refreshed);
        assert_eq!(
            client.vault.access_token().await.unwrap(),
            Some("access-1".to_string())
        );
        assert_eq!(
            client.vault.refresh_token().await.unwrap(),
            Some("refresh-1".to_string())
        );
    }

    #[tokio::test]
    async fn test_undecryptable_refresh_token_clears_credentials() {
        // Given a refresh envelope sealed under a secret the client does not know
        let foreign = EnvelopeCipher::new("someone-else").unwrap();
        let mut store = InMemoryCredentialStore::new();
        store
            .put(REFRESH_TOKEN_KEY, foreign.seal("refresh-x").unwrap())
            .await
            .unwrap();
        let config = ClientConfig::new(Url::parse("http://127.0.0.1:1").unwrap(), "refresh-secret");
        let client = ApiClient::with_store(config, Box::new(store)).unwrap();

        // When recovering
        let outcome = client.recover_from_unauthorized().await;

        // Then the refresh fails and everything is wiped
        assert_eq!(outcome, RefreshOutcome::Failed);
        assert_eq!(client.vault.envelope(REFRESH_TOKEN_KEY).await.unwrap(), None);
    }
}
