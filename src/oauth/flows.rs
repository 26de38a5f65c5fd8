use crate::{
    cache::{Cache, CacheBackend},
    config::OAuthConfig,
    error::AppError,
    oauth::state::{PendingAuthState, CREDENTIALS_TTL, STATE_TTL},
};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use url::Url;

/// Minimal page returned to the popup window once the callback completes
pub const CLOSE_WINDOW_HTML: &str = r#"<html>
    <script>
        window.close();
    </script>
</html>
"#;

/// Query parameters HubSpot appends to the callback redirect
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

/// OAuth flow handlers
pub struct OAuthFlows {
    config: OAuthConfig,
    http_client: Client,
    cache: Arc<CacheBackend>,
}

impl OAuthFlows {
    pub fn new(config: OAuthConfig, cache: Arc<CacheBackend>) -> Self {
        Self {
            config,
            http_client: Client::new(),
            cache,
        }
    }

    fn pending_key(org_id: &str, user_id: &str) -> String {
        format!("pending_auth:{org_id}:{user_id}")
    }

    fn credentials_key(org_id: &str, user_id: &str) -> String {
        format!("credentials:{org_id}:{user_id}")
    }

    /// Build the provider authorization URL for a user/organization pair and
    /// park the pending state for the callback to validate against. No
    /// network call is made here.
    pub async fn authorize(&self, user_id: &str, org_id: &str) -> Result<String, AppError> {
        let pending = PendingAuthState::new(user_id, org_id);

        self.cache
            .set(
                &Self::pending_key(org_id, user_id),
                &pending,
                Some(STATE_TTL),
            )
            .await?;

        let mut url = Url::parse(&self.config.authorization_url)
            .map_err(|e| AppError::Internal(format!("Invalid authorization URL: {e}")))?;
        url.query_pairs_mut()
            .append_pair("client_id", &self.config.client_id)
            .append_pair("redirect_uri", &self.config.redirect_uri)
            .append_pair("scope", &self.config.scope)
            .append_pair("response_type", "code")
            .append_pair("state", &pending.encode());

        tracing::debug!(user_id, org_id, "created authorization url");
        Ok(url.into())
    }

    /// Handle the redirect back from HubSpot: validate the anti-forgery
    /// state, exchange the code for tokens, and park the raw credential
    /// blob for a one-shot pickup.
    pub async fn handle_callback(&self, params: CallbackQuery) -> Result<(), AppError> {
        if let Some(error) = params.error {
            let detail = params.error_description.unwrap_or(error);
            return Err(AppError::ProviderDenied(detail));
        }

        let encoded_state = params.state.ok_or(AppError::InvalidState)?;
        let decoded = PendingAuthState::decode(&encoded_state)?;

        let pending_key = Self::pending_key(&decoded.org_id, &decoded.user_id);
        let saved: Option<PendingAuthState> = self.cache.get(&pending_key).await?;
        // Absent (expired or never created) and mismatched both fail the
        // CSRF/replay guard before any token exchange happens. The guard
        // runs before the code check so forged requests learn nothing
        // beyond the state verdict.
        match saved {
            Some(saved) if saved.state == decoded.state => {}
            _ => return Err(AppError::StateMismatch),
        }

        let code = params
            .code
            .ok_or_else(|| AppError::BadRequest("Missing authorization code".to_string()))?;

        let response = self
            .http_client
            .post(&self.config.token_url)
            .form(&[
                ("grant_type", "authorization_code"),
                ("client_id", &self.config.client_id),
                ("client_secret", &self.config.client_secret),
                ("redirect_uri", &self.config.redirect_uri),
                ("code", &code),
            ])
            .send()
            .await
            .map_err(|e| AppError::TokenExchangeFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(%status, "token exchange rejected");
            return Err(AppError::TokenExchangeFailed(format!("status {status}")));
        }

        // The token response is cached verbatim; it is only parsed when the
        // caller picks it up.
        let raw_credentials = response
            .text()
            .await
            .map_err(|e| AppError::TokenExchangeFailed(e.to_string()))?;

        let credentials_key = Self::credentials_key(&decoded.org_id, &decoded.user_id);
        let store = self
            .cache
            .set(&credentials_key, &raw_credentials, Some(CREDENTIALS_TTL));
        let cleanup = self.cache.delete(&pending_key);
        tokio::try_join!(store, cleanup)?;

        tracing::info!(
            user_id = %decoded.user_id,
            org_id = %decoded.org_id,
            "authorization completed"
        );
        Ok(())
    }

    /// One-shot pickup of the exchanged credentials. The cache entry is
    /// deleted on read, so a second call for the same pair fails.
    pub async fn credentials(&self, user_id: &str, org_id: &str) -> Result<Value, AppError> {
        let key = Self::credentials_key(org_id, user_id);

        let raw: Option<String> = self.cache.get(&key).await?;
        let raw = raw.ok_or(AppError::CredentialsNotFound)?;

        self.cache.delete(&key).await?;

        serde_json::from_str(&raw)
            .map_err(|e| AppError::Internal(format!("Cached credentials were not valid JSON: {e}")))
    }
}
