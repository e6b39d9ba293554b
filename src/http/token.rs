use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::config::ApiSettings;
use crate::errors::GatewayError;

const DEFAULT_EXPIRES_IN_SECS: u64 = 86_400;

#[derive(Serialize)]
struct TokenRequest<'a> {
    client_id: &'a str,
    client_secret: &'a str,
    grant_type: &'static str,
    scope: &'static str,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

struct AccessToken {
    value: String,
    refresh_at: Instant,
}

/// Client-credentials bearer token, cached until shortly before it expires.
pub struct TokenManager {
    client: Client,
    token_url: String,
    client_id: String,
    client_secret: String,
    refresh_margin: Duration,
    current: Mutex<Option<AccessToken>>,
}

impl TokenManager {
    pub fn new(client: Client, settings: &ApiSettings) -> Self {
        Self {
            client,
            token_url: settings.token_url.clone(),
            client_id: settings.client_id.clone(),
            client_secret: settings.client_secret.clone(),
            refresh_margin: settings.token_refresh_margin,
            current: Mutex::new(None),
        }
    }

    /// Return a token valid for at least the refresh margin, exchanging
    /// credentials when needed. Concurrent callers wait on a single exchange.
    pub async fn ensure_token(&self) -> Result<String, GatewayError> {
        let mut current = self.current.lock().await;

        if let Some(token) = current.as_ref().filter(|t| self.is_usable(t)) {
            return Ok(token.value.clone());
        }

        let token = self.exchange().await?;
        let value = token.value.clone();
        *current = Some(token);
        Ok(value)
    }

    /// Forget the held token so the next call performs a fresh exchange.
    pub async fn invalidate(&self) {
        *self.current.lock().await = None;
    }

    fn is_usable(&self, token: &AccessToken) -> bool {
        Instant::now() < token.refresh_at
    }

    /// Refresh `refresh_margin` before expiry, but never earlier than half
    /// way through the token's lifetime.
    fn refresh_point(&self, issued_at: Instant, lifetime: Duration) -> Instant {
        let margin = self.refresh_margin.min(lifetime / 2);
        issued_at + lifetime - margin
    }

    async fn exchange(&self) -> Result<AccessToken, GatewayError> {
        let body = TokenRequest {
            client_id: &self.client_id,
            client_secret: &self.client_secret,
            grant_type: "client_credentials",
            scope: "public",
        };

        let response = self
            .client
            .post(&self.token_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| GatewayError::Auth(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            log::error!("Token request failed with status {}", status);
            return Err(GatewayError::Auth(format!("token endpoint returned {}", status)));
        }

        let parsed: TokenResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::Auth(format!("malformed token response: {}", e)))?;

        let lifetime = parsed.expires_in.unwrap_or(DEFAULT_EXPIRES_IN_SECS);
        log::info!("Obtained access token valid for {}s", lifetime);

        Ok(AccessToken {
            value: parsed.access_token,
            refresh_at: self.refresh_point(Instant::now(), Duration::from_secs(lifetime)),
        })
    }
}
