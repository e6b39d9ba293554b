use crate::rate_limiter::RateLimiter;
use anyhow::{Context, Result};
use reqwest::Client;
use std::time::Duration;

/// HTTP client with built-in rate limiting
pub struct RateLimitedClient {
    client: Client,
    rate_limiter: RateLimiter,
}

impl RateLimitedClient {
    pub fn new(user_agent: &str, timeout: Duration, min_interval: Duration) -> Result<Self> {
        let client = Self::build_client(user_agent, timeout)?;
        let rate_limiter = RateLimiter::new(min_interval);

        Ok(Self {
            client,
            rate_limiter,
        })
    }

    /// Authenticated GET; every call consumes one rate-limiter slot.
    pub async fn get(
        &self,
        url: &str,
        token: &str,
        params: &[(&str, String)],
    ) -> reqwest::Result<reqwest::Response> {
        self.rate_limiter.acquire().await;
        self.send_get_request(url, token, params).await
    }

    /// The underlying client, for calls that bypass the rate limiter.
    pub fn inner(&self) -> Client {
        self.client.clone()
    }

    fn build_client(user_agent: &str, timeout: Duration) -> Result<Client> {
        Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")
    }

    async fn send_get_request(
        &self,
        url: &str,
        token: &str,
        params: &[(&str, String)],
    ) -> reqwest::Result<reqwest::Response> {
        self.client
            .get(url)
            .bearer_auth(token)
            .query(params)
            .send()
            .await
    }
}
