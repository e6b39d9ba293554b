use anyhow::Result;
use log::{debug, info, warn};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tokio::time::sleep;

use crate::cache::{cache_key, RequestCache};
use crate::config::ApiSettings;
use crate::domain::{Play, ScoreResponse, UserInfo};
use crate::errors::{fetch_context, GatewayError};
use crate::http::{RateLimitedClient, TokenManager};

const MAX_SCORE_LIMIT: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreType {
    Best,
    Recent,
}

impl ScoreType {
    pub fn as_str(&self) -> &str {
        match self {
            ScoreType::Best => "best",
            ScoreType::Recent => "recent",
        }
    }
}

/// How a single HTTP attempt should be handled.
enum Attempt {
    Success,
    NotFound,
    Throttled,
    ServerError(u16),
    Unauthorized,
    Rejected(u16),
}

impl From<StatusCode> for Attempt {
    fn from(status: StatusCode) -> Self {
        match status {
            s if s.is_success() => Attempt::Success,
            StatusCode::NOT_FOUND => Attempt::NotFound,
            StatusCode::TOO_MANY_REQUESTS => Attempt::Throttled,
            StatusCode::UNAUTHORIZED => Attempt::Unauthorized,
            s if s.is_server_error() => Attempt::ServerError(s.as_u16()),
            s => Attempt::Rejected(s.as_u16()),
        }
    }
}

/// Authenticated, rate-limited, caching access to the osu! API.
///
/// Built once per process and shared behind an `Arc`; every component that
/// talks to the API goes through the same token, limiter and cache.
pub struct ApiGateway {
    client: RateLimitedClient,
    tokens: TokenManager,
    cache: RequestCache,
    base_url: String,
    retry_budget: u32,
    backoff_base: Duration,
    backoff_cap: Duration,
    transient_delay: Duration,
    user_ttl: Duration,
    scores_ttl: Duration,
    beatmap_ttl: Duration,
}

impl ApiGateway {
    pub fn new(settings: &ApiSettings) -> Result<Self> {
        let client = RateLimitedClient::new(
            settings.user_agent,
            settings.timeout,
            settings.min_request_interval,
        )?;
        let tokens = TokenManager::new(client.inner(), settings);

        Ok(Self {
            client,
            tokens,
            cache: RequestCache::new(),
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            retry_budget: settings.retry_budget.max(1),
            backoff_base: settings.backoff_base,
            backoff_cap: settings.backoff_cap,
            transient_delay: settings.transient_delay,
            user_ttl: settings.user_ttl,
            scores_ttl: settings.scores_ttl,
            beatmap_ttl: settings.beatmap_ttl,
        })
    }

    /// Fetch `endpoint` as JSON. `Ok(None)` means the resource does not exist.
    pub async fn fetch(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
        ttl: Duration,
    ) -> Result<Option<Value>, GatewayError> {
        let token = self.tokens.ensure_token().await?;

        let key = cache_key(endpoint, params);
        if let Some(hit) = self.cache.get(&key, ttl) {
            debug!("Cache hit for {}", endpoint);
            return Ok(Some(hit));
        }

        let url = self.build_url(endpoint);
        let mut attempt = 0;

        loop {
            attempt += 1;

            let response = match self.client.get(&url, &token, params).await {
                Ok(response) => response,
                Err(e) => {
                    warn!("{} (attempt {}): {}", fetch_context(endpoint), attempt, e);
                    self.wait_transient(attempt, e.to_string()).await?;
                    continue;
                }
            };

            match Attempt::from(response.status()) {
                Attempt::Success => {
                    // The request timeout also covers the body, so a stalled body is transient.
                    let body = match response.bytes().await {
                        Ok(body) => body,
                        Err(e) => {
                            warn!("Reading body of {} failed (attempt {}): {}", endpoint, attempt, e);
                            self.wait_transient(attempt, e.to_string()).await?;
                            continue;
                        }
                    };
                    let value: Value = serde_json::from_slice(&body)
                        .map_err(|e| GatewayError::Decode(e.to_string()))?;
                    self.cache.put(&key, value.clone());
                    return Ok(Some(value));
                }
                Attempt::NotFound => {
                    warn!("Resource not found: {}", endpoint);
                    return Ok(None);
                }
                Attempt::Throttled => self.wait_throttled(attempt).await?,
                Attempt::ServerError(status) => {
                    warn!("{} returned {} (attempt {})", endpoint, status, attempt);
                    self.wait_transient(attempt, format!("status {}", status))
                        .await?;
                }
                Attempt::Unauthorized => {
                    self.tokens.invalidate().await;
                    return Err(GatewayError::Auth(format!("{} rejected token", endpoint)));
                }
                Attempt::Rejected(status) => {
                    return Err(GatewayError::Rejected { status });
                }
            }
        }
    }

    /// Cache lookup without touching the network or the rate limiter.
    pub fn cached(&self, endpoint: &str, params: &[(&str, String)], ttl: Duration) -> Option<Value> {
        self.cache.get(&cache_key(endpoint, params), ttl)
    }

    pub fn beatmap_ttl(&self) -> Duration {
        self.beatmap_ttl
    }

    pub async fn get_user(&self, username: &str) -> Result<Option<UserInfo>, GatewayError> {
        if username.trim().is_empty() {
            return Ok(None);
        }

        info!("Fetching user info for {}", username);
        let endpoint = format!("users/{}/osu", urlencoding::encode(username.trim()));
        let params = [("key", "username".to_string())];

        self.fetch(&endpoint, &params, self.user_ttl)
            .await?
            .map(decode::<UserInfo>)
            .transpose()
    }

    pub async fn get_user_scores(
        &self,
        user_id: i64,
        score_type: ScoreType,
        limit: usize,
    ) -> Result<Vec<Play>, GatewayError> {
        info!("Fetching {} scores for user {}", score_type.as_str(), user_id);
        let endpoint = format!("users/{}/scores/{}", user_id, score_type.as_str());
        let params = [
            ("limit", limit.min(MAX_SCORE_LIMIT).to_string()),
            ("mode", "osu".to_string()),
        ];

        let scores: Vec<ScoreResponse> = match self.fetch(&endpoint, &params, self.scores_ttl).await? {
            Some(value) => decode(value)?,
            None => Vec::new(),
        };

        Ok(scores.into_iter().map(Play::from).collect())
    }

    // --- Helper Methods ---

    fn build_url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'))
    }

    async fn wait_throttled(&self, attempt: u32) -> Result<(), GatewayError> {
        if attempt >= self.retry_budget {
            return Err(GatewayError::Throttled { attempts: attempt });
        }

        let delay = self.backoff_delay(attempt);
        warn!("Rate limited, waiting {:?} before retry {}", delay, attempt + 1);
        sleep(delay).await;
        Ok(())
    }

    async fn wait_transient(&self, attempt: u32, reason: String) -> Result<(), GatewayError> {
        if attempt >= self.retry_budget {
            return Err(GatewayError::Transient {
                attempts: attempt,
                reason,
            });
        }

        sleep(self.transient_delay).await;
        Ok(())
    }

    fn backoff_delay(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.backoff_base
            .saturating_mul(factor)
            .min(self.backoff_cap)
    }
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T, GatewayError> {
    serde_json::from_value(value).map_err(|e| GatewayError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gateway(base: u64, cap: u64) -> ApiGateway {
        let settings = ApiSettings {
            backoff_base: Duration::from_secs(base),
            backoff_cap: Duration::from_secs(cap),
            ..ApiSettings::default()
        };
        ApiGateway::new(&settings).unwrap()
    }

    #[test]
    fn test_backoff_doubles_then_caps() {
        let gateway = gateway(5, 30);
        assert_eq!(gateway.backoff_delay(1), Duration::from_secs(5));
        assert_eq!(gateway.backoff_delay(2), Duration::from_secs(10));
        assert_eq!(gateway.backoff_delay(3), Duration::from_secs(20));
        assert_eq!(gateway.backoff_delay(4), Duration::from_secs(30));
        assert_eq!(gateway.backoff_delay(40), Duration::from_secs(30));
    }

    #[test]
    fn test_build_url_joins_without_double_slash() {
        let gateway = gateway(5, 30);
        assert_eq!(
            gateway.build_url("/beatmaps/1"),
            "https://osu.ppy.sh/api/v2/beatmaps/1"
        );
    }

    #[test]
    fn test_status_classification() {
        assert!(matches!(Attempt::from(StatusCode::OK), Attempt::Success));
        assert!(matches!(Attempt::from(StatusCode::NOT_FOUND), Attempt::NotFound));
        assert!(matches!(Attempt::from(StatusCode::TOO_MANY_REQUESTS), Attempt::Throttled));
        assert!(matches!(Attempt::from(StatusCode::BAD_GATEWAY), Attempt::ServerError(502)));
        assert!(matches!(Attempt::from(StatusCode::FORBIDDEN), Attempt::Rejected(403)));
    }

    mod upstream {
        use super::super::*;
        use crate::api::fake_osu::{self, Hits};
        use axum::response::IntoResponse;
        use axum::routing::{get, post};
        use axum::{Json, Router};

        /// Serve `users/{name}/osu` through `respond`, which sees the request number.
        fn user_routes<F>(hits: Hits, respond: F) -> Router
        where
            F: Fn(usize) -> axum::response::Response + Clone + Send + Sync + 'static,
        {
            Router::new().route(
                "/api/v2/users/:name/osu",
                get(move || {
                    let hits = hits.clone();
                    let respond = respond.clone();
                    async move { respond(hits.bump()) }
                }),
            )
        }

        fn ok_user() -> axum::response::Response {
            Json(fake_osu::user_json("whitecat")).into_response()
        }

        async fn gateway_for(app: Router, tune: impl FnOnce(&mut ApiSettings)) -> ApiGateway {
            let host = fake_osu::spawn(app).await;
            let mut settings = fake_osu::settings(&host);
            tune(&mut settings);
            ApiGateway::new(&settings).unwrap()
        }

        #[tokio::test]
        async fn test_throttled_request_is_retried() {
            let hits = Hits::default();
            let app = user_routes(hits.clone(), |n| {
                if n == 1 {
                    StatusCode::TOO_MANY_REQUESTS.into_response()
                } else {
                    ok_user()
                }
            })
            .merge(fake_osu::token_routes(Hits::default()));
            let gateway = gateway_for(app, |_| {}).await;

            let user = gateway.get_user("whitecat").await.unwrap().unwrap();
            assert_eq!(user.id, fake_osu::PLAYER_ID);
            assert_eq!(hits.count(), 2);
        }

        #[tokio::test]
        async fn test_persistent_throttling_exhausts_budget() {
            let hits = Hits::default();
            let app = user_routes(hits.clone(), |_| StatusCode::TOO_MANY_REQUESTS.into_response())
                .merge(fake_osu::token_routes(Hits::default()));
            let gateway = gateway_for(app, |s| s.retry_budget = 2).await;

            let err = gateway.get_user("whitecat").await.unwrap_err();
            assert!(matches!(err, GatewayError::Throttled { attempts: 2 }));
            assert_eq!(hits.count(), 2);
        }

        #[tokio::test]
        async fn test_server_errors_become_transient_failure() {
            let hits = Hits::default();
            let app = user_routes(hits.clone(), |_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
                .merge(fake_osu::token_routes(Hits::default()));
            let gateway = gateway_for(app, |s| s.retry_budget = 2).await;

            let err = gateway.get_user("whitecat").await.unwrap_err();
            assert!(matches!(err, GatewayError::Transient { attempts: 2, .. }));
            assert_eq!(hits.count(), 2);
        }

        /// 200 headers followed by a body that arrives long after the client timeout.
        fn stalled_user() -> axum::response::Response {
            let body = futures::stream::once(async {
                tokio::time::sleep(Duration::from_secs(2)).await;
                Ok::<_, std::convert::Infallible>(axum::body::Bytes::from_static(b"{}"))
            });
            axum::response::Response::builder()
                .status(StatusCode::OK)
                .header("content-type", "application/json")
                .body(axum::body::Body::from_stream(body))
                .unwrap()
        }

        #[tokio::test]
        async fn test_stalled_body_is_retried() {
            let hits = Hits::default();
            let app = user_routes(hits.clone(), |n| if n == 1 { stalled_user() } else { ok_user() })
                .merge(fake_osu::token_routes(Hits::default()));
            let gateway = gateway_for(app, |s| s.timeout = Duration::from_millis(300)).await;

            let user = gateway.get_user("whitecat").await.unwrap();
            assert!(user.is_some());
            assert_eq!(hits.count(), 2);
        }

        #[tokio::test]
        async fn test_stalled_bodies_exhaust_into_transient_failure() {
            let hits = Hits::default();
            let app = user_routes(hits.clone(), |_| stalled_user())
                .merge(fake_osu::token_routes(Hits::default()));
            let gateway = gateway_for(app, |s| {
                s.timeout = Duration::from_millis(300);
                s.retry_budget = 2;
            })
            .await;

            let err = gateway.get_user("whitecat").await.unwrap_err();
            assert!(matches!(err, GatewayError::Transient { attempts: 2, .. }));
            assert_eq!(hits.count(), 2);
        }

        #[tokio::test]
        async fn test_malformed_body_is_decode_error() {
            let app = user_routes(Hits::default(), |_| {
                (StatusCode::OK, "not json at all").into_response()
            })
            .merge(fake_osu::token_routes(Hits::default()));
            let gateway = gateway_for(app, |_| {}).await;

            let err = gateway.get_user("whitecat").await.unwrap_err();
            assert!(matches!(err, GatewayError::Decode(_)));
        }

        #[tokio::test]
        async fn test_missing_user_is_none() {
            let app = user_routes(Hits::default(), |_| StatusCode::NOT_FOUND.into_response())
                .merge(fake_osu::token_routes(Hits::default()));
            let gateway = gateway_for(app, |_| {}).await;

            assert!(gateway.get_user("nobody").await.unwrap().is_none());
        }

        #[tokio::test]
        async fn test_other_client_errors_are_rejected() {
            let app = user_routes(Hits::default(), |_| StatusCode::FORBIDDEN.into_response())
                .merge(fake_osu::token_routes(Hits::default()));
            let gateway = gateway_for(app, |_| {}).await;

            let err = gateway.get_user("whitecat").await.unwrap_err();
            assert!(matches!(err, GatewayError::Rejected { status: 403 }));
        }

        #[tokio::test]
        async fn test_repeat_request_is_served_from_cache() {
            let hits = Hits::default();
            let app = user_routes(hits.clone(), |_| ok_user()).merge(fake_osu::token_routes(Hits::default()));
            let gateway = gateway_for(app, |_| {}).await;

            gateway.get_user("whitecat").await.unwrap();
            gateway.get_user("whitecat").await.unwrap();
            assert_eq!(hits.count(), 1);
        }

        #[tokio::test]
        async fn test_token_is_reused_and_refreshed_after_401() {
            let tokens = Hits::default();
            let app = user_routes(Hits::default(), |n| {
                if n == 1 {
                    StatusCode::UNAUTHORIZED.into_response()
                } else {
                    ok_user()
                }
            })
            .merge(fake_osu::token_routes(tokens.clone()));
            let gateway = gateway_for(app, |_| {}).await;

            let err = gateway.get_user("whitecat").await.unwrap_err();
            assert!(matches!(err, GatewayError::Auth(_)));
            assert_eq!(tokens.count(), 1);

            assert!(gateway.get_user("whitecat").await.unwrap().is_some());
            assert_eq!(tokens.count(), 2);
        }

        #[tokio::test]
        async fn test_failed_token_exchange_is_auth_error() {
            let hits = Hits::default();
            let app = user_routes(hits.clone(), |_| ok_user()).route(
                "/oauth/token",
                post(|| async { StatusCode::UNAUTHORIZED }),
            );
            let gateway = gateway_for(app, |_| {}).await;

            let err = gateway.get_user("whitecat").await.unwrap_err();
            assert!(matches!(err, GatewayError::Auth(_)));
            assert_eq!(hits.count(), 0);
        }

        #[tokio::test]
        async fn test_scores_are_decoded_into_plays() {
            let hits = fake_osu::FixtureHits::default();
            let gateway = gateway_for(fake_osu::fixture_routes(hits), |_| {}).await;

            let best = gateway
                .get_user_scores(fake_osu::PLAYER_ID, ScoreType::Best, 25)
                .await
                .unwrap();
            assert_eq!(best.len(), 12);
            assert_eq!(best[0].beatmap_id, Some(101));
            assert_eq!(best[0].mods, vec!["HD", "DT"]);
            assert!(best[0].played_at().is_some());
        }
    }
}
