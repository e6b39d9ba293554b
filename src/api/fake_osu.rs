//! In-process stand-in for the osu! API, served on an ephemeral port.

use axum::extract::Path;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{Duration as ChronoDuration, Utc};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::config::ApiSettings;

pub const PLAYER: &str = "rusty";
pub const PLAYER_ID: i64 = 42;

/// Request counter shared between a fake route and the test body.
#[derive(Clone, Default)]
pub struct Hits(Arc<AtomicUsize>);

impl Hits {
    /// Record a request and return how many have been seen, this one included.
    pub fn bump(&self) -> usize {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }

    pub fn drop_one(&self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }

    /// Keep the largest value seen.
    pub fn raise_to(&self, value: usize) {
        self.0.fetch_max(value, Ordering::SeqCst);
    }
}

pub async fn spawn(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

/// Settings pointed at `host` with millisecond-scale waits.
pub fn settings(host: &str) -> ApiSettings {
    ApiSettings {
        base_url: format!("{}/api/v2", host),
        token_url: format!("{}/oauth/token", host),
        client_id: "client".to_string(),
        client_secret: "secret".to_string(),
        timeout: Duration::from_secs(5),
        min_request_interval: Duration::from_millis(1),
        retry_budget: 3,
        backoff_base: Duration::from_millis(10),
        backoff_cap: Duration::from_millis(40),
        transient_delay: Duration::from_millis(5),
        ..ApiSettings::default()
    }
}

pub fn token_routes(hits: Hits) -> Router {
    expiring_token_routes(hits, 86_400)
}

pub fn expiring_token_routes(hits: Hits, expires_in: u64) -> Router {
    Router::new().route(
        "/oauth/token",
        post(move || {
            let hits = hits.clone();
            async move {
                hits.bump();
                Json(json!({ "access_token": "test-token", "expires_in": expires_in }))
            }
        }),
    )
}

pub fn user_json(username: &str) -> Value {
    json!({
        "id": PLAYER_ID,
        "username": username,
        "avatar_url": "https://a.ppy.sh/42",
        "statistics": { "global_rank": 12_345, "pp": 6_100.5, "play_count": 40_000 }
    })
}

/// Easy maps below 100, hard maps from 100 up.
pub fn beatmap_json(id: i64) -> Value {
    if id < 100 {
        json!({ "id": id, "difficulty_rating": 4.5, "ar": 9.0, "bpm": 170.0, "status": "ranked" })
    } else {
        json!({ "id": id, "difficulty_rating": 6.5, "ar": 9.6, "bpm": 200.0, "status": "ranked" })
    }
}

fn score_json(id: i64, beatmap_id: i64, accuracy: f64, days_ago: i64, pp: f64, mods: &[&str]) -> Value {
    let created_at = (Utc::now() - ChronoDuration::days(days_ago)).to_rfc3339();
    json!({
        "id": id,
        "accuracy": accuracy,
        "created_at": created_at,
        "mods": mods,
        "passed": true,
        "pp": pp,
        "beatmap": { "id": beatmap_id }
    })
}

/// Twelve recent plays on easy maps, one per day.
pub fn recent_scores() -> Value {
    Value::Array(
        (1..=12)
            .map(|i| score_json(1_000 + i, i, 0.95, i, 150.0, &["HD"]))
            .collect(),
    )
}

/// Twelve best plays on hard maps, set months ago.
pub fn best_scores() -> Value {
    Value::Array(
        (1..=12)
            .map(|i| score_json(2_000 + i, 100 + i, 0.98, 100 + i, 400.0 - i as f64, &["HD", "DT"]))
            .collect(),
    )
}

/// Counts of upstream requests made against the full fixture.
#[derive(Clone, Default)]
pub struct FixtureHits {
    pub tokens: Hits,
    pub users: Hits,
    pub scores: Hits,
    pub beatmaps: Hits,
}

/// A complete upstream: one known player, their scores, and every map.
pub fn fixture_routes(hits: FixtureHits) -> Router {
    let users = hits.users.clone();
    let scores = hits.scores.clone();
    let beatmaps = hits.beatmaps.clone();

    Router::new()
        .route(
            "/api/v2/users/:name/osu",
            get(move |Path(name): Path<String>| {
                let users = users.clone();
                async move {
                    users.bump();
                    if name == PLAYER {
                        Json(user_json(&name)).into_response()
                    } else {
                        StatusCode::NOT_FOUND.into_response()
                    }
                }
            }),
        )
        .route(
            "/api/v2/users/:id/scores/:kind",
            get(move |Path((_id, kind)): Path<(i64, String)>| {
                let scores = scores.clone();
                async move {
                    scores.bump();
                    match kind.as_str() {
                        "recent" => Json(recent_scores()).into_response(),
                        "best" => Json(best_scores()).into_response(),
                        _ => StatusCode::BAD_REQUEST.into_response(),
                    }
                }
            }),
        )
        .route(
            "/api/v2/beatmaps/:id",
            get(move |Path(id): Path<i64>| {
                let beatmaps = beatmaps.clone();
                async move {
                    beatmaps.bump();
                    Json(beatmap_json(id))
                }
            }),
        )
        .merge(token_routes(hits.tokens))
}
