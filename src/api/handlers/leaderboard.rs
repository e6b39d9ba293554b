use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use std::sync::Arc;

use super::{AppState, LeaderboardParams};
use crate::api::models::{ErrorResponse, LeaderboardResponse};
use crate::database::LeaderboardFilter;
use crate::rating::Verdict;

const MAX_LIMIT: usize = 500;

pub async fn get_leaderboard(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LeaderboardParams>,
) -> impl IntoResponse {
    let verdict = match params.verdict.as_deref() {
        None | Some("") | Some("all") => None,
        Some(raw) => match Verdict::parse(raw) {
            Some(verdict) => Some(verdict),
            None => {
                let message = format!("Unknown verdict filter: {}", raw);
                return (StatusCode::BAD_REQUEST, Json(ErrorResponse::new(message))).into_response();
            }
        },
    };

    let filter = LeaderboardFilter {
        limit: params.limit.unwrap_or(50).clamp(1, MAX_LIMIT),
        verdict,
        name_contains: params.search,
    };

    match state.service.leaderboard(&filter) {
        Ok(items) => Json(LeaderboardResponse {
            total: items.len(),
            items,
        })
        .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new(format!("Query Error: {}", e))),
        )
            .into_response(),
    }
}
