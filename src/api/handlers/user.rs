use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Json},
};
use log::warn;
use std::sync::Arc;

use super::{status_for, AppState, HistoryParams};
use crate::api::models::{ErrorResponse, HistoryResponse, PositionResponse};

const MAX_HISTORY: usize = 100;

pub async fn get_history(
    State(state): State<Arc<AppState>>,
    Path(username): Path<String>,
    Query(params): Query<HistoryParams>,
) -> impl IntoResponse {
    let limit = params.limit.unwrap_or(10).clamp(1, MAX_HISTORY);

    match state.service.history(&username, limit).await {
        Ok(history) => Json(HistoryResponse {
            username,
            total_entries: history.len(),
            history,
        })
        .into_response(),
        Err(e) => {
            warn!("History of {} failed: {}", username, e);
            (status_for(&e), Json(ErrorResponse::new(e.to_string()))).into_response()
        }
    }
}

/// Leaderboard row of a user; `position` is null until they have been analysed.
pub async fn get_position(State(state): State<Arc<AppState>>, Path(username): Path<String>) -> impl IntoResponse {
    match state.service.position(&username).await {
        Ok(position) => Json(PositionResponse { username, position }).into_response(),
        Err(e) => {
            warn!("Position of {} failed: {}", username, e);
            (status_for(&e), Json(ErrorResponse::new(e.to_string()))).into_response()
        }
    }
}
