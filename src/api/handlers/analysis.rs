use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Json},
};
use log::warn;
use std::sync::Arc;

use super::{status_for, AnalyzeParams, AppState};
use crate::api::models::ErrorResponse;

pub async fn analyze_user(
    State(state): State<Arc<AppState>>,
    Path(username): Path<String>,
    Query(params): Query<AnalyzeParams>,
) -> impl IntoResponse {
    let force = params.force.unwrap_or(false);

    match state.service.analyze_with(&username, force).await {
        Ok(result) => Json(result).into_response(),
        Err(e) => {
            warn!("Analysis of {} failed: {}", username, e);
            let status = status_for(&e);
            (status, Json(ErrorResponse::new(e.to_string()))).into_response()
        }
    }
}
