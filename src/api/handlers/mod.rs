use axum::http::StatusCode;
use serde::Deserialize;
use std::sync::Arc;

use crate::errors::AnalysisError;
use crate::services::analysis::AnalysisService;

pub mod analysis;
pub mod leaderboard;
pub mod user;

pub struct AppState {
    pub service: Arc<AnalysisService>,
}

#[derive(Deserialize)]
pub struct AnalyzeParams {
    pub force: Option<bool>,
}

#[derive(Deserialize)]
pub struct LeaderboardParams {
    pub limit: Option<usize>,
    pub verdict: Option<String>,
    pub search: Option<String>,
}

#[derive(Deserialize)]
pub struct HistoryParams {
    pub limit: Option<usize>,
}

fn status_for(error: &AnalysisError) -> StatusCode {
    match error {
        AnalysisError::UserNotFound(_) => StatusCode::NOT_FOUND,
        AnalysisError::DataUnavailable(_) => StatusCode::BAD_GATEWAY,
        AnalysisError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
