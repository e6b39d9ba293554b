use serde::Serialize;

use crate::database::LeaderboardEntry;
use crate::rating::AnalysisResult;

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self { error: error.into() }
    }
}

#[derive(Serialize)]
pub struct LeaderboardResponse {
    pub items: Vec<LeaderboardEntry>,
    pub total: usize,
}

#[derive(Serialize)]
pub struct HistoryResponse {
    pub username: String,
    pub history: Vec<AnalysisResult>,
    pub total_entries: usize,
}

#[derive(Serialize)]
pub struct PositionResponse {
    pub username: String,
    pub position: Option<LeaderboardEntry>,
}
