use axum::{routing::get, Router};
use std::sync::Arc;

use crate::api::handlers::{
    analysis::analyze_user,
    leaderboard::get_leaderboard,
    user::{get_history, get_position},
    AppState,
};

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/analyze/:username", get(analyze_user))
        .route("/api/leaderboard", get(get_leaderboard))
        .route("/api/user/:username/history", get(get_history))
        .route("/api/user/:username/position", get(get_position))
        .with_state(state)
}
