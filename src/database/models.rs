use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::rating::Verdict;

#[derive(Debug, Clone)]
pub struct DbUser {
    pub id: i64,
    pub osu_id: i64,
    pub username: String,
    pub avatar_url: Option<String>,
    pub global_rank: Option<i64>,
    pub pp: Option<f64>,
    pub play_count: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaderboardEntry {
    pub rank_position: Option<i64>,
    pub user_id: i64,
    pub osu_id: i64,
    pub username: String,
    pub avatar_url: Option<String>,
    pub recent_skill: f64,
    pub peak_skill: f64,
    pub skill_match: f64,
    pub confidence: f64,
    pub verdict: Verdict,
    pub skill_score: f64,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct LeaderboardFilter {
    pub limit: usize,
    pub verdict: Option<Verdict>,
    /// Case-insensitive substring of the username.
    pub name_contains: Option<String>,
}

impl Default for LeaderboardFilter {
    fn default() -> Self {
        Self {
            limit: 50,
            verdict: None,
            name_contains: None,
        }
    }
}
