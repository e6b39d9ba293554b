use anyhow::{Context, Result};
use chrono::Utc;
use log::info;

use super::connection::{create_memory_pool, create_pool, get_connection, DbPool};
use super::models::{LeaderboardEntry, LeaderboardFilter};
use super::setup::ensure_schema;
use super::{analyses, leaderboard, users};
use crate::domain::UserInfo;
use crate::errors::store_context;
use crate::rating::AnalysisResult;

/// Persistence for users, analyses and the leaderboard.
pub trait ResultStore: Send + Sync {
    /// Returns the store's own id for the user.
    fn upsert_user(&self, user: &UserInfo) -> Result<i64>;

    /// The store's id for an osu! user, if they were ever stored.
    fn find_user(&self, osu_id: i64) -> Result<Option<i64>>;

    fn save_analysis(&self, user_id: i64, result: &AnalysisResult) -> Result<i64>;

    fn get_latest_analysis(&self, user_id: i64) -> Result<Option<AnalysisResult>>;

    /// Up to `limit` stored analyses, newest first.
    fn get_analysis_history(&self, user_id: i64, limit: usize) -> Result<Vec<AnalysisResult>>;

    fn update_leaderboard(&self, user_id: i64, result: &AnalysisResult) -> Result<()>;

    fn get_leaderboard(&self, filter: &LeaderboardFilter) -> Result<Vec<LeaderboardEntry>>;

    fn get_user_position(&self, user_id: i64) -> Result<Option<LeaderboardEntry>>;
}

pub struct SqliteResultStore {
    pool: DbPool,
}

impl SqliteResultStore {
    pub fn open(database_path: &str) -> Result<Self> {
        let pool = create_pool(database_path)
            .with_context(|| format!("Failed to open result database at {}", database_path))?;
        Self::new(pool)
    }

    pub fn in_memory() -> Result<Self> {
        Self::new(create_memory_pool()?)
    }

    pub fn new(pool: DbPool) -> Result<Self> {
        let mut conn = get_connection(&pool)?;
        ensure_schema(&mut conn)?;
        drop(conn);
        Ok(Self { pool })
    }
}

impl ResultStore for SqliteResultStore {
    fn upsert_user(&self, user: &UserInfo) -> Result<i64> {
        let mut conn = get_connection(&self.pool)?;
        let stored = users::upsert_user(&mut conn, user, Utc::now())
            .with_context(|| store_context("upsert user", user.id))?;
        Ok(stored.id)
    }

    fn find_user(&self, osu_id: i64) -> Result<Option<i64>> {
        let mut conn = get_connection(&self.pool)?;
        let stored = users::find_by_osu_id(&mut conn, osu_id)
            .with_context(|| format!("Failed to look up osu! user {}", osu_id))?;
        Ok(stored.map(|user| user.id))
    }

    fn save_analysis(&self, user_id: i64, result: &AnalysisResult) -> Result<i64> {
        let mut conn = get_connection(&self.pool)?;
        let id = analyses::insert_analysis(&mut conn, user_id, result)
            .with_context(|| store_context("save analysis", user_id))?;
        info!("Saved analysis {} for user {}", id, user_id);
        Ok(id)
    }

    fn get_latest_analysis(&self, user_id: i64) -> Result<Option<AnalysisResult>> {
        let mut conn = get_connection(&self.pool)?;
        analyses::get_latest_for_user(&mut conn, user_id)
            .with_context(|| store_context("load latest analysis", user_id))
    }

    fn get_analysis_history(&self, user_id: i64, limit: usize) -> Result<Vec<AnalysisResult>> {
        let mut conn = get_connection(&self.pool)?;
        analyses::list_for_user(&mut conn, user_id, limit)
            .with_context(|| store_context("load analysis history", user_id))
    }

    fn update_leaderboard(&self, user_id: i64, result: &AnalysisResult) -> Result<()> {
        let mut conn = get_connection(&self.pool)?;
        let tx = conn.transaction()?;

        let score = leaderboard::upsert_entry(&tx, user_id, result, Utc::now())
            .with_context(|| store_context("update leaderboard", user_id))?;
        leaderboard::update_ranks(&tx)?;
        tx.commit().context("Failed to commit leaderboard update")?;

        info!("Leaderboard updated for user {} with skill score {:.2}", user_id, score);
        Ok(())
    }

    fn get_leaderboard(&self, filter: &LeaderboardFilter) -> Result<Vec<LeaderboardEntry>> {
        let mut conn = get_connection(&self.pool)?;
        leaderboard::list_entries(&mut conn, filter)
    }

    fn get_user_position(&self, user_id: i64) -> Result<Option<LeaderboardEntry>> {
        let mut conn = get_connection(&self.pool)?;
        leaderboard::get_entry(&mut conn, user_id)
            .with_context(|| store_context("load leaderboard position", user_id))
    }
}
