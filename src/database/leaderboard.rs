use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use super::analyses::parse_verdict_column;
use super::connection::DbConn;
use super::models::{LeaderboardEntry, LeaderboardFilter};
use crate::rating::AnalysisResult;

const RECENT_SHARE: f64 = 0.7;
const PEAK_SHARE: f64 = 0.3;
const MIN_CONFIDENCE: f64 = 30.0;
const MAX_CONFIDENCE: f64 = 100.0;

/// Ranking score: skill blend scaled by clamped confidence.
pub fn skill_score(result: &AnalysisResult) -> f64 {
    let confidence = result.confidence.clamp(MIN_CONFIDENCE, MAX_CONFIDENCE);
    (result.recent_skill * RECENT_SHARE + result.peak_skill * PEAK_SHARE) * confidence / 100.0
}

pub fn upsert_entry(
    conn: &Connection,
    user_id: i64,
    result: &AnalysisResult,
    now: DateTime<Utc>,
) -> Result<f64> {
    let sql = "INSERT INTO leaderboard (user_id, recent_skill, peak_skill, skill_match, confidence, verdict, skill_score, updated_at)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
               ON CONFLICT(user_id) DO UPDATE SET
                   recent_skill = excluded.recent_skill,
                   peak_skill = excluded.peak_skill,
                   skill_match = excluded.skill_match,
                   confidence = excluded.confidence,
                   verdict = excluded.verdict,
                   skill_score = excluded.skill_score,
                   updated_at = excluded.updated_at";

    let score = skill_score(result);
    conn.execute(
        sql,
        params![
            user_id,
            result.recent_skill,
            result.peak_skill,
            result.skill_match,
            result.confidence,
            result.verdict.as_str(),
            score,
            now
        ],
    )
    .context("Failed to upsert leaderboard entry")?;

    Ok(score)
}

/// Renumber every row by skill score; ties go to the lower user id.
pub fn update_ranks(conn: &Connection) -> Result<()> {
    let sql = "UPDATE leaderboard SET rank_position = ranked.position
               FROM (SELECT user_id, ROW_NUMBER() OVER (ORDER BY skill_score DESC, user_id ASC) AS position FROM leaderboard) AS ranked
               WHERE leaderboard.user_id = ranked.user_id";

    conn.execute(sql, [])
        .context("Failed to update leaderboard ranks")
        .map(|_| ())
}

const ENTRY_SELECT: &str = "SELECT l.rank_position, l.user_id, u.osu_id, u.username, u.avatar_url, l.recent_skill, l.peak_skill, l.skill_match, l.confidence, l.verdict, l.skill_score, l.updated_at
               FROM leaderboard l
               JOIN users u ON u.id = l.user_id";

pub fn list_entries(conn: &mut DbConn, filter: &LeaderboardFilter) -> Result<Vec<LeaderboardEntry>> {
    let sql = format!(
        "{}
         WHERE (?1 IS NULL OR l.verdict = ?1)
           AND (?2 IS NULL OR instr(lower(u.username), lower(?2)) > 0)
         ORDER BY l.skill_score DESC, l.user_id ASC
         LIMIT ?3",
        ENTRY_SELECT
    );

    let verdict = filter.verdict.map(|v| v.as_str().to_string());
    let name = filter
        .name_contains
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty());
    let limit = i64::try_from(filter.limit).unwrap_or(i64::MAX);

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params![verdict, name, limit], parse_entry_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(rows)
}

pub fn get_entry(conn: &mut DbConn, user_id: i64) -> Result<Option<LeaderboardEntry>> {
    let sql = format!("{} WHERE l.user_id = ?1", ENTRY_SELECT);

    conn.query_row(&sql, params![user_id], parse_entry_row)
        .optional()
        .context("Failed to query leaderboard entry")
}

fn parse_entry_row(row: &rusqlite::Row) -> rusqlite::Result<LeaderboardEntry> {
    Ok(LeaderboardEntry {
        rank_position: row.get(0)?,
        user_id: row.get(1)?,
        osu_id: row.get(2)?,
        username: row.get(3)?,
        avatar_url: row.get(4)?,
        recent_skill: row.get(5)?,
        peak_skill: row.get(6)?,
        skill_match: row.get(7)?,
        confidence: row.get(8)?,
        verdict: parse_verdict_column(row, 9)?,
        skill_score: row.get(10)?,
        updated_at: row.get(11)?,
    })
}
