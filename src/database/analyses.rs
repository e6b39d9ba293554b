use anyhow::{Context, Result};
use rusqlite::types::Type;
use rusqlite::{params, OptionalExtension};
use serde::de::DeserializeOwned;

use super::connection::DbConn;
use crate::rating::{AnalysisResult, Verdict};

pub fn insert_analysis(conn: &mut DbConn, user_id: i64, result: &AnalysisResult) -> Result<i64> {
    let sql = "INSERT INTO analysis_results (user_id, recent_skill, peak_skill, skill_match, confidence, verdict, insights, confidence_factors, data_quality, analyzed_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10) RETURNING id";

    let insights = serde_json::to_string(&result.insights)?;
    let factors = serde_json::to_string(&result.confidence_factors)?;
    let quality = serde_json::to_string(&result.data_quality)?;

    conn.query_row(
        sql,
        params![
            user_id,
            result.recent_skill,
            result.peak_skill,
            result.skill_match,
            result.confidence,
            result.verdict.as_str(),
            insights,
            factors,
            quality,
            result.analyzed_at
        ],
        |row| row.get(0),
    )
    .context("Failed to insert analysis result")
}

const ANALYSIS_COLUMNS: &str = "recent_skill, peak_skill, skill_match, confidence, verdict, insights, confidence_factors, data_quality, analyzed_at";

pub fn get_latest_for_user(conn: &mut DbConn, user_id: i64) -> Result<Option<AnalysisResult>> {
    let sql = format!(
        "SELECT {} FROM analysis_results WHERE user_id = ?1 ORDER BY analyzed_at DESC, id DESC LIMIT 1",
        ANALYSIS_COLUMNS
    );

    conn.query_row(&sql, params![user_id], parse_analysis_row)
        .optional()
        .context("Failed to query latest analysis")
}

/// Up to `limit` analyses of the user, newest first.
pub fn list_for_user(conn: &mut DbConn, user_id: i64, limit: usize) -> Result<Vec<AnalysisResult>> {
    let sql = format!(
        "SELECT {} FROM analysis_results WHERE user_id = ?1 ORDER BY analyzed_at DESC, id DESC LIMIT ?2",
        ANALYSIS_COLUMNS
    );
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params![user_id, limit], parse_analysis_row)?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("Failed to query analysis history")?;

    Ok(rows)
}

fn parse_analysis_row(row: &rusqlite::Row) -> rusqlite::Result<AnalysisResult> {
    Ok(AnalysisResult {
        recent_skill: row.get(0)?,
        peak_skill: row.get(1)?,
        skill_match: row.get(2)?,
        confidence: row.get(3)?,
        verdict: parse_verdict_column(row, 4)?,
        insights: parse_json_column(row, 5)?,
        confidence_factors: parse_json_column(row, 6)?,
        data_quality: parse_json_column(row, 7)?,
        analyzed_at: row.get(8)?,
    })
}

pub(super) fn parse_verdict_column(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<Verdict> {
    let raw: String = row.get(idx)?;
    Verdict::parse(&raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, format!("unknown verdict '{}'", raw).into())
    })
}

fn parse_json_column<T: DeserializeOwned>(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}
