use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};

use super::connection::DbConn;
use super::models::DbUser;
use crate::domain::UserInfo;

const USER_COLUMNS: &str =
    "id, osu_id, username, avatar_url, global_rank, pp, play_count, created_at, updated_at";

/// Insert the user or refresh their profile fields, keyed by osu! id.
pub fn upsert_user(conn: &mut DbConn, user: &UserInfo, now: DateTime<Utc>) -> Result<DbUser> {
    let stats = user.statistics.clone().unwrap_or_default();
    let sql = format!(
        "INSERT INTO users (osu_id, username, avatar_url, global_rank, pp, play_count, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
         ON CONFLICT(osu_id) DO UPDATE SET
             username = excluded.username,
             avatar_url = excluded.avatar_url,
             global_rank = excluded.global_rank,
             pp = excluded.pp,
             play_count = excluded.play_count,
             updated_at = excluded.updated_at
         RETURNING {}",
        USER_COLUMNS
    );

    conn.query_row(
        &sql,
        params![
            user.id,
            user.username,
            user.avatar_url,
            stats.global_rank,
            stats.pp,
            stats.play_count,
            now
        ],
        parse_user_row,
    )
    .context("Failed to upsert user")
}

pub fn find_by_osu_id(conn: &mut DbConn, osu_id: i64) -> Result<Option<DbUser>> {
    let sql = format!("SELECT {} FROM users WHERE osu_id = ?1", USER_COLUMNS);

    conn.query_row(&sql, params![osu_id], parse_user_row)
        .optional()
        .context("Failed to query user by osu_id")
}

fn parse_user_row(row: &rusqlite::Row) -> rusqlite::Result<DbUser> {
    Ok(DbUser {
        id: row.get(0)?,
        osu_id: row.get(1)?,
        username: row.get(2)?,
        avatar_url: row.get(3)?,
        global_rank: row.get(4)?,
        pp: row.get(5)?,
        play_count: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}
