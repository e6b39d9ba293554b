pub mod api;
pub mod cache;
pub mod cli;
pub mod config;
pub mod database;
pub mod domain;
pub mod errors;
pub mod http;
pub mod rate_limiter;
pub mod rating;
pub mod services;

use anyhow::{bail, Result};
use clap::Parser;
use cli::Cli;
use colored::Colorize;
use std::sync::Arc;

use crate::cli::Command;
use crate::config::settings::AppConfig;
use crate::database::{LeaderboardEntry, LeaderboardFilter, ResultStore, SqliteResultStore};
use crate::rating::Verdict;
use crate::services::{AnalysisService, ServerService};

pub fn interpret() -> Command {
    let cli = Cli::parse();
    cli.command
}

pub fn handle_analyze(username: &str, force: bool) -> Result<()> {
    let config = AppConfig::from_env()?;
    let service = build_service(&config)?;

    let runtime = tokio::runtime::Runtime::new()?;
    let result = runtime.block_on(service.analyze_with(username, force))?;

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

pub fn handle_serve(port: u16) -> Result<()> {
    let config = AppConfig::from_env()?;
    let service = Arc::new(build_service(&config)?);

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async {
        let server = ServerService::new(port, service);
        server.run().await
    })
}

pub fn handle_leaderboard(limit: usize, verdict: Option<&str>, search: Option<&str>) -> Result<()> {
    let verdict = match verdict {
        None => None,
        Some(raw) => match Verdict::parse(raw) {
            Some(verdict) => Some(verdict),
            None => bail!("Unknown verdict: {}", raw),
        },
    };

    let config = AppConfig::offline();
    let store = SqliteResultStore::open(&config.database_path)?;
    let entries = store.get_leaderboard(&LeaderboardFilter {
        limit,
        verdict,
        name_contains: search.map(str::to_string),
    })?;

    if entries.is_empty() {
        println!("No players analysed yet");
    }
    for entry in &entries {
        println!("{}", format_entry(entry));
    }
    Ok(())
}

fn build_service(config: &AppConfig) -> Result<AnalysisService> {
    let store = Arc::new(SqliteResultStore::open(&config.database_path)?);
    AnalysisService::from_config(config, store)
}

fn format_entry(entry: &LeaderboardEntry) -> String {
    let rank = entry
        .rank_position
        .map_or_else(|| "-".to_string(), |rank| rank.to_string());

    format!(
        "{:>4}. {:<20} {:>7.2}  recent {:>5.1}  peak {:>5.1}  match {:>5.1}%  {}",
        rank,
        entry.username,
        entry.skill_score,
        entry.recent_skill,
        entry.peak_skill,
        entry.skill_match,
        paint_verdict(entry.verdict)
    )
}

fn paint_verdict(verdict: Verdict) -> colored::ColoredString {
    let label = verdict.as_str();
    match verdict {
        Verdict::Accurate => label.green(),
        Verdict::SlightlyRusty => label.cyan(),
        Verdict::Rusty => label.yellow(),
        Verdict::Overranked => label.red(),
        Verdict::Inactive | Verdict::Insufficient => label.dimmed(),
    }
}
