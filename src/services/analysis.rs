use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use futures::future::try_join;
use log::{info, warn};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Instant;

use crate::api::{ApiGateway, BatchFetcher, ScoreType};
use crate::config::{AppConfig, RatingSettings};
use crate::database::{LeaderboardEntry, LeaderboardFilter, ResultStore};
use crate::domain::{Beatmap, EnrichedPlay, Play};
use crate::errors::AnalysisError;
use crate::rating::{analyze_plays, select_for_analysis, AnalysisResult};

/// The caller-facing entry point: username in, stored analysis out.
pub struct AnalysisService {
    gateway: Arc<ApiGateway>,
    batch: BatchFetcher,
    store: Arc<dyn ResultStore>,
    settings: RatingSettings,
}

impl AnalysisService {
    pub fn new(
        gateway: Arc<ApiGateway>,
        batch: BatchFetcher,
        store: Arc<dyn ResultStore>,
        settings: RatingSettings,
    ) -> Self {
        Self {
            gateway,
            batch,
            store,
            settings,
        }
    }

    pub fn from_config(config: &AppConfig, store: Arc<dyn ResultStore>) -> Result<Self> {
        let gateway = Arc::new(ApiGateway::new(&config.api)?);
        let batch = BatchFetcher::new(
            Arc::clone(&gateway),
            config.api.batch_workers,
            config.api.batch_chunk_size,
        );
        Ok(Self::new(gateway, batch, store, config.rating.clone()))
    }

    pub async fn analyze(&self, username: &str) -> Result<AnalysisResult, AnalysisError> {
        self.analyze_with(username, false).await
    }

    /// Run a full analysis; `force` skips reuse of a fresh stored result.
    pub async fn analyze_with(&self, username: &str, force: bool) -> Result<AnalysisResult, AnalysisError> {
        let started = Instant::now();
        let now = Utc::now();

        let user = self
            .gateway
            .get_user(username)
            .await?
            .ok_or_else(|| AnalysisError::UserNotFound(username.to_string()))?;
        let user_id = self.store.upsert_user(&user).map_err(AnalysisError::Storage)?;

        if !force {
            if let Some(cached) = self.reusable_analysis(user_id, now) {
                info!("Reusing analysis for {} from {}", user.username, cached.analyzed_at);
                self.record_leaderboard(user_id, &cached);
                return Ok(cached);
            }
        }

        let (recent, top) = self.fetch_plays(user.id, now).await?;
        let (recent, top) = self.enrich(recent, top).await;

        let recent = select_for_analysis(&recent, self.settings.analysis.score_limit, &self.settings.analysis);
        let result = analyze_plays(&recent, &top, now, &self.settings);

        self.persist(user_id, &result);
        info!(
            "Analysed {} in {:.2}s: {} ({:.1}% match, {:.1}% confidence)",
            user.username,
            started.elapsed().as_secs_f64(),
            result.verdict.as_str(),
            result.skill_match,
            result.confidence
        );

        Ok(result)
    }

    pub fn leaderboard(&self, filter: &LeaderboardFilter) -> Result<Vec<LeaderboardEntry>> {
        self.store.get_leaderboard(filter)
    }

    /// Stored analyses of a user, newest first. Empty if they were never analysed.
    pub async fn history(&self, username: &str, limit: usize) -> Result<Vec<AnalysisResult>, AnalysisError> {
        match self.stored_user_id(username).await? {
            Some(user_id) => self
                .store
                .get_analysis_history(user_id, limit)
                .map_err(AnalysisError::Storage),
            None => Ok(Vec::new()),
        }
    }

    /// The user's leaderboard row, if they have one.
    pub async fn position(&self, username: &str) -> Result<Option<LeaderboardEntry>, AnalysisError> {
        match self.stored_user_id(username).await? {
            Some(user_id) => self.store.get_user_position(user_id).map_err(AnalysisError::Storage),
            None => Ok(None),
        }
    }

    // --- Helper Methods ---

    /// Resolve the name upstream, then find the user in the store without writing.
    async fn stored_user_id(&self, username: &str) -> Result<Option<i64>, AnalysisError> {
        let user = self
            .gateway
            .get_user(username)
            .await?
            .ok_or_else(|| AnalysisError::UserNotFound(username.to_string()))?;

        self.store.find_user(user.id).map_err(AnalysisError::Storage)
    }

    fn reusable_analysis(&self, user_id: i64, now: DateTime<Utc>) -> Option<AnalysisResult> {
        let lifetime = self.settings.analysis.cached_analysis_lifetime;
        match self.store.get_latest_analysis(user_id) {
            Ok(Some(cached)) if now.signed_duration_since(cached.analyzed_at) < lifetime => Some(cached),
            Ok(_) => None,
            Err(e) => {
                warn!("Ignoring stored analysis for user {}: {:#}", user_id, e);
                None
            }
        }
    }

    /// Recent and best scores fetched concurrently; recent ones limited to the activity window.
    async fn fetch_plays(&self, osu_id: i64, now: DateTime<Utc>) -> Result<(Vec<Play>, Vec<Play>), AnalysisError> {
        let limit = self.settings.analysis.score_limit + self.settings.analysis.fetch_margin;

        let (recent, mut top) = try_join(
            self.gateway.get_user_scores(osu_id, ScoreType::Recent, limit),
            self.gateway.get_user_scores(osu_id, ScoreType::Best, limit),
        )
        .await?;

        let window = Duration::days(self.settings.analysis.recent_window_days);
        let fetched = recent.len();
        let recent = within_window(recent, now, window);
        top.truncate(self.settings.analysis.score_limit);

        info!(
            "Fetched {} top plays and {} recent plays ({} inside the activity window)",
            top.len(),
            fetched,
            recent.len()
        );
        Ok((recent, top))
    }

    /// Attach map metadata fetched once for the union of both play sets.
    async fn enrich(&self, recent: Vec<Play>, top: Vec<Play>) -> (Vec<EnrichedPlay>, Vec<EnrichedPlay>) {
        let ids: Vec<i64> = recent
            .iter()
            .chain(top.iter())
            .filter_map(|play| play.beatmap_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let started = Instant::now();
        let beatmaps = self.batch.fetch_beatmaps(&ids).await;
        info!(
            "Enriched with {}/{} beatmaps in {:.2}s",
            beatmaps.len(),
            ids.len(),
            started.elapsed().as_secs_f64()
        );

        (attach(recent, &beatmaps), attach(top, &beatmaps))
    }

    fn persist(&self, user_id: i64, result: &AnalysisResult) {
        if let Err(e) = self.store.save_analysis(user_id, result) {
            warn!("Analysis for user {} not saved: {:#}", user_id, e);
        }
        self.record_leaderboard(user_id, result);
    }

    fn record_leaderboard(&self, user_id: i64, result: &AnalysisResult) {
        if let Err(e) = self.store.update_leaderboard(user_id, result) {
            warn!("Leaderboard not updated for user {}: {:#}", user_id, e);
        }
    }
}

/// Plays at or after `now - window`; undated plays are dropped.
pub fn within_window(plays: Vec<Play>, now: DateTime<Utc>, window: Duration) -> Vec<Play> {
    let cutoff = now - window;
    plays
        .into_iter()
        .filter(|play| play.played_at().is_some_and(|at| at >= cutoff))
        .collect()
}

fn attach(plays: Vec<Play>, beatmaps: &HashMap<i64, Beatmap>) -> Vec<EnrichedPlay> {
    plays
        .into_iter()
        .map(|play| {
            let beatmap = play.beatmap_id.and_then(|id| beatmaps.get(&id).cloned());
            EnrichedPlay::new(play, beatmap)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RankedStatus;
    use chrono::TimeZone;

    fn raw_play(beatmap_id: Option<i64>, created_at: Option<&str>) -> Play {
        Play {
            score_id: None,
            beatmap_id,
            accuracy: Some(0.95),
            created_at: created_at.map(str::to_string),
            mods: vec![],
            passed: true,
            pp: None,
            is_retry: false,
        }
    }

    #[test]
    fn test_within_window_drops_old_and_undated() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let plays = vec![
            raw_play(Some(1), Some("2024-05-30T00:00:00Z")),
            raw_play(Some(2), Some("2024-04-02T00:00:00Z")),
            raw_play(Some(3), Some("2024-03-01T00:00:00Z")),
            raw_play(Some(4), None),
            raw_play(Some(5), Some("garbage")),
        ];

        let kept = within_window(plays, now, Duration::days(60));
        let ids: Vec<_> = kept.iter().map(|p| p.beatmap_id).collect();
        assert_eq!(ids, vec![Some(1), Some(2)]);
    }

    #[test]
    fn test_attach_leaves_missing_maps_unenriched() {
        let beatmaps = HashMap::from([(
            1,
            Beatmap {
                id: 1,
                star_rating: Some(5.0),
                approach_rate: Some(9.0),
                bpm: Some(180.0),
                status: RankedStatus::Ranked,
            },
        )]);
        let plays = vec![raw_play(Some(1), None), raw_play(Some(2), None), raw_play(None, None)];

        let enriched = attach(plays, &beatmaps);
        assert!(enriched[0].beatmap_full.is_some());
        assert!(enriched[1].beatmap_full.is_none());
        assert!(enriched[2].beatmap_full.is_none());
    }

    mod flow {
        use super::super::*;
        use crate::api::fake_osu::{self, FixtureHits};
        use crate::database::SqliteResultStore;
        use crate::rating::Verdict;

        async fn service(hits: FixtureHits) -> AnalysisService {
            let host = fake_osu::spawn(fake_osu::fixture_routes(hits)).await;
            let gateway = Arc::new(ApiGateway::new(&fake_osu::settings(&host)).unwrap());
            let batch = BatchFetcher::new(Arc::clone(&gateway), 4, 5);
            let store = Arc::new(SqliteResultStore::in_memory().unwrap());
            AnalysisService::new(gateway, batch, store, RatingSettings::default())
        }

        #[tokio::test]
        async fn test_full_analysis_is_scored_and_ranked() {
            let hits = FixtureHits::default();
            let service = service(hits.clone()).await;

            let result = service.analyze(fake_osu::PLAYER).await.unwrap();

            assert_eq!(result.data_quality.valid_recent_plays, 12);
            assert_eq!(result.data_quality.valid_top_plays, 12);
            assert!(result.recent_skill > 0.0);
            assert!(result.recent_skill < result.peak_skill);
            assert!(result.skill_match < 100.0);
            assert!(!matches!(result.verdict, Verdict::Insufficient | Verdict::Inactive));
            assert!(!result.insights.is_empty());
            // 24 distinct maps, each fetched once
            assert_eq!(hits.beatmaps.count(), 24);
            assert_eq!(hits.scores.count(), 2);

            let board = service.leaderboard(&LeaderboardFilter::default()).unwrap();
            assert_eq!(board.len(), 1);
            assert_eq!(board[0].username, fake_osu::PLAYER);
            assert_eq!(board[0].rank_position, Some(1));
            assert_eq!(board[0].verdict, result.verdict);
        }

        #[tokio::test]
        async fn test_unknown_user_is_not_found() {
            let service = service(FixtureHits::default()).await;

            let err = service.analyze("ghost").await.unwrap_err();
            assert!(matches!(err, AnalysisError::UserNotFound(name) if name == "ghost"));

            let board = service.leaderboard(&LeaderboardFilter::default()).unwrap();
            assert!(board.is_empty());
        }

        #[tokio::test]
        async fn test_fresh_analysis_is_reused_unless_forced() {
            let service = service(FixtureHits::default()).await;

            let first = service.analyze(fake_osu::PLAYER).await.unwrap();
            let reused = service.analyze(fake_osu::PLAYER).await.unwrap();
            assert_eq!(
                reused.analyzed_at.timestamp_millis(),
                first.analyzed_at.timestamp_millis()
            );
            assert_eq!(reused.verdict, first.verdict);

            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            let forced = service.analyze_with(fake_osu::PLAYER, true).await.unwrap();
            assert!(forced.analyzed_at > first.analyzed_at);
            assert_eq!(forced.recent_skill, first.recent_skill);
        }

        #[tokio::test]
        async fn test_history_and_position_after_analyses() {
            let service = service(FixtureHits::default()).await;

            assert!(service.history(fake_osu::PLAYER, 10).await.unwrap().is_empty());
            assert!(service.position(fake_osu::PLAYER).await.unwrap().is_none());

            let first = service.analyze(fake_osu::PLAYER).await.unwrap();
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            let forced = service.analyze_with(fake_osu::PLAYER, true).await.unwrap();

            let history = service.history(fake_osu::PLAYER, 10).await.unwrap();
            assert_eq!(history.len(), 2);
            assert_eq!(
                history[0].analyzed_at.timestamp_millis(),
                forced.analyzed_at.timestamp_millis()
            );
            assert_eq!(
                history[1].analyzed_at.timestamp_millis(),
                first.analyzed_at.timestamp_millis()
            );
            assert_eq!(service.history(fake_osu::PLAYER, 1).await.unwrap().len(), 1);

            let position = service.position(fake_osu::PLAYER).await.unwrap().unwrap();
            assert_eq!(position.rank_position, Some(1));
            assert_eq!(position.verdict, forced.verdict);
        }

        #[tokio::test]
        async fn test_history_of_unknown_user_is_not_found() {
            let service = service(FixtureHits::default()).await;

            let err = service.history("ghost", 10).await.unwrap_err();
            assert!(matches!(err, AnalysisError::UserNotFound(_)));
            let err = service.position("ghost").await.unwrap_err();
            assert!(matches!(err, AnalysisError::UserNotFound(_)));
        }
    }
}
