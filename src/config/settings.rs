use anyhow::{Context, Result};
use std::collections::HashMap;
use std::time::Duration;

use crate::rating::curve::{PiecewiseLinear, Segment};

pub struct ApiSettings {
    pub base_url: String,
    pub token_url: String,
    pub client_id: String,
    pub client_secret: String,
    pub user_agent: &'static str,
    pub timeout: Duration,
    pub min_request_interval: Duration,
    pub retry_budget: u32,
    pub backoff_base: Duration,
    pub backoff_cap: Duration,
    pub transient_delay: Duration,
    pub token_refresh_margin: Duration,
    pub user_ttl: Duration,
    pub scores_ttl: Duration,
    pub beatmap_ttl: Duration,
    pub batch_workers: usize,
    pub batch_chunk_size: usize,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: "https://osu.ppy.sh/api/v2".to_string(),
            token_url: "https://osu.ppy.sh/oauth/token".to_string(),
            client_id: String::new(),
            client_secret: String::new(),
            user_agent: "osu-skillcheck/1.0",
            timeout: Duration::from_secs(10),
            min_request_interval: Duration::from_millis(50),
            retry_budget: 3,
            backoff_base: Duration::from_secs(5),
            backoff_cap: Duration::from_secs(30),
            transient_delay: Duration::from_secs(2),
            token_refresh_margin: Duration::from_secs(300),
            user_ttl: Duration::from_secs(600),
            scores_ttl: Duration::from_secs(180),
            beatmap_ttl: Duration::from_secs(3600),
            batch_workers: 5,
            batch_chunk_size: 50,
        }
    }
}

/// A set of mods that earns one fixed multiplier when all of them co-occur.
#[derive(Clone)]
pub struct ModCombination {
    pub mods: Vec<&'static str>,
    pub multiplier: f64,
}

#[derive(Clone)]
pub struct ScoringSettings {
    pub accuracy_factor: PiecewiseLinear,
    pub difficulty_scale: PiecewiseLinear,
    pub fail_penalty: f64,
    pub aim_star_exponent: f64,
    pub ar_baseline: f64,
    pub ar_coefficient: f64,
    pub normal_bpm: f64,
    pub bpm_cap: f64,
    pub speed_star_exponent: f64,
    pub accuracy_floor: f64,
    pub accuracy_exponent: f64,
    pub accuracy_star_coefficient: f64,
    pub aim_weight: f64,
    pub speed_weight: f64,
    pub accuracy_weight: f64,
    pub mod_multipliers: HashMap<&'static str, f64>,
    pub mod_aliases: HashMap<&'static str, &'static str>,
    /// Checked in order, the first fully present combination wins.
    pub mod_combinations: Vec<ModCombination>,
    pub multiplier_min: f64,
    pub multiplier_max: f64,
    pub position_decay: f64,
    pub retry_penalty: f64,
    pub recent_sample: usize,
    pub peak_sample: usize,
    /// (max age in days, weight) plateaus, ascending.
    pub temporal_plateaus: Vec<(i64, f64)>,
    pub temporal_decay_rate: f64,
    pub temporal_floor: f64,
    pub temporal_neutral: f64,
}

impl Default for ScoringSettings {
    fn default() -> Self {
        Self {
            accuracy_factor: PiecewiseLinear::new(vec![
                Segment::new(0.0, 0.0, 0.01),
                Segment::new(90.0, 0.90, 0.01),
                Segment::new(95.0, 0.95, 0.01),
                Segment::new(98.0, 0.98, 0.02),
            ]),
            difficulty_scale: PiecewiseLinear::new(vec![
                Segment::new(0.0, 0.8, 0.1),
                Segment::new(2.0, 1.0, 0.2),
                Segment::new(4.0, 1.4, 0.25),
                Segment::new(6.0, 1.9, 0.15),
            ]),
            fail_penalty: 0.85,
            aim_star_exponent: 1.05,
            ar_baseline: 9.0,
            ar_coefficient: 0.05,
            normal_bpm: 150.0,
            bpm_cap: 2.0,
            speed_star_exponent: 0.8,
            accuracy_floor: 90.0,
            accuracy_exponent: 1.1,
            accuracy_star_coefficient: 0.1,
            aim_weight: 0.45,
            speed_weight: 0.35,
            accuracy_weight: 0.20,
            mod_multipliers: HashMap::from([
                ("HD", 1.06),
                ("HR", 1.12),
                ("DT", 1.18),
                ("EZ", 0.88),
                ("FL", 1.15),
                ("SO", 0.92),
                ("NF", 0.98),
                ("SD", 1.0),
                ("PF", 1.0),
                ("HT", 0.82),
            ]),
            mod_aliases: HashMap::from([("NC", "DT")]),
            mod_combinations: vec![
                ModCombination { mods: vec!["DT", "HR", "HD"], multiplier: 1.35 },
                ModCombination { mods: vec!["DT", "HR"], multiplier: 1.28 },
                ModCombination { mods: vec!["DT", "HD"], multiplier: 1.24 },
                ModCombination { mods: vec!["HR", "HD"], multiplier: 1.18 },
            ],
            multiplier_min: 0.6,
            multiplier_max: 2.5,
            position_decay: 0.97,
            retry_penalty: 0.75,
            recent_sample: 30,
            peak_sample: 25,
            temporal_plateaus: vec![(14, 1.0), (30, 0.95), (60, 0.85), (90, 0.75), (180, 0.6)],
            temporal_decay_rate: 0.005,
            temporal_floor: 0.4,
            temporal_neutral: 0.5,
        }
    }
}

#[derive(Clone)]
pub struct ConfidenceSettings {
    pub volume: PiecewiseLinear,
    pub diversity: PiecewiseLinear,
    pub recency: PiecewiseLinear,
    pub consistency_floor: f64,
    pub consistency_normalizer: f64,
    pub consistency_single_sample: f64,
    pub consistency_fallback: f64,
    pub volume_weight: f64,
    pub diversity_weight: f64,
    pub recency_weight: f64,
    pub consistency_weight: f64,
    pub low_volume_threshold: f64,
    pub low_volume_penalty: f64,
    pub mid_volume_threshold: f64,
    pub mid_volume_penalty: f64,
}

impl Default for ConfidenceSettings {
    fn default() -> Self {
        Self {
            volume: PiecewiseLinear::new(vec![
                Segment::new(0.0, 0.0, 0.08),
                Segment::new(6.0, 0.5, 0.05),
                Segment::new(10.0, 0.7, 0.03),
                Segment::new(15.0, 0.85, 0.015),
                Segment::new(25.0, 1.0, 0.0),
            ])
            .with_floor(0.3),
            diversity: PiecewiseLinear::new(vec![
                Segment::new(0.0, 0.0, 0.1),
                Segment::new(6.0, 0.6, 0.05),
                Segment::new(10.0, 0.8, 0.04),
                Segment::new(15.0, 1.0, 0.0),
            ])
            .with_floor(0.4),
            recency: PiecewiseLinear::new(vec![
                Segment::new(0.0, 0.0, 0.3),
                Segment::new(2.0, 0.6, 0.1),
                Segment::new(4.0, 0.8, 0.1),
                Segment::new(6.0, 1.0, 0.0),
            ])
            .with_floor(0.4),
            consistency_floor: 0.4,
            consistency_normalizer: 25.0,
            consistency_single_sample: 0.8,
            consistency_fallback: 0.6,
            volume_weight: 0.35,
            diversity_weight: 0.25,
            recency_weight: 0.25,
            consistency_weight: 0.15,
            low_volume_threshold: 0.4,
            low_volume_penalty: 0.75,
            mid_volume_threshold: 0.6,
            mid_volume_penalty: 0.9,
        }
    }
}

#[derive(Clone)]
pub struct VerdictSettings {
    pub min_recent_plays: usize,
    pub min_top_plays: usize,
    pub min_confidence: f64,
    pub fallback_confidence: f64,
    pub fallback_skill_match: f64,
    pub accurate: f64,
    pub slightly_rusty: f64,
    pub rusty: f64,
    pub overranked: f64,
    pub reliability: PiecewiseLinear,
}

impl Default for VerdictSettings {
    fn default() -> Self {
        Self {
            min_recent_plays: 6,
            min_top_plays: 8,
            min_confidence: 20.0,
            fallback_confidence: 15.0,
            fallback_skill_match: 50.0,
            accurate: 92.0,
            slightly_rusty: 75.0,
            rusty: 55.0,
            overranked: 35.0,
            reliability: PiecewiseLinear::new(vec![
                Segment::new(0.0, 0.0, 0.1),
                Segment::new(6.0, 0.7, 0.0375),
                Segment::new(10.0, 0.85, 0.02),
                Segment::new(15.0, 0.95, 0.005),
                Segment::new(25.0, 1.0, 0.0),
            ])
            .with_floor(0.5),
        }
    }
}

#[derive(Clone)]
pub struct AnalysisSettings {
    pub score_limit: usize,
    pub fetch_margin: usize,
    pub recent_window_days: i64,
    pub quality_floor: usize,
    pub retry_window: usize,
    pub retry_threshold: chrono::Duration,
    pub cached_analysis_lifetime: chrono::Duration,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            score_limit: 25,
            fetch_margin: 10,
            recent_window_days: 60,
            quality_floor: 10,
            retry_window: 8,
            retry_threshold: chrono::Duration::minutes(20),
            cached_analysis_lifetime: chrono::Duration::minutes(30),
        }
    }
}

/// Everything the scoring pipeline reads, grouped so it can be cloned cheaply
/// into request handlers.
#[derive(Clone, Default)]
pub struct RatingSettings {
    pub scoring: ScoringSettings,
    pub confidence: ConfidenceSettings,
    pub verdict: VerdictSettings,
    pub analysis: AnalysisSettings,
}

pub struct AppConfig {
    pub api: ApiSettings,
    pub rating: RatingSettings,
    pub database_path: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl AppConfig {
    pub fn new() -> Self {
        Self {
            api: ApiSettings::default(),
            rating: RatingSettings::default(),
            database_path: "skillcheck.db".to_string(),
        }
    }

    /// Defaults plus credentials and paths taken from the environment.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::offline();
        config.api.client_id = read_required_var("OSU_CLIENT_ID")?;
        config.api.client_secret = read_required_var("OSU_CLIENT_SECRET")?;
        Ok(config)
    }

    /// Environment overrides that do not need API credentials.
    pub fn offline() -> Self {
        let mut config = Self::new();
        if let Ok(path) = std::env::var("DATABASE_PATH") {
            config.database_path = path;
        }
        config
    }
}

fn read_required_var(name: &str) -> Result<String> {
    std::env::var(name).with_context(|| format!("{} environment variable must be set", name))
}
