use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

const DEFAULT_APPROACH_RATE: f64 = 9.0;
const DEFAULT_BPM: f64 = 120.0;

// --- API Response Structures ---

/// User profile from `users/{username}/osu`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserInfo {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub statistics: Option<UserStatistics>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserStatistics {
    #[serde(default)]
    pub global_rank: Option<i64>,
    #[serde(default)]
    pub pp: Option<f64>,
    #[serde(default)]
    pub play_count: Option<i64>,
}

/// Mods arrive either as bare acronyms or as `{ "acronym": .. }` objects
/// depending on the API version.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ModEntry {
    Acronym(String),
    Detailed { acronym: String },
}

impl ModEntry {
    pub fn acronym(&self) -> &str {
        match self {
            ModEntry::Acronym(acronym) => acronym,
            ModEntry::Detailed { acronym } => acronym,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BeatmapRef {
    pub id: i64,
}

/// Raw score from `users/{id}/scores/{type}`
#[derive(Debug, Clone, Deserialize)]
pub struct ScoreResponse {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub accuracy: Option<f64>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub mods: Vec<ModEntry>,
    #[serde(default = "default_passed")]
    pub passed: bool,
    #[serde(default)]
    pub pp: Option<f64>,
    #[serde(default)]
    pub beatmap: Option<BeatmapRef>,
}

fn default_passed() -> bool {
    true
}

/// Raw beatmap from `beatmaps/{id}`
#[derive(Debug, Clone, Deserialize)]
pub struct BeatmapResponse {
    pub id: i64,
    #[serde(default)]
    pub difficulty_rating: Option<f64>,
    #[serde(default)]
    pub ar: Option<f64>,
    #[serde(default)]
    pub bpm: Option<f64>,
    #[serde(default)]
    pub status: RankedStatus,
}

// --- Domain Structures ---

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RankedStatus {
    Ranked,
    Loved,
    Qualified,
    #[default]
    #[serde(other)]
    Other,
}

/// Map metadata attached to a play during enrichment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Beatmap {
    pub id: i64,
    pub star_rating: Option<f64>,
    pub approach_rate: Option<f64>,
    pub bpm: Option<f64>,
    pub status: RankedStatus,
}

impl From<BeatmapResponse> for Beatmap {
    fn from(raw: BeatmapResponse) -> Self {
        Self {
            id: raw.id,
            star_rating: raw.difficulty_rating,
            approach_rate: raw.ar,
            bpm: raw.bpm,
            status: raw.status,
        }
    }
}

/// A single recorded attempt at a map.
///
/// `is_retry` is derived per analysis run and never trusted from input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Play {
    pub score_id: Option<i64>,
    pub beatmap_id: Option<i64>,
    pub accuracy: Option<f64>,
    pub created_at: Option<String>,
    pub mods: Vec<String>,
    pub passed: bool,
    pub pp: Option<f64>,
    #[serde(default, skip_deserializing)]
    pub is_retry: bool,
}

impl From<ScoreResponse> for Play {
    fn from(raw: ScoreResponse) -> Self {
        Self {
            score_id: raw.id,
            beatmap_id: raw.beatmap.map(|b| b.id),
            accuracy: raw.accuracy,
            created_at: raw.created_at.filter(|s| !s.is_empty()),
            mods: raw.mods.iter().map(|m| m.acronym().to_uppercase()).collect(),
            passed: raw.passed,
            pp: raw.pp,
            is_retry: false,
        }
    }
}

impl Play {
    pub fn played_at(&self) -> Option<DateTime<Utc>> {
        self.created_at.as_deref().and_then(parse_timestamp)
    }
}

/// A play with its map metadata, which may be missing if enrichment failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedPlay {
    pub play: Play,
    pub beatmap_full: Option<Beatmap>,
}

impl EnrichedPlay {
    pub fn new(play: Play, beatmap_full: Option<Beatmap>) -> Self {
        Self { play, beatmap_full }
    }

    pub fn accuracy_percent(&self) -> f64 {
        self.play.accuracy.unwrap_or(0.0) * 100.0
    }

    pub fn star_rating(&self) -> f64 {
        self.beatmap_full
            .as_ref()
            .and_then(|b| b.star_rating)
            .unwrap_or(0.0)
    }

    pub fn approach_rate(&self) -> f64 {
        self.beatmap_full
            .as_ref()
            .and_then(|b| b.approach_rate)
            .unwrap_or(DEFAULT_APPROACH_RATE)
    }

    pub fn bpm(&self) -> f64 {
        self.beatmap_full
            .as_ref()
            .and_then(|b| b.bpm)
            .unwrap_or(DEFAULT_BPM)
    }

    pub fn is_retry(&self) -> bool {
        self.play.is_retry
    }

    pub fn with_retry(mut self, is_retry: bool) -> Self {
        self.play.is_retry = is_retry;
        self
    }
}

/// Parse an API timestamp; accepts RFC 3339 and naive ISO forms (taken as UTC).
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }

    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(|naive| naive.and_utc())
}
