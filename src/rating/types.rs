use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Per-play skill split, already fail-penalty adjusted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SkillComponents {
    pub aim: f64,
    pub speed: f64,
    pub accuracy: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceFactors {
    pub volume: f64,
    pub diversity: f64,
    pub recency: f64,
    pub consistency: f64,
}

impl ConfidenceFactors {
    pub fn rounded(&self, decimals: i32) -> Self {
        Self {
            volume: round_to(self.volume, decimals),
            diversity: round_to(self.diversity, decimals),
            recency: round_to(self.recency, decimals),
            consistency: round_to(self.consistency, decimals),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Insufficient,
    Inactive,
    Overranked,
    Rusty,
    SlightlyRusty,
    Accurate,
}

impl Verdict {
    pub fn as_str(&self) -> &str {
        match self {
            Verdict::Insufficient => "insufficient",
            Verdict::Inactive => "inactive",
            Verdict::Overranked => "overranked",
            Verdict::Rusty => "rusty",
            Verdict::SlightlyRusty => "slightly_rusty",
            Verdict::Accurate => "accurate",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "insufficient" => Some(Verdict::Insufficient),
            "inactive" => Some(Verdict::Inactive),
            "overranked" => Some(Verdict::Overranked),
            "rusty" => Some(Verdict::Rusty),
            "slightly_rusty" => Some(Verdict::SlightlyRusty),
            "accurate" => Some(Verdict::Accurate),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataQuality {
    pub valid_recent_plays: usize,
    pub valid_top_plays: usize,
    pub total_recent_plays: usize,
    pub total_top_plays: usize,
}

/// Output of one analysis run. Built once and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub recent_skill: f64,
    pub peak_skill: f64,
    pub skill_match: f64,
    pub confidence: f64,
    pub confidence_factors: ConfidenceFactors,
    pub verdict: Verdict,
    pub insights: Vec<String>,
    pub data_quality: DataQuality,
    pub analyzed_at: DateTime<Utc>,
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}
