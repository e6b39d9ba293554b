use chrono::{DateTime, Utc};
use log::info;

use super::confidence::{confidence_factors, confidence_score};
use super::insights::{generate_insights, InsightContext};
use super::types::{round_to, AnalysisResult, DataQuality};
use super::validation::filter_valid;
use super::verdict::{classify, VerdictInputs};
use super::weighting::{peak_skill, recent_skill, skill_match};
use crate::config::RatingSettings;

use crate::domain::EnrichedPlay;

/// Score enriched recent and top plays into a finished analysis.
///
/// Pure apart from logging: the same plays and `now` give the same result.
pub fn analyze_plays(
    recent: &[EnrichedPlay],
    top: &[EnrichedPlay],
    now: DateTime<Utc>,
    settings: &RatingSettings,
) -> AnalysisResult {
    let valid_recent = filter_valid(recent);
    let valid_top = filter_valid(top);
    info!(
        "Scoring {}/{} recent and {}/{} top plays",
        valid_recent.len(),
        recent.len(),
        valid_top.len(),
        top.len()
    );

    let recent_score = recent_skill(&valid_recent, now, &settings.scoring, &settings.analysis);
    let peak_score = peak_skill(&valid_top, now, &settings.scoring, &settings.analysis);
    let matched = skill_match(recent_score, peak_score, valid_recent.len(), &settings.verdict);

    let factors = confidence_factors(&valid_recent, &settings.confidence);
    let confidence = confidence_score(&factors, &settings.confidence);

    let verdict = classify(
        VerdictInputs {
            skill_match: matched,
            confidence,
            recent_count: valid_recent.len(),
            top_count: valid_top.len(),
        },
        &settings.verdict,
    );

    let ctx = InsightContext {
        now,
        scoring: &settings.scoring,
        analysis: &settings.analysis,
    };
    let insights = generate_insights(&valid_recent, &valid_top, &ctx);

    AnalysisResult {
        recent_skill: round_to(recent_score, 1),
        peak_skill: round_to(peak_score, 1),
        skill_match: round_to(matched, 1),
        confidence: round_to(confidence, 1),
        confidence_factors: factors.rounded(3),
        verdict,
        insights,
        data_quality: DataQuality {
            valid_recent_plays: valid_recent.len(),
            valid_top_plays: valid_top.len(),
            total_recent_plays: recent.len(),
            total_top_plays: top.len(),
        },
        analyzed_at: now,
    }
}
