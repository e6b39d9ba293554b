use chrono::{DateTime, Utc};

use super::retries::detect_retry_flags;
use super::skill::score_overall;
use super::types::round_to;
use super::validation::filter_valid;
use crate::config::{AnalysisSettings, ScoringSettings, VerdictSettings};
use crate::domain::{parse_timestamp, EnrichedPlay};

/// Recency weight of a play timestamp relative to `now`.
///
/// Plateaus first, then exponential decay with a floor. Unparseable input
/// gets the neutral weight; future timestamps count as brand new.
pub fn temporal_weight(timestamp: Option<&str>, now: DateTime<Utc>, settings: &ScoringSettings) -> f64 {
    let Some(played_at) = timestamp.and_then(parse_timestamp) else {
        return settings.temporal_neutral;
    };

    let age_days = calculate_age_days(played_at, now);
    settings
        .temporal_plateaus
        .iter()
        .find(|(max_days, _)| age_days <= *max_days)
        .map(|(_, weight)| *weight)
        .unwrap_or_else(|| apply_exponential_decay(age_days, settings))
}

fn calculate_age_days(played_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    now.signed_duration_since(played_at).num_days().max(0)
}

fn apply_exponential_decay(age_days: i64, settings: &ScoringSettings) -> f64 {
    // weight = exp(-rate × days), floored
    let decay = (-settings.temporal_decay_rate * age_days as f64).exp();
    decay.max(settings.temporal_floor)
}

/// Weighted mean skill of `plays`, in the order given.
///
/// Each play at position i weighs temporal × decay^i, discounted further when
/// it is a retry. Returns 0 when nothing valid remains.
pub fn weighted_average(
    plays: &[EnrichedPlay],
    now: DateTime<Utc>,
    scoring: &ScoringSettings,
    analysis: &AnalysisSettings,
) -> f64 {
    let valid = filter_valid(plays);
    if valid.is_empty() {
        return 0.0;
    }

    let retries = detect_retry_flags(&valid, analysis.retry_window, analysis.retry_threshold);

    let mut weighted_sum = 0.0;
    let mut total_weight = 0.0;
    let mut position_weight = 1.0;

    for (play, is_retry) in valid.iter().zip(retries) {
        let retry_factor = if is_retry { scoring.retry_penalty } else { 1.0 };
        let weight = temporal_weight(play.play.created_at.as_deref(), now, scoring)
            * position_weight
            * retry_factor;

        weighted_sum += score_overall(play, scoring) * weight;
        total_weight += weight;
        position_weight *= scoring.position_decay;
    }

    if total_weight > 0.0 {
        weighted_sum / total_weight
    } else {
        0.0
    }
}

pub fn recent_skill(
    plays: &[EnrichedPlay],
    now: DateTime<Utc>,
    scoring: &ScoringSettings,
    analysis: &AnalysisSettings,
) -> f64 {
    let sample = &plays[..plays.len().min(scoring.recent_sample)];
    weighted_average(sample, now, scoring, analysis)
}

/// Skill over the best plays, ranked by pp rather than by time.
pub fn peak_skill(
    plays: &[EnrichedPlay],
    now: DateTime<Utc>,
    scoring: &ScoringSettings,
    analysis: &AnalysisSettings,
) -> f64 {
    let mut ranked = plays.to_vec();
    ranked.sort_by(|a, b| {
        let pp_a = a.play.pp.unwrap_or(0.0);
        let pp_b = b.play.pp.unwrap_or(0.0);
        pp_b.total_cmp(&pp_a)
    });
    ranked.truncate(scoring.peak_sample);

    weighted_average(&ranked, now, scoring, analysis)
}

/// Recent/peak ratio in percent, scaled by how many recent plays back it.
pub fn skill_match(recent: f64, peak: f64, recent_count: usize, settings: &VerdictSettings) -> f64 {
    if peak == 0.0 {
        return 0.0;
    }

    let reliability = settings.reliability.eval(recent_count as f64);
    round_to(recent / peak * 100.0 * reliability, 2)
}
