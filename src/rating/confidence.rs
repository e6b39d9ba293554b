use chrono::Datelike;
use ndarray::Array1;
use std::collections::HashSet;

use super::types::{round_to, ConfidenceFactors};
use crate::config::ConfidenceSettings;
use crate::domain::EnrichedPlay;

/// Reliability factors of a set of valid recent plays.
pub fn confidence_factors(plays: &[EnrichedPlay], settings: &ConfidenceSettings) -> ConfidenceFactors {
    // The curve floors describe a real sample. With no valid plays every
    // factor is zero, never the floored values.
    if plays.is_empty() {
        return ConfidenceFactors::default();
    }

    ConfidenceFactors {
        volume: settings.volume.eval(plays.len() as f64),
        diversity: settings.diversity.eval(count_distinct_maps(plays) as f64),
        recency: settings.recency.eval(count_distinct_weeks(plays) as f64),
        consistency: consistency(plays, settings),
    }
}

/// Combined confidence in percent, one decimal.
pub fn confidence_score(factors: &ConfidenceFactors, settings: &ConfidenceSettings) -> f64 {
    let weighted = factors.volume * settings.volume_weight
        + factors.diversity * settings.diversity_weight
        + factors.recency * settings.recency_weight
        + factors.consistency * settings.consistency_weight;

    let mut confidence = (weighted * 100.0).min(100.0);

    if factors.volume < settings.low_volume_threshold {
        confidence *= settings.low_volume_penalty;
    } else if factors.volume < settings.mid_volume_threshold {
        confidence *= settings.mid_volume_penalty;
    }

    round_to(confidence, 1)
}

fn count_distinct_maps(plays: &[EnrichedPlay]) -> usize {
    plays
        .iter()
        .filter_map(|play| play.play.beatmap_id)
        .collect::<HashSet<_>>()
        .len()
}

/// Distinct ISO calendar weeks touched; the ISO year keeps weeks of
/// different years apart.
fn count_distinct_weeks(plays: &[EnrichedPlay]) -> usize {
    plays
        .iter()
        .filter_map(|play| play.play.played_at())
        .map(|at| {
            let week = at.iso_week();
            (week.year(), week.week())
        })
        .collect::<HashSet<_>>()
        .len()
}

fn consistency(plays: &[EnrichedPlay], settings: &ConfidenceSettings) -> f64 {
    if plays.len() < 2 {
        return settings.consistency_single_sample;
    }

    let accuracies: Array1<f64> = plays.iter().map(EnrichedPlay::accuracy_percent).collect();
    // Sample standard deviation
    let deviation = accuracies.std(1.0);
    if !deviation.is_finite() {
        return settings.consistency_fallback;
    }

    (1.0 - deviation / settings.consistency_normalizer).max(settings.consistency_floor)
}
