use chrono::{DateTime, Duration, Utc};
use ndarray::Array1;
use std::collections::HashSet;

use super::retries::detect_retry_flags;
use super::skill::score_components;
use crate::config::{AnalysisSettings, ScoringSettings};
use crate::domain::EnrichedPlay;

const LIMITED_DATA: &str = "Limited data available for comprehensive analysis";

const STALE_AFTER_DAYS: i64 = 270;
const STALE_SAMPLE: usize = 10;
const STALE_MIN_COUNT: usize = 7;

const DIFFICULTY_SAMPLE: usize = 10;
const DIFFICULTY_MIN_PLAYS: usize = 5;
const EASIER_RATIO: f64 = 0.7;
const HARDER_RATIO: f64 = 1.15;

const CONSISTENCY_MIN_PLAYS: usize = 7;
const CONSISTENT_ACCURACY_STDEV: f64 = 5.0;

const HIGH_RETRY_RATE: f64 = 0.4;
const LOW_RETRY_RATE: f64 = 0.15;

const WIDE_MOD_VARIETY: usize = 4;

const BIAS_MIN_PLAYS: usize = 5;
const BIAS_SAMPLE: usize = 10;
const SPEED_BIAS: f64 = 1.2;
const AIM_BIAS: f64 = 0.8;

const SPREAD_MIN_PLAYS: usize = 6;
const NARROW_SPREAD: f64 = 0.3;
const WIDE_SPREAD: f64 = 1.0;

const EASY_MIN_PLAYS: usize = 5;
const EASY_HIGH_ACCURACY: f64 = 0.96;
const EASY_STAR_RATING: f64 = 3.5;

/// Settings and clock the insight rules read.
pub struct InsightContext<'a> {
    pub now: DateTime<Utc>,
    pub scoring: &'a ScoringSettings,
    pub analysis: &'a AnalysisSettings,
}

/// Observations about valid recent and top plays, in a fixed rule order.
///
/// Rules are independent; each adds at most one line.
pub fn generate_insights(recent: &[EnrichedPlay], top: &[EnrichedPlay], ctx: &InsightContext) -> Vec<String> {
    if recent.is_empty() || top.is_empty() {
        return vec![LIMITED_DATA.to_string()];
    }

    [
        stale_top_plays(top, ctx.now),
        difficulty_gap(recent, top),
        accuracy_consistency(recent),
        retry_behaviour(recent, ctx.analysis),
        mod_variety(recent),
        speed_aim_bias(recent, ctx.scoring),
        difficulty_spread(recent),
        easy_map_accuracy(recent),
    ]
    .into_iter()
    .flatten()
    .map(str::to_string)
    .collect()
}

fn stale_top_plays(top: &[EnrichedPlay], now: DateTime<Utc>) -> Option<&'static str> {
    let cutoff = now - Duration::days(STALE_AFTER_DAYS);
    let stale = top
        .iter()
        .take(STALE_SAMPLE)
        .filter(|play| play.play.played_at().is_some_and(|at| at < cutoff))
        .count();

    (stale > STALE_MIN_COUNT)
        .then_some("Most top plays are quite old - consider setting new personal bests")
}

fn difficulty_gap(recent: &[EnrichedPlay], top: &[EnrichedPlay]) -> Option<&'static str> {
    if recent.len() < DIFFICULTY_MIN_PLAYS || top.len() < DIFFICULTY_MIN_PLAYS {
        return None;
    }

    let recent_stars = mean_star_rating(&recent[..recent.len().min(DIFFICULTY_SAMPLE)]);
    let top_stars = mean_star_rating(&top[..top.len().min(DIFFICULTY_SAMPLE)]);

    if recent_stars < top_stars * EASIER_RATIO {
        Some("Recent plays are significantly easier than your peak performance")
    } else if recent_stars > top_stars * HARDER_RATIO {
        Some("You're attempting harder maps than your current top plays")
    } else {
        None
    }
}

fn accuracy_consistency(recent: &[EnrichedPlay]) -> Option<&'static str> {
    if recent.len() < CONSISTENCY_MIN_PLAYS {
        return None;
    }

    let accuracies: Array1<f64> = recent.iter().map(EnrichedPlay::accuracy_percent).collect();
    let deviation = accuracies.std(1.0);
    if deviation.is_nan() || deviation >= CONSISTENT_ACCURACY_STDEV {
        return None;
    }

    let mean = accuracies.mean().unwrap_or(0.0);
    Some(if mean >= 95.0 {
        "Excellent aim consistency with exceptional accuracy!"
    } else if mean >= 90.0 {
        "Strong aim consistency with good accuracy"
    } else if mean >= 75.0 {
        "Consistent aim, but accuracy needs improvement"
    } else {
        "Very consistent, but accuracy is too low - focus on precision"
    })
}

fn retry_behaviour(recent: &[EnrichedPlay], settings: &AnalysisSettings) -> Option<&'static str> {
    let flags = detect_retry_flags(recent, settings.retry_window, settings.retry_threshold);
    let retries = flags.iter().filter(|&&flag| flag).count();
    let rate = retries as f64 / flags.len() as f64;

    if rate > HIGH_RETRY_RATE {
        Some("High retry rate detected - consider focusing on first-try consistency")
    } else if rate < LOW_RETRY_RATE {
        Some("Good play selection - low retry rate shows consistency")
    } else {
        None
    }
}

fn mod_variety(recent: &[EnrichedPlay]) -> Option<&'static str> {
    let combinations: HashSet<String> = recent.iter().map(|play| mod_key(&play.play.mods)).collect();

    if combinations.len() == 1 {
        Some("Consider trying different mods to develop diverse skills")
    } else if combinations.len() > WIDE_MOD_VARIETY {
        Some("Good mod variety - you're developing well-rounded skills")
    } else {
        None
    }
}

fn mod_key(mods: &[String]) -> String {
    if mods.is_empty() {
        return "NM".to_string();
    }
    let mut sorted = mods.to_vec();
    sorted.sort();
    sorted.join("+")
}

fn speed_aim_bias(recent: &[EnrichedPlay], settings: &ScoringSettings) -> Option<&'static str> {
    if recent.len() < BIAS_MIN_PLAYS {
        return None;
    }

    let sample = &recent[..recent.len().min(BIAS_SAMPLE)];
    let (aim, speed) = sample.iter().fold((0.0, 0.0), |(aim, speed), play| {
        let components = score_components(play, settings);
        (aim + components.aim, speed + components.speed)
    });
    let ratio = if aim > 0.0 { speed / aim } else { 0.0 };

    if ratio > SPEED_BIAS {
        Some("Your speed outpaces your aim - consider working on precision.")
    } else if ratio < AIM_BIAS {
        Some("Your aim is stronger than your speed - speed training might help balance.")
    } else {
        None
    }
}

fn difficulty_spread(recent: &[EnrichedPlay]) -> Option<&'static str> {
    if recent.len() < SPREAD_MIN_PLAYS {
        return None;
    }

    let stars: Array1<f64> = recent.iter().map(EnrichedPlay::star_rating).collect();
    let deviation = stars.std(1.0);

    if deviation < NARROW_SPREAD {
        Some("You're focusing on a narrow difficulty range - try mixing up challenge levels.")
    } else if deviation > WIDE_SPREAD {
        Some("Great variety in map difficulty - good for balanced improvement.")
    } else {
        None
    }
}

fn easy_map_accuracy(recent: &[EnrichedPlay]) -> Option<&'static str> {
    let easy_high_accuracy = recent
        .iter()
        .filter(|play| {
            play.play.accuracy.unwrap_or(0.0) >= EASY_HIGH_ACCURACY
                && play.star_rating() < EASY_STAR_RATING
        })
        .count();

    (easy_high_accuracy >= EASY_MIN_PLAYS)
        .then_some("You're achieving high accuracy on easier maps - try challenging yourself more.")
}

fn mean_star_rating(plays: &[EnrichedPlay]) -> f64 {
    if plays.is_empty() {
        return 0.0;
    }
    plays.iter().map(EnrichedPlay::star_rating).sum::<f64>() / plays.len() as f64
}
