use std::collections::HashSet;

use super::types::SkillComponents;
use crate::config::ScoringSettings;
use crate::domain::EnrichedPlay;

pub fn score_components(play: &EnrichedPlay, settings: &ScoringSettings) -> SkillComponents {
    let accuracy = play.accuracy_percent();
    let stars = play.star_rating().max(0.0);
    let accuracy_factor = settings.accuracy_factor.eval(accuracy);
    let difficulty_scale = settings.difficulty_scale.eval(stars);

    let aim = accuracy_factor
        * stars.powf(settings.aim_star_exponent)
        * (1.0 + (play.approach_rate() - settings.ar_baseline) * settings.ar_coefficient)
        * difficulty_scale;

    let tempo = (play.bpm() / settings.normal_bpm).min(settings.bpm_cap);
    let speed = accuracy_factor * tempo * stars.powf(settings.speed_star_exponent) * difficulty_scale;

    let precision = accuracy_skill(accuracy, stars, settings);

    let penalty = if play.play.passed { 1.0 } else { settings.fail_penalty };

    SkillComponents {
        aim: aim * penalty,
        speed: speed * penalty,
        accuracy: precision * penalty,
    }
}

fn accuracy_skill(accuracy: f64, stars: f64, settings: &ScoringSettings) -> f64 {
    if accuracy <= settings.accuracy_floor {
        return 0.0;
    }

    let above_floor = (accuracy - settings.accuracy_floor) / (100.0 - settings.accuracy_floor);
    above_floor.powf(settings.accuracy_exponent) * (1.0 + stars * settings.accuracy_star_coefficient)
}

/// Combined multiplier for a mod set.
///
/// The first configured combination whose mods are all present replaces the
/// individual multipliers of those mods; every other mod applies its own.
/// Unknown mods count as 1.0.
pub fn mod_multiplier(mods: &[String], settings: &ScoringSettings) -> f64 {
    let present: HashSet<&str> = mods
        .iter()
        .map(|m| canonical_mod(m, settings))
        .collect();

    let combination = settings
        .mod_combinations
        .iter()
        .find(|combo| combo.mods.iter().all(|m| present.contains(*m)));

    let mut multiplier = combination.map_or(1.0, |combo| combo.multiplier);
    for m in &present {
        let consumed = combination.is_some_and(|combo| combo.mods.iter().any(|c| c == m));
        if !consumed {
            multiplier *= settings.mod_multipliers.get(*m).copied().unwrap_or(1.0);
        }
    }

    multiplier.clamp(settings.multiplier_min, settings.multiplier_max)
}

fn canonical_mod<'a>(acronym: &'a str, settings: &ScoringSettings) -> &'a str {
    settings
        .mod_aliases
        .get(acronym)
        .copied()
        .unwrap_or(acronym)
}

pub fn score_overall(play: &EnrichedPlay, settings: &ScoringSettings) -> f64 {
    let components = score_components(play, settings);
    let base = settings.aim_weight * components.aim
        + settings.speed_weight * components.speed
        + settings.accuracy_weight * components.accuracy;

    base * mod_multiplier(&play.play.mods, settings)
}
