use log::debug;

use super::retries::mark_retries;
use crate::config::AnalysisSettings;
use crate::domain::EnrichedPlay;

const AIM_SHARE: f64 = 0.4;
const SPEED_SHARE: f64 = 0.3;
const READING_SHARE: f64 = 0.3;
const RETRY_DISCOUNT: f64 = 0.7;

/// Cheap ranking estimate used only to pick which recent plays to analyse.
pub fn provisional_score(play: &EnrichedPlay) -> f64 {
    let Some(beatmap) = play.beatmap_full.as_ref() else {
        return 0.0;
    };

    let accuracy = play.accuracy_percent();
    let stars = beatmap.star_rating.unwrap_or(0.0).max(0.0);
    let ar = beatmap.approach_rate.unwrap_or(0.0);
    let bpm = beatmap.bpm.unwrap_or(0.0);

    let score = AIM_SHARE * accuracy * stars.sqrt()
        + SPEED_SHARE * accuracy * (bpm / 100.0)
        + READING_SHARE * accuracy * ar;

    if play.is_retry() {
        score * RETRY_DISCOUNT
    } else {
        score
    }
}

/// Best `target` plays by provisional score, never fewer than the floor
/// while enough plays exist.
pub fn select_for_analysis(
    plays: &[EnrichedPlay],
    target: usize,
    settings: &AnalysisSettings,
) -> Vec<EnrichedPlay> {
    let mut ranked = mark_retries(plays, settings.retry_window, settings.retry_threshold);
    ranked.sort_by(|a, b| provisional_score(b).total_cmp(&provisional_score(a)));

    let keep = selection_size(ranked.len(), target, settings.quality_floor);
    debug!("Quality filter kept {} of {} recent plays", keep, ranked.len());

    ranked.truncate(keep);
    ranked
}

fn selection_size(available: usize, target: usize, floor: usize) -> usize {
    let selected = target.min(available);
    if selected < floor && available >= floor {
        floor
    } else {
        selected
    }
}
