use std::ops::RangeInclusive;

use crate::domain::EnrichedPlay;

const ACCURACY_RANGE: RangeInclusive<f64> = 0.0..=1.0;
const STAR_RATING_RANGE: RangeInclusive<f64> = 0.0..=12.0;
const APPROACH_RATE_RANGE: RangeInclusive<f64> = 0.0..=11.0;
const BPM_RANGE: RangeInclusive<f64> = 30.0..=600.0;

/// Whether a play carries everything scoring needs, within plausible ranges.
pub fn is_valid(play: &EnrichedPlay) -> bool {
    let Some(accuracy) = play.play.accuracy else {
        return false;
    };
    if play.play.created_at.is_none() {
        return false;
    }
    let Some(beatmap) = play.beatmap_full.as_ref() else {
        return false;
    };
    let (Some(stars), Some(ar), Some(bpm)) = (beatmap.star_rating, beatmap.approach_rate, beatmap.bpm)
    else {
        return false;
    };

    ACCURACY_RANGE.contains(&accuracy)
        && STAR_RATING_RANGE.contains(&stars)
        && APPROACH_RATE_RANGE.contains(&ar)
        && BPM_RANGE.contains(&bpm)
}

pub fn filter_valid(plays: &[EnrichedPlay]) -> Vec<EnrichedPlay> {
    plays.iter().filter(|play| is_valid(play)).cloned().collect()
}
