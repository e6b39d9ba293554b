use chrono::{DateTime, TimeZone, Utc};

use crate::domain::{Beatmap, EnrichedPlay, Play, RankedStatus};

pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

pub fn beatmap(id: i64, stars: f64, ar: f64, bpm: f64) -> Beatmap {
    Beatmap {
        id,
        star_rating: Some(stars),
        approach_rate: Some(ar),
        bpm: Some(bpm),
        status: RankedStatus::Ranked,
    }
}

pub fn play(beatmap_id: i64, accuracy: f64, created_at: &str, beatmap: Beatmap) -> EnrichedPlay {
    EnrichedPlay::new(
        Play {
            score_id: None,
            beatmap_id: Some(beatmap_id),
            accuracy: Some(accuracy),
            created_at: Some(created_at.to_string()),
            mods: vec![],
            passed: true,
            pp: None,
            is_retry: false,
        },
        Some(beatmap),
    )
}

pub fn with_mods(mut play: EnrichedPlay, mods: &[&str]) -> EnrichedPlay {
    play.play.mods = mods.iter().map(|m| m.to_string()).collect();
    play
}

pub fn with_pp(mut play: EnrichedPlay, pp: f64) -> EnrichedPlay {
    play.play.pp = Some(pp);
    play
}
