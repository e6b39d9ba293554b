use chrono::Duration;
use std::cmp::Reverse;

use crate::domain::EnrichedPlay;

/// Retry flag for every play, aligned with the input positions.
///
/// Plays are scanned newest first. A play is a retry when one of the
/// `window` plays scanned just before it is on the same map and less than
/// `threshold` apart. Plays without a map id or timestamp are never retries.
pub fn detect_retry_flags(plays: &[EnrichedPlay], window: usize, threshold: Duration) -> Vec<bool> {
    let order = newest_first(plays);
    let mut flags = vec![false; plays.len()];

    for (position, &index) in order.iter().enumerate() {
        let current = &plays[index];
        let (Some(map), Some(at)) = (current.play.beatmap_id, current.play.played_at()) else {
            continue;
        };

        let start = position.saturating_sub(window);
        flags[index] = order[start..position].iter().any(|&prior| {
            let prior = &plays[prior].play;
            prior.beatmap_id == Some(map)
                && prior
                    .played_at()
                    .is_some_and(|prior_at| {
                        (at - prior_at).num_milliseconds().abs() < threshold.num_milliseconds()
                    })
        });
    }

    flags
}

/// Copies of `plays` sorted newest first, with `is_retry` recomputed.
pub fn mark_retries(plays: &[EnrichedPlay], window: usize, threshold: Duration) -> Vec<EnrichedPlay> {
    let flags = detect_retry_flags(plays, window, threshold);

    newest_first(plays)
        .into_iter()
        .map(|index| plays[index].clone().with_retry(flags[index]))
        .collect()
}

/// Indices of `plays` by timestamp descending; undated plays go last.
fn newest_first(plays: &[EnrichedPlay]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..plays.len()).collect();
    order.sort_by_key(|&index| Reverse(plays[index].play.played_at()));
    order
}
