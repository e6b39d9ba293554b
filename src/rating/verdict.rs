use super::types::{round_to, Verdict};
use crate::config::VerdictSettings;

/// Everything the verdict depends on.
#[derive(Debug, Clone, Copy)]
pub struct VerdictInputs {
    pub skill_match: f64,
    pub confidence: f64,
    pub recent_count: usize,
    pub top_count: usize,
}

/// Checks run in a fixed order; every tier has a closed lower bound.
pub fn classify(inputs: VerdictInputs, settings: &VerdictSettings) -> Verdict {
    if inputs.recent_count == 0 && inputs.top_count >= settings.min_top_plays {
        return Verdict::Inactive;
    }

    if inputs.recent_count < settings.min_recent_plays || inputs.top_count < settings.min_top_plays {
        return Verdict::Insufficient;
    }

    if inputs.confidence < settings.min_confidence && !passes_fallback(inputs, settings) {
        return Verdict::Insufficient;
    }

    bucket(round_to(inputs.skill_match, 1), settings)
}

fn passes_fallback(inputs: VerdictInputs, settings: &VerdictSettings) -> bool {
    inputs.confidence >= settings.fallback_confidence
        && inputs.skill_match >= settings.fallback_skill_match
}

fn bucket(skill_match: f64, settings: &VerdictSettings) -> Verdict {
    if skill_match >= settings.accurate {
        Verdict::Accurate
    } else if skill_match >= settings.slightly_rusty {
        Verdict::SlightlyRusty
    } else if skill_match >= settings.rusty {
        Verdict::Rusty
    } else if skill_match >= settings.overranked {
        Verdict::Overranked
    } else {
        Verdict::Inactive
    }
}
