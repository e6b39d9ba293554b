pub mod analyzer;
pub mod confidence;
pub mod curve;
pub mod insights;
pub mod quality;
pub mod retries;
pub mod skill;
pub mod types;
pub mod validation;
pub mod verdict;
pub mod weighting;

#[cfg(test)]
pub(crate) mod test_support;

pub use analyzer::analyze_plays;
pub use quality::select_for_analysis;
pub use retries::{detect_retry_flags, mark_retries};
pub use types::{AnalysisResult, ConfidenceFactors, DataQuality, SkillComponents, Verdict};
pub use validation::{filter_valid, is_valid};
