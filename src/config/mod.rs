pub mod settings;

pub use settings::{
    AnalysisSettings, ApiSettings, AppConfig, ConfidenceSettings, ModCombination, RatingSettings,
    ScoringSettings, VerdictSettings,
};
