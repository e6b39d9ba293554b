pub mod models;
pub mod progress;

pub use models::{
    parse_timestamp, Beatmap, BeatmapResponse, EnrichedPlay, ModEntry, Play, RankedStatus,
    ScoreResponse, UserInfo, UserStatistics,
};
pub use progress::FetchProgress;
