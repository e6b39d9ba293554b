pub mod batch_fetcher;
#[cfg(test)]
pub(crate) mod fake_osu;
pub mod handlers;
pub mod models;
pub mod osu_client;
pub mod routes;

pub use batch_fetcher::BatchFetcher;
pub use osu_client::{ApiGateway, ScoreType};
