pub mod client;
pub mod token;

pub use client::RateLimitedClient;
pub use token::TokenManager;
