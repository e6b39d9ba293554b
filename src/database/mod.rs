pub mod analyses;
pub mod connection;
pub mod leaderboard;
pub mod models;
pub mod setup;
pub mod store;
pub mod users;

pub use connection::{create_memory_pool, create_pool, get_connection, DbConn, DbPool};
pub use models::*;
pub use store::{ResultStore, SqliteResultStore};
