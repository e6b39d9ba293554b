use thiserror::Error;

/// Failures of a single upstream fetch.
///
/// "Resource does not exist" is not an error: the gateway reports it as
/// `Ok(None)` so callers can tell it apart from a failed fetch.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("cannot authenticate with the osu! API: {0}")]
    Auth(String),

    #[error("still rate limited after {attempts} attempts")]
    Throttled { attempts: u32 },

    #[error("request failed after {attempts} attempts: {reason}")]
    Transient { attempts: u32, reason: String },

    #[error("API rejected request with status {status}")]
    Rejected { status: u16 },

    #[error("failed to decode response: {0}")]
    Decode(String),
}

/// Outcome of a whole analysis run.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("could not retrieve data: user '{0}' was not found")]
    UserNotFound(String),

    #[error("could not retrieve data: {0}")]
    DataUnavailable(#[from] GatewayError),

    #[error("failed to persist analysis: {0}")]
    Storage(#[source] anyhow::Error),
}

/// Add context to fetch errors
pub fn fetch_context(endpoint: &str) -> String {
    format!("Failed to fetch from: {}", endpoint)
}

/// Add context to store errors
pub fn store_context(operation: &str, user_id: i64) -> String {
    format!("Failed to {} for user {}", operation, user_id)
}
