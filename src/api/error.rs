//! Directory API error types

/// Failure of one call to the directory API
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    /// HTTP 404
    #[error("Data not found: {path}")]
    NotFound { path: String },

    /// HTTP 400 on a `server/...` path: the id is not a valid server id
    #[error("Unknown server: {server_id}")]
    UnknownServer { server_id: String },

    /// Any other non-success status
    #[error("API returned HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// Connection failure or timeout
    #[error("API request failed: {0}")]
    Transport(String),

    /// Success status but the body is not the expected JSON
    #[error("Invalid API response: {0}")]
    Decode(String),

    /// The client could not be built
    #[error("Invalid API client configuration: {0}")]
    InvalidConfig(String),
}

impl FetchError {
    /// True for failures that mean "this thing does not exist"
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            FetchError::NotFound { .. } | FetchError::UnknownServer { .. }
        )
    }
}
