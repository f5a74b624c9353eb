// Error types module

use crate::api::FetchError;
use crate::constants::{MSG_API_FAILED, MSG_SERVER_GONE};

/// Centralized error type for the web client
///
/// `is_not_found` lets the boundary choose between a "server no longer
/// exists" page and a generic "service unavailable" page.
#[derive(Debug, thiserror::Error)]
pub enum WebclientError {
    /// The API answered, but no longer lists this server
    #[error("Server '{server_id}' is no longer listed")]
    ServerNotFound { server_id: String },

    /// The API call itself failed
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

impl WebclientError {
    pub fn is_not_found(&self) -> bool {
        match self {
            WebclientError::ServerNotFound { .. } => true,
            WebclientError::Fetch(e) => e.is_not_found(),
            WebclientError::Config(_) => false,
        }
    }

    /// Message suitable for showing to an end user
    pub fn user_message(&self) -> &'static str {
        if self.is_not_found() {
            MSG_SERVER_GONE
        } else {
            MSG_API_FAILED
        }
    }
}

pub type Result<T> = std::result::Result<T, WebclientError>;
