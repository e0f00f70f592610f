/// Errors raised while creating clusters
use super::request::ValidationError;
use crate::gcp::AuthError;

#[derive(Debug, thiserror::Error)]
pub enum GkeError {
    #[error("Request validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Failed to obtain access token: {0}")]
    Auth(#[from] AuthError),

    #[error("Failed to reach the Kubernetes Engine API: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("API error: {status} {code} - {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    #[error("Failed to parse API response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl GkeError {
    /// HTTP status reported by the API, if the call reached it
    pub fn api_status(&self) -> Option<u16> {
        match self {
            GkeError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}
