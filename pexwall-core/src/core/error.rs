use std::time::Duration;

/// Failure reasons surfaced by the fetch gateway.
///
/// Cloneable so a single upstream failure can be handed to every caller
/// that was waiting on the same coalesced request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    /// The upstream answered with a non-success status.
    #[error("Pexels API error: HTTP {status} for {endpoint}")]
    Http { status: u16, endpoint: String },

    /// The request never produced a response (DNS, TLS, connection reset...).
    #[error("Pexels API transport error: {0}")]
    Transport(String),

    /// The response body was not the JSON we expected.
    #[error("Pexels API decode error: {0}")]
    Decode(String),

    #[error("Pexels API request timed out after {0:?}")]
    Timeout(Duration),

    #[error("request cancelled by caller")]
    Cancelled,

    #[error("unknown category: {0}")]
    UnknownCategory(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl GatewayError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, GatewayError::Http { status: 404, .. })
    }
}

pub type GatewayResult<T> = Result<T, GatewayError>;
