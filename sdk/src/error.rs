//! Error types shared by the SDK modules that can fail. The pure validation
//! modules never error: their findings are [crate::ValidationMessage]s.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MpError {
    /// The endpoint answered with a 4xx or 5xx status.
    #[error("HTTP error {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timeout: {0}")]
    Timeout(String),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// The payload does not have the shape the endpoint accepts.
    #[error("Invalid payload: {0}")]
    Schema(String),

    /// A sharable link could not be decoded.
    #[error("Sharable link error: {0}")]
    Link(String),
}

#[cfg(feature = "client")]
impl MpError {
    pub fn from_network_error(e: reqwest::Error) -> Self {
        let error_msg = e.to_string();

        if e.is_timeout() || error_msg.contains("timed out") {
            Self::Timeout(error_msg)
        } else if e.is_decode() {
            Self::Network(format!("Could not decode response body: {error_msg}"))
        } else {
            Self::Network(error_msg)
        }
    }
}

#[cfg(feature = "link")]
impl From<base64::DecodeError> for MpError {
    fn from(e: base64::DecodeError) -> Self {
        Self::Link(format!("Invalid base64 data: {e}"))
    }
}

#[cfg(feature = "link")]
impl From<url::ParseError> for MpError {
    fn from(e: url::ParseError) -> Self {
        Self::Link(format!("Invalid URL: {e}"))
    }
}
