//! Error types for the REST API client

use thiserror::Error;
use wp_api_contract::ContractError;

/// Errors that can occur when using the REST API client
#[derive(Debug, Error)]
pub enum RestClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("URL parsing error: {0}")]
    Url(#[from] url::ParseError),

    #[error("Event decoding error: {0}")]
    Contract(#[from] ContractError),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Unexpected response format: {0}")]
    UnexpectedResponse(String),

    #[error("SSE stream error: {0}")]
    Sse(String),
}

impl RestClientError {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Http(_) => "Http",
            Self::Json(_) => "Json",
            Self::Url(_) => "Url",
            Self::Contract(_) => "Contract",
            Self::Auth(_) => "Auth",
            Self::UnexpectedResponse(_) => "UnexpectedResponse",
            Self::Sse(_) => "Sse",
        }
    }
}

/// Result type alias for REST client operations
pub type RestClientResult<T> = Result<T, RestClientError>;
