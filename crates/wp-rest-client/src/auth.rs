//! Authentication methods for the REST API client

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use std::fmt;

use crate::error::{RestClientError, RestClientResult};

/// Authentication methods supported by the API
#[derive(Clone, Default)]
pub enum AuthMethod {
    /// Personal or service access token (`Authorization: Bearer <token>`)
    Bearer(String),
    /// No authentication
    #[default]
    None,
}

impl AuthMethod {
    /// Apply authentication headers to a request
    pub fn apply_to_headers(&self, headers: &mut HeaderMap) -> RestClientResult<()> {
        match self {
            AuthMethod::Bearer(token) => {
                let mut value = HeaderValue::from_str(&format!("Bearer {}", token))
                    .map_err(|e| RestClientError::Auth(e.to_string()))?;
                value.set_sensitive(true);
                headers.insert(AUTHORIZATION, value);
            }
            AuthMethod::None => {}
        }
        Ok(())
    }

    /// Create bearer token authentication from a token string
    pub fn bearer(token: impl Into<String>) -> Self {
        Self::Bearer(token.into())
    }

    /// Token prefix safe to print, e.g. `pat_kHM3…`
    pub fn redacted(&self) -> String {
        match self {
            AuthMethod::Bearer(token) => {
                let visible: String = token.chars().take(8).collect();
                if visible.len() < token.len() {
                    format!("Bearer {}…", visible)
                } else {
                    "Bearer ***".to_string()
                }
            }
            AuthMethod::None => "none".to_string(),
        }
    }
}

impl fmt::Debug for AuthMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.redacted())
    }
}

/// Authentication configuration for the client
#[derive(Debug, Clone, Default)]
pub struct AuthConfig {
    pub method: AuthMethod,
}

impl AuthConfig {
    /// Create a new auth config with bearer token authentication
    pub fn with_bearer(token: impl Into<String>) -> Self {
        Self {
            method: AuthMethod::bearer(token),
        }
    }

    /// Get headers for this authentication configuration
    pub fn headers(&self) -> RestClientResult<HeaderMap> {
        let mut headers = HeaderMap::new();
        self.method.apply_to_headers(&mut headers)?;
        Ok(headers)
    }
}
