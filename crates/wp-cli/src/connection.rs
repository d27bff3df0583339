//! Connection settings shared by the API-facing commands

use anyhow::{Context, Result};
use clap::Args;
use wp_rest_client::{AuthConfig, RestClient, COZE_CN_BASE_URL};

/// Where to connect and how to authenticate
#[derive(Args, Clone)]
pub struct ConnectionArgs {
    /// Access token sent as `Authorization: Bearer <token>`
    #[arg(long, env = "COZE_API_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// API base URL
    #[arg(long, env = "COZE_API_BASE", default_value = COZE_CN_BASE_URL)]
    pub base_url: String,
}

impl ConnectionArgs {
    /// Build an authenticated REST client
    pub fn client(&self) -> Result<RestClient> {
        let token = self
            .token
            .as_deref()
            .filter(|token| !token.trim().is_empty())
            .context("no API token given; pass --token or set COZE_API_TOKEN")?;

        RestClient::from_url(&self.base_url, AuthConfig::with_bearer(token.trim()))
            .with_context(|| format!("invalid API base '{}'", self.base_url))
    }
}
