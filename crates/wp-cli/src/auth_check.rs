//! Bearer token check against the workspace listing

use anyhow::Result;
use clap::Args;
use tracing::info;

use crate::connection::ConnectionArgs;

/// Arguments for the auth-check command
#[derive(Args)]
pub struct AuthCheckArgs {
    #[command(flatten)]
    pub connection: ConnectionArgs,
}

impl AuthCheckArgs {
    /// Issue one authenticated request and print what came back
    pub async fn run(self) -> Result<()> {
        let client = self.connection.client()?;
        info!(
            "Checking {:?} against {}",
            client.auth().method,
            client.base_url()
        );

        let answer = client.list_workspaces_raw().await?;
        println!("Status Code: {}", answer.status.as_u16());
        println!("Response: {}", answer.body);

        if !answer.status.is_success() {
            info!("Token rejected with status {}", answer.status);
        }
        Ok(())
    }
}
