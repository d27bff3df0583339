//! Workflow probe CLI library

pub mod auth_check;
pub mod connection;
pub mod logging;
pub mod workflow;

// Re-export CLI types for testing
pub use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "wp")]
#[command(about = "Credential and workflow checks against the Coze API")]
#[command(version, author, long_about = None)]
pub struct Cli {
    /// Log filter for stderr diagnostics; `RUST_LOG` takes precedence
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Verify that a bearer token is accepted by the API
    AuthCheck(auth_check::AuthCheckArgs),
    /// Workflow execution commands
    Workflow {
        #[command(subcommand)]
        subcommand: workflow::WorkflowCommands,
    },
}
