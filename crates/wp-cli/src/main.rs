use anyhow::Result;
use wp_cli::{logging, Cli, Commands, Parser};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(&cli.log_level)?;

    match cli.command {
        Commands::AuthCheck(args) => args.run().await,
        Commands::Workflow { subcommand } => subcommand.run().await,
    }
}
