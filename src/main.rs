use anyhow::Context;
use clap::Parser;
use context_vault::{
    cli::{execute, Cli},
    utils::{config::Config, logging},
    Application,
};
use tracing::{debug, error};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env is optional; real environment variables win
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    let config = Config::load(cli.config.as_deref()).context("failed to load configuration")?;
    let _log_guard = logging::init(&config.logging, cli.verbose)?;

    debug!("Starting context-vault v{}", env!("CARGO_PKG_VERSION"));

    let app = Application::new(config).await.map_err(|e| {
        error!("Failed to open store: {}", e);
        e
    })?;

    match execute(app.context_store(), cli.command).await {
        Ok(Some(output)) => {
            println!("{}", serde_json::to_string_pretty(&output)?);
            Ok(())
        }
        Ok(None) => Ok(()),
        Err(e) => {
            error!("Command failed: {}", e);
            Err(e.into())
        }
    }
}
