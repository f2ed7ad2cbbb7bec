mod commands;

use std::env;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};
use uploadcare::{ClientConfig, UploadcareClient};

use commands::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = ClientConfig::from_env().context("Failed to load Uploadcare configuration")?;
    tracing::debug!(
        api_url = %config.api_url,
        signed = config.credentials.secret_key().is_some(),
        "Loaded configuration"
    );
    let credentials = config.credentials.clone();
    let client = UploadcareClient::new(config)?;

    let output = commands::execute(&client, &credentials, cli.command).await?;
    println!("{output}");
    Ok(())
}

/// Logs go to stderr so command output stays pipeable.
/// `UPLOADCARE_LOG_FORMAT=json` switches to JSON lines.
fn init_tracing() {
    let json =
        env::var("UPLOADCARE_LOG_FORMAT").is_ok_and(|format| format.eq_ignore_ascii_case("json"));

    if json {
        fmt()
            .json()
            .with_env_filter(EnvFilter::from_default_env())
            .with_writer(std::io::stderr)
            .init();
    } else {
        fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_writer(std::io::stderr)
            .init();
    }
}
