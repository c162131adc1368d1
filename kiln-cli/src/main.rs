//! Kiln CLI
//!
//! Command-line interface for generating images through the provider.

mod commands;
mod config;

use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, handle_command};
use config::Config;
use kiln_client::config::{DEFAULT_API_KEY_HEADER, DEFAULT_BASE_URL};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "kiln")]
#[command(about = "Kiln image generation CLI", long_about = None)]
struct Cli {
    /// Provider API base URL
    #[arg(long, global = true, env = "KILN_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Provider API key
    #[arg(long, global = true, env = "KILN_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Header carrying the API key ("Authorization" sends a bearer token)
    #[arg(
        long,
        global = true,
        env = "KILN_API_KEY_HEADER",
        default_value = DEFAULT_API_KEY_HEADER
    )]
    api_key_header: String,

    /// Timeout of a single HTTP request, in seconds
    #[arg(long, global = true, env = "KILN_REQUEST_TIMEOUT", default_value_t = 30)]
    request_timeout: u64,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Logs go to stderr so stdout stays clean for command output
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "kiln_cli=info,kiln_poller=info,kiln_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = Config {
        base_url: cli.base_url,
        api_key: cli.api_key.unwrap_or_default(),
        api_key_header: cli.api_key_header,
        request_timeout: Duration::from_secs(cli.request_timeout),
    };

    handle_command(cli.command, &config).await
}
