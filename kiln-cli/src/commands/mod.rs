//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod generate;
mod search;
mod status;

pub use generate::GenerateArgs;

use anyhow::Result;
use clap::Subcommand;

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Generate an image from a prompt and save it
    Generate(GenerateArgs),
    /// Check the status of a submitted job once
    Status {
        /// Job ID returned by the provider
        job_id: String,
    },
    /// Search the provider's stock resources
    Search {
        /// Search keywords
        #[arg(required = true)]
        term: Vec<String>,

        /// Maximum number of results
        #[arg(short, long, default_value_t = 5)]
        limit: u32,
    },
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler module.
///
/// # Arguments
/// * `command` - The command to execute
/// * `config` - The CLI configuration
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Generate(args) => generate::handle_generate(args, config).await,
        Commands::Status { job_id } => status::handle_status(&job_id, config).await,
        Commands::Search { term, limit } => {
            search::handle_search(&term.join(" "), limit, config).await
        }
    }
}
