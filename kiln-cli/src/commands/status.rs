//! Status command handler

use anyhow::{Context, Result};
use colored::*;
use kiln_core::{JobHandle, JobStatus};

use crate::config::Config;

/// Perform one status check and print the result
pub async fn handle_status(job_id: &str, config: &Config) -> Result<()> {
    let client = config.client()?;
    let handle = JobHandle::new(job_id.trim());

    let status = client
        .fetch_status(&handle)
        .await
        .with_context(|| format!("Failed to fetch status of job {}", handle))?;

    println!("{}", "Job Status:".bold());
    println!("  ID:     {}", handle.id().cyan());
    println!("  Status: {}", colorize_status(&status));

    match &status {
        JobStatus::Completed { asset_url } => println!("  Asset:  {}", asset_url),
        JobStatus::Unknown(raw) => println!("  Raw:    {}", raw.to_string().dimmed()),
        _ => {}
    }

    Ok(())
}

/// Colorize a job status for display
pub fn colorize_status(status: &JobStatus) -> ColoredString {
    match status {
        JobStatus::Pending => status.label().yellow(),
        JobStatus::Running => status.label().blue(),
        JobStatus::Completed { .. } => status.label().green(),
        JobStatus::Failed => status.label().red(),
        JobStatus::Cancelled => status.label().dimmed(),
        JobStatus::Unknown(_) => status.label().magenta(),
    }
}
