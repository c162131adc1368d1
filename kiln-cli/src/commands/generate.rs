//! Generate command handler
//!
//! Runs one invocation in its own task and writes the asset to disk. The
//! command's own `--timeout` and Ctrl-C both cancel the invocation.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use colored::*;
use kiln_core::domain::request::{DEFAULT_ASPECT_RATIO, DEFAULT_MODEL, DEFAULT_RESOLUTION};
use kiln_poller::{
    CancellationToken, FailureKind, GeneratedAsset, GenerationError, JobPoller, PollerConfig,
};
use tokio::task::JoinHandle;
use tracing::warn;

use crate::config::Config;

/// Arguments of `kiln generate`
#[derive(Args)]
pub struct GenerateArgs {
    /// Prompt describing the image
    #[arg(required = true)]
    prompt: Vec<String>,

    /// Output file (defaults to kiln-<job id>.<ext> in the current directory)
    #[arg(short, long)]
    out: Option<PathBuf>,

    #[arg(long, default_value = DEFAULT_RESOLUTION)]
    resolution: String,

    #[arg(long, default_value = DEFAULT_ASPECT_RATIO)]
    aspect_ratio: String,

    #[arg(long, default_value = DEFAULT_MODEL)]
    model: String,

    /// Seconds between status checks
    #[arg(long, default_value_t = 3)]
    interval: u64,

    /// Seconds after submission before giving up on a running job
    #[arg(long, default_value_t = 60)]
    deadline: u64,

    /// Overall budget of this command in seconds
    #[arg(long)]
    timeout: Option<u64>,
}

/// Handle `kiln generate`
pub async fn handle_generate(args: GenerateArgs, config: &Config) -> Result<()> {
    let poller_config = PollerConfig::new(
        Duration::from_secs(args.interval),
        Duration::from_secs(args.deadline),
    )
    .with_resolution(args.resolution)
    .with_aspect_ratio(args.aspect_ratio)
    .with_model(args.model);
    poller_config
        .validate()
        .context("Invalid polling settings")?;

    let client = config.client()?;
    let poller = Arc::new(JobPoller::new(poller_config, Arc::new(client)));

    let cancel = CancellationToken::new();
    let watcher = watch_for_cancel(cancel.clone(), args.timeout.map(Duration::from_secs));

    println!("{}", "Generating image...".dimmed());
    let outcome = poller
        .spawn(args.prompt.join(" "), cancel.clone())
        .await
        .context("Generation task panicked")?;
    watcher.abort();

    match outcome {
        Ok(asset) => {
            let path = args.out.unwrap_or_else(|| default_path(&asset));
            tokio::fs::write(&path, &asset.bytes)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;

            println!(
                "{} Saved {} ({} bytes)",
                "✓".green(),
                path.display().to_string().bold(),
                asset.bytes.len()
            );
            println!("  Job:       {}", asset.job_id.cyan());
            println!(
                "  Submitted: {}",
                asset.submitted_at.format("%Y-%m-%d %H:%M:%S")
            );
            println!(
                "  Polls:     {} in {:.1}s",
                asset.polls,
                asset.elapsed.as_secs_f64()
            );
            Ok(())
        }
        Err(err) => {
            print_failure(&err);
            anyhow::bail!(headline(&err))
        }
    }
}

/// Cancels `cancel` on Ctrl-C or once `timeout` elapses
fn watch_for_cancel(cancel: CancellationToken, timeout: Option<Duration>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let budget = async {
            match timeout {
                Some(timeout) => tokio::time::sleep(timeout).await,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            _ = tokio::signal::ctrl_c() => warn!("Interrupted, abandoning generation"),
            _ = budget => warn!("Command timeout reached, abandoning generation"),
            _ = cancel.cancelled() => return,
        }
        cancel.cancel();
    })
}

fn default_path(asset: &GeneratedAsset) -> PathBuf {
    let id: String = asset
        .job_id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    PathBuf::from(format!("kiln-{}.{}", id, asset.file_extension()))
}

/// One-line summary telling the user what to do next
fn headline(err: &GenerationError) -> String {
    match err {
        GenerationError::InvalidInput(msg) => format!("Invalid input: {}", msg),
        GenerationError::Misconfigured(_) => {
            "Check --base-url, --api-key and --api-key-header".to_string()
        }
        GenerationError::TimedOut {
            cancelled: true, ..
        } => "Generation abandoned".to_string(),
        GenerationError::TimedOut {
            job_id: Some(id), ..
        } => format!(
            "Still processing, try again later with `kiln status {}`",
            id
        ),
        GenerationError::TimedOut { .. } => "Still processing, try again later".to_string(),
        _ => "Generation failed, not retrying".to_string(),
    }
}

fn print_failure(err: &GenerationError) {
    let mark = match err.kind() {
        FailureKind::InvalidInput | FailureKind::Misconfigured => "!".yellow(),
        FailureKind::TimedOut => "…".yellow(),
        _ => "✗".red(),
    };
    println!("{} {}", mark, err);

    if let Some(body) = err.raw_body() {
        println!("  {}", body.dimmed());
    }
}
