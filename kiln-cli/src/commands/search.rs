//! Search command handler

use anyhow::{Context, Result};
use colored::*;

use crate::config::Config;

/// Search stock resources and print one entry per result
pub async fn handle_search(term: &str, limit: u32, config: &Config) -> Result<()> {
    let client = config.client()?;

    let results = client
        .search_resources(term, limit)
        .await
        .with_context(|| format!("Failed to search resources for '{}'", term))?;

    if results.is_empty() {
        println!("{}", format!("No resources found for '{}'.", term).yellow());
        return Ok(());
    }

    println!(
        "{}",
        format!("Found {} resource(s) for '{}':", results.len(), term).bold()
    );
    println!();
    for resource in results {
        println!("  {} {}", "▸".cyan(), resource.title);
        println!("    URL:     {}", resource.url.dimmed());
        if let Some(preview) = &resource.preview {
            println!("    Preview: {}", preview.dimmed());
        }
        println!();
    }

    Ok(())
}
