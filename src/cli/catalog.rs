//! Catalog CLI subcommands for inspecting recorded boards.
//!
//! Provides commands to:
//! - `list`: Table of every record in stored order
//! - `show`: Full record for a hash prefix, plus where its image lives
//! - `verify`: Re-hash stored images and report orphans

use anyhow::{Context, Result};
use clap::Subcommand;

use crate::config::ResolvedConfig;
use crate::domain::{Dictionary, ParamValue, Record};
use crate::library::Verification;

/// Catalog-related subcommands
#[derive(Subcommand, Debug)]
pub enum CatalogCommands {
    /// List all records
    List,

    /// Show one record
    Show {
        /// Hash or unique hash prefix
        hash: String,
    },

    /// Check every record against the stored images
    Verify,
}

/// Execute catalog subcommands
pub async fn execute(cfg: &ResolvedConfig, command: CatalogCommands) -> Result<()> {
    match command {
        CatalogCommands::List => execute_list(cfg).await,
        CatalogCommands::Show { hash } => execute_show(cfg, &hash).await,
        CatalogCommands::Verify => execute_verify(cfg).await,
    }
}

fn param(record: &Record, key: &str) -> String {
    record
        .param(key)
        .map(|v| v.to_string())
        .unwrap_or_else(|| "-".to_string())
}

/// Dictionary name for a record, falling back to the raw value
fn dictionary_label(record: &Record) -> String {
    match record.param("dictionary") {
        Some(ParamValue::Integer(selector)) => u32::try_from(*selector)
            .ok()
            .and_then(|s| Dictionary::from_selector(s).ok())
            .map(|d| d.name().to_string())
            .unwrap_or_else(|| selector.to_string()),
        Some(other) => other.to_string(),
        None => "-".to_string(),
    }
}

async fn execute_list(cfg: &ResolvedConfig) -> Result<()> {
    let catalog = cfg.catalog_store().load().await?;

    if catalog.is_empty() {
        println!("Catalog is empty. Use 'calibcat generate' to add boards.");
        return Ok(());
    }

    println!(
        "{:<14} {:<6} {:<6} {:<10} {:<10} {:<18}",
        "HASH", "W", "L", "SQUARE", "MARKER", "DICTIONARY"
    );
    println!("{}", "-".repeat(68));

    for record in catalog.iter() {
        let short: String = record.hash.chars().take(12).collect();
        println!(
            "{:<14} {:<6} {:<6} {:<10} {:<10} {:<18}",
            short,
            param(record, "width"),
            param(record, "length"),
            param(record, "square_length"),
            param(record, "marker_length"),
            dictionary_label(record),
        );
    }

    println!("\nTotal: {} records", catalog.len());

    Ok(())
}

async fn execute_show(cfg: &ResolvedConfig, prefix: &str) -> Result<()> {
    let catalog = cfg.catalog_store().load().await?;

    let record = catalog
        .find_by_prefix(prefix)?
        .with_context(|| format!("No record matches '{}'", prefix))?;

    println!("{}", serde_json::to_string_pretty(record)?);
    println!();

    match cfg.content_store().verify(&record.hash).await? {
        Verification::Ok(path) => println!("Image: {}", path.display()),
        Verification::Missing => println!("Image: (missing from {})", cfg.images.display()),
        Verification::Mismatch { path, actual } => println!(
            "Image: {} (content changed, now hashes to {})",
            path.display(),
            actual.short()
        ),
        Verification::Unverifiable(path) => {
            println!("Image: {} (hash predates SHA-256, not checked)", path.display())
        }
    }

    Ok(())
}

async fn execute_verify(cfg: &ResolvedConfig) -> Result<()> {
    let catalog = cfg.catalog_store().load().await?;
    let content = cfg.content_store();

    let mut failures = 0;
    let mut unverifiable = 0;
    for record in catalog.iter() {
        let short: String = record.hash.chars().take(12).collect();
        let verification = content.verify(&record.hash).await?;
        if verification.is_failure() {
            failures += 1;
        }
        match verification {
            Verification::Ok(_) => println!("  ok            {}", short),
            Verification::Missing => println!("  missing       {}", short),
            Verification::Mismatch { path, .. } => {
                println!("  mismatch      {}  {}", short, path.display())
            }
            Verification::Unverifiable(path) => {
                unverifiable += 1;
                println!("  unverifiable  {}  {} (not a SHA-256 hash)", short, path.display())
            }
        }
    }

    let orphans = content.orphans(&catalog)?;
    if !orphans.is_empty() {
        println!("\nImages with no record:");
        for path in &orphans {
            println!("  {}", path.display());
        }
    }

    println!(
        "\n{} records, {} failed, {} unverifiable, {} orphaned images",
        catalog.len(),
        failures,
        unverifiable,
        orphans.len()
    );

    if failures > 0 {
        anyhow::bail!("{} of {} records failed verification", failures, catalog.len());
    }

    Ok(())
}
