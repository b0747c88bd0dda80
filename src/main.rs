// src/main.rs

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use rockscan::archive::DEFAULT_MAX_DEPTH;
use rockscan::{FlattenLimits, ResolverConfig};
use std::path::PathBuf;
use tracing::info;

/// Output formats for the resolved module list
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// One module name per line
    Text,
    /// Package, version, module names and warnings as JSON
    Json,
}

#[derive(Parser)]
#[command(name = "rockscan")]
#[command(author, version, about = "List the Lua modules declared by a packed rock", long_about = None)]
struct Cli {
    /// Path to the packed rock
    archive: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Fail if any warning was raised during resolution
    #[arg(long)]
    strict: bool,

    /// Maximum nesting depth for archives inside the rock
    #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
    max_depth: usize,

    /// Log progress to stderr
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing subscriber for logging; stdout is reserved for output
    let default_filter = if cli.verbose { "info" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .init();

    info!("Reading rock: {}", cli.archive.display());
    let data = tokio::fs::read(&cli.archive)
        .await
        .with_context(|| format!("Failed to read {}", cli.archive.display()))?;

    let config = ResolverConfig {
        limits: FlattenLimits {
            max_depth: cli.max_depth,
            ..FlattenLimits::default()
        },
        ..ResolverConfig::default()
    };
    let resolution = rockscan::resolve_with(data, &config)
        .await
        .with_context(|| format!("Failed to resolve modules of {}", cli.archive.display()))?;

    match cli.format {
        OutputFormat::Text => {
            for name in resolution.modules.keys() {
                println!("{}", name);
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&resolution.summary())?);
        }
    }

    if cli.strict && !resolution.warnings.is_empty() {
        for warning in &resolution.warnings {
            eprintln!("warning: {}", warning);
        }
        anyhow::bail!(
            "{} warning(s) raised while resolving {}",
            resolution.warnings.len(),
            cli.archive.display()
        );
    }

    Ok(())
}
