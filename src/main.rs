// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Parse command-line arguments using clap
// 2. Set up logging (to stderr, so stdout only ever carries the document)
// 3. Dispatch to the appropriate subcommand handler
// 4. Exit with proper code (0 = document, 1 = error report / invalid URL, 2 = internal error)
// =============================================================================

mod cli;
mod config;
mod error;
mod format;
mod github;
mod pipeline;
mod select;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands, FetchArgs};
use config::AcquireConfig;
use pipeline::Pipeline;
use std::fs;
use std::path::Path;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() {
    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            // Unexpected failure (unreadable config, unwritable output, ...)
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

async fn run() -> Result<i32> {
    let cli = Cli::parse();
    init_logging(&cli.log_level)?;

    match cli.command {
        Commands::Fetch(args) => handle_fetch(&args).await,
        Commands::Classify { url, json } => handle_classify(&url, json),
        Commands::Outline { file } => handle_outline(&file),
    }
}

// RUST_LOG takes precedence over --log-level
fn init_logging(level: &str) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(level).with_context(|| format!("invalid log level {:?}", level))?,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
    Ok(())
}

// Handles the 'fetch' subcommand
async fn handle_fetch(args: &FetchArgs) -> Result<i32> {
    let mut config = match &args.config {
        Some(path) => AcquireConfig::load(path)?,
        None => AcquireConfig::default(),
    };
    apply_overrides(&mut config, args);

    let pipeline = Pipeline::with_http(config)?;
    let document = pipeline.acquire(&args.url).await;

    match &args.output {
        Some(path) => {
            fs::write(path, document.as_str())
                .with_context(|| format!("could not write {}", path.display()))?;
            info!(path = %path.display(), "document written");
        }
        None => print!("{}", document),
    }

    match document.failure() {
        Some(failure) => {
            eprintln!("❌ {} ({})", failure.message, failure.reason);
            Ok(1)
        }
        None => Ok(0),
    }
}

fn apply_overrides(config: &mut AcquireConfig, args: &FetchArgs) {
    if let Some(n) = args.max_files {
        config.limits.max_files = n;
    }
    if let Some(n) = args.max_total_bytes {
        config.limits.max_total_bytes = n;
    }
    if let Some(n) = args.max_file_bytes {
        config.limits.max_file_bytes = n;
    }
    if let Some(n) = args.max_depth {
        config.walk.max_depth = n;
    }
}

// Handles the 'classify' subcommand
fn handle_classify(url: &str, json: bool) -> Result<i32> {
    let reference = match github::classify(url) {
        Ok(reference) => reference,
        Err(e) => {
            eprintln!("❌ {} ({})", e, e.reason_code());
            return Ok(1);
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&reference)?);
        return Ok(0);
    }

    let kind = format!("{:?}", reference.kind);
    let role = reference
        .role
        .map(|r| format!("{:?}", r))
        .unwrap_or_else(|| "-".to_string());
    println!("{:<10} {}", "Owner:", reference.owner);
    println!("{:<10} {}", "Repo:", reference.repo);
    println!("{:<10} {}", "Branch:", reference.branch.as_deref().unwrap_or("(default)"));
    println!("{:<10} {}", "Path:", if reference.path.is_empty() { "/" } else { &reference.path });
    println!("{:<10} {}", "Kind:", kind);
    println!("{:<10} {}", "Role:", role);
    Ok(0)
}

// Handles the 'outline' subcommand
fn handle_outline(file: &Path) -> Result<i32> {
    let text = fs::read_to_string(file).with_context(|| format!("could not read {}", file.display()))?;
    let outline = format::outline(&text);

    if outline.is_error_report {
        println!("⚠️  {} is an error report, it contains no files", file.display());
        return Ok(0);
    }

    if let Some(repository) = &outline.repository {
        println!("📦 {}", repository);
    }
    for entry in &outline.files {
        let marker = if entry.priority { format::PRIORITY_MARKER } else { "" };
        println!("   {}{}", entry.path, marker);
    }
    println!("📄 {} file(s)", outline.files.len());
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_limits_override_config() {
        let cli = Cli::try_parse_from([
            "repo-intake",
            "fetch",
            "https://github.com/a/b",
            "--max-files",
            "3",
            "--max-file-bytes",
            "1000",
        ])
        .unwrap();
        let Commands::Fetch(args) = cli.command else {
            panic!("expected fetch");
        };

        let mut config = AcquireConfig::default();
        apply_overrides(&mut config, &args);
        assert_eq!(config.limits.max_files, 3);
        assert_eq!(config.limits.max_file_bytes, 1000);
        assert_eq!(config.limits.max_total_bytes, AcquireConfig::default().limits.max_total_bytes);
        assert_eq!(config.walk.max_depth, AcquireConfig::default().walk.max_depth);
    }
}
