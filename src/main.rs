//! sweep - storage analyzer and cleaner.
//!
//! Usage:
//!   sweep scan [PATH]                 Scan and show a category summary
//!   sweep duplicates [PATH]           List duplicate groups
//!   sweep junk [PATH]                 List junk files
//!   sweep large [PATH]                List large files
//!   sweep clean [PATH] --junk         Delete junk (and/or --duplicates)
//!   sweep export [PATH]               Export the scan snapshot to JSON
//!   sweep cached                      Show the revalidated cached scan
//!   sweep --help                      Show help

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{Context, Result, bail, eyre};
use serde_json::json;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use sweepfile_analyze::{select_all_except_newest, summarize};
use sweepfile_core::FileRecord;
use sweepfile_engine::{CacheLoad, DerivedViews, EngineConfig, ScanOrchestrator, ScanState};

#[derive(Parser)]
#[command(
    name = "sweep",
    version,
    about = "Find what fills your storage and clean it up",
    long_about = "sweep scans a storage root once and shows where the space goes: \
                  content categories, duplicate files, junk and large files.\n\n\
                  Results are cached and revalidated on the next run with `sweep cached`."
)]
struct Cli {
    /// Output format
    #[arg(short, long, global = true, default_value = "text")]
    format: OutputFormat,

    /// Neither read nor write the snapshot cache
    #[arg(long, global = true)]
    no_cache: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scan and show a storage summary
    Scan {
        /// Storage root to scan
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// List duplicate files, grouped by content
    Duplicates {
        /// Storage root to scan
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Maximum number of duplicate groups to show
        #[arg(short = 'n', long, default_value = "20")]
        top: usize,
    },

    /// List junk files
    Junk {
        /// Storage root to scan
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// List large files
    Large {
        /// Storage root to scan
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Size threshold (e.g., "100MB", "1GB"); the configured one when omitted
        #[arg(short, long)]
        min_size: Option<String>,
    },

    /// Delete junk and/or redundant duplicate copies
    Clean {
        /// Storage root to scan
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Delete every junk file
        #[arg(long, required_unless_present = "duplicates")]
        junk: bool,

        /// Delete all duplicates except the newest copy in each group
        #[arg(long)]
        duplicates: bool,

        /// Show what would be deleted without deleting
        #[arg(long)]
        dry_run: bool,

        /// Move files to the system trash instead of deleting them
        #[arg(long)]
        trash: bool,
    },

    /// Export the scan snapshot to JSON
    Export {
        /// Storage root to scan
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show the cached scan after revalidating it against the filesystem
    Cached,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = EngineConfig::load().context("Failed to load configuration")?;
    if cli.no_cache {
        config.cache_enabled = false;
    }
    debug!(?config, "Configuration loaded");

    match cli.command {
        Command::Scan { path } => {
            let views = scan(config, &path).await?;
            print_summary(&views, cli.format)?;
        }
        Command::Duplicates { path, top } => {
            let views = scan(config, &path).await?;
            print_duplicates(&views, top, cli.format)?;
        }
        Command::Junk { path } => {
            let views = scan(config, &path).await?;
            print_files("Junk Files", &views.junk, cli.format)?;
        }
        Command::Large { path, min_size } => {
            if let Some(min_size) = min_size {
                config.large_file_threshold = parse_size(&min_size)?;
            }
            let views = scan(config, &path).await?;
            let mut large = views.large.clone();
            large.sort_by(|a, b| b.size.cmp(&a.size));
            print_files("Large Files", &large, cli.format)?;
        }
        Command::Clean {
            path,
            junk,
            duplicates,
            dry_run,
            trash,
        } => {
            config.use_trash = trash;
            let engine = ScanOrchestrator::new(config);
            let views = run_scan(&engine, &path).await?;
            let targets = clean_targets(&views, junk, duplicates);
            run_clean(&engine, &targets, dry_run, cli.format).await?;
        }
        Command::Export { path, output } => {
            let views = scan(config, &path).await?;
            run_export(&views, output)?;
        }
        Command::Cached => {
            if !config.cache_enabled {
                bail!("The snapshot cache is disabled");
            }
            run_cached(config, cli.format).await?;
        }
    }

    Ok(())
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        _ => EnvFilter::new("debug"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn scan(config: EngineConfig, path: &Path) -> Result<Arc<DerivedViews>> {
    let engine = ScanOrchestrator::new(config);
    run_scan(&engine, path).await
}

/// Scan `path` to completion and return the published views.
async fn run_scan(engine: &ScanOrchestrator, path: &Path) -> Result<Arc<DerivedViews>> {
    let path = path.canonicalize().context("Invalid path")?;
    eprintln!("Scanning {}...", path.display());

    let mut state = engine.subscribe_state();
    let reporter = tokio::spawn(async move {
        while state.changed().await.is_ok() {
            let files_found = state.borrow_and_update().files_found();
            match files_found {
                Some(n) if n > 0 => eprint!("\r  {n} files found"),
                Some(_) => {}
                None => break,
            }
        }
    });

    engine.start_scan(path).await.context("Scan task failed")?;
    reporter.abort();
    eprintln!();

    match engine.state() {
        ScanState::Done => engine
            .views()
            .ok_or_else(|| eyre!("Scan finished without results")),
        ScanState::Error { message } => bail!("Scan failed: {message}"),
        other => bail!("Scan ended unexpectedly in state {other:?}"),
    }
}

fn print_summary(views: &DerivedViews, format: OutputFormat) -> Result<()> {
    let categories = summarize(&views.by_category);

    match format {
        OutputFormat::Text => {
            let stats = &views.stats;
            println!();
            println!("{}", "─".repeat(60));
            println!(
                " {} - {}",
                views.snapshot.root_path().display(),
                format_size(stats.total_size)
            );
            println!(
                " {} files, {} directories",
                stats.total_files,
                views.snapshot.tree.directory_count()
            );
            println!("{}", "─".repeat(60));
            println!();

            for summary in &categories {
                let ratio = if stats.total_size > 0 {
                    summary.total_size as f64 / stats.total_size as f64
                } else {
                    0.0
                };
                println!(
                    "  {:<12} {:>10} {:>8} files {:>5.1}% {}",
                    summary.category.label(),
                    format_size(summary.total_size),
                    summary.file_count,
                    ratio * 100.0,
                    make_bar(ratio, 10)
                );
            }

            println!();
            println!("  Junk        {:>10}", format_size(stats.junk_size));
            println!("  Duplicates  {:>10}", format_size(stats.duplicate_size));
            println!("  Large files {:>10}", format_size(stats.large_size));
        }
        OutputFormat::Json => {
            let report = json!({
                "root": views.snapshot.root_path(),
                "scanned_at": views.snapshot.scanned_at,
                "stats": views.stats,
                "categories": categories,
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}

fn print_duplicates(views: &DerivedViews, top_n: usize, format: OutputFormat) -> Result<()> {
    let groups: Vec<&[FileRecord]> = views
        .duplicates
        .chunk_by(|a, b| a.duplicate_group == b.duplicate_group)
        .collect();

    match format {
        OutputFormat::Text => {
            println!();
            println!("{}", "─".repeat(70));
            println!(" Duplicate File Report");
            println!("{}", "─".repeat(70));
            println!();

            if groups.is_empty() {
                println!(" No duplicate files found.");
                return Ok(());
            }

            let reclaimable: u64 = select_all_except_newest(&views.duplicates)
                .iter()
                .map(|r| r.size)
                .sum();
            println!(
                " Found {} duplicate groups ({} files)",
                groups.len(),
                views.duplicates.len()
            );
            println!(" Reclaimable space: {}", format_size(reclaimable));
            println!();

            for (i, group) in groups.iter().take(top_n).enumerate() {
                let size = group.first().map(|r| r.size).unwrap_or(0);
                println!(
                    " Group {} ({} files, {} each)",
                    i + 1,
                    group.len(),
                    format_size(size)
                );
                for record in group.iter() {
                    println!("   {}", record.path.display());
                }
                println!();
            }

            let remaining = groups.len().saturating_sub(top_n);
            if remaining > 0 {
                println!(" ... and {remaining} more groups");
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&views.duplicates)?);
        }
    }

    Ok(())
}

fn print_files(title: &str, files: &[FileRecord], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => {
            let total: u64 = files.iter().map(|f| f.size).sum();
            println!();
            println!(
                " {title}: {} files, {}",
                files.len(),
                format_size(total)
            );
            println!();
            for record in files {
                println!(
                    "  {:>10}  {}",
                    format_size(record.size),
                    record.path.display()
                );
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(files)?);
        }
    }

    Ok(())
}

/// Files selected for cleaning, each path at most once.
fn clean_targets(views: &DerivedViews, junk: bool, duplicates: bool) -> Vec<FileRecord> {
    let mut seen = HashSet::new();
    let mut targets = Vec::new();

    let mut selected = Vec::new();
    if junk {
        selected.extend(views.junk.iter().cloned());
    }
    if duplicates {
        selected.extend(select_all_except_newest(&views.duplicates));
    }

    for record in selected {
        if seen.insert(record.path.clone()) {
            targets.push(record);
        }
    }
    targets
}

async fn run_clean(
    engine: &ScanOrchestrator,
    targets: &[FileRecord],
    dry_run: bool,
    format: OutputFormat,
) -> Result<()> {
    if targets.is_empty() {
        eprintln!("Nothing to clean.");
        return Ok(());
    }

    if dry_run {
        return print_files("Would delete", targets, format);
    }

    let summary = engine.delete_files(targets).await?;

    match format {
        OutputFormat::Text => {
            println!(
                " Deleted {} files, freed {}",
                summary.deleted_count,
                format_size(summary.freed_bytes)
            );
            if summary.failed_count > 0 {
                println!(" {} files could not be deleted:", summary.failed_count);
                for failure in &summary.failures {
                    println!("   {failure}");
                }
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
    }

    Ok(())
}

/// Export the scan snapshot to JSON.
fn run_export(views: &DerivedViews, output: Option<PathBuf>) -> Result<()> {
    let json = serde_json::to_string_pretty(&views.snapshot)?;

    match output {
        Some(output_path) => {
            std::fs::write(&output_path, json)
                .with_context(|| format!("Failed to write {}", output_path.display()))?;
            eprintln!("Exported to {}", output_path.display());
        }
        None => {
            println!("{}", json);
        }
    }

    Ok(())
}

async fn run_cached(config: EngineConfig, format: OutputFormat) -> Result<()> {
    let engine = ScanOrchestrator::new(config);

    match engine.restore_cached().await? {
        CacheLoad::Loaded { pruned, .. } => {
            if pruned > 0 {
                eprintln!("{pruned} files no longer exist and were dropped from the cache.");
            }
            let views = engine
                .views()
                .ok_or_else(|| eyre!("Cached snapshot was not published"))?;
            print_summary(&views, format)
        }
        CacheLoad::Absent => {
            eprintln!("No cached scan. Run `sweep scan` first.");
            Ok(())
        }
        CacheLoad::Discarded { reason } => {
            eprintln!("Cached scan was discarded: {reason}");
            Ok(())
        }
    }
}

/// Create a simple ASCII bar.
fn make_bar(ratio: f64, width: usize) -> String {
    let filled = ((ratio * width as f64).round() as usize).min(width);
    let empty = width - filled;
    format!("[{}{}]", "█".repeat(filled), "░".repeat(empty))
}

/// Format size in human-readable form.
fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::BINARY)
}

/// Parse a size string (e.g., "1KB", "10MB", "1GB").
fn parse_size(s: &str) -> Result<u64> {
    let s = s.trim().to_uppercase();
    let digits = s.trim_end_matches(|c: char| !c.is_ascii_digit() && c != '.');
    let unit = &s[digits.len()..];

    let multiplier: u64 = match unit {
        "" | "B" => 1,
        "K" | "KB" => 1024,
        "M" | "MB" => 1024 * 1024,
        "G" | "GB" => 1024 * 1024 * 1024,
        other => bail!("Unknown size unit '{other}'"),
    };
    let num: f64 = digits
        .parse()
        .with_context(|| format!("Invalid size '{s}'"))?;

    Ok((num * multiplier as f64) as u64)
}
