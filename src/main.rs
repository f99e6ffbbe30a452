use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use flexpatch::{preview_batch, scheduler, FilePreview, FileReport, InstructionBatch};
use similar::{ChangeTag, TextDiff};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "flexpatch")]
#[command(about = "Apply whitespace-tolerant edit instructions to source files", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply an instruction batch to files on disk
    Apply {
        /// Path to the JSON instruction batch
        #[arg(short, long)]
        instructions: PathBuf,

        /// Directory that relative target paths resolve against
        #[arg(short, long, default_value = ".")]
        root: PathBuf,

        /// Dry run - compute results without modifying files
        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Show unified diff of changes
        #[arg(short, long)]
        diff: bool,
    },

    /// Check an instruction batch against the current files without writing
    Check {
        /// Path to the JSON instruction batch
        #[arg(short, long)]
        instructions: PathBuf,

        /// Directory that relative target paths resolve against
        #[arg(short, long, default_value = ".")]
        root: PathBuf,

        /// Show unified diff of would-be changes
        #[arg(short, long)]
        diff: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Apply {
            instructions,
            root,
            dry_run,
            diff,
        } => {
            if dry_run {
                cmd_check(instructions, root, diff, true)
            } else {
                cmd_apply(instructions, root, diff)
            }
        }

        Commands::Check {
            instructions,
            root,
            diff,
        } => cmd_check(instructions, root, diff, false),
    }
}

/// Load a batch, reporting the path on failure.
fn load_batch(path: &Path) -> Result<InstructionBatch> {
    let batch = InstructionBatch::from_json_path(path)
        .with_context(|| format!("failed to load instruction batch {}", path.display()))?;
    if batch.is_empty() {
        eprintln!("{}", "Warning: instruction batch is empty".yellow());
    }
    Ok(batch)
}

fn cmd_apply(instructions: PathBuf, root: PathBuf, show_diff: bool) -> Result<()> {
    let batch = load_batch(&instructions)?;

    println!("Root: {}", root.display());
    println!("Instructions: {}", batch.len());
    println!();

    // Capture previews first when a diff was requested, since apply
    // overwrites the originals.
    let previews = if show_diff {
        Some(preview_batch(&batch, &root))
    } else {
        None
    };

    let reports = scheduler::apply_batch(&batch, &root);

    let mut written = 0;
    let mut skipped = 0;
    let mut failed = 0;

    for report in &reports {
        match report {
            FileReport::Written { path, .. } => {
                println!("{} {}", "✓".green(), report);
                written += 1;

                if let Some(previews) = &previews {
                    if let Some(FilePreview::Ready {
                        original, patched, ..
                    }) = previews.iter().find(
                        |p| matches!(p, FilePreview::Ready { path: target, .. } if target == path),
                    ) {
                        if original != patched {
                            display_diff(path, original, patched);
                        }
                    }
                }
            }
            FileReport::SkippedMissing { .. } => {
                println!("{} {}", "⊘".yellow(), report);
                skipped += 1;
            }
            FileReport::Failed { .. } => {
                eprintln!("{} {}", "✗".red(), report);
                failed += 1;
            }
        }
    }

    print_summary(written, skipped, failed);

    if failed > 0 {
        std::process::exit(1);
    }

    Ok(())
}

fn cmd_check(instructions: PathBuf, root: PathBuf, show_diff: bool, dry_run: bool) -> Result<()> {
    let batch = load_batch(&instructions)?;

    if dry_run {
        println!("{}", "[DRY RUN - no files will be modified]".cyan());
    }
    println!("Root: {}", root.display());
    println!("Instructions: {}", batch.len());
    println!();

    let mut ready = 0;
    let mut skipped = 0;
    let mut failed = 0;

    for preview in preview_batch(&batch, &root) {
        match &preview {
            FilePreview::Ready {
                path,
                original,
                patched,
                applied,
                no_match,
            } => {
                println!(
                    "{} Would update {} ({} applied, {} unmatched)",
                    "✓".green(),
                    path.display(),
                    applied,
                    no_match
                );
                ready += 1;

                if show_diff && original != patched {
                    display_diff(path, original, patched);
                }
            }
            FilePreview::SkippedMissing { path } => {
                println!("{} Skipped missing file {}", "⊘".yellow(), path.display());
                skipped += 1;
            }
            FilePreview::Failed { path, reason } => {
                eprintln!("{} Failed on {}: {}", "✗".red(), path.display(), reason);
                failed += 1;
            }
        }
    }

    print_summary(ready, skipped, failed);

    if failed > 0 {
        std::process::exit(1);
    }

    Ok(())
}

fn print_summary(ok: usize, skipped: usize, failed: usize) {
    println!();
    println!("{}", "Summary:".bold());
    println!("  {} updated", format!("{}", ok).green());
    println!("  {} skipped", format!("{}", skipped).yellow());
    println!("  {} failed", format!("{}", failed).red());
}

/// Show unified diff between original and patched content.
fn display_diff(file: &Path, original: &str, patched: &str) {
    println!(
        "\n{}",
        format!("--- {} (original)", file.display()).dimmed()
    );
    println!("{}", format!("+++ {} (patched)", file.display()).dimmed());

    let diff = TextDiff::from_lines(original, patched);

    for change in diff.iter_all_changes() {
        let sign = match change.tag() {
            ChangeTag::Delete => format!("-{}", change).red(),
            ChangeTag::Insert => format!("+{}", change).green(),
            ChangeTag::Equal => format!(" {}", change).normal(),
        };
        print!("{}", sign);
    }
}
