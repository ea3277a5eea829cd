use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use tokio::sync::mpsc;

use photo_organize_lib::commands::{file_commands, organize_commands};
use photo_organize_lib::models::photo::PhotoMetadata;
use photo_organize_lib::models::progress::Progress;
use photo_organize_lib::services::analysis_service::SidecarAnalyzer;
use photo_organize_lib::services::materialize_service::ApplyOptions;
use photo_organize_lib::{AppConfig, AppState};

#[derive(Parser)]
#[command(name = "photo-organize")]
#[command(version)]
#[command(about = "Organize a photo folder into suggested sub-folders")]
struct Cli {
    /// Increase verbosity (-v=INFO, -vv=DEBUG, -vvv=TRACE)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Config file to use instead of the per-user one
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Attach scene/object analysis from `<image>.ai.json` sidecars
    #[arg(long, global = true)]
    sidecars: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the photos found under a folder
    Scan { folder: PathBuf },
    /// Print the organization strategies that fit a folder
    Suggest { folder: PathBuf },
    /// Propose a folder layout for a query, and optionally apply it
    Organize {
        folder: PathBuf,
        /// Free-text request such as "by month" or "by camera"
        #[arg(short, long)]
        query: Option<String>,
        /// Destination base (default: the scanned folder)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
        /// Write the proposal to disk
        #[arg(long)]
        apply: bool,
        /// Copy instead of moving
        #[arg(long)]
        copy: bool,
        /// Create a backup manifest so the run can be rolled back
        #[arg(long)]
        backup: bool,
        /// Re-organize the proposal once before printing it
        #[arg(long)]
        regenerate: bool,
    },
    /// Roll back the run recorded in a backup folder
    Rollback { backup_dir: PathBuf },
    /// Undo the most recent run
    Undo,
    /// Remove empty sub-folders left behind
    Cleanup { folder: PathBuf },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let config = match &cli.config {
        Some(path) => AppConfig::load_from(path),
        None => AppConfig::load(),
    };

    match cli.command {
        Commands::Scan { folder } => {
            let photos = scan_and_analyze(&folder, &config, cli.sidecars).await?;
            print_json(&photos)
        }
        Commands::Suggest { folder } => {
            let photos = scan_and_analyze(&folder, &config, cli.sidecars).await?;
            for suggestion in organize_commands::suggest_organization(&photos) {
                println!("{suggestion}");
            }
            Ok(())
        }
        Commands::Organize {
            folder,
            query,
            output_dir,
            apply,
            copy,
            backup,
            regenerate,
        } => {
            let photos = scan_and_analyze(&folder, &config, cli.sidecars).await?;
            let state = Arc::new(AppState::open(config.clone()).context("failed to open journal")?);
            let query = query.unwrap_or_else(|| config.default_query.clone());

            let mut snapshot = organize_commands::organize_photos(&state, &query, photos)?;
            if regenerate {
                snapshot = organize_commands::regenerate(&state)?;
            }
            print_json(&snapshot)?;
            if !apply {
                return Ok(());
            }

            let defaults = config.apply_options();
            let options = ApplyOptions {
                create_backup: backup || defaults.create_backup,
                copy_instead_of_move: copy || defaults.copy_instead_of_move,
            };
            let base = output_dir.unwrap_or(folder);
            let (tx, rx) = mpsc::unbounded_channel();
            let printer = tokio::spawn(log_progress(rx));
            let result = organize_commands::accept_session(state, base, options, tx).await?;
            let _ = printer.await;
            print_json(&result)
        }
        Commands::Rollback { backup_dir } => {
            let state = AppState::open(config).context("failed to open journal")?;
            let report = file_commands::rollback(&state, &backup_dir)
                .with_context(|| format!("rollback from {} failed", backup_dir.display()))?;
            print_json(&report)
        }
        Commands::Undo => {
            let state = AppState::open(config).context("failed to open journal")?;
            let report = file_commands::undo_last(&state)?;
            print_json(&report)
        }
        Commands::Cleanup { folder } => {
            let removed = file_commands::cleanup_empty_folders(&folder)?;
            println!("{removed}");
            Ok(())
        }
    }
}

fn setup_logging(verbosity: u8) {
    let level = match verbosity {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

async fn scan_and_analyze(
    folder: &Path,
    config: &AppConfig,
    sidecars: bool,
) -> Result<Vec<PhotoMetadata>> {
    let (tx, rx) = mpsc::unbounded_channel();
    let printer = tokio::spawn(log_progress(rx));
    let scan = file_commands::scan_folder(folder.to_path_buf(), config.clone(), tx)
        .await
        .with_context(|| format!("failed to scan {}", folder.display()))?;
    let _ = printer.await;
    for error in &scan.errors {
        eprintln!("{error}");
    }
    if !sidecars {
        return Ok(scan.photos);
    }

    let (tx, rx) = mpsc::unbounded_channel();
    let printer = tokio::spawn(log_progress(rx));
    let (photos, summary) =
        file_commands::analyze_photos(scan.photos, SidecarAnalyzer, config.progress_every, tx).await?;
    let _ = printer.await;
    info!(
        "{} photos, {} with analysis sidecars",
        photos.len(),
        summary.analyzed
    );
    Ok(photos)
}

async fn log_progress(mut rx: mpsc::UnboundedReceiver<Progress>) {
    while let Some(progress) = rx.recv().await {
        info!(
            "{:?} {}/{} ({}%) {}",
            progress.stage, progress.current, progress.total, progress.percentage, progress.current_item
        );
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
