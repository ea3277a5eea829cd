use std::path::{Path, PathBuf};

use tokio::sync::mpsc::UnboundedSender;

use crate::config::AppConfig;
use crate::error::AppError;
use crate::models::photo::PhotoMetadata;
use crate::models::progress::{Progress, ProgressReporter};
use crate::services::analysis_service::{self, AnalysisSummary, ImageAnalyzer};
use crate::services::file_service;
use crate::services::scan_service::{self, FolderScanResult};
use crate::services::undo_service::{self, RollbackReport};
use crate::state::AppState;

fn channel_reporter(every: usize, progress: UnboundedSender<Progress>) -> ProgressReporter<'static> {
    ProgressReporter::new(every, move |p| {
        let _ = progress.send(p);
    })
}

pub async fn scan_folder(
    folder: PathBuf,
    config: AppConfig,
    progress: UnboundedSender<Progress>,
) -> Result<FolderScanResult, AppError> {
    tokio::task::spawn_blocking(move || {
        let mut reporter = channel_reporter(config.progress_every, progress);
        scan_service::scan_photos(&folder, &config, &mut reporter)
    })
    .await
    .map_err(|e| AppError::Scan(format!("scan task failed: {e}")))?
}

pub async fn analyze_photos<A>(
    mut photos: Vec<PhotoMetadata>,
    analyzer: A,
    every: usize,
    progress: UnboundedSender<Progress>,
) -> Result<(Vec<PhotoMetadata>, AnalysisSummary), AppError>
where
    A: ImageAnalyzer + Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let mut reporter = channel_reporter(every, progress);
        let summary = analysis_service::analyze_photos(&mut photos, &analyzer, &mut reporter);
        (photos, summary)
    })
    .await
    .map_err(|e| AppError::Analysis(format!("analysis task failed: {e}")))
}

pub fn rollback(state: &AppState, backup_path: &Path) -> Result<RollbackReport, AppError> {
    let conn = state.lock_db();
    undo_service::rollback_organization(&conn, backup_path)
}

pub fn undo_last(state: &AppState) -> Result<RollbackReport, AppError> {
    let conn = state.lock_db();
    undo_service::undo_last_organization(&conn)
}

pub fn cleanup_empty_folders(base: &Path) -> Result<usize, AppError> {
    let removed = file_service::cleanup_empty_folders(base)?;
    log::info!("removed {removed} empty folders under {}", base.display());
    Ok(removed)
}
