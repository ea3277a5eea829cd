use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::mpsc::UnboundedSender;

use crate::error::AppError;
use crate::models::photo::PhotoMetadata;
use crate::models::progress::{Progress, ProgressReporter};
use crate::services::materialize_service::{ApplyOptions, FileOperationResult, JournaledMaterializer};
use crate::services::organize_service;
use crate::services::workspace::{WorkspaceSnapshot, WorkspaceState};
use crate::state::AppState;

/// Starts a review session for `photos`. A session still under review is
/// discarded first; one that is committing is left alone.
pub fn organize_photos(
    state: &AppState,
    query: &str,
    photos: Vec<PhotoMetadata>,
) -> Result<WorkspaceSnapshot, AppError> {
    let result = organize_service::organize_by_query(query, &photos);
    let mut workspace = state.lock_workspace();
    if matches!(
        workspace.state(),
        WorkspaceState::Proposed | WorkspaceState::Editing
    ) {
        workspace.cancel();
    }
    workspace.propose(result.strategy, result.partition)?;
    Ok(workspace.snapshot())
}

pub fn suggest_organization(photos: &[PhotoMetadata]) -> Vec<String> {
    organize_service::suggest_strategies(photos)
}

pub fn get_session(state: &AppState) -> WorkspaceSnapshot {
    state.lock_workspace().snapshot()
}

pub fn move_photo(
    state: &AppState,
    photo_path: &str,
    from: &str,
    to: &str,
) -> Result<WorkspaceSnapshot, AppError> {
    let mut workspace = state.lock_workspace();
    workspace.move_photo(photo_path, from, to)?;
    Ok(workspace.snapshot())
}

pub fn create_folder(state: &AppState, name: &str) -> Result<WorkspaceSnapshot, AppError> {
    let mut workspace = state.lock_workspace();
    workspace.create_folder(name)?;
    Ok(workspace.snapshot())
}

pub fn request_new_folder(
    state: &AppState,
    photo_path: &str,
    from: &str,
) -> Result<WorkspaceSnapshot, AppError> {
    let mut workspace = state.lock_workspace();
    workspace.request_folder_for_photo(photo_path, from)?;
    Ok(workspace.snapshot())
}

pub fn create_folder_with_pending_photo(
    state: &AppState,
    name: &str,
) -> Result<WorkspaceSnapshot, AppError> {
    let mut workspace = state.lock_workspace();
    workspace.create_folder_with_pending_photo(name)?;
    Ok(workspace.snapshot())
}

pub fn cancel_new_folder(state: &AppState) -> WorkspaceSnapshot {
    let mut workspace = state.lock_workspace();
    workspace.cancel_pending_folder();
    workspace.snapshot()
}

pub fn rename_folder(
    state: &AppState,
    old: &str,
    new: &str,
) -> Result<WorkspaceSnapshot, AppError> {
    let mut workspace = state.lock_workspace();
    workspace.rename_folder(old, new)?;
    Ok(workspace.snapshot())
}

pub fn regenerate(state: &AppState) -> Result<WorkspaceSnapshot, AppError> {
    let mut workspace = state.lock_workspace();
    workspace.regenerate()?;
    Ok(workspace.snapshot())
}

pub fn cancel_session(state: &AppState) -> WorkspaceSnapshot {
    let mut workspace = state.lock_workspace();
    workspace.cancel();
    workspace.snapshot()
}

/// Materializes the session's partition under `base`. The workspace stays
/// locked, in `Committing`, until the run finishes.
pub async fn accept_session(
    state: Arc<AppState>,
    base: PathBuf,
    options: ApplyOptions,
    progress: UnboundedSender<Progress>,
) -> Result<FileOperationResult, AppError> {
    let every = state.config.progress_every;
    tokio::task::spawn_blocking(move || -> Result<FileOperationResult, AppError> {
        let mut workspace = state.lock_workspace();
        let conn = state.lock_db();
        let mut materializer = JournaledMaterializer {
            conn: &conn,
            base,
            options,
            reporter: ProgressReporter::new(every, move |p| {
                let _ = progress.send(p);
            }),
        };
        Ok(workspace.accept(&mut materializer)?)
    })
    .await
    .map_err(|e| AppError::Materialize(format!("organization task failed: {e}")))?
}
