//! Applies an accepted partition to disk.
//!
//! Folders are processed in partition order and photos in list order, so the
//! `_n` collision suffixes are reproducible for a given partition and
//! destination state. Every effect is journaled under one batch id, which is
//! what rollback replays in reverse.

use std::fs;
use std::path::{Path, PathBuf};

use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::operation::OperationType;
use crate::models::partition::Partition;
use crate::models::progress::{ProgressReporter, ProgressStage};
use crate::safety::{validate_destination_base, validate_folder_name};
use crate::services::file_service;
use crate::services::undo_service;
use crate::services::workspace::Materializer;

pub const MANIFEST_FILE: &str = "manifest.json";
const BACKUP_PREFIX: &str = "backup_";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyOptions {
    #[serde(default)]
    pub create_backup: bool,
    #[serde(default)]
    pub copy_instead_of_move: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileOperationResult {
    pub success: bool,
    pub total_files: usize,
    pub moved_files: usize,
    pub errors: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup_path: Option<String>,
    pub batch_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupManifest {
    pub timestamp: String,
    pub base_path: String,
    pub batch_id: String,
    pub message: String,
}

pub fn create_backup(base: &Path, batch_id: &str) -> Result<PathBuf, AppError> {
    let now = chrono::Utc::now();
    let name = format!("{BACKUP_PREFIX}{}", now.format("%Y-%m-%dT%H-%M-%S"));
    let backup_path = file_service::unique_destination(base, &name);
    fs::create_dir_all(&backup_path)?;

    let manifest = BackupManifest {
        timestamp: now.to_rfc3339(),
        base_path: base.to_string_lossy().to_string(),
        batch_id: batch_id.to_string(),
        message: "Backup created before photo organization".to_string(),
    };
    fs::write(
        backup_path.join(MANIFEST_FILE),
        serde_json::to_string_pretty(&manifest)?,
    )?;
    Ok(backup_path)
}

pub fn apply_organization(
    conn: &Connection,
    base: &Path,
    partition: &Partition,
    options: &ApplyOptions,
    reporter: &mut ProgressReporter<'_>,
) -> FileOperationResult {
    let batch_id = uuid::Uuid::new_v4().to_string();
    let total_files = partition.photo_count();
    let mut result = FileOperationResult {
        success: false,
        total_files,
        moved_files: 0,
        errors: Vec::new(),
        backup_path: None,
        batch_id: batch_id.clone(),
    };
    let verb = if options.copy_instead_of_move {
        "copy"
    } else {
        "move"
    };

    if let Err(e) = validate_destination_base(base) {
        result.errors.push(format!("Failed to apply organization: {e}"));
        return result;
    }

    if options.create_backup {
        match create_backup(base, &batch_id) {
            Ok(path) => result.backup_path = Some(path.to_string_lossy().to_string()),
            Err(e) => {
                log::warn!("backup failed, nothing was changed: {e}");
                result.errors.push(format!("Failed to create backup: {e}"));
                return result;
            }
        }
    }

    reporter.stage(ProgressStage::Applying, 0, total_files);
    let mut current = 0;
    for (folder_name, photos) in partition.iter() {
        if photos.is_empty() {
            continue;
        }
        let destination_folder = base.join(folder_name);
        let prepared = validate_folder_name(folder_name)
            .and_then(|()| file_service::create_dir(&destination_folder));
        match prepared {
            Ok(true) => journal(
                conn,
                &batch_id,
                OperationType::CreateDir,
                Path::new(""),
                &destination_folder,
                &mut result.errors,
            ),
            Ok(false) => {}
            Err(e) => {
                result
                    .errors
                    .push(format!("Failed to create folder {folder_name}: {e}"));
                current += photos.len();
                continue;
            }
        }

        for photo in photos {
            current += 1;
            let source = Path::new(&photo.path);
            let file_name = source
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| photo.name.clone());
            reporter.item(ProgressStage::Applying, current, total_files, &file_name);

            if !source.is_file() {
                result
                    .errors
                    .push(format!("Source file not found: {}", photo.path));
                continue;
            }

            if file_service::is_same_file(source, &destination_folder.join(&file_name)) {
                log::debug!("{} already in place", photo.path);
                result.moved_files += 1;
                continue;
            }

            let destination = file_service::unique_destination(&destination_folder, &file_name);
            let outcome = if options.copy_instead_of_move {
                file_service::copy_file(source, &destination)
            } else {
                file_service::move_file(source, &destination)
            };

            match outcome {
                Ok(()) => {
                    result.moved_files += 1;
                    let op_type = if options.copy_instead_of_move {
                        OperationType::Copy
                    } else {
                        OperationType::Move
                    };
                    journal(conn, &batch_id, op_type, source, &destination, &mut result.errors);
                }
                Err(e) => {
                    log::warn!("failed to {verb} {}: {e}", photo.path);
                    result.errors.push(format!("Failed to {verb} {file_name}: {e}"));
                }
            }
        }
    }

    result.success = result.moved_files > 0;
    reporter.stage(ProgressStage::Complete, total_files, total_files);
    log::info!(
        "{verb} pass finished: {}/{} files, {} errors (batch {batch_id})",
        result.moved_files,
        result.total_files,
        result.errors.len()
    );
    result
}

fn journal(
    conn: &Connection,
    batch_id: &str,
    op_type: OperationType,
    source: &Path,
    destination: &Path,
    errors: &mut Vec<String>,
) {
    if let Err(e) = undo_service::record_operation(conn, batch_id, op_type, source, destination) {
        log::warn!("journal write failed for {}: {e}", destination.display());
        errors.push(format!(
            "Failed to journal {op_type} {}: {e}",
            destination.display()
        ));
    }
}

/// Workspace hand-off backed by the on-disk journal.
pub struct JournaledMaterializer<'a, 'r> {
    pub conn: &'a Connection,
    pub base: PathBuf,
    pub options: ApplyOptions,
    pub reporter: ProgressReporter<'r>,
}

impl Materializer for JournaledMaterializer<'_, '_> {
    type Report = FileOperationResult;

    fn materialize(&mut self, partition: &Partition) -> (bool, FileOperationResult) {
        let result = apply_organization(
            self.conn,
            &self.base,
            partition,
            &self.options,
            &mut self.reporter,
        );
        (result.success, result)
    }
}
