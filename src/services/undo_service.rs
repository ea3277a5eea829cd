use std::fs;
use std::path::Path;

use rusqlite::Connection;
use serde::Serialize;

use crate::data::repository;
use crate::error::AppError;
use crate::models::operation::{OperationRecord, OperationType};
use crate::services::file_service;
use crate::services::materialize_service::{BackupManifest, MANIFEST_FILE};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RollbackReport {
    pub batch_id: String,
    pub restored: usize,
    pub errors: Vec<String>,
}

pub fn record_operation(
    conn: &Connection,
    batch_id: &str,
    op_type: OperationType,
    source: &Path,
    destination: &Path,
) -> Result<(), AppError> {
    let record = OperationRecord {
        operation_id: uuid::Uuid::new_v4().to_string(),
        batch_id: batch_id.to_string(),
        operation_type: op_type,
        source_path: source.to_string_lossy().to_string(),
        destination_path: destination.to_string_lossy().to_string(),
        executed_at: chrono::Utc::now().to_rfc3339(),
        undone: false,
    };
    repository::insert_operation(conn, &record)?;
    Ok(())
}

pub fn undo_last_organization(conn: &Connection) -> Result<RollbackReport, AppError> {
    let batch_id = repository::get_latest_undoable_batch(conn)?
        .ok_or_else(|| AppError::General("nothing to undo".to_string()))?;
    undo_batch(conn, &batch_id, None)
}

pub fn rollback_organization(conn: &Connection, backup_path: &Path) -> Result<RollbackReport, AppError> {
    let manifest_path = backup_path.join(MANIFEST_FILE);
    let contents = fs::read_to_string(&manifest_path)?;
    let manifest: BackupManifest = serde_json::from_str(&contents)?;
    log::info!(
        "rolling back batch {} from backup taken at {}",
        manifest.batch_id,
        manifest.timestamp
    );
    undo_batch(conn, &manifest.batch_id, Some(Path::new(&manifest.base_path)))
}

/// Reverses a batch newest-first. With `scope`, entries whose destination lies
/// outside it are refused.
pub fn undo_batch(
    conn: &Connection,
    batch_id: &str,
    scope: Option<&Path>,
) -> Result<RollbackReport, AppError> {
    let operations = repository::list_batch(conn, batch_id)?;
    if operations.is_empty() {
        return Err(AppError::General(format!("unknown batch: {batch_id}")));
    }
    if operations.iter().all(|op| op.undone) {
        return Err(AppError::General(format!(
            "batch already rolled back: {batch_id}"
        )));
    }

    let mut report = RollbackReport {
        batch_id: batch_id.to_string(),
        restored: 0,
        errors: Vec::new(),
    };

    for op in operations.iter().rev() {
        let destination = Path::new(&op.destination_path);
        if let Some(scope) = scope {
            if !destination.starts_with(scope) {
                report.errors.push(format!(
                    "Refusing to touch path outside {}: {}",
                    scope.display(),
                    op.destination_path
                ));
                continue;
            }
        }
        match execute_inverse(op) {
            Ok(true) => report.restored += 1,
            Ok(false) => {}
            Err(e) => {
                log::warn!("rollback of {} failed: {e}", op.destination_path);
                report.errors.push(format!(
                    "Failed to undo {} {}: {e}",
                    op.operation_type, op.destination_path
                ));
            }
        }
    }

    repository::mark_batch_undone(conn, batch_id)?;
    log::info!(
        "rolled back batch {batch_id}: {} restored, {} errors",
        report.restored,
        report.errors.len()
    );
    Ok(report)
}

/// Ok(true) when a file was put back or a copy removed.
fn execute_inverse(op: &OperationRecord) -> Result<bool, AppError> {
    let destination = Path::new(&op.destination_path);
    match op.operation_type {
        OperationType::Move => {
            let source = Path::new(&op.source_path);
            if let Some(parent) = source.parent() {
                fs::create_dir_all(parent)?;
            }
            file_service::move_file(destination, source)?;
            Ok(true)
        }
        OperationType::Copy => {
            if destination.exists() {
                fs::remove_file(destination)?;
            }
            Ok(true)
        }
        OperationType::CreateDir => {
            if destination.is_dir() && fs::read_dir(destination)?.next().is_none() {
                fs::remove_dir(destination)?;
            } else if destination.is_dir() {
                log::warn!("keeping non-empty folder {}", destination.display());
            }
            Ok(false)
        }
    }
}
