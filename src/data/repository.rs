use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::error::AppError;
use crate::models::operation::{OperationRecord, OperationType};

const OPERATION_COLUMNS: &str =
    "operation_id, batch_id, operation_type, source_path, destination_path, executed_at, undone";

fn operation_from_row(row: &Row<'_>) -> rusqlite::Result<OperationRecord> {
    let op_type_str: String = row.get(2)?;
    let operation_type = op_type_str.parse::<OperationType>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(
            2,
            rusqlite::types::Type::Text,
            Box::new(std::io::Error::new(std::io::ErrorKind::InvalidData, e)),
        )
    })?;

    Ok(OperationRecord {
        operation_id: row.get(0)?,
        batch_id: row.get(1)?,
        operation_type,
        source_path: row.get(3)?,
        destination_path: row.get(4)?,
        executed_at: row.get(5)?,
        undone: row.get(6)?,
    })
}

pub fn insert_operation(conn: &Connection, record: &OperationRecord) -> Result<i64, AppError> {
    conn.execute(
        "INSERT INTO undo_log (operation_id, batch_id, operation_type, source_path, destination_path, executed_at, undone)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            record.operation_id,
            record.batch_id,
            record.operation_type.to_string(),
            record.source_path,
            record.destination_path,
            record.executed_at,
            record.undone,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Operations of one batch in execution order.
pub fn list_batch(conn: &Connection, batch_id: &str) -> Result<Vec<OperationRecord>, AppError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {OPERATION_COLUMNS} FROM undo_log WHERE batch_id = ?1 ORDER BY id ASC"
    ))?;

    let records = stmt
        .query_map(params![batch_id], operation_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(records)
}

pub fn get_latest_undoable_batch(conn: &Connection) -> Result<Option<String>, AppError> {
    let batch = conn
        .query_row(
            "SELECT batch_id FROM undo_log WHERE undone = 0 ORDER BY id DESC LIMIT 1",
            [],
            |row| row.get(0),
        )
        .optional()?;
    Ok(batch)
}

pub fn mark_batch_undone(conn: &Connection, batch_id: &str) -> Result<usize, AppError> {
    let count = conn.execute(
        "UPDATE undo_log SET undone = 1 WHERE batch_id = ?1",
        params![batch_id],
    )?;
    Ok(count)
}
