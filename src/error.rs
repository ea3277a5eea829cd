use serde::Serialize;

use crate::services::workspace::WorkspaceError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error(transparent)]
    Workspace(#[from] WorkspaceError),

    #[error("{0}")]
    General(String),

    #[error("Scan error: {0}")]
    Scan(String),

    #[error("Analysis error: {0}")]
    Analysis(String),

    #[error("Materialize error: {0}")]
    Materialize(String),
}

impl Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}
