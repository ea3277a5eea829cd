use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

use crate::config::AppConfig;
use crate::data;
use crate::error::AppError;
use crate::services::workspace::Workspace;

pub struct AppState {
    pub db: Mutex<rusqlite::Connection>,
    pub db_path: PathBuf,
    pub config: AppConfig,
    pub workspace: Mutex<Workspace>,
}

impl AppState {
    pub fn open(config: AppConfig) -> Result<Self, AppError> {
        let db_path = config.journal_path()?;
        let conn = data::open_journal(&db_path)?;
        Ok(Self::with_connection(conn, db_path, config))
    }

    pub fn with_connection(conn: rusqlite::Connection, db_path: PathBuf, config: AppConfig) -> Self {
        Self {
            db: Mutex::new(conn),
            db_path,
            config,
            workspace: Mutex::new(Workspace::new()),
        }
    }

    pub fn lock_db(&self) -> MutexGuard<'_, rusqlite::Connection> {
        self.db.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn lock_workspace(&self) -> MutexGuard<'_, Workspace> {
        self.workspace
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
