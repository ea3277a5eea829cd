use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::services::materialize_service::ApplyOptions;

const CONFIG_FILE: &str = "config.json";
const JOURNAL_FILE: &str = "photo-organize.db";
pub const DEFAULT_MAX_FILE_SIZE: u64 = 100 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AppConfig {
    pub default_query: String,
    pub progress_every: usize,
    pub max_file_size_bytes: u64,
    pub create_backup: bool,
    pub copy_instead_of_move: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub journal_path: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            default_query: String::new(),
            progress_every: 10,
            max_file_size_bytes: DEFAULT_MAX_FILE_SIZE,
            create_backup: false,
            copy_instead_of_move: false,
            journal_path: None,
        }
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("dev", "photo-organize", "photo-organize")
}

impl AppConfig {
    pub fn default_path() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE))
    }

    /// Reads `path`, falling back to defaults when it is missing or malformed.
    pub fn load_from(path: &Path) -> Self {
        let Ok(contents) = fs::read_to_string(path) else {
            return Self::default();
        };
        match serde_json::from_str(&contents) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("ignoring malformed config {}: {e}", path.display());
                Self::default()
            }
        }
    }

    pub fn load() -> Self {
        Self::default_path()
            .map(|path| Self::load_from(&path))
            .unwrap_or_default()
    }

    pub fn save_to(&self, path: &Path) -> Result<(), AppError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn journal_path(&self) -> Result<PathBuf, AppError> {
        if let Some(path) = &self.journal_path {
            return Ok(path.clone());
        }
        project_dirs()
            .map(|dirs| dirs.data_dir().join(JOURNAL_FILE))
            .ok_or_else(|| AppError::General("failed to resolve app data dir".to_string()))
    }

    pub fn apply_options(&self) -> ApplyOptions {
        ApplyOptions {
            create_backup: self.create_backup,
            copy_instead_of_move: self.copy_instead_of_move,
        }
    }
}
