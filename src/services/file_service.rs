use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::AppError;

/// `dir/file_name`, or `dir/<stem>_<n><.ext>` with the first free `n >= 1`.
pub fn unique_destination(dir: &Path, file_name: &str) -> PathBuf {
    let candidate = dir.join(file_name);
    if !candidate.exists() {
        return candidate;
    }

    let as_path = Path::new(file_name);
    let stem = as_path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| file_name.to_string());
    let extension = as_path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    let mut counter = 1usize;
    loop {
        let candidate = dir.join(format!("{stem}_{counter}{extension}"));
        if !candidate.exists() {
            return candidate;
        }
        counter += 1;
    }
}

/// Returns true when the directory did not exist before.
pub fn create_dir(path: &Path) -> Result<bool, AppError> {
    if path.is_dir() {
        return Ok(false);
    }
    fs::create_dir_all(path)?;
    Ok(true)
}

/// Rename, falling back to copy + remove when the rename fails (for example
/// across devices).
pub fn move_file(source: &Path, destination: &Path) -> Result<(), AppError> {
    if destination.exists() {
        return Err(AppError::General(format!(
            "destination already exists: {}",
            destination.display()
        )));
    }
    match fs::rename(source, destination) {
        Ok(()) => Ok(()),
        Err(rename_err) if source.is_file() => {
            if fs::copy(source, destination).is_err() {
                let _ = fs::remove_file(destination);
                return Err(rename_err.into());
            }
            remove_source_or_copy(source, destination, |p| fs::remove_file(p))
        }
        Err(e) => Err(e.into()),
    }
}

/// Finishes a copy-based move. When `source` cannot be removed the copy goes
/// too, so the file never ends up in both places.
fn remove_source_or_copy(
    source: &Path,
    destination: &Path,
    remove: impl FnOnce(&Path) -> io::Result<()>,
) -> Result<(), AppError> {
    if let Err(e) = remove(source) {
        let _ = fs::remove_file(destination);
        return Err(e.into());
    }
    Ok(())
}

/// Both paths name one existing file.
pub fn is_same_file(a: &Path, b: &Path) -> bool {
    if a == b {
        return a.exists();
    }
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

pub fn copy_file(source: &Path, destination: &Path) -> Result<(), AppError> {
    if destination.exists() {
        return Err(AppError::General(format!(
            "destination already exists: {}",
            destination.display()
        )));
    }
    fs::copy(source, destination)?;
    Ok(())
}

/// Removes empty immediate subdirectories of `base`, leaving `backup_*` alone.
pub fn cleanup_empty_folders(base: &Path) -> Result<usize, AppError> {
    let mut removed = 0;
    for entry in fs::read_dir(base)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        if entry.file_name().to_string_lossy().starts_with("backup_") {
            continue;
        }
        let path = entry.path();
        if fs::read_dir(&path)?.next().is_none() {
            fs::remove_dir(&path)?;
            removed += 1;
        }
    }
    Ok(removed)
}
