use std::path::{Component, Path};

use crate::error::AppError;

const PROTECTED_ROOTS: &[&str] = &[
    "/Applications",
    "/bin",
    "/sbin",
    "/usr",
    "/System",
    "/Library",
    "/etc",
    "C:\\Windows",
    "C:\\Program Files",
    "C:\\Program Files (x86)",
];

fn normalize_for_match(path: &str) -> String {
    let mut normalized = path.trim().replace('\\', "/");
    while normalized.ends_with('/') && normalized.len() > 1 {
        normalized.pop();
    }
    normalized
}

fn is_windows_style_path(path: &str) -> bool {
    let bytes = path.as_bytes();
    bytes.len() >= 2 && bytes[1] == b':' && bytes[0].is_ascii_alphabetic()
}

pub fn is_protected_path(path: &Path) -> bool {
    let normalized = normalize_for_match(&path.to_string_lossy());
    PROTECTED_ROOTS.iter().any(|root| {
        let root = normalize_for_match(root);
        let (candidate, root) = if is_windows_style_path(&root) {
            (normalized.to_ascii_lowercase(), root.to_ascii_lowercase())
        } else {
            (normalized.clone(), root)
        };
        candidate == root || candidate.starts_with(&format!("{root}/"))
    })
}

/// The organize base must not be a system location.
pub fn validate_destination_base(base: &Path) -> Result<(), AppError> {
    if base.as_os_str().is_empty() {
        return Err(AppError::General("base path is empty".to_string()));
    }
    if is_protected_path(base) {
        return Err(AppError::General(format!(
            "operation on protected path not allowed: {}",
            base.display()
        )));
    }
    Ok(())
}

/// Folder names become one directory under the base: exactly one normal
/// path component, no separators, no `.`/`..`.
pub fn validate_folder_name(name: &str) -> Result<(), AppError> {
    if name.trim().is_empty() {
        return Err(AppError::General("folder name is empty".to_string()));
    }
    if name.contains('/') || name.contains('\\') {
        return Err(AppError::General(format!(
            "folder name contains a path separator: {name}"
        )));
    }
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(()),
        _ => Err(AppError::General(format!(
            "folder name is not a plain directory name: {name}"
        ))),
    }
}
