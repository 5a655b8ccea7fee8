use crate::error::{PatchError, PatchResult};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

pub fn ensure_directory_exists(path: &Path) -> PatchResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| PatchError::io(parent, e))?;
    }
    Ok(())
}

/// Reads a text file as lines, replacing invalid UTF-8 rather than failing.
pub fn read_lines(path: &Path) -> PatchResult<Vec<String>> {
    let bytes = fs::read(path).map_err(|e| PatchError::io(path, e))?;
    Ok(String::from_utf8_lossy(&bytes)
        .lines()
        .map(|s| s.to_string())
        .collect())
}

pub fn write_lines(path: &Path, lines: &[String], ending_newline: bool) -> PatchResult<()> {
    ensure_directory_exists(path)?;
    let mut content = lines.join("\n");
    if !lines.is_empty() && ending_newline {
        content.push('\n');
    }
    fs::write(path, content).map_err(|e| PatchError::io(path, e))
}

pub fn write_bytes(path: &Path, content: &[u8]) -> PatchResult<()> {
    ensure_directory_exists(path)?;
    fs::write(path, content).map_err(|e| PatchError::io(path, e))
}

/// Removes a file; a file that is already gone is not an error.
pub fn remove_file(path: &Path) -> PatchResult<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() != ErrorKind::NotFound => Err(PatchError::io(path, e)),
        _ => Ok(()),
    }
}

pub fn compute_backup(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(suffix);
    path.with_file_name(name)
}

/// Copies the current bytes of `path` next to it. Returns the backup location
/// when there was something to back up.
pub fn backup(path: &Path, suffix: &str) -> PatchResult<Option<PathBuf>> {
    if !path.is_file() {
        return Ok(None);
    }
    let backup_path = compute_backup(path, suffix);
    fs::copy(path, &backup_path).map_err(|e| PatchError::io(&backup_path, e))?;
    Ok(Some(backup_path))
}
