//! Discovery and reading of `.eml` input files.

use std::path::{Path, PathBuf};

use crate::error::{ConvertError, Result};

/// List the `.eml` files directly inside `dir`, sorted by filename.
///
/// The extension match is case-insensitive (`.eml`, `.EML`).
/// Subdirectories are not descended into.
pub fn discover_messages(dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    if !dir.is_dir() {
        return Err(ConvertError::InputDirNotFound(dir.to_path_buf()));
    }

    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
        .map_err(|e| ConvertError::io(dir, e))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|p| p.is_file() && has_eml_extension(p))
        .collect();

    files.sort();
    Ok(files)
}

/// Read the raw bytes of one message file.
pub fn read_message(path: impl AsRef<Path>) -> Result<Vec<u8>> {
    let path = path.as_ref();
    std::fs::read(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ConvertError::FileNotFound(path.to_path_buf())
        } else {
            ConvertError::io(path, e)
        }
    })
}

/// The filename without its `.eml` extension; output paths derive from this.
pub fn basename(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "message".to_string())
}

fn has_eml_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("eml"))
}
