//! Attachment extraction into the per-message working directory.
//!
//! Two strategies, tried in order: the native MIME walk (`mail-parser`),
//! then the external `munpack` tool for messages the native parser cannot
//! handle. Failure of both is reported to the caller, who treats it as
//! non-fatal.

use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, warn};

use crate::error::{ConvertError, Result};
use crate::parser::mime::ParsedMessage;

/// Extract a message's attachments as files under `workdir`.
///
/// `parsed` is the native MIME parse result when one exists. Returns the
/// extracted file paths (possibly empty when the message simply has no
/// attachments); an `Err` means both strategies failed.
pub fn extract_attachments(
    eml_path: &Path,
    parsed: Option<&ParsedMessage>,
    workdir: &Path,
    extractor: &str,
) -> Result<Vec<PathBuf>> {
    match parsed {
        Some(msg) if msg.attachments.is_empty() => return Ok(Vec::new()),
        Some(msg) => match write_native(msg, workdir) {
            Ok(files) => return Ok(files),
            Err(e) => {
                warn!(error = %e, "Native attachment extraction failed, trying fallback tool");
            }
        },
        None => {
            debug!(path = %eml_path.display(), "MIME parse failed, using fallback extractor");
        }
    }

    run_fallback_extractor(eml_path, workdir, extractor)
}

/// Write the already-decoded attachments of a parsed message to disk.
fn write_native(msg: &ParsedMessage, workdir: &Path) -> Result<Vec<PathBuf>> {
    let dir = workdir.join("parts");
    std::fs::create_dir_all(&dir).map_err(|e| ConvertError::io(&dir, e))?;

    let mut paths = Vec::with_capacity(msg.attachments.len());
    for att in &msg.attachments {
        let filename = sanitize_filename_part(&att.meta.filename, 150);
        let path = unique_path(&dir.join(&filename));
        std::fs::write(&path, &att.data).map_err(|e| ConvertError::io(&path, e))?;
        paths.push(path);
    }
    Ok(paths)
}

/// Run the external MIME extractor on the message file.
///
/// The tool is pointed at its own subdirectory so that whatever files it
/// produces can be collected without guessing their names.
fn run_fallback_extractor(eml_path: &Path, workdir: &Path, extractor: &str) -> Result<Vec<PathBuf>> {
    let dir = workdir.join("unpacked");
    std::fs::create_dir_all(&dir).map_err(|e| ConvertError::io(&dir, e))?;

    let output = Command::new(extractor)
        .arg("-q")
        .arg("-C")
        .arg(&dir)
        .arg(eml_path)
        .output()
        .map_err(|e| ConvertError::ToolSpawn {
            tool: extractor.to_string(),
            source: e,
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ConvertError::ToolFailed {
            tool: extractor.to_string(),
            status: output.status.to_string(),
            detail: stderr.trim().to_string(),
        });
    }

    let mut paths: Vec<PathBuf> = std::fs::read_dir(&dir)
        .map_err(|e| ConvertError::io(&dir, e))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|p| p.is_file() && !is_part_description(p))
        .collect();
    paths.sort();
    Ok(paths)
}

/// munpack writes a `.desc` companion per part; those are not attachments.
fn is_part_description(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("desc"))
}

/// Move extracted files into the per-message output folder.
///
/// The folder is only created when there is at least one file to place in
/// it. Names are sanitized and de-duplicated with a numeric suffix.
pub fn move_into_output(files: &[PathBuf], dest_dir: &Path) -> Result<Vec<PathBuf>> {
    if files.is_empty() {
        return Ok(Vec::new());
    }
    std::fs::create_dir_all(dest_dir).map_err(|e| ConvertError::io(dest_dir, e))?;

    let mut moved = Vec::with_capacity(files.len());
    for file in files {
        let name = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "attachment".to_string());
        let dest = unique_path(&dest_dir.join(sanitize_filename_part(&name, 150)));
        move_file(file, &dest)?;
        moved.push(dest);
    }
    Ok(moved)
}

/// Rename, falling back to copy+remove for cross-device moves.
fn move_file(from: &Path, to: &Path) -> Result<()> {
    if std::fs::rename(from, to).is_ok() {
        return Ok(());
    }
    std::fs::copy(from, to).map_err(|e| ConvertError::io(to, e))?;
    std::fs::remove_file(from).map_err(|e| ConvertError::io(from, e))?;
    Ok(())
}

/// Sanitize a string for use in filenames.
///
/// Replaces invalid characters with `_` and truncates to `max_len`.
pub fn sanitize_filename_part(s: &str, max_len: usize) -> String {
    let sanitized: String = s
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '.' || c == '_' || c == '@' {
                c
            } else {
                '_'
            }
        })
        .take(max_len)
        .collect();

    if sanitized.is_empty() {
        "attachment".to_string()
    } else {
        sanitized
    }
}

/// If `path` already exists, append a counter to make it unique.
pub fn unique_path(path: &Path) -> PathBuf {
    if !path.exists() {
        return path.to_path_buf();
    }

    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("file");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    let parent = path.parent().unwrap_or(Path::new("."));

    for i in 1..1000 {
        let candidate = if ext.is_empty() {
            parent.join(format!("{stem}_{i}"))
        } else {
            parent.join(format!("{stem}_{i}.{ext}"))
        };
        if !candidate.exists() {
            return candidate;
        }
    }

    // Last resort, extremely unlikely
    parent.join(format!("{stem}_dup.{ext}"))
}
