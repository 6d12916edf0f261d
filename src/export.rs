//! Export of recognised text to plain UTF-8 files.

use crate::error::OcrError;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Write `text` to `path` atomically: uniquely named temp file in the same
/// directory, then rename.
///
/// Parent directories are created. A failed write leaves any existing file at
/// `path` as it was, and concurrent writers to one path never share a temp file.
pub async fn write_text_file(path: &Path, text: &str) -> Result<(), OcrError> {
    let (path, text) = (path.to_path_buf(), text.to_owned());
    tokio::task::spawn_blocking(move || persist_text(&path, &text))
        .await
        .map_err(|e| OcrError::Internal(format!("Export task panicked: {}", e)))?
}

fn persist_text(path: &Path, text: &str) -> Result<(), OcrError> {
    let fail = |source: std::io::Error| OcrError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent).map_err(fail)?;

    let mut tmp = NamedTempFile::new_in(parent).map_err(fail)?;
    tmp.write_all(text.as_bytes()).map_err(fail)?;
    tmp.persist(path).map_err(|e| fail(e.error))?;
    Ok(())
}

/// Suggested export file name: `scan.pdf` → `scan.txt`, `notes` → `notes.txt`.
pub fn default_export_name(filename: &str) -> String {
    let lower = filename.to_ascii_lowercase();
    match lower.strip_suffix(".pdf") {
        Some(stem) if !stem.is_empty() => format!("{}.txt", &filename[..stem.len()]),
        _ => format!("{filename}.txt"),
    }
}
