//! Input validation: make sure a user-supplied path is a readable PDF.
//!
//! The magic bytes (`%PDF`) are checked up front so a renamed image or
//! archive fails with a clear message instead of a pdfium error string, and
//! before anything is recorded for the file.

use crate::error::OcrError;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Validate a local PDF path: it must exist, be readable and start with `%PDF`.
pub fn resolve_local(path: impl AsRef<Path>) -> Result<PathBuf, OcrError> {
    let path = path.as_ref().to_path_buf();

    if !path.is_file() {
        return Err(OcrError::FileNotFound { path });
    }

    match std::fs::File::open(&path) {
        Ok(mut f) => {
            let mut magic = [0u8; 4];
            let n = read_prefix(&mut f, &mut magic);
            if n < 4 || &magic != b"%PDF" {
                return Err(OcrError::NotAPdf {
                    path,
                    magic: magic[..n].to_vec(),
                });
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(OcrError::PermissionDenied { path });
        }
        Err(_) => {
            return Err(OcrError::FileNotFound { path });
        }
    }

    debug!("Resolved local PDF: {}", path.display());
    Ok(path)
}

/// Read up to `buf.len()` bytes, tolerating short files.
fn read_prefix(f: &mut std::fs::File, buf: &mut [u8]) -> usize {
    let mut filled = 0;
    while filled < buf.len() {
        match f.read(&mut buf[filled..]) {
            Ok(0) | Err(_) => break,
            Ok(n) => filled += n,
        }
    }
    filled
}

/// Key under which a document's text is stored: the file's base name.
pub fn document_key(path: impl AsRef<Path>) -> String {
    let path = path.as_ref();
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}
