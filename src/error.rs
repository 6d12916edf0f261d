//! Error types for the pdfocr library.
//!
//! A single fatal error type, [`OcrError`], covers every way a document can
//! fail. A document is all-or-nothing: the first page that cannot be
//! rasterised or recognised fails the whole run, and nothing is recorded for
//! it. Callers that need to react differently per failure family can match
//! on [`OcrError::category`] instead of on individual variants.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the pdfocr library.
#[derive(Debug, Error)]
pub enum OcrError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: Vec<u8> },

    // ── Rasterisation errors ──────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{path}' is corrupt: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{path}' is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired { path: PathBuf },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{path}'")]
    WrongPassword { path: PathBuf },

    /// The page selection matched no page of the document.
    #[error("Page {page} is out of range (document has {total} pages)")]
    PageOutOfRange { page: usize, total: usize },

    /// The renderer returned an error for a specific page.
    #[error("Rasterisation failed for page {page}: {detail}")]
    RasterisationFailed { page: usize, detail: String },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Install libpdfium system-wide, or point --pdfium-lib-dir / PDFIUM_LIB_PATH\n\
at the directory that contains it.\n"
    )]
    PdfiumBindingFailed(String),

    // ── Recognition engine errors ─────────────────────────────────────────
    /// The OCR executable could not be started.
    #[error("OCR engine '{command}' not found: {detail}\nInstall tesseract or set --tesseract-cmd.")]
    EngineNotFound { command: String, detail: String },

    /// The OCR engine ran but reported a failure for a page.
    #[error("OCR engine failed on page {page}: {detail}")]
    EngineFailed { page: usize, detail: String },

    /// No trained model exists for (part of) the requested language.
    #[error("Unsupported language '{language}': {detail}")]
    UnsupportedLanguage { language: String, detail: String },

    /// The model-data directory is missing or holds no models.
    #[error("Model data unavailable at '{}': {detail}", .dir.as_ref().map(|d| d.display().to_string()).unwrap_or_else(|| "<engine default>".into()))]
    ModelDataMissing { dir: Option<PathBuf>, detail: String },

    // ── Export errors ─────────────────────────────────────────────────────
    /// Export was requested for a file that has no recognised text.
    #[error("No recognised text for '{filename}'; open it successfully before exporting")]
    NoResult { filename: String },

    /// Could not create or write the output text file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Coarse failure family, mirroring the three places a document can break.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Unreadable, corrupt, encrypted or non-PDF input.
    Rasterization,
    /// Missing engine binary, missing models, unknown language.
    Recognition,
    /// Filesystem failure or nothing to export.
    Export,
    /// Rejected configuration.
    Configuration,
    Internal,
}

impl OcrError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            OcrError::FileNotFound { .. }
            | OcrError::PermissionDenied { .. }
            | OcrError::NotAPdf { .. }
            | OcrError::CorruptPdf { .. }
            | OcrError::PasswordRequired { .. }
            | OcrError::WrongPassword { .. }
            | OcrError::PageOutOfRange { .. }
            | OcrError::RasterisationFailed { .. }
            | OcrError::PdfiumBindingFailed(_) => ErrorCategory::Rasterization,
            OcrError::EngineNotFound { .. }
            | OcrError::EngineFailed { .. }
            | OcrError::UnsupportedLanguage { .. }
            | OcrError::ModelDataMissing { .. } => ErrorCategory::Recognition,
            OcrError::NoResult { .. } | OcrError::OutputWriteFailed { .. } => ErrorCategory::Export,
            OcrError::InvalidConfig(_) => ErrorCategory::Configuration,
            OcrError::Internal(_) => ErrorCategory::Internal,
        }
    }
}
