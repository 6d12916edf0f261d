//! Result types returned by the recognition entry points.

use crate::config::ModelQuality;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Text of one recognised page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageText {
    /// 1-indexed page number in the source document.
    pub page_num: usize,
    /// Recognised text (normalised when `normalize_text` is on).
    pub text: String,
    /// Rendered size fed to the cleanup step.
    pub width: u32,
    pub height: u32,
    /// Cleanup + recognition wall time.
    pub duration_ms: u64,
}

/// Document-level metadata read without rendering.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    pub page_count: usize,
    pub pdf_version: String,
}

/// Timing and model information for one run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecognitionStats {
    pub total_pages: usize,
    pub processed_pages: usize,
    pub total_chars: usize,
    pub total_duration_ms: u64,
    pub render_duration_ms: u64,
    pub recognition_duration_ms: u64,
    pub engine: String,
    pub language: String,
    pub model_quality: ModelQuality,
    /// Model-data directory actually used; `None` is the engine default.
    pub model_dir: Option<PathBuf>,
    /// True when high-quality models were requested but unavailable.
    pub model_fallback: bool,
}

/// Full output of [`crate::recognize::recognize_document`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecognitionOutput {
    /// Assembled text: `"\n--- Page N ---\n<text>"` for every page, in order.
    pub text: String,
    pub pages: Vec<PageText>,
    pub metadata: DocumentMetadata,
    pub stats: RecognitionStats,
}
