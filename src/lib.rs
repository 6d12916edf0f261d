//! # pdfocr
//!
//! Extract text from scanned PDF documents with OCR.
//!
//! ## Why this crate?
//!
//! Scanned contracts, forms and letters carry no text layer, so text
//! extraction tools return nothing. This crate rasterises each page, cleans
//! the raster into a crisp black-on-white image (grayscale, Gaussian adaptive
//! threshold, median denoise) and hands it to an OCR engine. The default
//! language set is Vietnamese plus English.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input     validate the local file (exists, readable, %PDF magic)
//!  ├─ 2. Render    rasterise pages via pdfium (CPU-bound, spawn_blocking)
//!  ├─ 3. Cleanup   grayscale → adaptive threshold (35, 11) → 3×3 median
//!  ├─ 4. Engine    tesseract with explicit language / model dir / DPI
//!  ├─ 5. Polish    normalise engine text
//!  └─ 6. Output    "\n--- Page N ---\n<text>" per page + stats
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdfocr::{recognize_document, RecognitionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = RecognitionConfig::default();
//!     let output = recognize_document("scan.pdf", &config).await?;
//!     println!("{}", output.text);
//!     eprintln!("{} pages in {}ms", output.stats.processed_pages, output.stats.total_duration_ms);
//!     Ok(())
//! }
//! ```
//!
//! Interfaces that keep several documents open use [`DocumentStore`], which
//! records a document's text only when recognition succeeded and exports it
//! on request.
//!
//! ## External Tools
//!
//! | Tool | Found via | Override |
//! |------|-----------|----------|
//! | pdfium | system library path | [`RecognitionConfigBuilder::pdfium_lib_dir`] |
//! | tesseract | `PATH` | [`RecognitionConfigBuilder::tesseract_cmd`] |
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdfocr` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! pdfocr = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod export;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod recognize;
pub mod session;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{
    CleanupParams, ModelQuality, PageSelection, RecognitionConfig, RecognitionConfigBuilder,
    DEFAULT_DPI, DEFAULT_LANGUAGE,
};
pub use error::{ErrorCategory, OcrError};
pub use export::default_export_name;
pub use output::{DocumentMetadata, PageText, RecognitionOutput, RecognitionStats};
pub use pipeline::engine::{RecognitionRequest, TesseractEngine, TextRecognizer};
pub use pipeline::render::{PageRasterizer, PdfiumRasterizer, RenderSettings};
pub use progress::{NoopProgressCallback, ProgressCallback, RecognitionProgressCallback};
pub use recognize::{inspect, recognize_document, recognize_document_sync, recognize_to_file};
pub use session::DocumentStore;
