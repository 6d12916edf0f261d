//! Progress-callback trait for per-page recognition events.
//!
//! Inject an [`Arc<dyn RecognitionProgressCallback>`] via
//! [`crate::config::RecognitionConfigBuilder::progress_callback`] to receive
//! events as the pipeline works through a document. A multi-page scan at
//! 300 DPI takes several seconds per page, so an interface that shows nothing
//! looks hung; these hooks are where a progress bar or status line attaches.
//!
//! # Example
//!
//! ```rust
//! use pdfocr::{RecognitionConfig, RecognitionProgressCallback};
//! use std::sync::{Arc, Mutex};
//!
//! /// Keeps a one-line status for a window title or status bar.
//! #[derive(Default)]
//! struct StatusLine(Mutex<String>);
//!
//! impl RecognitionProgressCallback for StatusLine {
//!     fn on_page_start(&self, page_num: usize, total_pages: usize) {
//!         *self.0.lock().unwrap() = format!("Reading page {page_num} of {total_pages}");
//!     }
//!     fn on_document_complete(&self, total_pages: usize, success_count: usize) {
//!         *self.0.lock().unwrap() = format!("{success_count}/{total_pages} pages done");
//!     }
//! }
//!
//! let status = Arc::new(StatusLine::default());
//! let config = RecognitionConfig::builder()
//!     .progress_callback(status.clone())
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the recognition pipeline as it processes each page.
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
///
/// # Thread safety
///
/// With `concurrency > 1`, `on_page_start`, `on_page_complete` and
/// `on_page_error` may be called concurrently from different threads.
pub trait RecognitionProgressCallback: Send + Sync {
    /// Called once after the document was inspected, before any page is rendered.
    ///
    /// # Arguments
    /// * `total_pages` — number of pages that will be processed
    fn on_document_start(&self, total_pages: usize) {
        let _ = total_pages;
    }

    /// Called just before a page is cleaned and handed to the engine.
    fn on_page_start(&self, page_num: usize, total_pages: usize) {
        let _ = (page_num, total_pages);
    }

    /// Called when a page was recognised.
    ///
    /// # Arguments
    /// * `page_num`    — 1-indexed page number
    /// * `total_pages` — pages selected for this run
    /// * `text_len`    — character count of the recognised text
    fn on_page_complete(&self, page_num: usize, total_pages: usize, text_len: usize) {
        let _ = (page_num, total_pages, text_len);
    }

    /// Called when a page failed. The document is aborted right after.
    fn on_page_error(&self, page_num: usize, total_pages: usize, error: &str) {
        let _ = (page_num, total_pages, error);
    }

    /// Called once the document finished, successfully or not.
    ///
    /// # Arguments
    /// * `total_pages`   — pages selected for this run
    /// * `success_count` — pages recognised before completion or abort
    fn on_document_complete(&self, total_pages: usize, success_count: usize) {
        let _ = (total_pages, success_count);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl RecognitionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::RecognitionConfig`].
pub type ProgressCallback = Arc<dyn RecognitionProgressCallback>;
