//! Pipeline stages for PDF text recognition.
//!
//! Each submodule implements exactly one transformation step, so each can be
//! tested on its own and the external collaborators (renderer, OCR engine)
//! can be swapped behind their traits.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ render ──▶ cleanup ──▶ engine ──▶ postprocess
//! (path)    (pdfium)   (binarise)  (tesseract) (normalise)
//!                                    ▲
//!                                  models
//! ```
//!
//! 1. [`input`]   — validate the user-supplied path and derive the result key
//! 2. [`render`]  — rasterise selected pages; runs in `spawn_blocking` because
//!    pdfium is not async-safe
//! 3. [`cleanup`] — grayscale, Gaussian adaptive threshold, median denoise
//! 4. [`models`]  — pick the model-data directory, with silent fallback
//! 5. [`engine`]  — run the OCR engine with an explicit per-call request
//! 6. [`postprocess`] — deterministic cleanup of the engine's text

pub mod cleanup;
pub mod engine;
pub mod input;
pub mod models;
pub mod postprocess;
pub mod render;
