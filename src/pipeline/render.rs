//! Page rasterisation.
//!
//! [`PageRasterizer`] turns selected pages of a PDF into images;
//! [`PdfiumRasterizer`] is the pdfium-backed implementation. pdfium is a
//! blocking C library, so the async helpers at the bottom of this module move
//! every call onto tokio's blocking pool.
//!
//! Pages are scaled by `dpi / 72` (PDF user space is 72 units per inch), then
//! clamped to `max_rendered_pixels` on the longer edge.

use crate::config::RecognitionConfig;
use crate::error::OcrError;
use crate::output::DocumentMetadata;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Render parameters shared by every page of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderSettings {
    pub dpi: u32,
    pub max_rendered_pixels: u32,
    pub password: Option<String>,
}

impl From<&RecognitionConfig> for RenderSettings {
    fn from(config: &RecognitionConfig) -> Self {
        Self {
            dpi: config.dpi,
            max_rendered_pixels: config.max_rendered_pixels,
            password: config.password.clone(),
        }
    }
}

/// Converts a PDF into page rasters.
///
/// Methods are blocking; the pipeline calls them from `spawn_blocking`.
pub trait PageRasterizer: Send + Sync {
    /// Read document metadata (page count at minimum) without rendering.
    fn inspect(&self, pdf_path: &Path, password: Option<&str>)
        -> Result<DocumentMetadata, OcrError>;

    /// Render the given 0-indexed pages, in the order given.
    ///
    /// Returns `(page_index_0based, image)` tuples.
    fn render(
        &self,
        pdf_path: &Path,
        settings: &RenderSettings,
        page_indices: &[usize],
    ) -> Result<Vec<(usize, DynamicImage)>, OcrError>;
}

/// Rasterizer backed by the pdfium library.
#[derive(Debug, Clone, Default)]
pub struct PdfiumRasterizer {
    /// Directory containing the platform pdfium library. `None` binds the
    /// system library.
    library_dir: Option<PathBuf>,
}

impl PdfiumRasterizer {
    pub fn new(library_dir: Option<PathBuf>) -> Self {
        Self { library_dir }
    }

    fn bind(&self) -> Result<Pdfium, OcrError> {
        let bindings = match &self.library_dir {
            Some(dir) => {
                Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(dir))
            }
            None => Pdfium::bind_to_system_library(),
        }
        .map_err(|e| OcrError::PdfiumBindingFailed(format!("{:?}", e)))?;
        Ok(Pdfium::new(bindings))
    }

    fn load<'a>(
        pdfium: &'a Pdfium,
        pdf_path: &Path,
        password: Option<&'a str>,
    ) -> Result<PdfDocument<'a>, OcrError> {
        pdfium
            .load_pdf_from_file(pdf_path, password)
            .map_err(|e| load_error(pdf_path, password.is_some(), e))
    }
}

/// Classify a pdfium load failure.
fn load_error(pdf_path: &Path, had_password: bool, err: PdfiumError) -> OcrError {
    let path = pdf_path.to_path_buf();
    let detail = format!("{err:?}");
    let password_problem = matches!(
        err,
        PdfiumError::PdfiumLibraryInternalError(PdfiumInternalError::PasswordError)
    ) || detail.to_ascii_lowercase().contains("password");

    match (password_problem, had_password) {
        (true, true) => OcrError::WrongPassword { path },
        (true, false) => OcrError::PasswordRequired { path },
        (false, _) => OcrError::CorruptPdf { path, detail },
    }
}

/// A non-empty metadata tag value.
fn tag_value(document: &PdfDocument<'_>, tag: PdfDocumentMetadataTagType) -> Option<String> {
    document
        .metadata()
        .get(tag)
        .map(|t| t.value().trim().to_string())
        .filter(|v| !v.is_empty())
}

impl PageRasterizer for PdfiumRasterizer {
    fn inspect(
        &self,
        pdf_path: &Path,
        password: Option<&str>,
    ) -> Result<DocumentMetadata, OcrError> {
        let pdfium = self.bind()?;
        let document = Self::load(&pdfium, pdf_path, password)?;

        Ok(DocumentMetadata {
            title: tag_value(&document, PdfDocumentMetadataTagType::Title),
            author: tag_value(&document, PdfDocumentMetadataTagType::Author),
            subject: tag_value(&document, PdfDocumentMetadataTagType::Subject),
            creator: tag_value(&document, PdfDocumentMetadataTagType::Creator),
            producer: tag_value(&document, PdfDocumentMetadataTagType::Producer),
            page_count: document.pages().len() as usize,
            pdf_version: format!("{:?}", document.version()),
        })
    }

    fn render(
        &self,
        pdf_path: &Path,
        settings: &RenderSettings,
        page_indices: &[usize],
    ) -> Result<Vec<(usize, DynamicImage)>, OcrError> {
        let pdfium = self.bind()?;
        let document = Self::load(&pdfium, pdf_path, settings.password.as_deref())?;
        let pages = document.pages();
        let total = pages.len() as usize;

        let cap = settings.max_rendered_pixels as i32;
        let config = PdfRenderConfig::new()
            .scale_page_by_factor(settings.dpi as f32 / 72.0)
            .set_maximum_width(cap)
            .set_maximum_height(cap);

        page_indices
            .iter()
            .map(|&idx| {
                if idx >= total {
                    return Err(OcrError::PageOutOfRange {
                        page: idx + 1,
                        total,
                    });
                }
                let failed = |e: PdfiumError| OcrError::RasterisationFailed {
                    page: idx + 1,
                    detail: format!("{e:?}"),
                };
                let page = pages.get(idx as u16).map_err(failed)?;
                let image = page.render_with_config(&config).map_err(failed)?.as_image();
                debug!(
                    "Page {}: rendered at {} DPI, {}x{} px",
                    idx + 1,
                    settings.dpi,
                    image.width(),
                    image.height()
                );
                Ok((idx, image))
            })
            .collect()
    }
}

/// Rasterise selected pages of a PDF off the async executor.
pub async fn render_pages(
    rasterizer: Arc<dyn PageRasterizer>,
    pdf_path: &Path,
    settings: RenderSettings,
    page_indices: &[usize],
) -> Result<Vec<(usize, DynamicImage)>, OcrError> {
    let (path, indices) = (pdf_path.to_path_buf(), page_indices.to_vec());
    tokio::task::spawn_blocking(move || rasterizer.render(&path, &settings, &indices))
        .await
        .map_err(|e| OcrError::Internal(format!("Render task panicked: {}", e)))?
}

/// Extract document metadata off the async executor.
pub async fn extract_metadata(
    rasterizer: Arc<dyn PageRasterizer>,
    pdf_path: &Path,
    password: Option<&str>,
) -> Result<DocumentMetadata, OcrError> {
    let (path, password) = (pdf_path.to_path_buf(), password.map(str::to_owned));
    tokio::task::spawn_blocking(move || rasterizer.inspect(&path, password.as_deref()))
        .await
        .map_err(|e| OcrError::Internal(format!("Metadata task panicked: {}", e)))?
}
