//! Document recognition entry points.
//!
//! A document either produces text for every selected page or fails as a
//! whole: the first page that cannot be rendered or recognised aborts the run
//! and no partial text is returned. Callers that keep results per document
//! (see [`crate::session::DocumentStore`]) can therefore record a result on
//! `Ok` and nothing on `Err`.

use crate::config::{CleanupParams, RecognitionConfig};
use crate::error::OcrError;
use crate::export;
use crate::output::{DocumentMetadata, PageText, RecognitionOutput, RecognitionStats};
use crate::pipeline::cleanup;
use crate::pipeline::engine::{RecognitionRequest, TesseractEngine, TextRecognizer};
use crate::pipeline::render::{PageRasterizer, PdfiumRasterizer, RenderSettings};
use crate::pipeline::{input, models, postprocess, render};
use crate::progress::ProgressCallback;
use futures::stream::{self, StreamExt, TryStreamExt};
use image::DynamicImage;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Pages rasterised per batch; bounds peak memory on long documents.
const RENDER_BATCH_PAGES: usize = 8;

/// Recognise the text of a PDF file.
///
/// This is the primary entry point for the library.
///
/// # Returns
/// The assembled text, one `"\n--- Page N ---\n"` header per page followed by
/// that page's text, with N the 1-based page number in the document.
///
/// # Errors
/// Any input, rasterisation or engine failure aborts the whole document.
pub async fn recognize_document(
    pdf_path: impl AsRef<Path>,
    config: &RecognitionConfig,
) -> Result<RecognitionOutput, OcrError> {
    let total_start = Instant::now();
    let pdf_path = pdf_path.as_ref();
    info!("Starting recognition: {}", pdf_path.display());

    // ── Step 1: Validate input ───────────────────────────────────────────
    let pdf_path = input::resolve_local(pdf_path)?;

    // ── Step 2: Resolve collaborators and model data ─────────────────────
    let engine = resolve_engine(config);
    let rasterizer = resolve_rasterizer(config);
    let model_choice = models::resolve_model_dir(config);
    if let Some(ref dir) = model_choice.dir {
        models::check_language_models(dir, &config.language)?;
    }

    // ── Step 3: Extract metadata ─────────────────────────────────────────
    let metadata = render::extract_metadata(
        Arc::clone(&rasterizer),
        &pdf_path,
        config.password.as_deref(),
    )
    .await?;
    let total_pages = metadata.page_count;
    info!("PDF has {} pages", total_pages);

    // ── Step 4: Compute page indices ─────────────────────────────────────
    let page_indices = config.pages.to_indices(total_pages);
    if page_indices.is_empty() {
        return Err(OcrError::PageOutOfRange {
            page: 0,
            total: total_pages,
        });
    }
    debug!("Selected {} pages for recognition", page_indices.len());

    let selected = page_indices.len();
    if let Some(ref cb) = config.progress_callback {
        cb.on_document_start(selected);
    }

    // ── Step 5: Rasterise and recognise, batch by batch ──────────────────
    let ctx = Arc::new(PageContext {
        engine: Arc::clone(&engine),
        language: config.language.clone(),
        model_dir: model_choice.dir.clone(),
        dpi: config.dpi,
        cleanup: config.cleanup,
        normalize_text: config.normalize_text,
        progress: config.progress_callback.clone(),
        total_pages: selected,
        completed: AtomicUsize::new(0),
    });

    let mut pages: Vec<PageText> = Vec::with_capacity(selected);
    let mut render_duration_ms = 0u64;
    let mut recognition_duration_ms = 0u64;

    for batch in page_indices.chunks(RENDER_BATCH_PAGES) {
        let render_start = Instant::now();
        let rendered = render::render_pages(
            Arc::clone(&rasterizer),
            &pdf_path,
            RenderSettings::from(config),
            batch,
        )
        .await
        .inspect_err(|_| ctx.finish())?;
        render_duration_ms += render_start.elapsed().as_millis() as u64;

        check_rendered(batch, &rendered).inspect_err(|_| ctx.finish())?;

        let ocr_start = Instant::now();
        let batch_pages = recognise_batch(&ctx, rendered, config.concurrency)
            .await
            .inspect_err(|_| ctx.finish())?;
        recognition_duration_ms += ocr_start.elapsed().as_millis() as u64;

        pages.extend(batch_pages);
    }

    if pages.is_empty() {
        ctx.finish();
        return Err(OcrError::PageOutOfRange {
            page: 0,
            total: total_pages,
        });
    }

    // ── Step 6: Assemble final document ──────────────────────────────────
    let text = assemble_document(&pages);

    let stats = RecognitionStats {
        total_pages,
        processed_pages: pages.len(),
        total_chars: pages.iter().map(|p| p.text.chars().count()).sum(),
        total_duration_ms: total_start.elapsed().as_millis() as u64,
        render_duration_ms,
        recognition_duration_ms,
        engine: engine.name().to_string(),
        language: config.language.clone(),
        model_quality: config.model_quality,
        model_dir: model_choice.dir,
        model_fallback: model_choice.fell_back,
    };

    info!(
        "Recognition complete: {}/{} pages, {} chars, {}ms total",
        stats.processed_pages, total_pages, stats.total_chars, stats.total_duration_ms
    );

    ctx.finish();

    Ok(RecognitionOutput {
        text,
        pages,
        metadata,
        stats,
    })
}

/// Recognise a PDF and write the text directly to a file.
///
/// Uses atomic write (temp file + rename) to prevent partial files. Nothing is
/// written when recognition fails.
pub async fn recognize_to_file(
    pdf_path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    config: &RecognitionConfig,
) -> Result<RecognitionStats, OcrError> {
    let output = recognize_document(pdf_path, config).await?;
    export::write_text_file(output_path.as_ref(), &output.text).await?;
    Ok(output.stats)
}

/// Synchronous wrapper around [`recognize_document`].
///
/// Creates a temporary tokio runtime internally.
pub fn recognize_document_sync(
    pdf_path: impl AsRef<Path>,
    config: &RecognitionConfig,
) -> Result<RecognitionOutput, OcrError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| OcrError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(recognize_document(pdf_path, config))
}

/// Read PDF metadata without recognising anything.
///
/// Does not need the OCR engine.
pub async fn inspect(
    pdf_path: impl AsRef<Path>,
    config: &RecognitionConfig,
) -> Result<DocumentMetadata, OcrError> {
    let pdf_path = input::resolve_local(pdf_path)?;
    render::extract_metadata(
        resolve_rasterizer(config),
        &pdf_path,
        config.password.as_deref(),
    )
    .await
}

/// Join pages as `"\n--- Page N ---\n<text>"`, in the order given.
pub fn assemble_document(pages: &[PageText]) -> String {
    let mut out = String::with_capacity(pages.iter().map(|p| p.text.len() + 20).sum());
    for page in pages {
        out.push_str(&page_header(page.page_num));
        out.push_str(&page.text);
    }
    out
}

/// Delimiter preceding the text of page `page_num`.
pub fn page_header(page_num: usize) -> String {
    format!("\n--- Page {} ---\n", page_num)
}

// ── Internal helpers ─────────────────────────────────────────────────────

fn resolve_engine(config: &RecognitionConfig) -> Arc<dyn TextRecognizer> {
    match config.engine {
        Some(ref engine) => Arc::clone(engine),
        None => Arc::new(TesseractEngine::new(config.tesseract_cmd.clone())),
    }
}

fn resolve_rasterizer(config: &RecognitionConfig) -> Arc<dyn PageRasterizer> {
    match config.rasterizer {
        Some(ref rasterizer) => Arc::clone(rasterizer),
        None => Arc::new(PdfiumRasterizer::new(config.pdfium_lib_dir.clone())),
    }
}

/// The renderer must hand back exactly the requested pages, in order.
fn check_rendered(batch: &[usize], rendered: &[(usize, DynamicImage)]) -> Result<(), OcrError> {
    for (pos, &want) in batch.iter().enumerate() {
        if rendered.get(pos).map(|(idx, _)| *idx) != Some(want) {
            warn!("Renderer did not return page {}", want + 1);
            return Err(OcrError::RasterisationFailed {
                page: want + 1,
                detail: "page missing from renderer output".into(),
            });
        }
    }
    if let Some((extra, _)) = rendered.get(batch.len()) {
        return Err(OcrError::RasterisationFailed {
            page: extra + 1,
            detail: "renderer returned a page that was not requested".into(),
        });
    }
    Ok(())
}

/// Per-document state shared by every page task.
struct PageContext {
    engine: Arc<dyn TextRecognizer>,
    language: String,
    model_dir: Option<PathBuf>,
    dpi: u32,
    cleanup: CleanupParams,
    normalize_text: bool,
    progress: Option<ProgressCallback>,
    total_pages: usize,
    completed: AtomicUsize,
}

impl PageContext {
    fn finish(&self) {
        if let Some(ref cb) = self.progress {
            cb.on_document_complete(self.total_pages, self.completed.load(Ordering::SeqCst));
        }
    }
}

/// Clean and recognise rendered pages, keeping page order.
async fn recognise_batch(
    ctx: &Arc<PageContext>,
    rendered: Vec<(usize, DynamicImage)>,
    concurrency: usize,
) -> Result<Vec<PageText>, OcrError> {
    stream::iter(rendered.into_iter().map(|(idx, image)| {
        let ctx = Arc::clone(ctx);
        async move {
            let page_num = idx + 1;
            if let Some(ref cb) = ctx.progress {
                cb.on_page_start(page_num, ctx.total_pages);
            }

            let task_ctx = Arc::clone(&ctx);
            let result = tokio::task::spawn_blocking(move || {
                recognise_page_blocking(&task_ctx, page_num, image)
            })
            .await
            .map_err(|e| OcrError::Internal(format!("Recognition task panicked: {}", e)))
            .and_then(|r| r);

            match &result {
                Ok(page) => {
                    ctx.completed.fetch_add(1, Ordering::SeqCst);
                    if let Some(ref cb) = ctx.progress {
                        cb.on_page_complete(page_num, ctx.total_pages, page.text.chars().count());
                    }
                }
                Err(e) => {
                    warn!("Page {}: {}", page_num, e);
                    if let Some(ref cb) = ctx.progress {
                        cb.on_page_error(page_num, ctx.total_pages, &e.to_string());
                    }
                }
            }
            result
        }
    }))
    .buffered(concurrency.max(1))
    .try_collect()
    .await
}

/// Cleanup + engine call for one page. Runs on a blocking thread.
fn recognise_page_blocking(
    ctx: &PageContext,
    page_num: usize,
    image: DynamicImage,
) -> Result<PageText, OcrError> {
    let start = Instant::now();
    let (width, height) = (image.width(), image.height());

    let cleaned = cleanup::clean_page(&image, &ctx.cleanup);
    drop(image);

    let request = RecognitionRequest {
        page_num,
        language: &ctx.language,
        model_dir: ctx.model_dir.as_deref(),
        dpi: ctx.dpi,
    };
    let raw = ctx.engine.recognize(&cleaned, &request)?;
    let text = if ctx.normalize_text {
        postprocess::clean_text(&raw)
    } else {
        raw
    };

    let duration_ms = start.elapsed().as_millis() as u64;
    debug!(
        "Page {}: {}x{} px → {} chars in {}ms",
        page_num,
        width,
        height,
        text.chars().count(),
        duration_ms
    );

    Ok(PageText {
        page_num,
        text,
        width,
        height,
        duration_ms,
    })
}
