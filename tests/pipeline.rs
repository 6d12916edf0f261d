//! Pipeline integration tests with an in-process rasterizer and engine.
//!
//! No pdfium or tesseract is needed: the stub rasterizer produces synthetic
//! page images and the stub engine reports which page it was given, so the
//! tests exercise ordering, page numbering, model-directory selection, the
//! failure policy and the document store.

use image::{DynamicImage, GrayImage, Rgb, RgbImage};
use pdfocr::{
    recognize_document, recognize_to_file, DocumentMetadata, DocumentStore, ModelQuality,
    OcrError, PageRasterizer, PageSelection, RecognitionConfig, RecognitionProgressCallback,
    RecognitionRequest, RenderSettings, TextRecognizer,
};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ── Stubs ────────────────────────────────────────────────────────────────────

/// Produces `pages` light-gray pages with a dark bar; can fail on one page or
/// silently leave one out.
struct StubRasterizer {
    pages: usize,
    fail_on: Option<usize>,
    drop_page: Option<usize>,
    rendered: AtomicUsize,
}

impl StubRasterizer {
    fn new(pages: usize) -> Arc<Self> {
        Arc::new(Self {
            pages,
            fail_on: None,
            drop_page: None,
            rendered: AtomicUsize::new(0),
        })
    }

    fn failing_on(pages: usize, page_num: usize) -> Arc<Self> {
        Arc::new(Self {
            pages,
            fail_on: Some(page_num),
            drop_page: None,
            rendered: AtomicUsize::new(0),
        })
    }

    fn dropping(pages: usize, page_num: usize) -> Arc<Self> {
        Arc::new(Self {
            pages,
            fail_on: None,
            drop_page: Some(page_num),
            rendered: AtomicUsize::new(0),
        })
    }
}

impl PageRasterizer for StubRasterizer {
    fn inspect(&self, _: &Path, _: Option<&str>) -> Result<DocumentMetadata, OcrError> {
        Ok(DocumentMetadata {
            page_count: self.pages,
            pdf_version: "Pdf1_4".into(),
            ..Default::default()
        })
    }

    fn render(
        &self,
        _: &Path,
        _: &RenderSettings,
        page_indices: &[usize],
    ) -> Result<Vec<(usize, DynamicImage)>, OcrError> {
        let mut out = Vec::new();
        for &idx in page_indices {
            if self.fail_on == Some(idx + 1) {
                return Err(OcrError::RasterisationFailed {
                    page: idx + 1,
                    detail: "unsupported content".into(),
                });
            }
            if self.drop_page == Some(idx + 1) {
                continue;
            }
            let img = RgbImage::from_fn(60, 40, |x, y| {
                if (15..25).contains(&y) && (10..50).contains(&x) {
                    Rgb([20, 20, 20])
                } else {
                    Rgb([200, 200, 200])
                }
            });
            self.rendered.fetch_add(1, Ordering::SeqCst);
            out.push((idx, DynamicImage::ImageRgb8(img)));
        }
        Ok(out)
    }
}

/// Returns `"text for page N"` and records what it was asked to do.
#[derive(Default)]
struct StubEngine {
    fail_on: Option<usize>,
    /// Sleep longer for earlier pages, so concurrent runs finish out of order.
    staggered: bool,
    model_dirs: Mutex<Vec<Option<PathBuf>>>,
    languages: Mutex<Vec<String>>,
    non_binary_pages: AtomicUsize,
}

impl TextRecognizer for StubEngine {
    fn name(&self) -> &str {
        "stub"
    }

    fn recognize(
        &self,
        page: &GrayImage,
        request: &RecognitionRequest<'_>,
    ) -> Result<String, OcrError> {
        if self.staggered {
            std::thread::sleep(Duration::from_millis(
                (20u64).saturating_sub(request.page_num as u64 * 2),
            ));
        }
        self.model_dirs
            .lock()
            .unwrap()
            .push(request.model_dir.map(Path::to_path_buf));
        self.languages
            .lock()
            .unwrap()
            .push(request.language.to_string());
        if page.pixels().any(|p| p.0[0] != 0 && p.0[0] != 255) {
            self.non_binary_pages.fetch_add(1, Ordering::SeqCst);
        }
        if self.fail_on == Some(request.page_num) {
            return Err(OcrError::EngineFailed {
                page: request.page_num,
                detail: "engine crashed".into(),
            });
        }
        Ok(format!("text for page {}\n\x0c", request.page_num))
    }
}

#[derive(Default)]
struct CountingProgress {
    started: AtomicUsize,
    completed: AtomicUsize,
    errors: AtomicUsize,
    finished: Mutex<Option<(usize, usize)>>,
}

impl RecognitionProgressCallback for CountingProgress {
    fn on_page_start(&self, _: usize, _: usize) {
        self.started.fetch_add(1, Ordering::SeqCst);
    }
    fn on_page_complete(&self, _: usize, _: usize, _: usize) {
        self.completed.fetch_add(1, Ordering::SeqCst);
    }
    fn on_page_error(&self, _: usize, _: usize, _: &str) {
        self.errors.fetch_add(1, Ordering::SeqCst);
    }
    fn on_document_complete(&self, total: usize, ok: usize) {
        *self.finished.lock().unwrap() = Some((total, ok));
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────────

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn fake_pdf(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, b"%PDF-1.4\n%stub\n").unwrap();
    path
}

fn model_dir(parent: &Path, name: &str, langs: &[&str]) -> PathBuf {
    let dir = parent.join(name);
    std::fs::create_dir_all(&dir).unwrap();
    for lang in langs {
        std::fs::write(dir.join(format!("{lang}.traineddata")), b"model").unwrap();
    }
    dir
}

fn config(
    rasterizer: Arc<StubRasterizer>,
    engine: Arc<StubEngine>,
) -> pdfocr::RecognitionConfigBuilder {
    RecognitionConfig::builder()
        .rasterizer(rasterizer)
        .engine(engine)
}

/// Page numbers of every `--- Page N ---` header, in order.
fn header_numbers(text: &str) -> Vec<usize> {
    text.split("\n--- Page ")
        .skip(1)
        .map(|rest| {
            let (n, _) = rest.split_once(" ---\n").expect("malformed header");
            n.parse().expect("page number")
        })
        .collect()
}

// ── Assembly ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn n_pages_give_n_ordered_headers() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let pdf = fake_pdf(dir.path(), "scan.pdf");
    let engine = Arc::new(StubEngine::default());
    let cfg = config(StubRasterizer::new(3), engine).build().unwrap();

    let out = recognize_document(&pdf, &cfg).await.unwrap();

    assert_eq!(
        out.text,
        "\n--- Page 1 ---\ntext for page 1\
         \n--- Page 2 ---\ntext for page 2\
         \n--- Page 3 ---\ntext for page 3"
    );
    assert_eq!(header_numbers(&out.text), vec![1, 2, 3]);
    assert_eq!(out.pages.len(), 3);
    assert_eq!(out.stats.total_pages, 3);
    assert_eq!(out.stats.processed_pages, 3);
    assert_eq!(out.stats.engine, "stub");
    assert_eq!(out.stats.language, "vie+eng");
    assert_eq!((out.pages[0].width, out.pages[0].height), (60, 40));
}

#[tokio::test]
async fn concurrent_pages_stay_in_document_order() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let pdf = fake_pdf(dir.path(), "long.pdf");
    let engine = Arc::new(StubEngine {
        staggered: true,
        ..Default::default()
    });
    // More pages than one render batch.
    let cfg = config(StubRasterizer::new(11), engine)
        .concurrency(4)
        .build()
        .unwrap();

    let out = recognize_document(&pdf, &cfg).await.unwrap();
    assert_eq!(header_numbers(&out.text), (1..=11).collect::<Vec<_>>());
    for (i, page) in out.pages.iter().enumerate() {
        assert_eq!(page.page_num, i + 1);
        assert_eq!(page.text, format!("text for page {}", i + 1));
    }
}

#[tokio::test]
async fn page_selection_keeps_document_page_numbers() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = fake_pdf(dir.path(), "scan.pdf");
    let cfg = config(StubRasterizer::new(5), Arc::new(StubEngine::default()))
        .pages(PageSelection::Set(vec![4, 2]))
        .build()
        .unwrap();

    let out = recognize_document(&pdf, &cfg).await.unwrap();
    assert_eq!(header_numbers(&out.text), vec![2, 4]);
    assert_eq!(out.stats.total_pages, 5);
    assert_eq!(out.stats.processed_pages, 2);
}

#[tokio::test]
async fn empty_selection_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = fake_pdf(dir.path(), "scan.pdf");
    let rasterizer = StubRasterizer::new(3);
    let cfg = config(Arc::clone(&rasterizer), Arc::new(StubEngine::default()))
        .pages(PageSelection::Single(9))
        .build()
        .unwrap();

    let err = recognize_document(&pdf, &cfg).await.unwrap_err();
    assert!(matches!(err, OcrError::PageOutOfRange { total: 3, .. }), "got {err:?}");
    assert_eq!(rasterizer.rendered.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn engine_receives_two_valued_pages() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = fake_pdf(dir.path(), "scan.pdf");
    let engine = Arc::new(StubEngine::default());
    let cfg = config(StubRasterizer::new(2), Arc::clone(&engine))
        .build()
        .unwrap();

    recognize_document(&pdf, &cfg).await.unwrap();
    assert_eq!(engine.non_binary_pages.load(Ordering::SeqCst), 0);
    assert_eq!(*engine.languages.lock().unwrap(), ["vie+eng", "vie+eng"]);
}

#[tokio::test]
async fn raw_engine_text_when_normalisation_is_off() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = fake_pdf(dir.path(), "scan.pdf");
    let cfg = config(StubRasterizer::new(1), Arc::new(StubEngine::default()))
        .normalize_text(false)
        .build()
        .unwrap();

    let out = recognize_document(&pdf, &cfg).await.unwrap();
    assert_eq!(out.text, "\n--- Page 1 ---\ntext for page 1\n\x0c");
}

// ── Model directories ────────────────────────────────────────────────────────

#[tokio::test]
async fn missing_high_quality_dir_falls_back_to_default() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = fake_pdf(dir.path(), "scan.pdf");
    let default_dir = model_dir(dir.path(), "tessdata", &["vie", "eng"]);
    let engine = Arc::new(StubEngine::default());
    let cfg = config(StubRasterizer::new(2), Arc::clone(&engine))
        .model_quality(ModelQuality::HighQuality)
        .model_dir(&default_dir)
        .high_quality_model_dir(dir.path().join("tessdata_best"))
        .build()
        .unwrap();

    let out = recognize_document(&pdf, &cfg).await.unwrap();
    assert_eq!(header_numbers(&out.text), vec![1, 2]);
    assert!(out.stats.model_fallback);
    assert_eq!(out.stats.model_dir.as_deref(), Some(default_dir.as_path()));
    let seen = engine.model_dirs.lock().unwrap().clone();
    assert_eq!(seen, vec![Some(default_dir.clone()), Some(default_dir)]);
}

#[tokio::test]
async fn high_quality_dir_without_models_falls_back_to_default() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = fake_pdf(dir.path(), "scan.pdf");
    let default_dir = model_dir(dir.path(), "tessdata", &["vie", "eng"]);
    let empty_best = model_dir(dir.path(), "tessdata_best", &[]);
    let partial_best = model_dir(dir.path(), "tessdata_best_eng", &["eng"]);

    for best in [empty_best, partial_best] {
        let engine = Arc::new(StubEngine::default());
        let cfg = config(StubRasterizer::new(1), Arc::clone(&engine))
            .model_quality(ModelQuality::HighQuality)
            .model_dir(&default_dir)
            .high_quality_model_dir(&best)
            .build()
            .unwrap();

        let out = recognize_document(&pdf, &cfg).await.unwrap();
        assert!(out.stats.model_fallback, "{}", best.display());
        assert_eq!(out.stats.model_dir.as_deref(), Some(default_dir.as_path()));
        let seen = engine.model_dirs.lock().unwrap().clone();
        assert_eq!(seen, vec![Some(default_dir.clone())]);
    }
}

#[tokio::test]
async fn high_quality_dir_is_passed_per_call() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = fake_pdf(dir.path(), "scan.pdf");
    let default_dir = model_dir(dir.path(), "tessdata", &["vie", "eng"]);
    let best_dir = model_dir(dir.path(), "tessdata_best", &["vie", "eng"]);
    let engine = Arc::new(StubEngine::default());

    let standard = config(StubRasterizer::new(1), Arc::clone(&engine))
        .model_dir(&default_dir)
        .build()
        .unwrap();
    let best = config(StubRasterizer::new(1), Arc::clone(&engine))
        .model_dir(&default_dir)
        .high_quality(true)
        .high_quality_model_dir(&best_dir)
        .build()
        .unwrap();

    // Two documents with different model sets, side by side on one engine.
    let (a, b) = tokio::join!(
        recognize_document(&pdf, &standard),
        recognize_document(&pdf, &best)
    );
    assert!(!a.unwrap().stats.model_fallback);
    let b = b.unwrap();
    assert!(!b.stats.model_fallback);
    assert_eq!(b.stats.model_dir.as_deref(), Some(best_dir.as_path()));

    let seen = engine.model_dirs.lock().unwrap().clone();
    assert!(seen.contains(&Some(default_dir)));
    assert!(seen.contains(&Some(best_dir)));
}

#[tokio::test]
async fn missing_language_model_fails_before_rendering() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = fake_pdf(dir.path(), "scan.pdf");
    let default_dir = model_dir(dir.path(), "tessdata", &["eng"]);
    let rasterizer = StubRasterizer::new(2);
    let cfg = config(Arc::clone(&rasterizer), Arc::new(StubEngine::default()))
        .model_dir(&default_dir)
        .build()
        .unwrap();

    let err = recognize_document(&pdf, &cfg).await.unwrap_err();
    assert!(matches!(err, OcrError::UnsupportedLanguage { .. }), "got {err:?}");
    assert_eq!(rasterizer.rendered.load(Ordering::SeqCst), 0);
}

// ── Failure policy ───────────────────────────────────────────────────────────

#[tokio::test]
async fn engine_failure_aborts_the_document() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = fake_pdf(dir.path(), "scan.pdf");
    let progress = Arc::new(CountingProgress::default());
    let engine = Arc::new(StubEngine {
        fail_on: Some(2),
        ..Default::default()
    });
    let cfg = config(StubRasterizer::new(3), engine)
        .progress_callback(progress.clone())
        .build()
        .unwrap();

    let err = recognize_document(&pdf, &cfg).await.unwrap_err();
    assert!(matches!(err, OcrError::EngineFailed { page: 2, .. }), "got {err:?}");
    assert_eq!(progress.errors.load(Ordering::SeqCst), 1);
    assert_eq!(progress.completed.load(Ordering::SeqCst), 1);
    assert_eq!(*progress.finished.lock().unwrap(), Some((3, 1)));
}

#[tokio::test]
async fn progress_reports_every_page() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = fake_pdf(dir.path(), "scan.pdf");
    let progress = Arc::new(CountingProgress::default());
    let cfg = config(StubRasterizer::new(4), Arc::new(StubEngine::default()))
        .progress_callback(progress.clone())
        .build()
        .unwrap();

    recognize_document(&pdf, &cfg).await.unwrap();
    assert_eq!(progress.started.load(Ordering::SeqCst), 4);
    assert_eq!(progress.completed.load(Ordering::SeqCst), 4);
    assert_eq!(progress.errors.load(Ordering::SeqCst), 0);
    assert_eq!(*progress.finished.lock().unwrap(), Some((4, 4)));
}

#[tokio::test]
async fn failed_render_writes_no_file() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = fake_pdf(dir.path(), "scan.pdf");
    let dest = dir.path().join("out/scan.txt");
    let cfg = config(
        StubRasterizer::failing_on(3, 2),
        Arc::new(StubEngine::default()),
    )
    .build()
    .unwrap();

    let err = recognize_to_file(&pdf, &dest, &cfg).await.unwrap_err();
    assert!(matches!(err, OcrError::RasterisationFailed { page: 2, .. }));
    assert!(!dest.exists());

    let ok = config(StubRasterizer::new(2), Arc::new(StubEngine::default()))
        .build()
        .unwrap();
    let stats = recognize_to_file(&pdf, &dest, &ok).await.unwrap();
    assert_eq!(stats.processed_pages, 2);
    assert!(std::fs::read_to_string(&dest)
        .unwrap()
        .starts_with("\n--- Page 1 ---\n"));
}

#[tokio::test]
async fn short_render_batch_fails_the_document() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let pdf = fake_pdf(dir.path(), "scan.pdf");
    let dest = dir.path().join("scan.txt");
    let progress = Arc::new(CountingProgress::default());
    let cfg = config(
        StubRasterizer::dropping(3, 3),
        Arc::new(StubEngine::default()),
    )
    .progress_callback(progress.clone())
    .build()
    .unwrap();

    let err = recognize_to_file(&pdf, &dest, &cfg).await.unwrap_err();
    assert!(
        matches!(err, OcrError::RasterisationFailed { page: 3, .. }),
        "got {err:?}"
    );
    assert!(!dest.exists());
    assert_eq!(progress.completed.load(Ordering::SeqCst), 0);
    assert_eq!(*progress.finished.lock().unwrap(), Some((3, 0)));
}

// ── Document store ───────────────────────────────────────────────────────────

#[tokio::test]
async fn store_records_only_successful_documents() {
    let dir = tempfile::tempdir().unwrap();
    let good = fake_pdf(dir.path(), "good.pdf");
    let renamed = dir.path().join("photo.pdf");
    std::fs::write(&renamed, [0x89, b'P', b'N', b'G', 0x0d, 0x0a]).unwrap();

    let cfg = config(StubRasterizer::new(2), Arc::new(StubEngine::default()))
        .build()
        .unwrap();
    let mut store = DocumentStore::new();

    let key = store.open(&good, &cfg).await.unwrap().to_string();
    assert_eq!(key, "good.pdf");

    let err = store.open(&renamed, &cfg).await.unwrap_err();
    assert!(matches!(err, OcrError::NotAPdf { .. }));
    assert!(!store.contains("photo.pdf"));
    assert_eq!(store.filenames().collect::<Vec<_>>(), ["good.pdf"]);
}

#[tokio::test]
async fn failed_reopen_keeps_previous_text() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = fake_pdf(dir.path(), "scan.pdf");
    let mut store = DocumentStore::new();

    let ok = config(StubRasterizer::new(1), Arc::new(StubEngine::default()))
        .build()
        .unwrap();
    store.open(&pdf, &ok).await.unwrap();
    let before = store.get("scan.pdf").unwrap().to_string();

    let failing = config(
        StubRasterizer::failing_on(2, 1),
        Arc::new(StubEngine::default()),
    )
    .build()
    .unwrap();
    assert!(store.open(&pdf, &failing).await.is_err());
    assert_eq!(store.get("scan.pdf"), Some(before.as_str()));
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn export_without_result_leaves_previous_export() {
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("scan.txt");
    std::fs::write(&dest, "previous export").unwrap();

    let store = DocumentStore::new();
    let err = store.export("scan.pdf", &dest).await.unwrap_err();
    assert!(matches!(err, OcrError::NoResult { .. }));
    assert_eq!(std::fs::read_to_string(&dest).unwrap(), "previous export");
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
}

#[tokio::test]
async fn export_round_trips_recognised_text() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = fake_pdf(dir.path(), "Hợp đồng.pdf");
    let cfg = config(StubRasterizer::new(2), Arc::new(StubEngine::default()))
        .build()
        .unwrap();
    let mut store = DocumentStore::new();
    let key = store.open(&pdf, &cfg).await.unwrap().to_string();

    let dest = dir
        .path()
        .join("exports")
        .join(pdfocr::default_export_name(&key));
    store.export(&key, &dest).await.unwrap();
    assert_eq!(dest.file_name().unwrap(), "Hợp đồng.txt");
    assert_eq!(
        std::fs::read_to_string(&dest).unwrap(),
        store.get(&key).unwrap()
    );
}

#[tokio::test]
async fn open_with_output_stores_what_it_returns() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = fake_pdf(dir.path(), "scan.pdf");
    let cfg = config(StubRasterizer::new(3), Arc::new(StubEngine::default()))
        .pages(PageSelection::Range(2, 3))
        .build()
        .unwrap();
    let mut store = DocumentStore::new();

    let (key, output) = store.open_with_output(&pdf, &cfg).await.unwrap();
    assert_eq!(key, "scan.pdf");
    assert_eq!(output.stats.processed_pages, 2);
    assert_eq!(output.pages.iter().map(|p| p.page_num).collect::<Vec<_>>(), [2, 3]);
    assert_eq!(store.get("scan.pdf"), Some(output.text.as_str()));

    let short = config(StubRasterizer::dropping(3, 2), Arc::new(StubEngine::default()))
        .build()
        .unwrap();
    assert!(store.open_with_output(&pdf, &short).await.is_err());
    assert_eq!(header_numbers(store.get("scan.pdf").unwrap()), vec![2, 3]);
}
