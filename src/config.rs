//! Configuration types for PDF text recognition.
//!
//! Everything the pipeline needs to know arrives through one explicit
//! [`RecognitionConfig`] value: the interface layer (CLI, GUI, service)
//! builds it and passes it in, and the pipeline never reads widget state or
//! process-wide settings. In particular the model-data directory travels with
//! each call instead of being installed into the process environment, so two
//! documents recognised side by side may use different model sets.

use crate::error::OcrError;
use crate::pipeline::engine::TextRecognizer;
use crate::pipeline::render::PageRasterizer;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

/// Language model used when none is configured: Vietnamese plus English.
pub const DEFAULT_LANGUAGE: &str = "vie+eng";

/// Rendering resolution used when none is configured.
pub const DEFAULT_DPI: u32 = 300;

/// Configuration for recognising one PDF document.
///
/// Built via [`RecognitionConfig::builder()`] or using
/// [`RecognitionConfig::default()`].
///
/// # Example
/// ```rust
/// use pdfocr::{ModelQuality, RecognitionConfig};
///
/// let config = RecognitionConfig::builder()
///     .language("vie+eng")
///     .model_quality(ModelQuality::HighQuality)
///     .high_quality_model_dir("/usr/share/tessdata_best")
///     .dpi(300)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct RecognitionConfig {
    /// Tesseract language identifier; several models are joined with `+`.
    /// Default: `"vie+eng"`.
    pub language: String,

    /// Which model set the user asked for. Default: [`ModelQuality::Standard`].
    pub model_quality: ModelQuality,

    /// Default model-data directory. `None` lets the engine use the models
    /// it was installed with.
    pub model_dir: Option<PathBuf>,

    /// Location of the high-quality model set. Only consulted when
    /// `model_quality` is [`ModelQuality::HighQuality`]; if it is unset or
    /// absent on disk the default directory is used instead.
    pub high_quality_model_dir: Option<PathBuf>,

    /// Rendering DPI used when rasterising each page. Range: 72–600. Default: 300.
    ///
    /// Tesseract is tuned for text around 300 DPI; lower values lose small
    /// glyphs, higher values mostly cost time.
    pub dpi: u32,

    /// Maximum rendered image dimension (width or height) in pixels. Default: 7000.
    ///
    /// Keeps oversized pages (posters, plans) from allocating gigabytes. An
    /// A4 page at 300 DPI is 2480 × 3508 px and is never affected.
    pub max_rendered_pixels: u32,

    /// Page selection. Default: all pages.
    pub pages: PageSelection,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Image cleanup applied to every page before recognition.
    pub cleanup: CleanupParams,

    /// Normalise engine output (line endings, form feeds, blank-line runs).
    /// Default: true.
    pub normalize_text: bool,

    /// Number of pages recognised at once. Default: 1.
    ///
    /// Tesseract already uses several threads per page, so values above the
    /// core count rarely help.
    pub concurrency: usize,

    /// Name or path of the tesseract executable. Default: `"tesseract"`.
    pub tesseract_cmd: PathBuf,

    /// Directory holding the pdfium shared library. `None` binds the
    /// system-wide library.
    pub pdfium_lib_dir: Option<PathBuf>,

    /// Pre-constructed recognition engine. Takes precedence over `tesseract_cmd`.
    pub engine: Option<Arc<dyn TextRecognizer>>,

    /// Pre-constructed rasterizer. Takes precedence over `pdfium_lib_dir`.
    pub rasterizer: Option<Arc<dyn PageRasterizer>>,

    /// Receives per-page progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            language: DEFAULT_LANGUAGE.to_string(),
            model_quality: ModelQuality::default(),
            model_dir: None,
            high_quality_model_dir: None,
            dpi: DEFAULT_DPI,
            max_rendered_pixels: 7000,
            pages: PageSelection::default(),
            password: None,
            cleanup: CleanupParams::default(),
            normalize_text: true,
            concurrency: 1,
            tesseract_cmd: PathBuf::from("tesseract"),
            pdfium_lib_dir: None,
            engine: None,
            rasterizer: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for RecognitionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecognitionConfig")
            .field("language", &self.language)
            .field("model_quality", &self.model_quality)
            .field("model_dir", &self.model_dir)
            .field("high_quality_model_dir", &self.high_quality_model_dir)
            .field("dpi", &self.dpi)
            .field("max_rendered_pixels", &self.max_rendered_pixels)
            .field("pages", &self.pages)
            .field("cleanup", &self.cleanup)
            .field("normalize_text", &self.normalize_text)
            .field("concurrency", &self.concurrency)
            .field("tesseract_cmd", &self.tesseract_cmd)
            .field("pdfium_lib_dir", &self.pdfium_lib_dir)
            .field("engine", &self.engine.as_ref().map(|e| e.name().to_string()))
            .field("rasterizer", &self.rasterizer.as_ref().map(|_| "<dyn PageRasterizer>"))
            .finish()
    }
}

impl RecognitionConfig {
    /// Create a new builder for `RecognitionConfig`.
    pub fn builder() -> RecognitionConfigBuilder {
        RecognitionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`RecognitionConfig`].
#[derive(Debug)]
pub struct RecognitionConfigBuilder {
    config: RecognitionConfig,
}

impl RecognitionConfigBuilder {
    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.config.language = language.into();
        self
    }

    pub fn model_quality(mut self, quality: ModelQuality) -> Self {
        self.config.model_quality = quality;
        self
    }

    /// Shorthand for the "use high-quality models" toggle.
    pub fn high_quality(self, enabled: bool) -> Self {
        self.model_quality(if enabled {
            ModelQuality::HighQuality
        } else {
            ModelQuality::Standard
        })
    }

    pub fn model_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.model_dir = Some(dir.into());
        self
    }

    pub fn high_quality_model_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.high_quality_model_dir = Some(dir.into());
        self
    }

    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.dpi = dpi;
        self
    }

    pub fn max_rendered_pixels(mut self, px: u32) -> Self {
        self.config.max_rendered_pixels = px.max(100);
        self
    }

    pub fn pages(mut self, selection: PageSelection) -> Self {
        self.config.pages = selection;
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn cleanup(mut self, params: CleanupParams) -> Self {
        self.config.cleanup = params;
        self
    }

    pub fn normalize_text(mut self, v: bool) -> Self {
        self.config.normalize_text = v;
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n;
        self
    }

    pub fn tesseract_cmd(mut self, cmd: impl Into<PathBuf>) -> Self {
        self.config.tesseract_cmd = cmd.into();
        self
    }

    pub fn pdfium_lib_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.pdfium_lib_dir = Some(dir.into());
        self
    }

    pub fn engine(mut self, engine: Arc<dyn TextRecognizer>) -> Self {
        self.config.engine = Some(engine);
        self
    }

    pub fn rasterizer(mut self, rasterizer: Arc<dyn PageRasterizer>) -> Self {
        self.config.rasterizer = Some(rasterizer);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<RecognitionConfig, OcrError> {
        let c = &self.config;
        if !(72..=600).contains(&c.dpi) {
            return Err(OcrError::InvalidConfig(format!(
                "DPI must be 72–600, got {}",
                c.dpi
            )));
        }
        if c.concurrency == 0 {
            return Err(OcrError::InvalidConfig("Concurrency must be ≥ 1".into()));
        }
        validate_language(&c.language)?;
        c.cleanup.validate()?;
        Ok(self.config)
    }
}

/// Check a `+`-joined language identifier such as `vie+eng`.
pub fn validate_language(language: &str) -> Result<(), OcrError> {
    if language.trim().is_empty() {
        return Err(OcrError::InvalidConfig("Language must not be empty".into()));
    }
    for part in language.split('+') {
        let ok = !part.is_empty()
            && part
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !ok {
            return Err(OcrError::InvalidConfig(format!(
                "Invalid language identifier '{language}' (expected e.g. 'eng' or 'vie+eng')"
            )));
        }
    }
    Ok(())
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Which trained-model set the engine should load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelQuality {
    /// The models found in the default model-data directory. (default)
    #[default]
    Standard,
    /// The slower, more accurate model set, when it is installed.
    HighQuality,
}

/// Parameters of the page cleanup transform.
///
/// The defaults are the fixed pipeline used for printed text: Gaussian
/// adaptive threshold over a 35 px block with offset 11, then a 3 × 3 median.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupParams {
    /// When false, pages are only converted to grayscale.
    pub enabled: bool,
    /// Side of the square neighbourhood used for the local threshold. Odd, ≥ 3.
    pub block_size: u32,
    /// Constant subtracted from the local weighted mean.
    pub offset: i32,
    /// Side of the square median window. Odd, ≥ 1.
    pub median_window: u32,
}

impl Default for CleanupParams {
    fn default() -> Self {
        Self {
            enabled: true,
            block_size: 35,
            offset: 11,
            median_window: 3,
        }
    }
}

impl CleanupParams {
    /// Cleanup that only converts to grayscale.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    fn validate(&self) -> Result<(), OcrError> {
        if self.block_size < 3 || self.block_size % 2 == 0 {
            return Err(OcrError::InvalidConfig(format!(
                "Threshold block size must be odd and ≥ 3, got {}",
                self.block_size
            )));
        }
        if self.median_window == 0 || self.median_window % 2 == 0 {
            return Err(OcrError::InvalidConfig(format!(
                "Median window must be odd and ≥ 1, got {}",
                self.median_window
            )));
        }
        Ok(())
    }
}

/// Specifies which pages of the PDF to recognise.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageSelection {
    /// Recognise all pages (default).
    #[default]
    All,
    /// Recognise a single page (1-indexed).
    Single(usize),
    /// Recognise a contiguous range of pages (1-indexed, inclusive).
    Range(usize, usize),
    /// Recognise specific pages (1-indexed, deduplicated).
    Set(Vec<usize>),
}

impl PageSelection {
    /// Expand the selection into a sorted, deduplicated list of 0-indexed page numbers.
    pub fn to_indices(&self, total_pages: usize) -> Vec<usize> {
        let mut indices: Vec<usize> = match self {
            PageSelection::All => (0..total_pages).collect(),
            PageSelection::Single(p) => {
                if *p >= 1 && *p <= total_pages {
                    vec![p - 1]
                } else {
                    vec![]
                }
            }
            PageSelection::Range(start, end) => {
                let s = (*start).max(1) - 1;
                let e = (*end).min(total_pages);
                (s..e).collect()
            }
            PageSelection::Set(pages) => pages
                .iter()
                .filter(|&&p| p >= 1 && p <= total_pages)
                .map(|p| p - 1)
                .collect(),
        };
        indices.sort_unstable();
        indices.dedup();
        indices
    }
}

impl FromStr for PageSelection {
    type Err = OcrError;

    /// Parse `all`, `5`, `3-15` or `1,3,5` (1-indexed).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let invalid =
            |why: String| OcrError::InvalidConfig(format!("Invalid page selection '{s}': {why}"));
        let page = |p: &str| -> Result<usize, OcrError> {
            match p.trim().parse::<usize>() {
                Ok(0) => Err(invalid("pages are 1-indexed".into())),
                Ok(n) => Ok(n),
                Err(_) => Err(invalid(format!("'{}' is not a page number", p.trim()))),
            }
        };

        if s.eq_ignore_ascii_case("all") {
            Ok(PageSelection::All)
        } else if let Some((start, end)) = s.split_once('-') {
            let (start, end) = (page(start)?, page(end)?);
            if start > end {
                return Err(invalid("start must be <= end".into()));
            }
            Ok(PageSelection::Range(start, end))
        } else if s.contains(',') {
            s.split(',')
                .map(page)
                .collect::<Result<Vec<_>, _>>()
                .map(PageSelection::Set)
        } else {
            page(s).map(PageSelection::Single)
        }
    }
}
