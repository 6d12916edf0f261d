//! Text recognition engines.
//!
//! [`TextRecognizer`] is the seam between the pipeline and the OCR backend.
//! Every call carries its own [`RecognitionRequest`] (language, model-data
//! directory, resolution), so an engine holds no per-document state and can
//! serve documents with different settings at the same time.
//!
//! [`TesseractEngine`] drives the `tesseract` executable: the cleaned page is
//! PNG-encoded onto stdin and the text is read back from stdout. The model
//! directory is given with `--tessdata-dir`, never through `TESSDATA_PREFIX`.

use crate::error::OcrError;
use image::GrayImage;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::{debug, warn};

/// Everything an engine needs to know for one page.
#[derive(Debug, Clone, Copy)]
pub struct RecognitionRequest<'a> {
    /// 1-indexed page number, for error messages.
    pub page_num: usize,
    /// Language identifier, e.g. `"vie+eng"`.
    pub language: &'a str,
    /// Model-data directory; `None` uses the engine's built-in default.
    pub model_dir: Option<&'a Path>,
    /// Resolution the page was rendered at.
    pub dpi: u32,
}

/// An OCR backend that turns a cleaned page into plain text.
///
/// Implementations are called from blocking worker threads.
pub trait TextRecognizer: Send + Sync {
    /// Short name used in logs and stats.
    fn name(&self) -> &str;

    /// Recognise the text on one page.
    fn recognize(&self, page: &GrayImage, request: &RecognitionRequest<'_>)
        -> Result<String, OcrError>;
}

/// The Tesseract command-line engine.
#[derive(Debug, Clone)]
pub struct TesseractEngine {
    command: PathBuf,
}

impl Default for TesseractEngine {
    fn default() -> Self {
        Self::new("tesseract")
    }
}

impl TesseractEngine {
    pub fn new(command: impl Into<PathBuf>) -> Self {
        Self {
            command: command.into(),
        }
    }

    pub fn command(&self) -> &Path {
        &self.command
    }

    /// First line of `tesseract --version`, e.g. `"tesseract 5.3.4"`.
    pub fn version(&self) -> Result<String, OcrError> {
        let output = Command::new(&self.command)
            .arg("--version")
            .stdin(Stdio::null())
            .output()
            .map_err(|e| self.not_found(e))?;
        // Old releases print the banner on stderr.
        let text = if output.stdout.is_empty() {
            String::from_utf8_lossy(&output.stderr).into_owned()
        } else {
            String::from_utf8_lossy(&output.stdout).into_owned()
        };
        Ok(text.lines().next().unwrap_or_default().trim().to_string())
    }

    /// Arguments for one page, excluding the program name.
    fn args(request: &RecognitionRequest<'_>) -> Vec<String> {
        let mut args = vec![
            "stdin".to_string(),
            "stdout".to_string(),
            "-l".to_string(),
            request.language.to_string(),
            "--dpi".to_string(),
            request.dpi.to_string(),
        ];
        if let Some(dir) = request.model_dir {
            args.push("--tessdata-dir".to_string());
            args.push(dir.to_string_lossy().into_owned());
        }
        args
    }

    fn not_found(&self, e: std::io::Error) -> OcrError {
        OcrError::EngineNotFound {
            command: self.command.display().to_string(),
            detail: e.to_string(),
        }
    }
}

impl TextRecognizer for TesseractEngine {
    fn name(&self) -> &str {
        "tesseract"
    }

    fn recognize(
        &self,
        page: &GrayImage,
        request: &RecognitionRequest<'_>,
    ) -> Result<String, OcrError> {
        let mut png = Vec::new();
        page.write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
            .map_err(|e| OcrError::Internal(format!("PNG encoding failed: {e}")))?;

        let args = Self::args(request);
        debug!(
            "Page {}: {} {} ({} bytes PNG)",
            request.page_num,
            self.command.display(),
            args.join(" "),
            png.len()
        );

        let mut child = Command::new(&self.command)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| self.not_found(e))?;

        // Tesseract reads the whole image before it writes anything, so the
        // pipe can be filled before collecting output.
        if let Some(mut stdin) = child.stdin.take() {
            if let Err(e) = stdin.write_all(&png) {
                warn!("Page {}: writing to tesseract failed: {}", request.page_num, e);
            }
        }

        let output = child
            .wait_with_output()
            .map_err(|e| OcrError::EngineFailed {
                page: request.page_num,
                detail: e.to_string(),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(classify_failure(request, &stderr, output.status.code()));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Map a failed tesseract run onto the error taxonomy.
fn classify_failure(request: &RecognitionRequest<'_>, stderr: &str, code: Option<i32>) -> OcrError {
    let detail = stderr.trim().to_string();
    if stderr.contains("Failed loading language") {
        OcrError::UnsupportedLanguage {
            language: request.language.to_string(),
            detail,
        }
    } else if stderr.contains("Error opening data file") || stderr.contains("TESSDATA_PREFIX") {
        OcrError::ModelDataMissing {
            dir: request.model_dir.map(Path::to_path_buf),
            detail,
        }
    } else {
        OcrError::EngineFailed {
            page: request.page_num,
            detail: if detail.is_empty() {
                format!("exit code {}", code.map_or("none".into(), |c| c.to_string()))
            } else {
                detail
            },
        }
    }
}
