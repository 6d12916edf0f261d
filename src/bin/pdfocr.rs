//! CLI binary for pdfocr.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `RecognitionConfig`, keeps results in a `DocumentStore` and prints or
//! exports them.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pdfocr::pipeline::{input, models};
use pdfocr::{
    default_export_name, inspect, CleanupParams, DocumentStore, ModelQuality, PageSelection,
    ProgressCallback, RecognitionConfig, RecognitionOutput, RecognitionProgressCallback,
    TesseractEngine, DEFAULT_LANGUAGE,
};
use std::collections::HashMap;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers ──────────────────────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress for one document: a bar plus one log line per page.
struct CliProgressCallback {
    bar: ProgressBar,
    label: String,
    start_times: Mutex<HashMap<usize, Instant>>,
    errors: AtomicUsize,
}

impl CliProgressCallback {
    fn new(label: &str) -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message(format!("Opening {label}…"));
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            label: label.to_string(),
            start_times: Mutex::new(HashMap::new()),
            errors: AtomicUsize::new(0),
        })
    }

    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} pages  \
             ⏱ {elapsed_precise}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Recognising");
        self.bar.reset_eta();
    }

    fn page_elapsed(&self, page_num: usize) -> f64 {
        self.start_times
            .lock()
            .ok()
            .and_then(|mut m| m.remove(&page_num))
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }
}

impl RecognitionProgressCallback for CliProgressCallback {
    fn on_document_start(&self, total_pages: usize) {
        self.activate_bar(total_pages);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("{}: {total_pages} pages", self.label))
        ));
    }

    fn on_page_start(&self, page_num: usize, _total: usize) {
        if let Ok(mut m) = self.start_times.lock() {
            m.insert(page_num, Instant::now());
        }
        self.bar.set_message(format!("page {page_num}"));
    }

    fn on_page_complete(&self, page_num: usize, total: usize, text_len: usize) {
        let elapsed = self.page_elapsed(page_num);
        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {:<8}  {}",
            green("✓"),
            page_num,
            total,
            dim(&format!("{text_len:>5} chars")),
            dim(&format!("{elapsed:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_page_error(&self, page_num: usize, total: usize, error: &str) {
        let elapsed = self.page_elapsed(page_num);
        self.errors.fetch_add(1, Ordering::SeqCst);

        let msg: String = if error.chars().count() > 80 {
            error.chars().take(79).chain(std::iter::once('…')).collect()
        } else {
            error.to_string()
        };

        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {}  {}",
            red("✗"),
            page_num,
            total,
            red(&msg),
            dim(&format!("{elapsed:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_document_complete(&self, total_pages: usize, success_count: usize) {
        self.bar.finish_and_clear();
        if self.errors.load(Ordering::SeqCst) == 0 && success_count == total_pages {
            eprintln!(
                "{} {} pages recognised",
                green("✔"),
                bold(&success_count.to_string())
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Print the text of a scan (Vietnamese + English)
  pdfocr scan.pdf

  # Several documents, one .txt per document in out/
  pdfocr contract.pdf invoice.pdf -o out/

  # English only, first five pages
  pdfocr --lang eng --pages 1-5 report.pdf

  # High-quality models (falls back to the default set if missing)
  pdfocr --high-quality --tessdata-best-dir /usr/share/tessdata_best scan.pdf

  # Inspect PDF metadata (no OCR)
  pdfocr --inspect-only scan.pdf

  # Check the OCR engine and installed languages
  pdfocr --check

  # JSON output with per-page text and stats
  pdfocr --json scan.pdf > scan.json

OUTPUT FORMAT:
  Each page is preceded by a header line:

    --- Page 1 ---
    <text of page 1>
    --- Page 2 ---
    <text of page 2>

ENVIRONMENT VARIABLES:
  PDFOCR_LANG               Language models (default: vie+eng)
  PDFOCR_HIGH_QUALITY       Prefer the high-quality model set
  PDFOCR_TESSDATA_DIR       Default model-data directory
  PDFOCR_TESSDATA_BEST_DIR  High-quality model-data directory
  PDFOCR_TESSERACT_CMD      tesseract executable
  PDFIUM_LIB_PATH           Directory containing libpdfium
  RUST_LOG                  Log filter, overrides -v / -q
"#;

/// Extract text from scanned PDF files with OCR.
#[derive(Parser, Debug)]
#[command(
    name = "pdfocr",
    version,
    about = "Extract text from scanned PDF files with OCR",
    long_about = "Rasterise each page of a scanned PDF, clean it into a black-on-white image \
and recognise its text with Tesseract. The default languages are Vietnamese and English.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// PDF files to recognise.
    #[arg(required_unless_present = "check")]
    inputs: Vec<PathBuf>,

    /// Write one `<name>.txt` per document into this directory instead of stdout.
    #[arg(short, long, env = "PDFOCR_OUTPUT")]
    output: Option<PathBuf>,

    /// Tesseract language(s), joined with `+`.
    #[arg(short, long, env = "PDFOCR_LANG", default_value = DEFAULT_LANGUAGE)]
    lang: String,

    /// Use the high-quality model set when it is installed.
    #[arg(long, env = "PDFOCR_HIGH_QUALITY")]
    high_quality: bool,

    /// Default model-data directory (tessdata).
    #[arg(long, env = "PDFOCR_TESSDATA_DIR")]
    tessdata_dir: Option<PathBuf>,

    /// High-quality model-data directory (tessdata_best).
    #[arg(long, env = "PDFOCR_TESSDATA_BEST_DIR")]
    tessdata_best_dir: Option<PathBuf>,

    /// tesseract executable.
    #[arg(long, env = "PDFOCR_TESSERACT_CMD", default_value = "tesseract")]
    tesseract_cmd: PathBuf,

    /// Directory containing the pdfium library.
    #[arg(long, env = "PDFIUM_LIB_PATH")]
    pdfium_lib_dir: Option<PathBuf>,

    /// Rendering DPI (72–600).
    #[arg(long, env = "PDFOCR_DPI", default_value_t = 300,
          value_parser = clap::value_parser!(u32).range(72..=600))]
    dpi: u32,

    /// Page selection: all, 5, 3-15, or 1,3,5,7.
    #[arg(long, env = "PDFOCR_PAGES", default_value = "all")]
    pages: String,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "PDFOCR_PASSWORD")]
    password: Option<String>,

    /// Skip thresholding and denoising (grayscale only).
    #[arg(long, env = "PDFOCR_NO_CLEANUP")]
    no_cleanup: bool,

    /// Pages recognised at once.
    #[arg(short, long, env = "PDFOCR_CONCURRENCY", default_value_t = 1)]
    concurrency: usize,

    /// Output structured JSON (RecognitionOutput) instead of plain text.
    #[arg(long, env = "PDFOCR_JSON")]
    json: bool,

    /// Print PDF metadata only, no OCR.
    #[arg(long)]
    inspect_only: bool,

    /// Print the tesseract version and installed languages, then exit.
    #[arg(long)]
    check: bool,

    /// Disable progress bar.
    #[arg(long, env = "PDFOCR_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDFOCR_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDFOCR_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO logs; verbose wins over both.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && !cli.inspect_only;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let config = build_config(&cli).context("Invalid configuration")?;

    if cli.check {
        return check_engine(&config);
    }

    let mut store = DocumentStore::new();
    let mut failed = 0usize;

    for path in &cli.inputs {
        let result = if cli.inspect_only {
            inspect_one(&cli, path, &config).await
        } else {
            recognise_one(&cli, path, &config, &mut store, show_progress).await
        };
        if let Err(e) = result {
            failed += 1;
            eprintln!("{} {}: {:#}", red("✘"), path.display(), e);
        }
    }

    if cli.inputs.len() > 1 && !cli.quiet {
        eprintln!(
            "{} {}/{} documents succeeded",
            if failed == 0 { green("✔") } else { cyan("⚠") },
            cli.inputs.len() - failed,
            cli.inputs.len()
        );
    }

    if failed > 0 {
        std::process::exit(1);
    }
    Ok(())
}

/// Recognise one document, record it and print or export the result.
async fn recognise_one(
    cli: &Cli,
    path: &Path,
    base: &RecognitionConfig,
    store: &mut DocumentStore,
    show_progress: bool,
) -> Result<()> {
    let mut config = base.clone();
    if show_progress {
        let cb = CliProgressCallback::new(&input::document_key(path));
        config.progress_callback = Some(cb as ProgressCallback);
    }

    let (stored, output) = store
        .open_with_output(path, &config)
        .await
        .context("Recognition failed")?;
    let key = stored.to_string();

    if let Some(ref dir) = cli.output {
        let dest = dir.join(default_export_name(&key));
        let written = store.export(&key, &dest).await.context("Export failed")?;
        if cli.json {
            let dest = written.with_extension("json");
            let json =
                serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
            tokio::fs::write(&dest, json)
                .await
                .with_context(|| format!("Failed to write {}", dest.display()))?;
        }
        if !cli.quiet {
            print_summary(&output, Some(&written));
        }
    } else {
        write_stdout(cli, &output)?;
        if !cli.quiet && !show_progress && !cli.json {
            print_summary(&output, None);
        }
    }
    Ok(())
}

fn write_stdout(cli: &Cli, output: &RecognitionOutput) -> Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    if cli.json {
        let json = serde_json::to_string_pretty(output).context("Failed to serialise output")?;
        writeln!(handle, "{json}").context("Failed to write to stdout")?;
    } else {
        handle
            .write_all(output.text.as_bytes())
            .context("Failed to write to stdout")?;
        if !output.text.ends_with('\n') {
            handle.write_all(b"\n").ok();
        }
    }
    Ok(())
}

fn print_summary(output: &RecognitionOutput, written: Option<&Path>) {
    let stats = &output.stats;
    let models = match (&stats.model_dir, stats.model_fallback) {
        (Some(dir), true) => format!("{} (fallback)", dir.display()),
        (Some(dir), false) => dir.display().to_string(),
        (None, true) => "engine default (fallback)".to_string(),
        (None, false) => "engine default".to_string(),
    };
    eprintln!(
        "{}  {}/{} pages  {} chars  {}ms  {}",
        green("✔"),
        stats.processed_pages,
        stats.total_pages,
        stats.total_chars,
        stats.total_duration_ms,
        written
            .map(|p| format!("→  {}", bold(&p.display().to_string())))
            .unwrap_or_default(),
    );
    eprintln!(
        "   {} {}  /  {} {}",
        dim("lang"),
        stats.language,
        dim("models"),
        models
    );
}

async fn inspect_one(cli: &Cli, path: &Path, config: &RecognitionConfig) -> Result<()> {
    let meta = inspect(path, config)
        .await
        .context("Failed to inspect PDF")?;

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&meta).context("Failed to serialise metadata")?
        );
    } else {
        println!("File:         {}", path.display());
        if let Some(ref t) = meta.title {
            println!("Title:        {}", t);
        }
        if let Some(ref a) = meta.author {
            println!("Author:       {}", a);
        }
        if let Some(ref s) = meta.subject {
            println!("Subject:      {}", s);
        }
        println!("Pages:        {}", meta.page_count);
        println!("PDF Version:  {}", meta.pdf_version);
        if let Some(ref p) = meta.producer {
            println!("Producer:     {}", p);
        }
        if let Some(ref c) = meta.creator {
            println!("Creator:      {}", c);
        }
    }
    Ok(())
}

/// `--check`: engine version, model directory and installed languages.
fn check_engine(config: &RecognitionConfig) -> Result<()> {
    let engine = TesseractEngine::new(config.tesseract_cmd.clone());
    let version = engine.version().context("OCR engine check failed")?;
    println!("Engine:       {}", version);

    let choice = models::resolve_model_dir(config);
    match choice.dir {
        Some(ref dir) => {
            println!(
                "Models:       {}{}",
                dir.display(),
                if choice.fell_back { " (fallback)" } else { "" }
            );
            let langs = models::installed_languages(dir);
            println!("Languages:    {}", langs.join(", "));
            if let Err(e) = models::check_language_models(dir, &config.language) {
                println!("Requested:    {} ({})", config.language, red(&e.to_string()));
                return Err(anyhow::Error::new(e));
            }
            println!("Requested:    {} {}", config.language, green("✓"));
        }
        None => {
            println!("Models:       engine default");
            println!("Requested:    {}", config.language);
        }
    }
    Ok(())
}

/// Map CLI args to `RecognitionConfig`.
fn build_config(cli: &Cli) -> Result<RecognitionConfig> {
    let pages: PageSelection = cli.pages.parse()?;

    let mut builder = RecognitionConfig::builder()
        .language(cli.lang.clone())
        .model_quality(if cli.high_quality {
            ModelQuality::HighQuality
        } else {
            ModelQuality::Standard
        })
        .dpi(cli.dpi)
        .pages(pages)
        .concurrency(cli.concurrency)
        .tesseract_cmd(cli.tesseract_cmd.clone());

    if cli.no_cleanup {
        builder = builder.cleanup(CleanupParams::disabled());
    }
    if let Some(ref dir) = cli.tessdata_dir {
        builder = builder.model_dir(dir.clone());
    }
    if let Some(ref dir) = cli.tessdata_best_dir {
        builder = builder.high_quality_model_dir(dir.clone());
    }
    if let Some(ref dir) = cli.pdfium_lib_dir {
        builder = builder.pdfium_lib_dir(dir.clone());
    }
    if let Some(ref pwd) = cli.password {
        builder = builder.password(pwd.clone());
    }

    Ok(builder.build()?)
}
