//! Model-data directory selection.
//!
//! The user may ask for the high-quality model set. When that set is not
//! configured, or its directory lacks a model for one of the requested
//! languages, recognition silently falls back to the default directory (or to
//! whatever the engine bundles). The chosen directory is returned as a value
//! and handed to the engine with each call; nothing is written to the process
//! environment.

use crate::config::{ModelQuality, RecognitionConfig};
use crate::error::OcrError;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Extension of a trained language model file.
const MODEL_EXTENSION: &str = "traineddata";

/// Outcome of [`resolve_model_dir`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelDirChoice {
    /// Directory to pass to the engine; `None` means the engine's own default.
    pub dir: Option<PathBuf>,
    /// True when high-quality models were requested but could not be used.
    pub fell_back: bool,
}

/// Pick the model-data directory for one recognition run.
pub fn resolve_model_dir(config: &RecognitionConfig) -> ModelDirChoice {
    let default_dir = config.model_dir.clone();

    if config.model_quality != ModelQuality::HighQuality {
        return ModelDirChoice {
            dir: default_dir,
            fell_back: false,
        };
    }

    match config.high_quality_model_dir.as_deref() {
        Some(dir) if has_models_for(dir, &config.language) => {
            debug!("Using high-quality models from {}", dir.display());
            ModelDirChoice {
                dir: Some(dir.to_path_buf()),
                fell_back: false,
            }
        }
        Some(dir) => {
            debug!(
                "High-quality models for {} not found in {}; using default models",
                config.language,
                dir.display()
            );
            ModelDirChoice {
                dir: default_dir,
                fell_back: true,
            }
        }
        None => {
            debug!("No high-quality model directory configured; using default models");
            ModelDirChoice {
                dir: default_dir,
                fell_back: true,
            }
        }
    }
}

/// True when `dir` holds a model for every `+`-separated language.
fn has_models_for(dir: &Path, language: &str) -> bool {
    let installed = installed_languages(dir);
    !installed.is_empty() && language.split('+').all(|l| installed.iter().any(|i| i == l))
}

/// Check that every `+`-separated language has a model file in `dir`.
///
/// Only meaningful when the directory is known; the engine's built-in
/// default is validated by the engine itself on first use.
pub fn check_language_models(dir: &Path, language: &str) -> Result<(), OcrError> {
    if !dir.is_dir() {
        return Err(OcrError::ModelDataMissing {
            dir: Some(dir.to_path_buf()),
            detail: "directory does not exist".into(),
        });
    }

    let installed = installed_languages(dir);
    if installed.is_empty() {
        return Err(OcrError::ModelDataMissing {
            dir: Some(dir.to_path_buf()),
            detail: format!("no *.{MODEL_EXTENSION} files found"),
        });
    }

    let missing: Vec<&str> = language
        .split('+')
        .filter(|lang| !installed.iter().any(|i| i == lang))
        .collect();
    if !missing.is_empty() {
        return Err(OcrError::UnsupportedLanguage {
            language: language.to_string(),
            detail: format!(
                "no model for {} in {} (installed: {})",
                missing.join(", "),
                dir.display(),
                installed.join(", ")
            ),
        });
    }
    Ok(())
}

/// Language codes with a model file in `dir`, sorted.
pub fn installed_languages(dir: &Path) -> Vec<String> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut langs: Vec<String> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.extension().is_some_and(|ext| ext == MODEL_EXTENSION))
        .filter_map(|p| p.file_stem().map(|s| s.to_string_lossy().into_owned()))
        .collect();
    langs.sort();
    langs
}
