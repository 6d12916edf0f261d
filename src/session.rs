//! In-memory store of recognised documents, keyed by file name.
//!
//! A result is recorded only when the whole document was recognised. Opening
//! a file whose name is already stored replaces its text but keeps its place
//! in [`DocumentStore::filenames`]. Nothing is written to disk unless
//! [`DocumentStore::export`] is called.

use crate::config::RecognitionConfig;
use crate::error::OcrError;
use crate::export;
use crate::output::RecognitionOutput;
use crate::pipeline::input;
use crate::recognize::recognize_document;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Filename → recognised text, in first-open order.
#[derive(Debug, Default, Clone)]
pub struct DocumentStore {
    entries: Vec<(String, String)>,
    index: HashMap<String, usize>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recognise `path` and store its text under the file's base name.
    ///
    /// Returns the key. On error the store is left exactly as it was.
    pub async fn open(
        &mut self,
        path: impl AsRef<Path>,
        config: &RecognitionConfig,
    ) -> Result<&str, OcrError> {
        let (key, _) = self.open_with_output(path, config).await?;
        Ok(key)
    }

    /// [`open`](Self::open), also handing back per-page text, metadata and
    /// stats of the run.
    pub async fn open_with_output(
        &mut self,
        path: impl AsRef<Path>,
        config: &RecognitionConfig,
    ) -> Result<(&str, RecognitionOutput), OcrError> {
        let path = path.as_ref();
        let key = input::document_key(path);
        let output = recognize_document(path, config).await?;
        info!(
            "Stored {} ({} pages, {} chars)",
            key, output.stats.processed_pages, output.stats.total_chars
        );
        let idx = self.insert(key, output.text.clone());
        Ok((&self.entries[idx].0, output))
    }

    /// Store `text` under `filename`, replacing any previous text.
    ///
    /// Returns the entry's position in [`filenames`](Self::filenames).
    pub fn insert(&mut self, filename: impl Into<String>, text: impl Into<String>) -> usize {
        let filename = filename.into();
        let text = text.into();
        match self.index.get(&filename) {
            Some(&idx) => {
                debug!("Replacing stored text for {}", filename);
                self.entries[idx].1 = text;
                idx
            }
            None => {
                let idx = self.entries.len();
                self.index.insert(filename.clone(), idx);
                self.entries.push((filename, text));
                idx
            }
        }
    }

    pub fn get(&self, filename: &str) -> Option<&str> {
        self.index
            .get(filename)
            .map(|&idx| self.entries[idx].1.as_str())
    }

    pub fn contains(&self, filename: &str) -> bool {
        self.index.contains_key(filename)
    }

    /// Stored file names, in the order they were first opened.
    pub fn filenames(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Forget a document. Returns its text if it was stored.
    pub fn remove(&mut self, filename: &str) -> Option<String> {
        let idx = self.index.remove(filename)?;
        let (_, text) = self.entries.remove(idx);
        for slot in self.index.values_mut() {
            if *slot > idx {
                *slot -= 1;
            }
        }
        Some(text)
    }

    /// Write the stored text of `filename` to `dest` as UTF-8.
    ///
    /// Fails with [`OcrError::NoResult`] when nothing is stored for
    /// `filename`; in that case no file is created or modified.
    pub async fn export(
        &self,
        filename: &str,
        dest: impl AsRef<Path>,
    ) -> Result<PathBuf, OcrError> {
        let text = self.get(filename).ok_or_else(|| OcrError::NoResult {
            filename: filename.to_string(),
        })?;
        let dest = dest.as_ref();
        export::write_text_file(dest, text).await?;
        info!("Exported {} → {}", filename, dest.display());
        Ok(dest.to_path_buf())
    }
}
