//! Per-file classification pipeline: cached extraction, then arbitration.
//!
//! Engines are injected as trait objects so job tests can run the whole
//! path against mock extractors and an in-memory pattern store.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::pipeline::arbitration::{ClassificationResult, Confidence, DecisionArbitrator, DecisionMethod};
use crate::pipeline::categories::{FALLBACK_CATEGORY, FALLBACK_DISPLAY_NAME};
use crate::pipeline::extraction::{text_quality, ExtractionCache, TextExtractor};
use crate::pipeline::naming::suggested_filename;

#[derive(Debug, thiserror::Error)]
pub enum ProcessingError {
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    #[error("Not a regular file: {0}")]
    NotAFile(PathBuf),
}

/// One entry of a job's results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileClassification {
    pub filename: String,
    #[serde(flatten)]
    pub result: ClassificationResult,
    pub suggested_filename: String,
    /// Extracted text quality in [0, 1].
    pub ocr_confidence: f64,
    pub text_length: usize,
}

impl FileClassification {
    /// Fallback entry for a file that could not be processed.
    pub fn failed(path: &Path, error: &ProcessingError) -> Self {
        let filename = display_filename(path);
        Self {
            suggested_filename: filename.clone(),
            filename,
            result: ClassificationResult {
                category: FALLBACK_CATEGORY.to_string(),
                category_name: FALLBACK_DISPLAY_NAME.to_string(),
                confidence: Confidence::NotApplicable,
                method: DecisionMethod::ProcessingError,
                details: Some(error.to_string()),
            },
            ocr_confidence: 0.0,
            text_length: 0,
        }
    }
}

pub struct DocumentProcessor {
    cache: Arc<ExtractionCache>,
    extractor: Arc<dyn TextExtractor>,
    arbitrator: Arc<DecisionArbitrator>,
}

impl DocumentProcessor {
    pub fn new(
        cache: Arc<ExtractionCache>,
        extractor: Arc<dyn TextExtractor>,
        arbitrator: Arc<DecisionArbitrator>,
    ) -> Self {
        Self {
            cache,
            extractor,
            arbitrator,
        }
    }

    pub fn cache(&self) -> &Arc<ExtractionCache> {
        &self.cache
    }

    pub fn arbitrator(&self) -> &Arc<DecisionArbitrator> {
        &self.arbitrator
    }

    /// Extract (through the cache) and classify one file.
    pub fn process_file(&self, path: &Path) -> Result<FileClassification, ProcessingError> {
        let metadata = std::fs::metadata(path).map_err(|_| ProcessingError::NotFound(path.to_path_buf()))?;
        if !metadata.is_file() {
            return Err(ProcessingError::NotAFile(path.to_path_buf()));
        }

        let text = self.cache.lookup_or_extract(path, self.extractor.as_ref());
        let result = self.arbitrator.classify(path, &text);
        let filename = display_filename(path);

        Ok(FileClassification {
            suggested_filename: suggested_filename(&result.category, &filename, &text),
            filename,
            result,
            ocr_confidence: text_quality(&text),
            text_length: text.chars().count(),
        })
    }

    /// `process_file`, with errors turned into a fallback entry.
    pub fn process_or_fallback(&self, path: &Path) -> FileClassification {
        self.process_file(path).unwrap_or_else(|e| {
            tracing::warn!(path = %path.display(), error = %e, "File could not be classified");
            FileClassification::failed(path, &e)
        })
    }
}

fn display_filename(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
