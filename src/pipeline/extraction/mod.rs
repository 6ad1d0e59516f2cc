pub mod cache;
pub mod hash;

pub use cache::*;
pub use hash::*;

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unsupported format for extraction: {0}")]
    Unsupported(String),

    #[error("Extraction failed: {0}")]
    Extraction(String),
}

/// Text extraction oracle. OCR and PDF parsing live behind this seam.
pub trait TextExtractor: Send + Sync {
    fn extract(&self, path: &Path) -> Result<String, ExtractionError>;
}

/// File extensions read directly as text.
const PLAIN_TEXT_EXTENSIONS: &[&str] = &["txt", "md", "csv", "json", "xml", "html", "htm", "log"];

/// Reads text-like files from disk. Binary formats report `Unsupported`,
/// which the cache degrades to empty text.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    fn extract(&self, path: &Path) -> Result<String, ExtractionError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        if !PLAIN_TEXT_EXTENSIONS.contains(&ext.as_str()) {
            return Err(ExtractionError::Unsupported(ext));
        }

        let bytes = std::fs::read(path)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

/// Mock extractor for unit testing. Counts how often it was invoked so
/// tests can assert cache hits perform no extraction work.
pub struct MockTextExtractor {
    pub text: String,
    pub fail: bool,
    calls: AtomicUsize,
}

impl MockTextExtractor {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            text: String::new(),
            fail: true,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl TextExtractor for MockTextExtractor {
    fn extract(&self, _path: &Path) -> Result<String, ExtractionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(ExtractionError::Extraction("mock failure".into()));
        }
        Ok(self.text.clone())
    }
}

/// Text quality signal reported next to each verdict: 500 characters of
/// extracted text count as full confidence.
pub fn text_quality(text: &str) -> f64 {
    let chars = text.trim().chars().count();
    (chars as f64 / 500.0).min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_reads_txt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nota.txt");
        std::fs::write(&path, "Nota fiscal eletrônica").unwrap();

        let text = PlainTextExtractor.extract(&path).unwrap();
        assert_eq!(text, "Nota fiscal eletrônica");
    }

    #[test]
    fn plain_text_rejects_binary_formats() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.jpg");
        std::fs::write(&path, [0xFF, 0xD8, 0xFF]).unwrap();

        let err = PlainTextExtractor.extract(&path).unwrap_err();
        assert!(matches!(err, ExtractionError::Unsupported(ref ext) if ext == "jpg"));
    }

    #[test]
    fn plain_text_missing_file_is_io() {
        let dir = tempfile::tempdir().unwrap();
        let err = PlainTextExtractor.extract(&dir.path().join("gone.txt")).unwrap_err();
        assert!(matches!(err, ExtractionError::Io(_)));
    }

    #[test]
    fn mock_counts_calls() {
        let mock = MockTextExtractor::new("bonjour");
        let path = Path::new("whatever.pdf");
        assert_eq!(mock.extract(path).unwrap(), "bonjour");
        assert_eq!(mock.extract(path).unwrap(), "bonjour");
        assert_eq!(mock.calls(), 2);
    }

    #[test]
    fn text_quality_scales_to_500_chars() {
        assert_eq!(text_quality(""), 0.0);
        assert!((text_quality(&"a".repeat(250)) - 0.5).abs() < 1e-9);
        assert_eq!(text_quality(&"a".repeat(2000)), 1.0);
    }
}
