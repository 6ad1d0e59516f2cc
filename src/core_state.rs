//! Transport-agnostic service state.
//!
//! `CoreState` owns the pattern store and the job orchestrator and is the
//! single entry point for the CLI or any outer layer: batch submission,
//! polling, feedback, corrections and reporting.

use std::path::Path;
use std::sync::Arc;

use crate::config::{self, ClassifierConfig};
use crate::db::DatabaseError;
use crate::pipeline::arbitration::{
    DecisionArbitrator, OllamaClassifier, PeoplePhotoDetector, RemoteClassifier, RemoteError,
};
use crate::pipeline::categories::CategoryCatalog;
use crate::pipeline::extraction::{ExtractionCache, PlainTextExtractor, TextExtractor};
use crate::pipeline::jobs::{BatchSource, JobError, JobOrchestrator, JobSnapshot, SubmitReceipt};
use crate::pipeline::learning::{
    apply_feedback, FeedbackError, FeedbackReceipt, FeedbackRequest, PatternStore, PatternStoreError,
    PerformanceReport,
};
use crate::pipeline::processor::DocumentProcessor;

// ═══════════════════════════════════════════════════════════
// Errors
// ═══════════════════════════════════════════════════════════

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
    #[error("Pattern store error: {0}")]
    PatternStore(#[from] PatternStoreError),
    #[error("{0}")]
    Job(#[from] JobError),
    #[error("{0}")]
    Feedback(#[from] FeedbackError),
    #[error("Remote classifier error: {0}")]
    Remote(#[from] RemoteError),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

// ═══════════════════════════════════════════════════════════
// CoreState
// ═══════════════════════════════════════════════════════════

/// Optional collaborators plugged into the arbitrator.
#[derive(Default)]
pub struct Oracles {
    pub remote: Option<Arc<dyn RemoteClassifier>>,
    pub photo_detector: Option<Arc<dyn PeoplePhotoDetector>>,
}

pub struct CoreState {
    config: ClassifierConfig,
    store: Arc<PatternStore>,
    orchestrator: JobOrchestrator,
}

impl CoreState {
    /// Service backed by the pattern database at `config::patterns_db_path()`.
    pub fn open_default(config: ClassifierConfig) -> Result<Self, CoreError> {
        let path = config::patterns_db_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(DatabaseError::from)?;
        }
        Self::open(config, &path)
    }

    /// Service backed by the pattern database at `db_path`, with the
    /// plain-text extractor and, when configured, the Ollama classifier.
    pub fn open(config: ClassifierConfig, db_path: &Path) -> Result<Self, CoreError> {
        let store = Arc::new(PatternStore::open(db_path)?);
        let remote = OllamaClassifier::from_config(&config)?.map(|c| Arc::new(c) as Arc<dyn RemoteClassifier>);
        tracing::info!(db = %db_path.display(), remote = remote.is_some(), "Pattern store opened");
        Ok(Self::with_components(
            config,
            store,
            Arc::new(PlainTextExtractor),
            Oracles {
                remote,
                photo_detector: None,
            },
        ))
    }

    pub fn with_components(
        config: ClassifierConfig,
        store: Arc<PatternStore>,
        extractor: Arc<dyn TextExtractor>,
        oracles: Oracles,
    ) -> Self {
        let mut arbitrator = DecisionArbitrator::new(Arc::clone(&store), CategoryCatalog::default()).with_config(&config);
        if let Some(remote) = oracles.remote {
            arbitrator = arbitrator.with_remote(remote);
        }
        if let Some(detector) = oracles.photo_detector {
            arbitrator = arbitrator.with_photo_detector(detector);
        }

        let processor = DocumentProcessor::new(
            Arc::new(ExtractionCache::from_config(&config)),
            extractor,
            Arc::new(arbitrator),
        );
        let orchestrator = JobOrchestrator::new(Arc::new(processor), config.worker_threads);

        Self {
            config,
            store,
            orchestrator,
        }
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<PatternStore> {
        &self.store
    }

    // ── Batches ─────────────────────────────────────────────

    pub fn submit_batch(&self, batch_id: &str, source: BatchSource) -> Result<SubmitReceipt, CoreError> {
        Ok(self.orchestrator.submit(batch_id, source)?)
    }

    pub fn batch_status(&self, batch_id: &str) -> Result<JobSnapshot, CoreError> {
        Ok(self.orchestrator.status(batch_id)?)
    }

    // ── Learning ────────────────────────────────────────────

    pub fn submit_feedback(&self, request: FeedbackRequest) -> Result<FeedbackReceipt, CoreError> {
        let feedback = request.validate()?;
        Ok(apply_feedback(&self.store, &feedback)?)
    }

    /// Correct the latest verdict for `filename`. `None` when the file was
    /// never classified.
    pub fn record_correction(&self, filename: &str, category: &str) -> Result<Option<usize>, CoreError> {
        let filename = filename.trim();
        let category = category.trim().to_lowercase();
        if filename.is_empty() || category.is_empty() {
            return Err(FeedbackError::Validation("filename and category are required".into()).into());
        }
        Ok(self.store.record_correction(filename, &category)?)
    }

    pub fn performance_report(&self) -> Result<PerformanceReport, CoreError> {
        Ok(self.store.performance_report()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::pipeline::arbitration::{DecisionMethod, MockPhotoDetector};
    use crate::pipeline::jobs::JobStatus;

    fn state() -> CoreState {
        CoreState::with_components(
            ClassifierConfig::default(),
            Arc::new(PatternStore::in_memory().unwrap()),
            Arc::new(PlainTextExtractor),
            Oracles::default(),
        )
    }

    fn wait_terminal(state: &CoreState, batch_id: &str) -> JobSnapshot {
        for _ in 0..1000 {
            let snap = state.batch_status(batch_id).unwrap();
            if snap.status.is_terminal() {
                return snap;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        panic!("batch {batch_id} did not finish");
    }

    #[test]
    fn folder_batch_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("cemig_janeiro.txt"), "Conta de energia elétrica - 150 kWh").unwrap();
        std::fs::write(dir.path().join("notas.txt"), "lembrar de comprar pão").unwrap();

        let state = state();
        state.submit_batch("S1", BatchSource::Folder(dir.path().to_path_buf())).unwrap();
        let snap = wait_terminal(&state, "S1");

        assert_eq!(snap.status, JobStatus::Completed);
        let results = snap.results.unwrap();
        assert_eq!(results[0].result.category, "conta_luz");
        assert_eq!(results[0].result.method, DecisionMethod::RulesOnly);

        let report = state.performance_report().unwrap();
        assert_eq!(report.total_classifications, 2);
    }

    #[test]
    fn feedback_validation_surfaces() {
        let err = state().submit_feedback(FeedbackRequest::default()).unwrap_err();
        assert!(matches!(err, CoreError::Feedback(FeedbackError::Validation(_))));
    }

    #[test]
    fn feedback_moves_learning() {
        let state = state();
        let request = FeedbackRequest {
            filename: Some("fatura123.pdf".into()),
            category: Some("energia".into()),
            positive: Some(true),
        };
        let receipt = state.submit_feedback(request).unwrap();
        assert_eq!(receipt.patterns_affected, 3);

        let suggestion = state.store().suggest("fatura123.pdf", "").unwrap().unwrap();
        assert_eq!(suggestion.category, "energia");
        assert_eq!(state.performance_report().unwrap().positive_feedback, 1);
    }

    #[test]
    fn correction_requires_history() {
        let state = state();
        assert_eq!(state.record_correction("never_seen.pdf", "rg").unwrap(), None);
        assert!(state.record_correction(" ", "rg").is_err());
    }

    #[test]
    fn unknown_batch_is_not_found() {
        let err = state().batch_status("missing").unwrap_err();
        assert!(matches!(err, CoreError::Job(JobError::SessionNotFound(_))));
    }

    #[test]
    fn photo_detector_is_wired() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("IMG_2024.jpg"), b"\xff\xd8").unwrap();

        let state = CoreState::with_components(
            ClassifierConfig::default(),
            Arc::new(PatternStore::in_memory().unwrap()),
            Arc::new(PlainTextExtractor),
            Oracles {
                remote: None,
                photo_detector: Some(Arc::new(MockPhotoDetector::new(Some(0.95)))),
            },
        );
        state.submit_batch("P", BatchSource::Folder(dir.path().to_path_buf())).unwrap();
        let results = wait_terminal(&state, "P").results.unwrap();
        assert_eq!(results[0].result.method, DecisionMethod::PeoplePhoto);
    }

    #[test]
    fn open_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("learning_data.db");
        {
            let state = CoreState::open(ClassifierConfig::default(), &db).unwrap();
            state.store().reinforce_positive("contrato_2024.pdf", "contrato").unwrap();
        }
        let state = CoreState::open(ClassifierConfig::default(), &db).unwrap();
        assert_eq!(state.performance_report().unwrap().positive_feedback, 1);
    }
}
