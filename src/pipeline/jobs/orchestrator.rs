use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;

use super::*;
use crate::pipeline::processor::DocumentProcessor;

type JobTable = Arc<Mutex<HashMap<String, Job>>>;

/// Accepts batches, runs them on the worker pool and serves progress.
pub struct JobOrchestrator {
    jobs: JobTable,
    processor: Arc<DocumentProcessor>,
    pool: WorkerPool,
}

impl JobOrchestrator {
    pub fn new(processor: Arc<DocumentProcessor>, workers: usize) -> Self {
        Self {
            jobs: Arc::new(Mutex::new(HashMap::new())),
            processor,
            pool: WorkerPool::new(workers),
        }
    }

    pub fn processor(&self) -> &Arc<DocumentProcessor> {
        &self.processor
    }

    /// Start a batch. A batch id whose previous run is still processing is
    /// rejected; a finished run is replaced.
    pub fn submit(&self, batch_id: &str, source: BatchSource) -> Result<SubmitReceipt, JobError> {
        {
            let mut jobs = lock(&self.jobs)?;
            if let Some(existing) = jobs.get(batch_id) {
                if existing.status == JobStatus::Processing {
                    return Err(JobError::ConflictInProgress(batch_id.to_string()));
                }
            }
            let total = match &source {
                BatchSource::Files(files) => files.len(),
                BatchSource::Folder(_) => 0,
            };
            jobs.insert(batch_id.to_string(), Job::new(batch_id, total));
        }

        let jobs = Arc::clone(&self.jobs);
        let processor = Arc::clone(&self.processor);
        let id = batch_id.to_string();
        let task = move || {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| run_job(&jobs, &processor, &id, source)));
            if outcome.is_err() {
                tracing::error!(batch_id = %id, "Batch worker panicked");
                finish(&jobs, &id, JobStatus::Failed, Some("Batch worker panicked".to_string()));
            }
        };
        if let Err(e) = self.pool.execute(task) {
            finish(&self.jobs, batch_id, JobStatus::Failed, Some(e.to_string()));
            return Err(e);
        }

        tracing::info!(batch_id, "Batch submitted");
        Ok(SubmitReceipt {
            batch_id: batch_id.to_string(),
            status: JobStatus::Processing,
            message: "processing started".to_string(),
        })
    }

    pub fn status(&self, batch_id: &str) -> Result<JobSnapshot, JobError> {
        let jobs = lock(&self.jobs)?;
        jobs.get(batch_id)
            .map(Job::snapshot)
            .ok_or_else(|| JobError::SessionNotFound(batch_id.to_string()))
    }
}

fn lock(jobs: &Mutex<HashMap<String, Job>>) -> Result<MutexGuard<'_, HashMap<String, Job>>, JobError> {
    jobs.lock().map_err(|_| JobError::LockPoisoned)
}

fn run_job(jobs: &Mutex<HashMap<String, Job>>, processor: &DocumentProcessor, batch_id: &str, source: BatchSource) {
    let files = match source {
        BatchSource::Files(files) => files,
        BatchSource::Folder(dir) => match list_folder(&dir) {
            Ok(files) => files,
            Err(e) => {
                tracing::warn!(batch_id, folder = %dir.display(), error = %e, "Batch folder unreadable");
                finish(jobs, batch_id, JobStatus::Failed, Some(format!("Cannot read folder {}: {e}", dir.display())));
                return;
            }
        },
    };

    tracing::info!(batch_id, files = files.len(), "Batch started");
    if !update(jobs, batch_id, |job| job.total = files.len()) {
        return;
    }

    for path in &files {
        let entry = processor.process_or_fallback(path);
        tracing::debug!(
            batch_id,
            filename = %entry.filename,
            category = %entry.result.category,
            confidence = %entry.result.confidence,
            "File classified"
        );
        let published = update(jobs, batch_id, |job| {
            job.results.push(entry);
            job.progress = job.results.len();
        });
        if !published {
            return;
        }
    }

    finish(jobs, batch_id, JobStatus::Completed, None);
    tracing::info!(batch_id, files = files.len(), "Batch completed");
}

/// Apply `f` to the job under the table lock. False when the job can no
/// longer be updated.
fn update(jobs: &Mutex<HashMap<String, Job>>, batch_id: &str, f: impl FnOnce(&mut Job)) -> bool {
    match jobs.lock() {
        Ok(mut table) => match table.get_mut(batch_id) {
            Some(job) => {
                f(job);
                true
            }
            None => false,
        },
        Err(_) => {
            tracing::warn!(batch_id, "Job table lock poisoned, abandoning batch");
            false
        }
    }
}

fn finish(jobs: &Mutex<HashMap<String, Job>>, batch_id: &str, status: JobStatus, error: Option<String>) {
    update(jobs, batch_id, |job| {
        job.status = status;
        job.error = error;
        job.finished_at = Some(Utc::now());
    });
}

/// Regular files directly inside `dir`, sorted by name.
fn list_folder(dir: &Path) -> Result<Vec<PathBuf>, std::io::Error> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            files.push(entry.path());
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;

    use crate::pipeline::arbitration::{Confidence, DecisionArbitrator};
    use crate::pipeline::categories::CategoryCatalog;
    use crate::pipeline::extraction::{ExtractionCache, ExtractionError, MockTextExtractor, TextExtractor};
    use crate::pipeline::learning::PatternStore;

    /// Blocks every extraction until released.
    struct GatedExtractor {
        open: AtomicBool,
        calls: AtomicUsize,
    }

    impl GatedExtractor {
        fn new() -> Self {
            Self {
                open: AtomicBool::new(false),
                calls: AtomicUsize::new(0),
            }
        }

        fn release(&self) {
            self.open.store(true, Ordering::SeqCst);
        }
    }

    impl TextExtractor for GatedExtractor {
        fn extract(&self, _path: &Path) -> Result<String, ExtractionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            for _ in 0..1000 {
                if self.open.load(Ordering::SeqCst) {
                    break;
                }
                std::thread::sleep(Duration::from_millis(5));
            }
            Ok("Contrato de prestação de serviços".into())
        }
    }

    struct PanickingExtractor;

    impl TextExtractor for PanickingExtractor {
        fn extract(&self, _path: &Path) -> Result<String, ExtractionError> {
            panic!("extractor crashed")
        }
    }

    fn orchestrator(extractor: Arc<dyn TextExtractor>) -> JobOrchestrator {
        let store = Arc::new(PatternStore::in_memory().unwrap());
        let processor = DocumentProcessor::new(
            Arc::new(ExtractionCache::new(Duration::from_secs(3600), 100)),
            extractor,
            Arc::new(DecisionArbitrator::new(store, CategoryCatalog::default())),
        );
        JobOrchestrator::new(Arc::new(processor), 2)
    }

    fn wait_terminal(orch: &JobOrchestrator, batch_id: &str) -> JobSnapshot {
        for _ in 0..1000 {
            let snap = orch.status(batch_id).unwrap();
            if snap.status.is_terminal() {
                return snap;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        panic!("batch {batch_id} did not finish");
    }

    fn write(dir: &Path, name: &str, content: &[u8]) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn completes_file_batch() {
        let dir = tempfile::tempdir().unwrap();
        let files = vec![
            write(dir.path(), "meu_rg_frente.jpg", b"rg"),
            write(dir.path(), "scan_0001.pdf", b"scan"),
        ];
        let orch = orchestrator(Arc::new(MockTextExtractor::new("REGISTRO GERAL - RG Nº 12.345.678-9")));

        let receipt = orch.submit("S1", BatchSource::Files(files)).unwrap();
        assert_eq!(receipt.status, JobStatus::Processing);

        let snap = wait_terminal(&orch, "S1");
        assert_eq!(snap.status, JobStatus::Completed);
        assert_eq!(snap.total, 2);
        assert_eq!(snap.progress, 2);
        let results = snap.results.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].filename, "meu_rg_frente.jpg");
        assert_eq!(results[0].result.category, "rg");
    }

    #[test]
    fn duplicate_submission_conflicts() {
        let dir = tempfile::tempdir().unwrap();
        let files = vec![write(dir.path(), "contrato.pdf", b"c")];
        let extractor = Arc::new(GatedExtractor::new());
        let orch = orchestrator(extractor.clone());

        orch.submit("S1", BatchSource::Files(files.clone())).unwrap();
        let second = orch.submit("S1", BatchSource::Files(files));
        assert!(matches!(second, Err(JobError::ConflictInProgress(_))));

        extractor.release();
        let snap = wait_terminal(&orch, "S1");
        assert_eq!(snap.status, JobStatus::Completed);
        assert_eq!(snap.results.unwrap().len(), 1);
        assert_eq!(extractor.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn finished_batch_can_be_resubmitted() {
        let dir = tempfile::tempdir().unwrap();
        let files = vec![write(dir.path(), "contrato.pdf", b"c")];
        let orch = orchestrator(Arc::new(MockTextExtractor::new("texto")));

        orch.submit("S1", BatchSource::Files(files.clone())).unwrap();
        wait_terminal(&orch, "S1");
        orch.submit("S1", BatchSource::Files(files)).unwrap();
        assert_eq!(wait_terminal(&orch, "S1").status, JobStatus::Completed);
    }

    #[test]
    fn identical_content_extracted_once() {
        let dir = tempfile::tempdir().unwrap();
        let files = vec![
            write(dir.path(), "original.txt", b"same bytes"),
            write(dir.path(), "copy.txt", b"same bytes"),
        ];
        let extractor = Arc::new(MockTextExtractor::new("Conta de luz 150 kWh"));
        let orch = orchestrator(extractor.clone());

        orch.submit("S1", BatchSource::Files(files)).unwrap();
        wait_terminal(&orch, "S1");

        assert_eq!(extractor.calls(), 1);
        let stats = orch.processor().cache().stats();
        assert_eq!(stats.entries, 1);
        assert_eq!(stats.hits, 1);
    }

    #[test]
    fn progress_never_decreases() {
        let dir = tempfile::tempdir().unwrap();
        let files: Vec<PathBuf> = (0..20)
            .map(|i| write(dir.path(), &format!("file_{i}.txt"), format!("content {i}").as_bytes()))
            .collect();
        let orch = orchestrator(Arc::new(MockTextExtractor::new("texto")));
        orch.submit("S1", BatchSource::Files(files)).unwrap();

        let mut last = 0;
        loop {
            let snap = orch.status("S1").unwrap();
            assert!(snap.progress >= last);
            last = snap.progress;
            if snap.status.is_terminal() {
                assert_eq!(snap.progress, snap.results.unwrap().len());
                break;
            }
            std::thread::sleep(Duration::from_millis(1));
        }
        assert_eq!(last, 20);
    }

    #[test]
    fn folder_batch_lists_sorted_files() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "b.txt", b"second");
        write(dir.path(), "a.txt", b"first");
        std::fs::create_dir(dir.path().join("nested")).unwrap();

        let orch = orchestrator(Arc::new(MockTextExtractor::new("")));
        orch.submit("S2", BatchSource::Folder(dir.path().to_path_buf())).unwrap();

        let snap = wait_terminal(&orch, "S2");
        assert_eq!(snap.total, 2);
        let names: Vec<String> = snap.results.unwrap().into_iter().map(|r| r.filename).collect();
        assert_eq!(names, vec!["a.txt", "b.txt"]);
    }

    #[test]
    fn missing_folder_fails_job() {
        let orch = orchestrator(Arc::new(MockTextExtractor::new("")));
        orch.submit("S3", BatchSource::Folder("/nonexistent/doctriage/session".into())).unwrap();

        let snap = wait_terminal(&orch, "S3");
        assert_eq!(snap.status, JobStatus::Failed);
        assert!(snap.error.unwrap().contains("Cannot read folder"));
        assert!(snap.results.is_none());
    }

    #[test]
    fn vanished_file_is_fallback_entry() {
        let dir = tempfile::tempdir().unwrap();
        let files = vec![dir.path().join("gone.pdf"), write(dir.path(), "contrato.pdf", b"c")];
        let orch = orchestrator(Arc::new(MockTextExtractor::new("texto")));
        orch.submit("S1", BatchSource::Files(files)).unwrap();

        let results = wait_terminal(&orch, "S1").results.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].result.confidence, Confidence::NotApplicable);
        assert_eq!(results[1].result.category, "contrato");
    }

    #[test]
    fn panicking_batch_fails_and_frees_its_id() {
        let dir = tempfile::tempdir().unwrap();
        let files = vec![write(dir.path(), "contrato.pdf", b"c")];
        let orch = orchestrator(Arc::new(PanickingExtractor));

        orch.submit("S1", BatchSource::Files(files.clone())).unwrap();
        let snap = wait_terminal(&orch, "S1");
        assert_eq!(snap.status, JobStatus::Failed);
        assert!(snap.error.unwrap().contains("panicked"));

        // not stuck in Processing, so the id is accepted again
        orch.submit("S1", BatchSource::Files(files)).unwrap();
        assert_eq!(wait_terminal(&orch, "S1").status, JobStatus::Failed);
    }

    #[test]
    fn unknown_batch_not_found() {
        let orch = orchestrator(Arc::new(MockTextExtractor::new("")));
        assert!(matches!(orch.status("nope"), Err(JobError::SessionNotFound(_))));
    }

    #[test]
    fn concurrent_batches_are_isolated() {
        let dir = tempfile::tempdir().unwrap();
        let orch = orchestrator(Arc::new(MockTextExtractor::new("texto")));
        for i in 0..4 {
            let files = vec![write(dir.path(), &format!("contrato_{i}.pdf"), format!("{i}").as_bytes())];
            orch.submit(&format!("B{i}"), BatchSource::Files(files)).unwrap();
        }
        for i in 0..4 {
            let snap = wait_terminal(&orch, &format!("B{i}"));
            assert_eq!(snap.results.unwrap()[0].filename, format!("contrato_{i}.pdf"));
        }
    }
}
