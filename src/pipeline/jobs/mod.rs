pub mod orchestrator;
pub mod pool;

pub use orchestrator::*;
pub use pool::*;

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::pipeline::processor::FileClassification;

#[derive(Error, Debug)]
pub enum JobError {
    #[error("Batch {0} is already processing")]
    ConflictInProgress(String),

    #[error("Batch not found: {0}")]
    SessionNotFound(String),

    #[error("Internal lock error")]
    LockPoisoned,

    #[error("Worker pool is shut down")]
    PoolClosed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Processing)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a batch classifies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchSource {
    /// Explicit files, processed in the given order.
    Files(Vec<PathBuf>),
    /// Every regular file in a folder, by name. Listed by the worker.
    Folder(PathBuf),
}

/// One batch run. Only its worker mutates it once submitted.
#[derive(Debug, Clone)]
pub struct Job {
    pub batch_id: String,
    pub status: JobStatus,
    pub progress: usize,
    pub total: usize,
    pub results: Vec<FileClassification>,
    pub error: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl Job {
    fn new(batch_id: &str, total: usize) -> Self {
        Self {
            batch_id: batch_id.to_string(),
            status: JobStatus::Processing,
            progress: 0,
            total,
            results: Vec::new(),
            error: None,
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    pub fn snapshot(&self) -> JobSnapshot {
        JobSnapshot {
            batch_id: self.batch_id.clone(),
            status: self.status,
            progress: self.progress,
            total: self.total,
            results: (self.status == JobStatus::Completed).then(|| self.results.clone()),
            error: self.error.clone(),
        }
    }
}

/// Polling view of a job. Results are only exposed once it completed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSnapshot {
    pub batch_id: String,
    pub status: JobStatus,
    pub progress: usize,
    pub total: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results: Option<Vec<FileClassification>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Returned when a batch is accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitReceipt {
    pub batch_id: String,
    pub status: JobStatus,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn processing_snapshot_hides_results() {
        let mut job = Job::new("S1", 2);
        job.progress = 1;
        let snap = job.snapshot();
        assert_eq!(snap.status, JobStatus::Processing);
        assert!(snap.results.is_none());

        job.status = JobStatus::Completed;
        assert_eq!(job.snapshot().results, Some(Vec::new()));
    }

    #[test]
    fn status_serializes_snake_case() {
        assert_eq!(serde_json::to_string(&JobStatus::Processing).unwrap(), "\"processing\"");
        assert!(JobStatus::Failed.is_terminal());
        assert!(!JobStatus::Processing.is_terminal());
    }

    #[test]
    fn error_messages() {
        assert_eq!(JobError::ConflictInProgress("S1".into()).to_string(), "Batch S1 is already processing");
        assert_eq!(JobError::SessionNotFound("x".into()).to_string(), "Batch not found: x");
    }
}
