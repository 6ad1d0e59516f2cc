pub mod feedback;
pub mod signals;
pub mod store;

pub use feedback::*;
pub use signals::*;
pub use store::*;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db::DatabaseError;

// ═══════════════════════════════════════════════════════════
// Reinforcement constants
// ═══════════════════════════════════════════════════════════

pub const MIN_PATTERN_CONFIDENCE: f64 = 0.05;
pub const MAX_PATTERN_CONFIDENCE: f64 = 1.0;

/// Positive feedback: existing pattern bump, or initial value of a new one.
pub const POSITIVE_STEP: f64 = 0.15;
pub const POSITIVE_INITIAL: f64 = 0.75;

/// Negative feedback penalty. Never creates patterns.
pub const NEGATIVE_STEP: f64 = 0.20;

/// Explicit correction bump, and initial value for corrections and
/// patterns grown from unlabeled outcomes.
pub const CORRECTION_STEP: f64 = 0.10;
pub const LEARNED_INITIAL: f64 = 0.5;

/// Scoring: usage boost per use and its cap, content weight.
pub const USAGE_BOOST_PER_USE: f64 = 0.1;
pub const USAGE_BOOST_CAP: f64 = 2.0;
pub const CONTENT_WEIGHT: f64 = 1.5;

/// Match-count multiplier `min(1.0, base + per_match × n)`.
pub const MATCH_MULTIPLIER_BASE: f64 = 0.3;
pub const MATCH_MULTIPLIER_STEP: f64 = 0.2;

#[derive(Error, Debug)]
pub enum PatternStoreError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Pattern store unavailable")]
    StorageUnavailable,
}

impl From<rusqlite::Error> for PatternStoreError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Database(DatabaseError::Sqlite(e))
    }
}

#[derive(Error, Debug)]
pub enum FeedbackError {
    #[error("Invalid feedback: {0}")]
    Validation(String),

    #[error(transparent)]
    Store(#[from] PatternStoreError),
}

/// Source of a learned pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternType {
    Filename,
    Content,
}

impl PatternType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Filename => "filename",
            Self::Content => "content",
        }
    }
}

impl std::fmt::Display for PatternType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One stored (token, category) association.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearnedPattern {
    pub pattern_type: PatternType,
    pub value: String,
    pub category: String,
    pub confidence: f64,
    pub usage_count: i64,
    pub last_used: String,
}

/// Best category according to the learned patterns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearnedSuggestion {
    pub category: String,
    pub confidence: f64,
    /// Patterns that contributed to the winning category.
    pub matched_patterns: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryFeedback {
    pub category: String,
    pub likes: i64,
    pub dislikes: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryStats {
    pub category: String,
    pub total_classifications: i64,
    pub correct_classifications: i64,
    pub accuracy_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceReport {
    pub total_classifications: i64,
    pub total_corrections: i64,
    /// Distinct learned token values.
    pub learned_patterns: i64,
    pub positive_feedback: i64,
    pub negative_feedback: i64,
    pub feedback_by_category: Vec<CategoryFeedback>,
    pub category_stats: Vec<CategoryStats>,
}
