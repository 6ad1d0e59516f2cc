use serde::{Deserialize, Serialize};

use super::{FeedbackError, PatternStore};

/// Raw feedback payload as received from a caller. Every field is
/// required; `validate` reports the first missing one.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeedbackRequest {
    pub filename: Option<String>,
    pub category: Option<String>,
    #[serde(alias = "is_positive")]
    pub positive: Option<bool>,
}

/// Validated like/dislike on a verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feedback {
    pub filename: String,
    pub category: String,
    pub positive: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedbackReceipt {
    pub filename: String,
    pub category: String,
    pub positive: bool,
    /// Patterns created, bumped or penalized.
    pub patterns_affected: usize,
}

impl FeedbackRequest {
    pub fn validate(self) -> Result<Feedback, FeedbackError> {
        let filename = required(self.filename, "filename")?;
        let category = required(self.category, "category")?;
        let positive = self
            .positive
            .ok_or_else(|| FeedbackError::Validation("missing field: positive".into()))?;
        Ok(Feedback {
            filename,
            category,
            positive,
        })
    }
}

fn required(value: Option<String>, field: &str) -> Result<String, FeedbackError> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(FeedbackError::Validation(format!("missing field: {field}"))),
    }
}

/// Route validated feedback to the matching reinforcement.
pub fn apply_feedback(store: &PatternStore, feedback: &Feedback) -> Result<FeedbackReceipt, FeedbackError> {
    let patterns_affected = if feedback.positive {
        store.reinforce_positive(&feedback.filename, &feedback.category)?
    } else {
        store.reinforce_negative(&feedback.filename, &feedback.category)?
    };
    Ok(FeedbackReceipt {
        filename: feedback.filename.clone(),
        category: feedback.category.clone(),
        positive: feedback.positive,
        patterns_affected,
    })
}
