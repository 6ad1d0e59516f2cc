pub mod arbitrator;
pub mod remote;
pub mod semantic;

pub use arbitrator::*;
pub use remote::*;
pub use semantic::*;

use std::path::Path;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::pipeline::categories::CategoryCatalog;

// ═══════════════════════════════════════════════════════════
// Policy constants
// ═══════════════════════════════════════════════════════════

pub const SEMANTIC_BOOST: f64 = 1.3;
pub const SEMANTIC_PENALTY: f64 = 0.6;
pub const SEMANTIC_NO_TEXT: f64 = 0.5;
pub const SEMANTIC_MIN_TEXT_CHARS: usize = 10;
pub const VALIDATED_CONFIDENCE_CAP: f64 = 0.98;

/// Floor for a specific category whose validated confidence came out 0.
pub const SPECIFIC_CATEGORY_FLOOR: f64 = 0.30;

pub const LEARNING_CONSENSUS_MIN: f64 = 0.7;
pub const LEARNING_CONSENSUS_BONUS: f64 = 0.15;
pub const LEARNING_CONSENSUS_CAP: f64 = 0.92;
pub const LEARNING_FALLBACK_MIN: f64 = 0.6;

/// Rule confidences in [floor, cutoff) are cross-checked remotely.
pub const REMOTE_FLOOR: f64 = 0.70;
pub const REMOTE_CUTOFF: f64 = 0.85;
pub const REMOTE_AGREEMENT_MIN: f64 = 0.7;
pub const REMOTE_AGREEMENT_BONUS: f64 = 0.2;
pub const REMOTE_AGREEMENT_CAP: f64 = 0.98;
pub const REMOTE_DISAGREEMENT_MIN: f64 = 0.8;

pub const PEOPLE_PHOTO_THRESHOLD: f64 = 0.70;

// ═══════════════════════════════════════════════════════════
// Errors and oracles
// ═══════════════════════════════════════════════════════════

#[derive(Error, Debug)]
pub enum RemoteError {
    #[error("Cannot connect to remote classifier at {0}")]
    Connection(String),

    #[error("HTTP client error: {0}")]
    Http(String),

    #[error("Remote classifier returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to parse remote response: {0}")]
    ResponseParsing(String),
}

/// A remote classifier's verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteOpinion {
    pub category: String,
    pub confidence: f64,
}

/// Optional external classifier consulted for cross-validation.
pub trait RemoteClassifier: Send + Sync {
    fn classify(&self, filename: &str, text: &str, catalog: &CategoryCatalog) -> Result<RemoteOpinion, RemoteError>;
}

/// Optional detector for photographs of people. Returns `None` when the
/// file is not something it can judge.
pub trait PeoplePhotoDetector: Send + Sync {
    fn people_confidence(&self, path: &Path) -> Option<f64>;
}

// ═══════════════════════════════════════════════════════════
// Verdict types
// ═══════════════════════════════════════════════════════════

/// Numeric confidence, or the "N/A" sentinel reported for the fallback
/// category. Serializes as a number or the string "N/A".
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Confidence {
    Score(f64),
    NotApplicable,
}

impl Confidence {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Score(v) => Some(*v),
            Self::NotApplicable => None,
        }
    }
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Score(v) => write!(f, "{v:.2}"),
            Self::NotApplicable => f.write_str("N/A"),
        }
    }
}

impl Serialize for Confidence {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Score(v) => serializer.serialize_f64(*v),
            Self::NotApplicable => serializer.serialize_str("N/A"),
        }
    }
}

impl<'de> Deserialize<'de> for Confidence {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Score(f64),
            Text(String),
        }
        match Raw::deserialize(deserializer)? {
            Raw::Score(v) => Ok(Self::Score(v)),
            Raw::Text(s) if s == "N/A" => Ok(Self::NotApplicable),
            Raw::Text(s) => Err(D::Error::custom(format!("invalid confidence: {s}"))),
        }
    }
}

/// Which signal produced the verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DecisionMethod {
    #[serde(rename = "rules only")]
    RulesOnly,
    #[serde(rename = "rules+learning consensus")]
    RulesLearningConsensus,
    #[serde(rename = "learning fallback")]
    LearningFallback,
    #[serde(rename = "fallback")]
    Fallback,
    #[serde(rename = "rules+remote consensus")]
    RulesRemoteConsensus,
    #[serde(rename = "rules specificity")]
    RulesSpecificity,
    #[serde(rename = "remote specificity")]
    RemoteSpecificity,
    #[serde(rename = "confidence priority")]
    ConfidencePriority,
    #[serde(rename = "people photo")]
    PeoplePhoto,
    #[serde(rename = "processing error")]
    ProcessingError,
}

impl DecisionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RulesOnly => "rules only",
            Self::RulesLearningConsensus => "rules+learning consensus",
            Self::LearningFallback => "learning fallback",
            Self::Fallback => "fallback",
            Self::RulesRemoteConsensus => "rules+remote consensus",
            Self::RulesSpecificity => "rules specificity",
            Self::RemoteSpecificity => "remote specificity",
            Self::ConfidencePriority => "confidence priority",
            Self::PeoplePhoto => "people photo",
            Self::ProcessingError => "processing error",
        }
    }
}

impl std::fmt::Display for DecisionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Final verdict for one file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub category: String,
    pub category_name: String,
    pub confidence: Confidence,
    pub method: DecisionMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confidence_serializes_number_or_sentinel() {
        assert_eq!(serde_json::to_string(&Confidence::Score(0.8)).unwrap(), "0.8");
        assert_eq!(serde_json::to_string(&Confidence::NotApplicable).unwrap(), "\"N/A\"");
    }

    #[test]
    fn confidence_deserializes_both_forms() {
        let c: Confidence = serde_json::from_str("0.75").unwrap();
        assert_eq!(c, Confidence::Score(0.75));
        let c: Confidence = serde_json::from_str("\"N/A\"").unwrap();
        assert_eq!(c, Confidence::NotApplicable);
        assert!(serde_json::from_str::<Confidence>("\"high\"").is_err());
    }

    #[test]
    fn method_serializes_as_label() {
        let json = serde_json::to_string(&DecisionMethod::RulesLearningConsensus).unwrap();
        assert_eq!(json, "\"rules+learning consensus\"");
        assert_eq!(DecisionMethod::RulesOnly.to_string(), "rules only");
    }

    #[test]
    fn result_omits_empty_details() {
        let result = ClassificationResult {
            category: "outros".into(),
            category_name: "Outros Documentos".into(),
            confidence: Confidence::NotApplicable,
            method: DecisionMethod::Fallback,
            details: None,
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["confidence"], "N/A");
        assert!(json.get("details").is_none());
    }
}
