//! Tiered keyword rules over filename and extracted text.
//!
//! Evaluation order: filename table, then the content tiers
//! (legal, specific, general), then the fallback category. Within a tier
//! the first rule in declaration order that meets its threshold wins.

pub mod tables;

use serde::{Deserialize, Serialize};

use crate::pipeline::categories::{FALLBACK_CATEGORY, INVOICE_CATEGORY};
use tables::{FILENAME_RULES, GENERAL_RULES, INVOICE_FILENAME_TOKENS, LEGAL_RULES, SPECIFIC_RULES};

/// Baseline confidence of any filename match.
pub const FILENAME_CONFIDENCE: f64 = 0.8;
/// Confidence reported by the fallback branch.
pub const FALLBACK_CONFIDENCE: f64 = 0.1;

/// Category → filename keyword list.
#[derive(Debug, Clone, Copy)]
pub struct FilenameRule {
    pub category: &'static str,
    pub keywords: &'static [&'static str],
}

/// Category → content keyword list with its match threshold.
#[derive(Debug, Clone, Copy)]
pub struct ContentRule {
    pub category: &'static str,
    pub keywords: &'static [&'static str],
    pub min_hits: usize,
    /// Any of these in the text suppresses the rule entirely.
    pub vetoes: &'static [&'static str],
}

impl ContentRule {
    pub fn hits(&self, text_lower: &str) -> usize {
        self.keywords.iter().filter(|kw| text_lower.contains(*kw)).count()
    }

    fn vetoed(&self, text_lower: &str) -> bool {
        self.vetoes.iter().any(|term| text_lower.contains(term))
    }
}

/// Content priority group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Legal,
    Specific,
    General,
}

impl Tier {
    /// Evaluation order.
    pub const ALL: [Tier; 3] = [Tier::Legal, Tier::Specific, Tier::General];

    pub fn rules(&self) -> &'static [ContentRule] {
        match self {
            Self::Legal => LEGAL_RULES,
            Self::Specific => SPECIFIC_RULES,
            Self::General => GENERAL_RULES,
        }
    }

    /// (base, cap) of `min(cap, base + 0.1 × hits)`.
    pub fn confidence(&self, hits: usize) -> f64 {
        let (base, cap) = match self {
            Self::Legal | Self::Specific => (0.7, 0.9),
            Self::General => (0.6, 0.8),
        };
        (base + 0.1 * hits as f64).min(cap)
    }

    pub fn method(&self) -> RuleMethod {
        match self {
            Self::Legal => RuleMethod::ContentLegal,
            Self::Specific => RuleMethod::ContentSpecific,
            Self::General => RuleMethod::Content,
        }
    }
}

/// Which rule branch produced a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleMethod {
    Filename,
    ContentLegal,
    ContentSpecific,
    Content,
    Fallback,
}

impl RuleMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Filename => "filename",
            Self::ContentLegal => "content_legal",
            Self::ContentSpecific => "content_specific",
            Self::Content => "content",
            Self::Fallback => "fallback",
        }
    }
}

impl std::fmt::Display for RuleMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleMatch {
    pub category: String,
    pub confidence: f64,
    pub method: RuleMethod,
    /// Keyword hits for content matches, 0 otherwise.
    pub hits: usize,
}

impl RuleMatch {
    fn new(category: &str, confidence: f64, method: RuleMethod, hits: usize) -> Self {
        Self {
            category: category.to_string(),
            confidence,
            method,
            hits,
        }
    }

    pub fn fallback() -> Self {
        Self::new(FALLBACK_CATEGORY, FALLBACK_CONFIDENCE, RuleMethod::Fallback, 0)
    }
}

/// Stateless rule evaluator. Total: every input yields a match.
#[derive(Debug, Clone, Copy)]
pub struct RuleMatcher {
    filename_rules: &'static [FilenameRule],
}

impl Default for RuleMatcher {
    fn default() -> Self {
        Self {
            filename_rules: FILENAME_RULES,
        }
    }
}

impl RuleMatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Matcher over a caller-supplied filename table. Content tiers are fixed.
    pub fn with_filename_rules(filename_rules: &'static [FilenameRule]) -> Self {
        Self { filename_rules }
    }

    pub fn evaluate(&self, filename: &str, text: &str) -> RuleMatch {
        if let Some(m) = self.match_filename(filename) {
            tracing::debug!(filename, category = %m.category, "Filename rule matched");
            return m;
        }

        let text_lower = text.to_lowercase();
        if !text_lower.trim().is_empty() {
            if let Some(m) = self.match_content(&text_lower) {
                tracing::debug!(filename, category = %m.category, hits = m.hits, method = %m.method, "Content rule matched");
                return m;
            }
        }

        RuleMatch::fallback()
    }

    pub fn match_filename(&self, filename: &str) -> Option<RuleMatch> {
        let lower = filename.to_lowercase();
        let rule = self
            .filename_rules
            .iter()
            .find(|rule| rule.keywords.iter().any(|kw| lower.contains(kw)))?;

        let category = if rule.category == FALLBACK_CATEGORY
            && INVOICE_FILENAME_TOKENS.iter().any(|t| lower.contains(t))
        {
            INVOICE_CATEGORY
        } else {
            rule.category
        };

        Some(RuleMatch::new(category, FILENAME_CONFIDENCE, RuleMethod::Filename, 0))
    }

    /// Content tiers over already-lowercased text.
    pub fn match_content(&self, text_lower: &str) -> Option<RuleMatch> {
        for tier in Tier::ALL {
            for rule in tier.rules() {
                let hits = rule.hits(text_lower);
                if hits == 0 || hits < rule.min_hits || rule.vetoed(text_lower) {
                    continue;
                }
                return Some(RuleMatch::new(rule.category, tier.confidence(hits), tier.method(), hits));
            }
        }
        None
    }
}
