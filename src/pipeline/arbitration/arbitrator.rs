use std::path::Path;
use std::sync::Arc;

use super::*;
use crate::config::ClassifierConfig;
use crate::pipeline::categories::{is_fallback, CategoryCatalog, FALLBACK_CATEGORY, PEOPLE_PHOTO_CATEGORY};
use crate::pipeline::learning::{LearnedSuggestion, PatternStore};
use crate::pipeline::rules::{RuleMatch, RuleMatcher};

/// Combines the rule verdict, the learned suggestion and the optional
/// remote opinion into one result, and records every verdict in the
/// learning history.
pub struct DecisionArbitrator {
    rules: RuleMatcher,
    store: Arc<PatternStore>,
    catalog: CategoryCatalog,
    remote: Option<Arc<dyn RemoteClassifier>>,
    photo_detector: Option<Arc<dyn PeoplePhotoDetector>>,
    remote_floor: f64,
    remote_cutoff: f64,
    photo_threshold: f64,
}

impl DecisionArbitrator {
    pub fn new(store: Arc<PatternStore>, catalog: CategoryCatalog) -> Self {
        Self {
            rules: RuleMatcher::new(),
            store,
            catalog,
            remote: None,
            photo_detector: None,
            remote_floor: REMOTE_FLOOR,
            remote_cutoff: REMOTE_CUTOFF,
            photo_threshold: PEOPLE_PHOTO_THRESHOLD,
        }
    }

    pub fn with_remote(mut self, remote: Arc<dyn RemoteClassifier>) -> Self {
        self.remote = Some(remote);
        self
    }

    pub fn with_photo_detector(mut self, detector: Arc<dyn PeoplePhotoDetector>) -> Self {
        self.photo_detector = Some(detector);
        self
    }

    /// Take the remote band and photo threshold from `config`.
    pub fn with_config(mut self, config: &ClassifierConfig) -> Self {
        self.remote_floor = config.remote_floor;
        self.remote_cutoff = config.remote_cutoff;
        self.photo_threshold = config.photo_threshold;
        self
    }

    pub fn catalog(&self) -> &CategoryCatalog {
        &self.catalog
    }

    pub fn store(&self) -> &Arc<PatternStore> {
        &self.store
    }

    /// Full decision for one file: people-photo check, rules, learned
    /// suggestion, then arbitration.
    pub fn classify(&self, path: &Path, text: &str) -> ClassificationResult {
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        if let Some(score) = self.photo_detector.as_ref().and_then(|d| d.people_confidence(path)) {
            if score > self.photo_threshold {
                tracing::debug!(filename = %filename, score, "People photo detected");
                let result = self.result(PEOPLE_PHOTO_CATEGORY, Confidence::Score(score), DecisionMethod::PeoplePhoto, None);
                self.record(&filename, &result, text);
                return result;
            }
        }

        let rule = self.rules.evaluate(&filename, text);
        let learned = match self.store.suggest(&filename, text) {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(filename = %filename, error = %e, "Learned suggestion unavailable");
                None
            }
        };

        self.decide(&filename, text, &rule, learned.as_ref())
    }

    /// Arbitrate between an already computed rule verdict and learned
    /// suggestion. The verdict is recorded before it is returned.
    pub fn decide(
        &self,
        filename: &str,
        text: &str,
        rule: &RuleMatch,
        learned: Option<&LearnedSuggestion>,
    ) -> ClassificationResult {
        let validated = (rule.confidence * validation_factor(&rule.category, text)).min(VALIDATED_CONFIDENCE_CAP);

        let mut result = if is_fallback(&rule.category) {
            self.result(FALLBACK_CATEGORY, Confidence::NotApplicable, DecisionMethod::Fallback, None)
        } else if validated <= 0.0 {
            self.result(
                &rule.category,
                Confidence::Score(SPECIFIC_CATEGORY_FLOOR),
                DecisionMethod::RulesOnly,
                Some(rule.method.to_string()),
            )
        } else {
            match learned {
                Some(l) if l.category == rule.category && l.confidence > LEARNING_CONSENSUS_MIN => {
                    let combined = ((validated + l.confidence) / 2.0 + LEARNING_CONSENSUS_BONUS).min(LEARNING_CONSENSUS_CAP);
                    self.result(
                        &rule.category,
                        Confidence::Score(combined),
                        DecisionMethod::RulesLearningConsensus,
                        Some(format!("{} + {} learned patterns", rule.method, l.matched_patterns)),
                    )
                }
                _ => self.result(
                    &rule.category,
                    Confidence::Score(validated),
                    DecisionMethod::RulesOnly,
                    Some(rule.method.to_string()),
                ),
            }
        };

        if is_fallback(&result.category) {
            if let Some(l) = learned {
                if l.confidence > LEARNING_FALLBACK_MIN && !is_fallback(&l.category) {
                    result = self.result(
                        &l.category,
                        Confidence::Score(l.confidence),
                        DecisionMethod::LearningFallback,
                        Some(format!("{} learned patterns", l.matched_patterns)),
                    );
                }
            }
        } else if validated >= self.remote_floor && validated < self.remote_cutoff {
            if let Some(cross) = self.cross_validate(filename, text, &rule.category, validated) {
                result = cross;
            }
        }

        tracing::debug!(
            filename,
            category = %result.category,
            confidence = %result.confidence,
            method = %result.method,
            "Classification decided"
        );
        self.record(filename, &result, text);
        result
    }

    /// Consult the remote classifier. `None` keeps the local verdict.
    fn cross_validate(&self, filename: &str, text: &str, category: &str, validated: f64) -> Option<ClassificationResult> {
        let remote = self.remote.as_ref()?;
        let opinion = match remote.classify(filename, text, &self.catalog) {
            Ok(o) => o,
            Err(e) => {
                tracing::warn!(filename, error = %e, "Remote cross-validation failed");
                return None;
            }
        };
        if is_fallback(&opinion.category) || !self.catalog.contains(&opinion.category) {
            return None;
        }
        let details = Some(format!("remote: {} ({:.2})", opinion.category, opinion.confidence));

        if opinion.category == category {
            if validated >= REMOTE_AGREEMENT_MIN && opinion.confidence >= REMOTE_AGREEMENT_MIN {
                let combined = ((validated + opinion.confidence) / 2.0 + REMOTE_AGREEMENT_BONUS).min(REMOTE_AGREEMENT_CAP);
                return Some(self.result(category, Confidence::Score(combined), DecisionMethod::RulesRemoteConsensus, details));
            }
            return None;
        }

        if validated < REMOTE_DISAGREEMENT_MIN || opinion.confidence < REMOTE_DISAGREEMENT_MIN {
            return None;
        }

        let local_markers = specificity_markers(category, text);
        let remote_markers = specificity_markers(&opinion.category, text);
        let local = |method| self.result(category, Confidence::Score(validated), method, details.clone());
        let remote = |method| self.result(&opinion.category, Confidence::Score(opinion.confidence), method, details.clone());

        let chosen = if local_markers > remote_markers {
            local(DecisionMethod::RulesSpecificity)
        } else if remote_markers > local_markers {
            remote(DecisionMethod::RemoteSpecificity)
        } else if validated >= opinion.confidence {
            local(DecisionMethod::ConfidencePriority)
        } else {
            remote(DecisionMethod::ConfidencePriority)
        };
        Some(chosen)
    }

    fn result(
        &self,
        category: &str,
        confidence: Confidence,
        method: DecisionMethod,
        details: Option<String>,
    ) -> ClassificationResult {
        ClassificationResult {
            category: category.to_string(),
            category_name: self.catalog.display_name(category),
            confidence,
            method,
            details,
        }
    }

    fn record(&self, filename: &str, result: &ClassificationResult, text: &str) {
        if let Err(e) = self
            .store
            .record_outcome(filename, &result.category, result.confidence.as_f64(), text)
        {
            tracing::warn!(filename, error = %e, "Failed to record classification");
        }
    }
}

/// Photo detector returning a fixed score for every file.
pub struct MockPhotoDetector {
    score: Option<f64>,
}

impl MockPhotoDetector {
    pub fn new(score: Option<f64>) -> Self {
        Self { score }
    }
}

impl PeoplePhotoDetector for MockPhotoDetector {
    fn people_confidence(&self, _path: &Path) -> Option<f64> {
        self.score
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::rules::RuleMethod;

    fn arbitrator() -> DecisionArbitrator {
        DecisionArbitrator::new(Arc::new(PatternStore::in_memory().unwrap()), CategoryCatalog::default())
    }

    fn rule(category: &str, confidence: f64) -> RuleMatch {
        RuleMatch {
            category: category.to_string(),
            confidence,
            method: RuleMethod::Filename,
            hits: 0,
        }
    }

    fn learned(category: &str, confidence: f64) -> LearnedSuggestion {
        LearnedSuggestion {
            category: category.to_string(),
            confidence,
            matched_patterns: 2,
        }
    }

    fn score(result: &ClassificationResult) -> f64 {
        result.confidence.as_f64().unwrap()
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    const NEUTRAL_TEXT: &str = "Instrumento particular firmado entre as partes abaixo";

    #[test]
    fn filename_rule_with_supporting_text() {
        let a = arbitrator();
        let r = a.classify(Path::new("/in/cemig_janeiro.pdf"), "Conta de energia elétrica - consumo 150 kWh");
        assert_eq!(r.category, "conta_luz");
        assert_eq!(r.category_name, "Contas de Luz");
        assert!(score(&r) >= 0.8);
        assert_eq!(r.method, DecisionMethod::RulesOnly);
    }

    #[test]
    fn validated_confidence_is_capped() {
        let a = arbitrator();
        let r = a.decide("x.pdf", "Registro geral 12.345.678-9", &rule("rg", 0.9), None);
        assert!(approx(score(&r), VALIDATED_CONFIDENCE_CAP));
    }

    #[test]
    fn fallback_reports_not_applicable() {
        let a = arbitrator();
        let r = a.classify(Path::new("scan_0001.pdf"), "");
        assert_eq!(r.category, FALLBACK_CATEGORY);
        assert_eq!(r.confidence, Confidence::NotApplicable);
        assert_eq!(r.method, DecisionMethod::Fallback);
    }

    #[test]
    fn short_text_halves_rule_confidence() {
        let a = arbitrator();
        let r = a.decide("contrato.pdf", "", &rule("contrato", 0.8), None);
        assert!(approx(score(&r), 0.4));
        assert_eq!(r.method, DecisionMethod::RulesOnly);
    }

    #[test]
    fn zero_confidence_specific_category_gets_floor() {
        let a = arbitrator();
        let r = a.decide("contrato.pdf", NEUTRAL_TEXT, &rule("contrato", 0.0), None);
        assert!(approx(score(&r), SPECIFIC_CATEGORY_FLOOR));
        assert_eq!(r.method, DecisionMethod::RulesOnly);
    }

    #[test]
    fn agreeing_learned_suggestion_boosts() {
        let a = arbitrator();
        let r = a.decide("contrato.pdf", "", &rule("contrato", 0.8), Some(&learned("contrato", 1.0)));
        // (0.4 + 1.0) / 2 + 0.15
        assert!(approx(score(&r), 0.85));
        assert_eq!(r.method, DecisionMethod::RulesLearningConsensus);

        let capped = a.decide("contrato.pdf", NEUTRAL_TEXT, &rule("contrato", 0.9), Some(&learned("contrato", 1.0)));
        assert!(approx(score(&capped), LEARNING_CONSENSUS_CAP));
    }

    #[test]
    fn weak_or_disagreeing_learning_is_ignored() {
        let a = arbitrator();
        let weak = a.decide("contrato.pdf", NEUTRAL_TEXT, &rule("contrato", 0.8), Some(&learned("contrato", 0.7)));
        assert_eq!(weak.method, DecisionMethod::RulesOnly);

        let other = a.decide("contrato.pdf", NEUTRAL_TEXT, &rule("contrato", 0.8), Some(&learned("recibo", 0.95)));
        assert_eq!(other.category, "contrato");
        assert_eq!(other.method, DecisionMethod::RulesOnly);
    }

    #[test]
    fn learning_rescues_fallback() {
        let a = arbitrator();
        let r = a.decide("scan.pdf", "", &RuleMatch::fallback(), Some(&learned("conta_luz", 0.65)));
        assert_eq!(r.category, "conta_luz");
        assert!(approx(score(&r), 0.65));
        assert_eq!(r.method, DecisionMethod::LearningFallback);

        let weak = a.decide("scan.pdf", "", &RuleMatch::fallback(), Some(&learned("conta_luz", 0.6)));
        assert_eq!(weak.confidence, Confidence::NotApplicable);

        let to_fallback = a.decide("scan.pdf", "", &RuleMatch::fallback(), Some(&learned(FALLBACK_CATEGORY, 0.9)));
        assert_eq!(to_fallback.confidence, Confidence::NotApplicable);
    }

    #[test]
    fn stored_feedback_drives_learning_fallback() {
        let a = arbitrator();
        a.store().reinforce_positive("scan_0001.pdf", "conta_luz").unwrap();

        let r = a.classify(Path::new("scan_0001.pdf"), "");
        assert_eq!(r.category, "conta_luz");
        assert_eq!(r.method, DecisionMethod::LearningFallback);
    }

    #[test]
    fn remote_agreement_raises_confidence() {
        let remote = Arc::new(MockRemoteClassifier::new("contrato", 0.9));
        let a = arbitrator().with_remote(remote.clone());
        let r = a.decide("contrato.pdf", NEUTRAL_TEXT, &rule("contrato", 0.8), None);
        assert_eq!(remote.calls(), 1);
        assert!(approx(score(&r), 0.98));
        assert_eq!(r.method, DecisionMethod::RulesRemoteConsensus);
    }

    #[test]
    fn remote_skipped_outside_band() {
        let remote = Arc::new(MockRemoteClassifier::new("recibo", 0.99));
        let a = arbitrator().with_remote(remote.clone());

        let high = a.decide("contrato.pdf", NEUTRAL_TEXT, &rule("contrato", 0.9), None);
        assert_eq!(high.category, "contrato");
        let low = a.decide("contrato.pdf", "", &rule("contrato", 0.8), None);
        assert_eq!(low.category, "contrato");
        let fallback = a.decide("scan.pdf", "", &RuleMatch::fallback(), None);
        assert_eq!(fallback.confidence, Confidence::NotApplicable);

        assert_eq!(remote.calls(), 0);
    }

    #[test]
    fn remote_specificity_wins_disagreement() {
        let remote = Arc::new(MockRemoteClassifier::new("extrato_bancario", 0.85));
        let a = arbitrator().with_remote(remote);
        let text = "Saldo anterior 100,00 - saldo atual 250,00";
        let r = a.decide("contrato.pdf", text, &rule("contrato", 0.8), None);
        assert_eq!(r.category, "extrato_bancario");
        assert!(approx(score(&r), 0.85));
        assert_eq!(r.method, DecisionMethod::RemoteSpecificity);
    }

    #[test]
    fn equal_specificity_falls_to_confidence() {
        let a = arbitrator().with_remote(Arc::new(MockRemoteClassifier::new("recibo", 0.9)));
        let r = a.decide("contrato.pdf", NEUTRAL_TEXT, &rule("contrato", 0.8), None);
        assert_eq!(r.category, "recibo");
        assert_eq!(r.method, DecisionMethod::ConfidencePriority);

        let tie = arbitrator().with_remote(Arc::new(MockRemoteClassifier::new("recibo", 0.8)));
        let r = tie.decide("contrato.pdf", NEUTRAL_TEXT, &rule("contrato", 0.8), None);
        assert_eq!(r.category, "contrato");
        assert!(approx(score(&r), 0.8));
        assert_eq!(r.method, DecisionMethod::ConfidencePriority);
    }

    #[test]
    fn unsure_remote_keeps_rules() {
        let a = arbitrator().with_remote(Arc::new(MockRemoteClassifier::new("recibo", 0.75)));
        let r = a.decide("contrato.pdf", NEUTRAL_TEXT, &rule("contrato", 0.8), None);
        assert_eq!(r.category, "contrato");
        assert_eq!(r.method, DecisionMethod::RulesOnly);
    }

    #[test]
    fn remote_fallback_or_failure_keeps_rules() {
        for remote in [MockRemoteClassifier::new(FALLBACK_CATEGORY, 0.95), MockRemoteClassifier::failing()] {
            let a = arbitrator().with_remote(Arc::new(remote));
            let r = a.decide("contrato.pdf", NEUTRAL_TEXT, &rule("contrato", 0.8), None);
            assert_eq!(r.category, "contrato");
            assert!(approx(score(&r), 0.8));
            assert_eq!(r.method, DecisionMethod::RulesOnly);
        }
    }

    #[test]
    fn config_band_applies() {
        let config = ClassifierConfig {
            remote_floor: 0.95,
            ..ClassifierConfig::default()
        };
        let remote = Arc::new(MockRemoteClassifier::new("contrato", 0.9));
        let a = arbitrator().with_remote(remote.clone()).with_config(&config);
        a.decide("contrato.pdf", NEUTRAL_TEXT, &rule("contrato", 0.8), None);
        assert_eq!(remote.calls(), 0);
    }

    #[test]
    fn people_photo_overrides_rules() {
        let a = arbitrator().with_photo_detector(Arc::new(MockPhotoDetector::new(Some(0.9))));
        let r = a.classify(Path::new("rg_frente.jpg"), "");
        assert_eq!(r.category, PEOPLE_PHOTO_CATEGORY);
        assert!(approx(score(&r), 0.9));
        assert_eq!(r.method, DecisionMethod::PeoplePhoto);

        let unsure = arbitrator().with_photo_detector(Arc::new(MockPhotoDetector::new(Some(0.5))));
        assert_eq!(unsure.classify(Path::new("rg_frente.jpg"), "").category, "rg");
    }

    #[test]
    fn every_verdict_is_recorded() {
        let a = arbitrator();
        a.classify(Path::new("contrato_aluguel_2024.pdf"), NEUTRAL_TEXT);
        a.classify(Path::new("scan_0001.pdf"), "");

        let report = a.store().performance_report().unwrap();
        assert_eq!(report.total_classifications, 2);
        assert!(report.category_stats.iter().any(|s| s.category == FALLBACK_CATEGORY));
    }

    #[test]
    fn repeated_classification_is_stable() {
        let a = arbitrator();
        let path = Path::new("/docs/contrato_servicos.pdf");
        a.classify(path, NEUTRAL_TEXT);
        let second = a.classify(path, NEUTRAL_TEXT);
        let third = a.classify(path, NEUTRAL_TEXT);
        assert_eq!(second, third);
    }
}
