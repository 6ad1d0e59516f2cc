//! Content features used to confirm or doubt a rule verdict.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use super::{SEMANTIC_BOOST, SEMANTIC_MIN_TEXT_CHARS, SEMANTIC_NO_TEXT, SEMANTIC_PENALTY};

static CPF: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d{3}\.\d{3}\.\d{3}-\d{2}").unwrap());
static RG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d{1,2}\.\d{3}\.\d{3}-\d{1,2}").unwrap());
static CNPJ: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d{2}\.\d{3}\.\d{3}/\d{4}-\d{2}").unwrap());
static CEP: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d{5}-?\d{3}").unwrap());
static MONEY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"R\$\s*\d+[,.]?\d*").unwrap());

/// Words that mark a document as French. Anything else is treated as Portuguese.
const FRENCH_MARKERS: &[&str] = &["monsieur", "madame", "attestation", "tribunal"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    French,
    Portuguese,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SemanticFeatures {
    pub has_cpf: bool,
    pub has_rg: bool,
    pub has_cnpj: bool,
    pub has_cep: bool,
    pub has_money: bool,
    pub has_kwh: bool,
    pub has_m3: bool,
    pub has_tribunal: bool,
    pub has_attestation: bool,
    pub has_salaire: bool,
    pub language: Language,
}

impl SemanticFeatures {
    pub fn extract(text: &str) -> Self {
        let lower = text.to_lowercase();
        let language = if FRENCH_MARKERS.iter().any(|m| lower.contains(m)) {
            Language::French
        } else {
            Language::Portuguese
        };
        Self {
            has_cpf: CPF.is_match(text),
            has_rg: RG.is_match(text),
            has_cnpj: CNPJ.is_match(text),
            has_cep: CEP.is_match(text),
            has_money: MONEY.is_match(text),
            has_kwh: lower.contains("kwh"),
            has_m3: lower.contains("m³") || lower.contains("m3"),
            has_tribunal: lower.contains("tribunal"),
            has_attestation: lower.contains("attestation"),
            has_salaire: lower.contains("salaire") || lower.contains("bulletin"),
            language,
        }
    }
}

/// Whether the text supports `category`. `None` when the category has no
/// validation predicate.
pub fn validate_category(category: &str, text: &str) -> Option<bool> {
    let f = SemanticFeatures::extract(text);
    let lower = text.to_lowercase();
    let has = |needle: &str| lower.contains(needle);

    let holds = match category {
        "rg" => f.has_rg || has("registro geral") || has("identidade"),
        "cpf" => f.has_cpf || has("cadastro de pessoa"),
        "conta_luz" => f.has_kwh || has("energia") || has("cemig"),
        "conta_agua" => f.has_m3 || has("saneamento") || has("sabesp"),
        "bulletin_salaire" => f.has_salaire && f.language == Language::French,
        "attestation_honneur" => f.has_attestation && has("honneur"),
        "refere_suspension" => f.has_tribunal && has("référé"),
        "extrato_bancario" => has("saldo") || has("extrato"),
        "nota_fiscal" => f.has_cnpj || has("nota fiscal"),
        _ => return None,
    };
    Some(holds)
}

/// Multiplier applied to a rule confidence: boost when the predicate holds,
/// penalty when it fails, neutral for categories without one, and a fixed
/// factor when there is too little text to judge.
pub fn validation_factor(category: &str, text: &str) -> f64 {
    if text.chars().count() < SEMANTIC_MIN_TEXT_CHARS {
        return SEMANTIC_NO_TEXT;
    }
    match validate_category(category, text) {
        Some(true) => SEMANTIC_BOOST,
        Some(false) => SEMANTIC_PENALTY,
        None => 1.0,
    }
}

/// High-precision markers used to break disagreements between two
/// confident opinions.
const SPECIFICITY_MARKERS: &[(&str, &[&str])] = &[
    ("passaporte", &["república federativa", "federal republic", "passport"]),
    ("rg", &["registro geral", "carteira de identidade"]),
    ("cpf", &["cadastro de pessoa física", "receita federal"]),
    ("cnh", &["carteira nacional de habilitação", "detran"]),
    ("conta_luz", &["kwh", "energia elétrica", "distribuidora"]),
    ("conta_agua", &["m³", "saneamento básico"]),
    ("extrato_bancario", &["saldo anterior", "saldo atual", "conta corrente"]),
    ("nota_fiscal", &["cnpj", "nota fiscal eletrônica", "chave de acesso"]),
];

pub fn specificity_markers(category: &str, text: &str) -> usize {
    let lower = text.to_lowercase();
    SPECIFICITY_MARKERS
        .iter()
        .find(|(c, _)| *c == category)
        .map(|(_, markers)| markers.iter().filter(|m| lower.contains(*m)).count())
        .unwrap_or(0)
}
