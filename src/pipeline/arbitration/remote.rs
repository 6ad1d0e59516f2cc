use std::sync::atomic::{AtomicUsize, Ordering};

use serde::{Deserialize, Serialize};

use super::{RemoteClassifier, RemoteError, RemoteOpinion, SEMANTIC_MIN_TEXT_CHARS};
use crate::config::ClassifierConfig;
use crate::pipeline::categories::{CategoryCatalog, FALLBACK_CATEGORY};

/// Characters of document text sent to the model.
const PROMPT_TEXT_LIMIT: usize = 2000;

const SYSTEM_PROMPT: &str = "You classify personal and administrative documents. \
Answer with exactly one category key from the list and nothing else.";

/// Ollama-backed remote classifier.
pub struct OllamaClassifier {
    base_url: String,
    model: String,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl OllamaClassifier {
    pub fn new(base_url: &str, model: &str, timeout_secs: u64) -> Result<Self, RemoteError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| RemoteError::Http(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            client,
            timeout_secs,
        })
    }

    /// Classifier for `config.remote_url`, or `None` when no URL is set.
    pub fn from_config(config: &ClassifierConfig) -> Result<Option<Self>, RemoteError> {
        config
            .remote_url
            .as_deref()
            .map(|url| Self::new(url, &config.remote_model, config.remote_timeout_secs))
            .transpose()
    }

    fn generate(&self, prompt: &str) -> Result<String, RemoteError> {
        let url = format!("{}/api/generate", self.base_url);
        let body = GenerateRequest {
            model: &self.model,
            prompt,
            system: SYSTEM_PROMPT,
            stream: false,
        };

        let response = self.client.post(&url).json(&body).send().map_err(|e| {
            if e.is_connect() {
                RemoteError::Connection(self.base_url.clone())
            } else if e.is_timeout() {
                RemoteError::Http(format!("Request timed out after {}s", self.timeout_secs))
            } else {
                RemoteError::Http(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(RemoteError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateResponse = response
            .json()
            .map_err(|e| RemoteError::ResponseParsing(e.to_string()))?;
        Ok(parsed.response)
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    system: &'a str,
    stream: bool,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

impl RemoteClassifier for OllamaClassifier {
    fn classify(&self, filename: &str, text: &str, catalog: &CategoryCatalog) -> Result<RemoteOpinion, RemoteError> {
        let prompt = build_prompt(filename, text, catalog);
        let reply = self.generate(&prompt)?;
        let opinion = RemoteOpinion {
            category: parse_reply(&reply, catalog),
            confidence: reply_confidence(text),
        };
        tracing::debug!(filename, category = %opinion.category, model = %self.model, "Remote opinion received");
        Ok(opinion)
    }
}

/// Category list followed by the document text, or by the filename when
/// there is too little text to judge.
pub fn build_prompt(filename: &str, text: &str, catalog: &CategoryCatalog) -> String {
    let mut prompt = String::from("Categories:\n");
    for entry in catalog.entries() {
        prompt.push_str(&format!("- {}: {}\n", entry.id, entry.display_name));
    }

    let trimmed = text.trim();
    if trimmed.chars().count() >= SEMANTIC_MIN_TEXT_CHARS {
        let excerpt: String = trimmed.chars().take(PROMPT_TEXT_LIMIT).collect();
        prompt.push_str(&format!("\nDocument text:\n{excerpt}\n"));
    } else {
        prompt.push_str(&format!("\nNo readable text. Filename: {filename}\n"));
    }
    prompt.push_str("\nCategory key:");
    prompt
}

/// Map a model reply to a catalog id; anything unrecognised is the fallback.
pub fn parse_reply(reply: &str, catalog: &CategoryCatalog) -> String {
    let key = reply
        .trim()
        .trim_matches(|c: char| c == '"' || c == '\'' || c == '`' || c == '.')
        .to_lowercase();
    if catalog.contains(&key) {
        key
    } else {
        FALLBACK_CATEGORY.to_string()
    }
}

/// Fixed confidence by how much text the model saw.
pub fn reply_confidence(text: &str) -> f64 {
    match text.trim().chars().count() {
        n if n >= 50 => 0.9,
        n if n < SEMANTIC_MIN_TEXT_CHARS => 0.5,
        _ => 0.8,
    }
}

/// Remote classifier returning a fixed opinion, or failing.
pub struct MockRemoteClassifier {
    opinion: Option<RemoteOpinion>,
    calls: AtomicUsize,
}

impl MockRemoteClassifier {
    pub fn new(category: &str, confidence: f64) -> Self {
        Self {
            opinion: Some(RemoteOpinion {
                category: category.to_string(),
                confidence,
            }),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            opinion: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl RemoteClassifier for MockRemoteClassifier {
    fn classify(&self, _filename: &str, _text: &str, _catalog: &CategoryCatalog) -> Result<RemoteOpinion, RemoteError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.opinion
            .clone()
            .ok_or_else(|| RemoteError::Connection("mock".into()))
    }
}
