use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Application-level constants
pub const APP_NAME: &str = "Doctriage";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "DOCTRIAGE_DATA_DIR";

/// Get the application data directory.
/// `$DOCTRIAGE_DATA_DIR` when set, otherwise ~/Doctriage/.
pub fn app_data_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os(DATA_DIR_ENV) {
        return PathBuf::from(dir);
    }
    dirs::home_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(APP_NAME)
}

/// Location of the learned pattern database.
pub fn patterns_db_path() -> PathBuf {
    app_data_dir().join("learning_data.db")
}

/// Default tracing filter when RUST_LOG is unset.
pub fn default_log_filter() -> &'static str {
    "doctriage_lib=info,doctriage=info"
}

/// Tunables for the classification service.
///
/// Defaults reproduce the behavioural constants of the classifier; the
/// `DOCTRIAGE_*` environment variables override individual fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Extraction cache entry lifetime in seconds.
    pub cache_ttl_secs: u64,
    /// Extraction cache capacity (entries).
    pub cache_max_entries: usize,
    /// Number of batch worker threads.
    pub worker_threads: usize,
    /// Ollama base URL for remote cross-validation. `None` disables it.
    pub remote_url: Option<String>,
    /// Model used by the remote classifier.
    pub remote_model: String,
    /// Remote request timeout in seconds.
    pub remote_timeout_secs: u64,
    /// Lowest validated rule confidence that triggers remote cross-validation.
    pub remote_floor: f64,
    /// Validated rule confidence at or above which the remote is skipped.
    pub remote_cutoff: f64,
    /// People-photo detector score above which the photo category wins.
    pub photo_threshold: f64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            cache_ttl_secs: 3600,
            cache_max_entries: 100,
            worker_threads: 4,
            remote_url: None,
            remote_model: "llama3.2".to_string(),
            remote_timeout_secs: 60,
            remote_floor: 0.70,
            remote_cutoff: 0.85,
            photo_threshold: 0.70,
        }
    }
}

impl ClassifierConfig {
    /// Defaults with `DOCTRIAGE_*` overrides applied. Unparsable values are
    /// ignored with a warning.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(v) = env_parse::<u64>("DOCTRIAGE_CACHE_TTL_SECS") {
            config.cache_ttl_secs = v;
        }
        if let Some(v) = env_parse::<usize>("DOCTRIAGE_CACHE_MAX_ENTRIES") {
            config.cache_max_entries = v;
        }
        if let Some(v) = env_parse::<usize>("DOCTRIAGE_WORKERS") {
            config.worker_threads = v.max(1);
        }
        if let Ok(url) = std::env::var("DOCTRIAGE_REMOTE_URL") {
            if !url.trim().is_empty() {
                config.remote_url = Some(url);
            }
        }
        if let Ok(model) = std::env::var("DOCTRIAGE_REMOTE_MODEL") {
            config.remote_model = model;
        }
        if let Some(v) = env_parse::<u64>("DOCTRIAGE_REMOTE_TIMEOUT_SECS") {
            config.remote_timeout_secs = v;
        }
        if let Some(v) = env_parse::<f64>("DOCTRIAGE_REMOTE_FLOOR") {
            config.remote_floor = v;
        }
        if let Some(v) = env_parse::<f64>("DOCTRIAGE_REMOTE_CUTOFF") {
            config.remote_cutoff = v;
        }
        if let Some(v) = env_parse::<f64>("DOCTRIAGE_PHOTO_THRESHOLD") {
            config.photo_threshold = v;
        }
        config
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!(key, value = raw.as_str(), "Ignoring unparsable config override");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patterns_db_under_app_data() {
        let db = patterns_db_path();
        assert!(db.starts_with(app_data_dir()));
        assert!(db.ends_with("learning_data.db"));
    }

    #[test]
    fn app_name_is_doctriage() {
        assert_eq!(APP_NAME, "Doctriage");
    }

    #[test]
    fn defaults_match_cache_contract() {
        let config = ClassifierConfig::default();
        assert_eq!(config.cache_ttl_secs, 3600);
        assert_eq!(config.cache_max_entries, 100);
        assert_eq!(config.cache_ttl(), Duration::from_secs(3600));
        assert!(config.remote_url.is_none());
    }

    #[test]
    fn remote_band_defaults() {
        let config = ClassifierConfig::default();
        assert_eq!(config.remote_floor, 0.70);
        assert_eq!(config.remote_cutoff, 0.85);
        assert!(config.remote_floor < config.remote_cutoff);
        assert_eq!(config.photo_threshold, 0.70);
    }

    // only test that sets the DOCTRIAGE_* tunables
    #[test]
    fn env_overrides_and_unparsable_values() {
        const OVERRIDES: &[(&str, &str)] = &[
            ("DOCTRIAGE_CACHE_TTL_SECS", "120"),
            ("DOCTRIAGE_CACHE_MAX_ENTRIES", "lots"),
            ("DOCTRIAGE_WORKERS", "0"),
            ("DOCTRIAGE_REMOTE_URL", "http://localhost:11434"),
            ("DOCTRIAGE_REMOTE_MODEL", "mistral"),
            ("DOCTRIAGE_REMOTE_TIMEOUT_SECS", "-5"),
            ("DOCTRIAGE_REMOTE_FLOOR", " 0.65 "),
            ("DOCTRIAGE_REMOTE_CUTOFF", "high"),
            ("DOCTRIAGE_PHOTO_THRESHOLD", "0.9"),
        ];
        let saved: Vec<(&str, Option<String>)> =
            OVERRIDES.iter().map(|(key, _)| (*key, std::env::var(key).ok())).collect();
        for (key, value) in OVERRIDES {
            std::env::set_var(key, value);
        }

        let config = ClassifierConfig::from_env();
        let defaults = ClassifierConfig::default();
        assert_eq!(config.cache_ttl_secs, 120);
        assert_eq!(config.cache_max_entries, defaults.cache_max_entries);
        assert_eq!(config.worker_threads, 1);
        assert_eq!(config.remote_url.as_deref(), Some("http://localhost:11434"));
        assert_eq!(config.remote_model, "mistral");
        assert_eq!(config.remote_timeout_secs, defaults.remote_timeout_secs);
        assert_eq!(config.remote_floor, 0.65);
        assert_eq!(config.remote_cutoff, defaults.remote_cutoff);
        assert_eq!(config.photo_threshold, 0.9);

        std::env::set_var("DOCTRIAGE_REMOTE_URL", "  ");
        assert!(ClassifierConfig::from_env().remote_url.is_none());

        for (key, value) in saved {
            match value {
                Some(v) => std::env::set_var(key, v),
                None => std::env::remove_var(key),
            }
        }
    }

    #[test]
    fn default_filter_names_both_targets() {
        assert!(default_log_filter().contains("doctriage_lib"));
    }
}
