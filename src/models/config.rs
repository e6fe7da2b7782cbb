//! Application configuration structures.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::MediaKind;

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// HTTP client behavior settings
    #[serde(default)]
    pub http: HttpConfig,

    /// Aggregated search behavior
    #[serde(default)]
    pub search: SearchConfig,

    /// Readarr instance endpoints
    #[serde(default)]
    pub readarr: ReadarrConfig,

    /// Catalog matching thresholds
    #[serde(default)]
    pub matching: MatchingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.http.user_agent.trim().is_empty() {
            return Err(AppError::validation("http.user_agent is empty"));
        }
        if self.http.timeout_secs == 0 {
            return Err(AppError::validation("http.timeout_secs must be > 0"));
        }
        if self.search.provider_timeout_secs == 0 {
            return Err(AppError::validation(
                "search.provider_timeout_secs must be > 0",
            ));
        }
        if self.search.overall_timeout_secs < self.search.provider_timeout_secs {
            return Err(AppError::validation(
                "search.overall_timeout_secs must be >= search.provider_timeout_secs",
            ));
        }
        if self.search.detail_concurrency == 0 {
            return Err(AppError::validation(
                "search.detail_concurrency must be > 0",
            ));
        }
        if self.search.max_results_per_provider == 0 {
            return Err(AppError::validation(
                "search.max_results_per_provider must be > 0",
            ));
        }
        for (name, threshold) in [
            ("matching.title_threshold", self.matching.title_threshold),
            ("matching.author_threshold", self.matching.author_threshold),
        ] {
            if !(0.0..=1.0).contains(&threshold) || threshold == 0.0 {
                return Err(AppError::validation(format!(
                    "{name} must be within (0.0, 1.0]"
                )));
            }
        }
        for instance in [&self.readarr.ebook, &self.readarr.audiobook]
            .into_iter()
            .flatten()
        {
            if instance.base_url.trim().is_empty() {
                return Err(AppError::validation("readarr base_url is empty"));
            }
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http: HttpConfig::default(),
            search: SearchConfig::default(),
            readarr: ReadarrConfig::default(),
            matching: MatchingConfig::default(),
        }
    }
}

/// HTTP client behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Delay between scraped detail-page requests in milliseconds
    #[serde(default = "defaults::request_delay")]
    pub request_delay_ms: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            request_delay_ms: defaults::request_delay(),
        }
    }
}

/// Aggregated search behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Time budget for a single provider call, in seconds
    #[serde(default = "defaults::provider_timeout")]
    pub provider_timeout_secs: u64,

    /// Shared deadline for the whole aggregation pass, in seconds
    #[serde(default = "defaults::overall_timeout")]
    pub overall_timeout_secs: u64,

    /// Concurrency cap for scraped detail-page fetches
    #[serde(default = "defaults::detail_concurrency")]
    pub detail_concurrency: usize,

    /// Maximum raw results taken from a single provider
    #[serde(default = "defaults::max_results_per_provider")]
    pub max_results_per_provider: usize,

    /// Per-provider enable flags
    #[serde(default)]
    pub providers: ProviderToggles,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            provider_timeout_secs: defaults::provider_timeout(),
            overall_timeout_secs: defaults::overall_timeout(),
            detail_concurrency: defaults::detail_concurrency(),
            max_results_per_provider: defaults::max_results_per_provider(),
            providers: ProviderToggles::default(),
        }
    }
}

/// Per-provider enable flags, passed explicitly into the aggregator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderToggles {
    #[serde(default = "defaults::enabled")]
    pub amazon: bool,

    #[serde(default = "defaults::enabled")]
    pub open_library: bool,

    #[serde(default = "defaults::enabled")]
    pub readarr: bool,
}

impl Default for ProviderToggles {
    fn default() -> Self {
        Self {
            amazon: true,
            open_library: true,
            readarr: true,
        }
    }
}

/// Readarr instance endpoints, one per media kind.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReadarrConfig {
    /// Instance handling ebook requests
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ebook: Option<ReadarrInstance>,

    /// Instance handling audiobook requests
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audiobook: Option<ReadarrInstance>,
}

impl ReadarrConfig {
    /// The instance configured for a media kind, if any.
    pub fn instance(&self, kind: MediaKind) -> Option<&ReadarrInstance> {
        match kind {
            MediaKind::Ebook => self.ebook.as_ref(),
            MediaKind::Audiobook => self.audiobook.as_ref(),
        }
    }
}

/// Connection settings for one Readarr instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadarrInstance {
    /// Base URL, e.g. `http://localhost:8787`
    pub base_url: String,

    /// API key sent in the `X-Api-Key` header
    #[serde(default)]
    pub api_key: String,
}

/// Catalog matching thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchingConfig {
    /// Minimum normalized title similarity for a fuzzy match
    #[serde(default = "defaults::title_threshold")]
    pub title_threshold: f64,

    /// Minimum normalized author similarity for a fuzzy match
    #[serde(default = "defaults::author_threshold")]
    pub author_threshold: f64,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            title_threshold: defaults::title_threshold(),
            author_threshold: defaults::author_threshold(),
        }
    }
}

mod defaults {
    // HTTP defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; bookscout/0.1)".into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn request_delay() -> u64 {
        250
    }

    // Search defaults
    pub fn provider_timeout() -> u64 {
        10
    }
    pub fn overall_timeout() -> u64 {
        15
    }
    pub fn detail_concurrency() -> usize {
        4
    }
    pub fn max_results_per_provider() -> usize {
        10
    }
    pub fn enabled() -> bool {
        true
    }

    // Matching defaults. The title threshold sits above jaro-winkler scores
    // for shared-prefix series titles ("Dune" vs "Dune Messiah" ~0.87).
    pub fn title_threshold() -> f64 {
        0.90
    }
    pub fn author_threshold() -> f64 {
        0.85
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_user_agent() {
        let mut config = Config::default();
        config.http.user_agent = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_concurrency() {
        let mut config = Config::default();
        config.search.detail_concurrency = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_overall_timeout_below_provider_timeout() {
        let mut config = Config::default();
        config.search.overall_timeout_secs = 2;
        config.search.provider_timeout_secs = 10;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_out_of_range_threshold() {
        let mut config = Config::default();
        config.matching.title_threshold = 1.5;
        assert!(config.validate().is_err());

        config.matching.title_threshold = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_blank_readarr_base_url() {
        let mut config = Config::default();
        config.readarr.ebook = Some(ReadarrInstance {
            base_url: "  ".to_string(),
            api_key: String::new(),
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn load_parses_toml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
[http]
user_agent = "test-agent"
timeout_secs = 5

[search]
provider_timeout_secs = 2
overall_timeout_secs = 4

[search.providers]
amazon = false

[readarr.ebook]
base_url = "http://localhost:8787"
api_key = "secret"

[matching]
title_threshold = 0.92
"#
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.http.user_agent, "test-agent");
        assert_eq!(config.search.provider_timeout_secs, 2);
        assert!(!config.search.providers.amazon);
        assert!(config.search.providers.open_library);
        assert_eq!(
            config.readarr.instance(MediaKind::Ebook).unwrap().base_url,
            "http://localhost:8787"
        );
        assert_eq!(config.readarr.instance(MediaKind::Audiobook), None);
        assert!((config.matching.title_threshold - 0.92).abs() < f64::EPSILON);
        assert!((config.matching.author_threshold - 0.85).abs() < f64::EPSILON);
    }
}
