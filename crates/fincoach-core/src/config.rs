//! Advisor configuration
//!
//! Tunables for the dispatcher and the rule engine's post-processing.
//!
//! ## Configuration Resolution
//!
//! Config is loaded with a two-layer resolution:
//! 1. Check for override in data dir (~/.local/share/fincoach/config/advisor.toml)
//! 2. Fall back to embedded defaults (compiled into binary)
//!
//! Keys missing from either file keep their built-in defaults.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::rules::{RecommendationOrder, RuleEngine};

/// Embedded default config (compiled into binary)
const DEFAULT_CONFIG: &str = include_str!("../../../config/advisor.toml");

/// Upper bound on retries; the collaborator call must stay bounded
pub const MAX_RETRIES_LIMIT: u32 = 3;

/// Dispatcher and rule-engine tunables
#[derive(Debug, Clone, PartialEq)]
pub struct AdvisorConfig {
    /// Bound on a single generation call
    pub timeout: Duration,
    /// Extra attempts after the first failure
    pub max_retries: u32,
    /// Trailing conversation turns forwarded to the backend
    pub history_window: usize,
    /// Categories embedded in the context block
    pub top_categories: usize,
    pub max_recommendations: usize,
    pub recommendation_order: RecommendationOrder,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_retries: 0,
            history_window: 6,
            top_categories: 3,
            max_recommendations: 5,
            recommendation_order: RecommendationOrder::AsEmitted,
            temperature: 0.7,
            max_tokens: 800,
        }
    }
}

impl AdvisorConfig {
    /// Load from the default override location, else the embedded defaults
    pub fn load() -> Result<Self> {
        load_config(default_config_path().as_deref())
    }

    /// Load from a specific override file (embedded defaults if it does not exist)
    pub fn load_from(path: &Path) -> Result<Self> {
        load_config(Some(path))
    }

    /// Embedded defaults only
    pub fn embedded() -> Result<Self> {
        parse_config(DEFAULT_CONFIG)
    }

    /// Rule engine configured with this config's recommendation settings
    pub fn rule_engine(&self) -> RuleEngine {
        RuleEngine::new()
            .with_max_recommendations(self.max_recommendations)
            .with_recommendation_order(self.recommendation_order)
    }
}

/// Default config override path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("fincoach").join("config").join("advisor.toml"))
}

/// Load configuration (override first, then default)
fn load_config(override_path: Option<&Path>) -> Result<AdvisorConfig> {
    let content = match override_path {
        Some(path) if path.exists() => {
            tracing::debug!(path = %path.display(), "Loading advisor config override");
            fs::read_to_string(path)
                .map_err(|e| Error::Config(format!("Failed to read config: {}", e)))?
        }
        _ => DEFAULT_CONFIG.to_string(),
    };

    parse_config(&content)
}

/// Raw config structure for TOML parsing
#[derive(Debug, Deserialize)]
struct RawConfig {
    generation: Option<RawGeneration>,
    context: Option<RawContext>,
    rules: Option<RawRules>,
}

#[derive(Debug, Deserialize)]
struct RawGeneration {
    timeout_secs: Option<u64>,
    max_retries: Option<u32>,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct RawContext {
    history_window: Option<usize>,
    top_categories: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct RawRules {
    max_recommendations: Option<usize>,
    recommendation_order: Option<String>,
}

/// Parse config from TOML content
fn parse_config(content: &str) -> Result<AdvisorConfig> {
    let raw: RawConfig = toml::from_str(content)
        .map_err(|e| Error::Config(format!("Invalid config TOML: {}", e)))?;

    let mut config = AdvisorConfig::default();

    if let Some(generation) = raw.generation {
        if let Some(timeout) = generation.timeout_secs {
            if timeout == 0 {
                return Err(Error::Config("timeout_secs must be at least 1".into()));
            }
            config.timeout = Duration::from_secs(timeout);
        }
        if let Some(retries) = generation.max_retries {
            config.max_retries = retries.min(MAX_RETRIES_LIMIT);
        }
        if let Some(temperature) = generation.temperature {
            config.temperature = temperature;
        }
        if let Some(max_tokens) = generation.max_tokens {
            config.max_tokens = max_tokens;
        }
    }

    if let Some(context) = raw.context {
        if let Some(window) = context.history_window {
            config.history_window = window;
        }
        if let Some(top) = context.top_categories {
            config.top_categories = top;
        }
    }

    if let Some(rules) = raw.rules {
        if let Some(max) = rules.max_recommendations {
            config.max_recommendations = max;
        }
        if let Some(order) = rules.recommendation_order {
            config.recommendation_order = order.parse().map_err(Error::Config)?;
        }
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_default_config() {
        let config = parse_config(DEFAULT_CONFIG).unwrap();
        assert_eq!(config, AdvisorConfig::default());
    }

    #[test]
    fn test_missing_keys_keep_defaults() {
        let config = parse_config("[context]\nhistory_window = 2\n").unwrap();
        assert_eq!(config.history_window, 2);
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.max_recommendations, 5);

        let empty = parse_config("").unwrap();
        assert_eq!(empty, AdvisorConfig::default());
    }

    #[test]
    fn test_retries_are_bounded() {
        let config = parse_config("[generation]\nmax_retries = 50\n").unwrap();
        assert_eq!(config.max_retries, MAX_RETRIES_LIMIT);
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            parse_config("[generation]\ntimeout_secs = 0\n"),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            parse_config("[rules]\nrecommendation_order = \"random\"\n"),
            Err(Error::Config(_))
        ));
        assert!(parse_config("not toml [").is_err());
    }

    #[test]
    fn test_override_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("advisor.toml");
        fs::write(
            &path,
            "[generation]\ntimeout_secs = 5\n\n[rules]\nrecommendation_order = \"by_priority\"\n",
        )
        .unwrap();

        let config = AdvisorConfig::load_from(&path).unwrap();
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.recommendation_order, RecommendationOrder::ByPriority);

        let missing = AdvisorConfig::load_from(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(missing, AdvisorConfig::default());
    }
}
