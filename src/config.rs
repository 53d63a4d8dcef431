//! Analyzer configuration.
//!
//! Configuration is layered with the `config` crate: built-in defaults, then an
//! optional file, then `RULE_ANALYZER__*` environment variables
//! (e.g. `RULE_ANALYZER__ANALYSIS__OVERLAP_THRESHOLD=0.4`).

use crate::{Error, Result};

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Environment variable prefix for configuration overrides.
pub const ENV_PREFIX: &str = "RULE_ANALYZER";

/// Top-level analyzer configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Conflict detection settings
    pub analysis: AnalysisConfig,
    /// Recommendation generator settings
    pub recommendations: RecommendationConfig,
    /// Conflict result cache settings
    pub cache: CacheConfig,
    /// Telemetry and logging settings
    pub telemetry: TelemetryConfig,
}

impl Config {
    /// Load configuration from defaults and environment variables.
    pub fn from_env() -> Result<Self> {
        Self::load(None)
    }

    /// Load configuration from a file, with environment variables layered on top.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::load(Some(path.as_ref()))
    }

    fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder =
            config::Config::builder().add_source(config::Config::try_from(&Config::default())?);

        if let Some(path) = path {
            if !path.exists() {
                return Err(Error::config(format!(
                    "Configuration file not found: {}",
                    path.display()
                )));
            }
            builder = builder.add_source(config::File::from(path));
        }

        let config: Config = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Validate every section.
    pub fn validate(&self) -> Result<()> {
        self.analysis.validate()?;
        self.recommendations.validate()?;
        self.cache.validate()?;
        Ok(())
    }
}

/// Thresholds used by the conflict detectors.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Minimum (exclusive) pattern overlap score that raises a conflict
    pub overlap_threshold: f64,
    /// Minimum (exclusive) cosine similarity for fuzzy redundancy
    pub redundancy_similarity_threshold: f64,
    /// Use the vector similarity backend when it is compiled in
    pub fuzzy_redundancy: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            overlap_threshold: 0.3,
            redundancy_similarity_threshold: 0.8,
            fuzzy_redundancy: true,
        }
    }
}

impl AnalysisConfig {
    fn validate(&self) -> Result<()> {
        check_unit_interval(self.overlap_threshold, "analysis.overlap_threshold")?;
        check_unit_interval(
            self.redundancy_similarity_threshold,
            "analysis.redundancy_similarity_threshold",
        )
    }
}

/// Thresholds used by the recommendation generator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommendationConfig {
    /// False positive rate above which a rule needs tuning
    pub false_positive_rate_threshold: f64,
    /// Effectiveness score below which a rule needs review
    pub effectiveness_threshold: f64,
    /// Patterns shorter than this (in characters) are considered too broad
    pub min_pattern_length: usize,
}

impl Default for RecommendationConfig {
    fn default() -> Self {
        Self {
            false_positive_rate_threshold: 0.3,
            effectiveness_threshold: 0.6,
            min_pattern_length: 10,
        }
    }
}

impl RecommendationConfig {
    fn validate(&self) -> Result<()> {
        check_unit_interval(
            self.false_positive_rate_threshold,
            "recommendations.false_positive_rate_threshold",
        )?;
        check_unit_interval(
            self.effectiveness_threshold,
            "recommendations.effectiveness_threshold",
        )?;
        if self.min_pattern_length == 0 {
            return Err(Error::config_key(
                "min_pattern_length must be at least 1",
                "recommendations.min_pattern_length",
            ));
        }
        Ok(())
    }
}

/// Conflict result cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Whether conflict results are cached by rule-set fingerprint
    pub enabled: bool,
    /// Maximum number of cached rule sets
    pub max_entries: usize,
    /// Time-to-live for cached entries, in seconds
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_entries: 64,
            ttl_secs: 300,
        }
    }
}

impl CacheConfig {
    /// TTL as a duration.
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    fn validate(&self) -> Result<()> {
        if self.enabled && self.max_entries == 0 {
            return Err(Error::config_key(
                "max_entries must be at least 1 when the cache is enabled",
                "cache.max_entries",
            ));
        }
        Ok(())
    }
}

/// Telemetry and logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Whether analysis counters are collected
    pub enabled: bool,
    /// Service name reported in logs
    pub service_name: String,
    /// Default log level for the CLI
    pub log_level: String,
    /// Emit JSON formatted logs
    pub json_logs: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            service_name: "policy-rule-analyzer".to_string(),
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

fn check_unit_interval(value: f64, key: &str) -> Result<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(Error::config_key(
            format!("{} must be within [0, 1], got {}", key, value),
            key,
        ));
    }
    Ok(())
}
