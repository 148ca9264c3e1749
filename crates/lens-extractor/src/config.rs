//! Configuration for the Extractor

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the extraction pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Maximum number of reviews kept per product
    pub review_cap: usize,

    /// Reviews shorter than this many characters are treated as page noise
    pub min_review_chars: usize,

    /// Stored review text is truncated to this many characters
    pub max_review_chars: usize,

    /// Number of placeholder reviews substituted when nothing was scraped
    pub fallback_review_count: usize,

    /// Substitute placeholder reviews when nothing was scraped
    pub synthesize_fallback: bool,

    /// Time limit for a single strategy attempt (seconds, 0 = unlimited)
    pub strategy_timeout_secs: u64,

    /// Candidates scanned per review probe, as a multiple of `review_cap`
    pub scan_multiplier: usize,

    /// Upper bound on extraction runs executing at the same time
    pub max_concurrent_runs: usize,

    /// Additional boilerplate patterns stripped from review candidates
    pub extra_boilerplate: Vec<String>,
}

impl ExtractorConfig {
    /// Get the strategy timeout as a Duration, if one is configured
    pub fn strategy_timeout(&self) -> Option<Duration> {
        (self.strategy_timeout_secs > 0).then(|| Duration::from_secs(self.strategy_timeout_secs))
    }

    /// Number of candidates examined per review probe
    pub fn scan_limit(&self) -> usize {
        self.review_cap.saturating_mul(self.scan_multiplier.max(1))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.review_cap == 0 {
            return Err("review_cap must be greater than 0".to_string());
        }
        if self.min_review_chars == 0 {
            return Err("min_review_chars must be greater than 0".to_string());
        }
        if self.max_review_chars < self.min_review_chars {
            return Err("max_review_chars cannot be below min_review_chars".to_string());
        }
        if self.max_concurrent_runs == 0 {
            return Err("max_concurrent_runs must be greater than 0".to_string());
        }
        if self.synthesize_fallback && self.fallback_review_count == 0 {
            return Err("fallback_review_count must be greater than 0 when fallback is enabled".to_string());
        }
        Ok(())
    }
}

impl Default for ExtractorConfig {
    /// Default configuration matching the marketplace scrapers
    fn default() -> Self {
        Self {
            review_cap: 10,
            min_review_chars: 31,
            max_review_chars: 1000,
            fallback_review_count: 6,
            synthesize_fallback: true,
            strategy_timeout_secs: 10,
            scan_multiplier: 3,
            max_concurrent_runs: 4,
            extra_boilerplate: Vec::new(),
        }
    }
}

impl ExtractorConfig {
    /// Aggressive preset: fewer reviews, short timeouts, more parallel runs
    pub fn aggressive() -> Self {
        Self {
            review_cap: 5,
            strategy_timeout_secs: 3,
            scan_multiplier: 2,
            max_concurrent_runs: 8,
            ..Self::default()
        }
    }

    /// Lenient preset: more reviews, generous timeouts, shorter minimum length
    pub fn lenient() -> Self {
        Self {
            review_cap: 30,
            min_review_chars: 10,
            max_review_chars: 2000,
            strategy_timeout_secs: 30,
            scan_multiplier: 5,
            max_concurrent_runs: 2,
            ..Self::default()
        }
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}
