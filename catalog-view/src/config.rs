//! Catalog configuration
//!
//! # Environment variables
//!
//! | Variable | Default | Meaning |
//! |----------|---------|---------|
//! | CATALOG_SOURCE_URL | http://localhost:3000/api | HTTP source base URL |
//! | CATALOG_CATEGORY_MARKER | s | id prefix of category nodes |
//! | CATALOG_BATCH_SIZE | 16 | concurrent product fetches per batch |
//! | CATALOG_MAX_RETRIES | 2 | retries per failed product fetch |
//! | CATALOG_RETRY_BASE_DELAY_MS | 100 | backoff base delay |
//! | CATALOG_REQUEST_TIMEOUT_MS | 10000 | HTTP request timeout |
//! | CATALOG_ALLOW_PARTIAL | true | commit loads that had failed fetches |
//! | CATALOG_LARGE_TREE | false | request the large category tree |
//! | LOG_LEVEL | info | tracing filter directive |
//! | LOG_DIR | (unset) | directory for daily log files |

use std::str::FromStr;
use std::time::Duration;

use shared::models::{DEFAULT_CATEGORY_MARKER, IdConvention};

use crate::source::TreeVariant;

const DEFAULT_SOURCE_URL: &str = "http://localhost:3000/api";
const DEFAULT_BATCH_SIZE: usize = 16;
const DEFAULT_MAX_RETRIES: u32 = 2;
const DEFAULT_RETRY_BASE_DELAY_MS: u64 = 100;
const RETRY_MAX_DELAY_MS: u64 = 5_000;
const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;

/// Batched fetch tuning
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchConfig {
    /// Requests issued concurrently per batch (at least 1)
    pub batch_size: usize,
    /// Retries for an id whose fetch failed, before reporting it
    pub max_retries: u32,
    pub retry_base_delay_ms: u64,
}

impl FetchConfig {
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_retries(mut self, max_retries: u32, base_delay_ms: u64) -> Self {
        self.max_retries = max_retries;
        self.retry_base_delay_ms = base_delay_ms;
        self
    }

    /// Exponential backoff for the given retry (1-based), capped
    pub fn retry_delay(&self, retry: u32) -> Duration {
        let factor = 1u64 << retry.saturating_sub(1).min(16);
        let delay = self.retry_base_delay_ms.saturating_mul(factor);
        Duration::from_millis(delay.min(RETRY_MAX_DELAY_MS))
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_base_delay_ms: DEFAULT_RETRY_BASE_DELAY_MS,
        }
    }
}

/// Catalog configuration
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    pub source_url: String,
    pub category_marker: String,
    pub fetch: FetchConfig,
    pub request_timeout_ms: u64,
    /// Commit loads with failed fetches (failures are reported, not hidden)
    pub allow_partial: bool,
    pub large_tree: bool,
    pub log_level: String,
    pub log_dir: Option<String>,
}

impl CatalogConfig {
    /// Load `.env` if present, then read the environment
    pub fn load() -> Self {
        dotenv::dotenv().ok();
        Self::from_env()
    }

    /// Read configuration from environment variables
    ///
    /// Unset or unparseable values fall back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary key lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let fetch = FetchConfig {
            batch_size: parsed(&lookup, "CATALOG_BATCH_SIZE")
                .unwrap_or(DEFAULT_BATCH_SIZE)
                .max(1),
            max_retries: parsed(&lookup, "CATALOG_MAX_RETRIES").unwrap_or(DEFAULT_MAX_RETRIES),
            retry_base_delay_ms: parsed(&lookup, "CATALOG_RETRY_BASE_DELAY_MS")
                .unwrap_or(DEFAULT_RETRY_BASE_DELAY_MS),
        };

        Self {
            source_url: lookup("CATALOG_SOURCE_URL").unwrap_or_else(|| DEFAULT_SOURCE_URL.into()),
            category_marker: lookup("CATALOG_CATEGORY_MARKER")
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| DEFAULT_CATEGORY_MARKER.into()),
            fetch,
            request_timeout_ms: parsed(&lookup, "CATALOG_REQUEST_TIMEOUT_MS")
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_MS),
            allow_partial: parsed(&lookup, "CATALOG_ALLOW_PARTIAL").unwrap_or(true),
            large_tree: parsed(&lookup, "CATALOG_LARGE_TREE").unwrap_or(false),
            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".into()),
            log_dir: lookup("LOG_DIR").filter(|d| !d.is_empty()),
        }
    }

    pub fn id_convention(&self) -> IdConvention {
        IdConvention::new(self.category_marker.clone())
    }

    pub fn tree_variant(&self) -> TreeVariant {
        if self.large_tree {
            TreeVariant::Large
        } else {
            TreeVariant::Standard
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

fn parsed<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    lookup(key).and_then(|raw| raw.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = CatalogConfig::default();
        assert_eq!(config.source_url, DEFAULT_SOURCE_URL);
        assert_eq!(config.category_marker, "s");
        assert_eq!(config.fetch, FetchConfig::default());
        assert!(config.allow_partial);
        assert_eq!(config.tree_variant(), TreeVariant::Standard);
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
        assert!(config.log_dir.is_none());
    }

    #[test]
    fn test_from_lookup_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("CATALOG_SOURCE_URL", "http://catalog:8080"),
            ("CATALOG_CATEGORY_MARKER", "cat-"),
            ("CATALOG_BATCH_SIZE", " 4 "),
            ("CATALOG_MAX_RETRIES", "0"),
            ("CATALOG_ALLOW_PARTIAL", "false"),
            ("CATALOG_LARGE_TREE", "true"),
            ("LOG_DIR", "/var/log/catalog"),
        ]);
        let config = CatalogConfig::from_lookup(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.source_url, "http://catalog:8080");
        assert!(config.id_convention().is_category("cat-wine"));
        assert_eq!(config.fetch.batch_size, 4);
        assert_eq!(config.fetch.max_retries, 0);
        assert!(!config.allow_partial);
        assert_eq!(config.tree_variant(), TreeVariant::Large);
        assert_eq!(config.log_dir.as_deref(), Some("/var/log/catalog"));
    }

    #[test]
    fn test_bad_values_fall_back() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("CATALOG_BATCH_SIZE", "0"),
            ("CATALOG_MAX_RETRIES", "lots"),
            ("CATALOG_CATEGORY_MARKER", ""),
        ]);
        let config = CatalogConfig::from_lookup(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(config.fetch.batch_size, 1);
        assert_eq!(config.fetch.max_retries, DEFAULT_MAX_RETRIES);
        assert_eq!(config.category_marker, "s");
    }

    #[test]
    fn test_retry_delay_backoff() {
        let fetch = FetchConfig::default().with_retries(3, 100);
        assert_eq!(fetch.retry_delay(1), Duration::from_millis(100));
        assert_eq!(fetch.retry_delay(2), Duration::from_millis(200));
        assert_eq!(fetch.retry_delay(3), Duration::from_millis(400));
        assert_eq!(fetch.retry_delay(30), Duration::from_millis(RETRY_MAX_DELAY_MS));
    }

    #[test]
    fn test_batch_size_floor() {
        assert_eq!(FetchConfig::default().with_batch_size(0).batch_size, 1);
    }
}
