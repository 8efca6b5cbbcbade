// =============================================================================
// Service Configuration — JSON file plus environment overrides
// =============================================================================
//
// Every tunable lives here. Loading happens in two layers:
//   1. `ServiceConfig::load` reads a JSON file. Every field carries a serde
//      default so a partial (or empty) file is valid.
//   2. `apply_overrides` layers environment variables on top. Unparsable
//      values are ignored with a warning and the file/default value is kept.
//
// =============================================================================

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_true() -> bool {
    true
}

fn default_bind_addr() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_environment() -> String {
    "development".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_ttl_seconds() -> u64 {
    30
}

fn default_max_requests() -> u32 {
    100
}

fn default_window_ms() -> u64 {
    60_000
}

// =============================================================================
// Network
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    #[default]
    Mainnet,
    Testnet,
}

impl Network {
    /// Public indexer gateway for this network.
    pub fn default_indexer_endpoint(self) -> &'static str {
        match self {
            Network::Mainnet => "https://sentry.exchange.grpc-web.injective.network",
            Network::Testnet => "https://testnet.sentry.exchange.grpc-web.injective.network",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Network::Mainnet => write!(f, "mainnet"),
            Network::Testnet => write!(f, "testnet"),
        }
    }
}

impl FromStr for Network {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mainnet" => Ok(Network::Mainnet),
            "testnet" => Ok(Network::Testnet),
            other => Err(format!("unknown network '{other}'")),
        }
    }
}

// =============================================================================
// Sections
// =============================================================================

/// Upstream indexer settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InjectiveConfig {
    #[serde(default)]
    pub network: Network,

    /// Explicit indexer base URL. `None` means the network's public gateway.
    #[serde(default)]
    pub indexer_endpoint: Option<String>,

    /// Per-request transport timeout for the indexer client.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for InjectiveConfig {
    fn default() -> Self {
        Self {
            network: Network::default(),
            indexer_endpoint: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl InjectiveConfig {
    pub fn endpoint(&self) -> &str {
        self.indexer_endpoint
            .as_deref()
            .unwrap_or_else(|| self.network.default_indexer_endpoint())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_ttl_seconds")]
    pub ttl_seconds: u64,

    /// Capacity bound; `None` (or 0) keeps the cache unbounded.
    #[serde(default)]
    pub max_entries: Option<usize>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_seconds: default_ttl_seconds(),
            max_entries: None,
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }
}

/// Fixed-window request limiter applied to every route.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_max_requests")]
    pub max_requests: u32,

    #[serde(default = "default_window_ms")]
    pub window_ms: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            max_requests: default_max_requests(),
            window_ms: default_window_ms(),
        }
    }
}

// =============================================================================
// ServiceConfig
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Socket address the HTTP server binds to.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Deployment label (`development`, `production`, ...). Informational.
    #[serde(default = "default_environment")]
    pub environment: String,

    #[serde(default)]
    pub injective: InjectiveConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub rate_limit: RateLimitConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            environment: default_environment(),
            injective: InjectiveConfig::default(),
            cache: CacheConfig::default(),
            rate_limit: RateLimitConfig::default(),
        }
    }
}

impl ServiceConfig {
    /// Load configuration from a JSON file at `path`.
    ///
    /// A missing or malformed file is an error so the caller can fall back to
    /// defaults with a warning.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read service config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse service config from {}", path.display()))?;

        info!(
            path = %path.display(),
            network = %config.injective.network,
            bind_addr = %config.bind_addr,
            "service config loaded"
        );

        Ok(config)
    }

    /// Apply environment overrides from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from `lookup` (an environment reader).
    ///
    /// `BIND_ADDR` wins over `PORT`. `APP_ENV` wins over `NODE_ENV`.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(port) = parsed::<u16>(&get, "PORT") {
            self.bind_addr = format!("0.0.0.0:{port}");
        }
        if let Some(addr) = get("BIND_ADDR") {
            self.bind_addr = addr;
        }

        if let Some(env) = get("APP_ENV").or_else(|| get("NODE_ENV")) {
            self.environment = env;
        }

        if let Some(network) = parsed::<Network>(&get, "INJECTIVE_NETWORK") {
            self.injective.network = network;
        }
        if let Some(endpoint) = get("INDEXER_ENDPOINT") {
            self.injective.indexer_endpoint = Some(endpoint);
        }
        if let Some(secs) = parsed::<u64>(&get, "UPSTREAM_TIMEOUT_SECS") {
            self.injective.timeout_secs = secs;
        }

        if let Some(ttl) = parsed::<u64>(&get, "CACHE_TTL_SECONDS") {
            self.cache.ttl_seconds = ttl;
        }
        if let Some(enabled) = parsed::<bool>(&get, "ENABLE_CACHE") {
            self.cache.enabled = enabled;
        }
        if let Some(max) = parsed::<usize>(&get, "CACHE_MAX_ENTRIES") {
            self.cache.max_entries = (max > 0).then_some(max);
        }

        if let Some(enabled) = parsed::<bool>(&get, "RATE_LIMIT_ENABLED") {
            self.rate_limit.enabled = enabled;
        }
        if let Some(max) = parsed::<u32>(&get, "RATE_LIMIT_MAX_REQUESTS") {
            self.rate_limit.max_requests = max;
        }
        if let Some(window) = parsed::<u64>(&get, "RATE_LIMIT_WINDOW_MS") {
            self.rate_limit.window_ms = window;
        }
    }
}

/// Parse an override, warning and returning `None` on bad input.
fn parsed<T>(get: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    let raw = get(key)?;
    match raw.parse::<T>() {
        Ok(v) => Some(v),
        Err(e) => {
            warn!(key, value = %raw, error = %e, "ignoring unparsable config override");
            None
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn default_config_has_expected_values() {
        let cfg = ServiceConfig::default();
        assert_eq!(cfg.bind_addr, "0.0.0.0:3000");
        assert_eq!(cfg.environment, "development");
        assert_eq!(cfg.injective.network, Network::Mainnet);
        assert_eq!(
            cfg.injective.endpoint(),
            "https://sentry.exchange.grpc-web.injective.network"
        );
        assert_eq!(cfg.injective.timeout(), Duration::from_secs(10));
        assert!(cfg.cache.enabled);
        assert_eq!(cfg.cache.ttl(), Duration::from_secs(30));
        assert_eq!(cfg.cache.max_entries, None);
        assert!(!cfg.rate_limit.enabled);
        assert_eq!(cfg.rate_limit.max_requests, 100);
        assert_eq!(cfg.rate_limit.window_ms, 60_000);
    }

    #[test]
    fn deserialise_empty_json_uses_defaults() {
        let cfg: ServiceConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg.bind_addr, "0.0.0.0:3000");
        assert!(cfg.cache.enabled);
        assert_eq!(cfg.rate_limit.max_requests, 100);
    }

    #[test]
    fn deserialise_partial_json_fills_defaults() {
        let json = r#"{ "injective": { "network": "testnet" }, "cache": { "ttl_seconds": 5 } }"#;
        let cfg: ServiceConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.injective.network, Network::Testnet);
        assert_eq!(
            cfg.injective.endpoint(),
            "https://testnet.sentry.exchange.grpc-web.injective.network"
        );
        assert_eq!(cfg.injective.timeout_secs, 10);
        assert_eq!(cfg.cache.ttl_seconds, 5);
        assert!(cfg.cache.enabled);
    }

    #[test]
    fn load_missing_file_is_error() {
        assert!(ServiceConfig::load("/nonexistent/service_config.json").is_err());
    }

    #[test]
    fn load_reads_file() {
        let path = std::env::temp_dir().join(format!("svc-config-{}.json", uuid::Uuid::new_v4()));
        std::fs::write(&path, r#"{ "bind_addr": "127.0.0.1:8080" }"#).unwrap();
        let cfg = ServiceConfig::load(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(cfg.bind_addr, "127.0.0.1:8080");
    }

    #[test]
    fn overrides_apply() {
        let mut cfg = ServiceConfig::default();
        cfg.apply_overrides(env(&[
            ("PORT", "8081"),
            ("NODE_ENV", "production"),
            ("INJECTIVE_NETWORK", "Testnet"),
            ("INDEXER_ENDPOINT", "http://localhost:4444"),
            ("UPSTREAM_TIMEOUT_SECS", "3"),
            ("CACHE_TTL_SECONDS", "60"),
            ("ENABLE_CACHE", "false"),
            ("CACHE_MAX_ENTRIES", "500"),
            ("RATE_LIMIT_ENABLED", "true"),
            ("RATE_LIMIT_MAX_REQUESTS", "20"),
            ("RATE_LIMIT_WINDOW_MS", "1000"),
        ]));

        assert_eq!(cfg.bind_addr, "0.0.0.0:8081");
        assert_eq!(cfg.environment, "production");
        assert_eq!(cfg.injective.network, Network::Testnet);
        assert_eq!(cfg.injective.endpoint(), "http://localhost:4444");
        assert_eq!(cfg.injective.timeout_secs, 3);
        assert_eq!(cfg.cache.ttl_seconds, 60);
        assert!(!cfg.cache.enabled);
        assert_eq!(cfg.cache.max_entries, Some(500));
        assert!(cfg.rate_limit.enabled);
        assert_eq!(cfg.rate_limit.max_requests, 20);
        assert_eq!(cfg.rate_limit.window_ms, 1000);
    }

    #[test]
    fn bind_addr_wins_over_port() {
        let mut cfg = ServiceConfig::default();
        cfg.apply_overrides(env(&[("PORT", "9000"), ("BIND_ADDR", "127.0.0.1:7000")]));
        assert_eq!(cfg.bind_addr, "127.0.0.1:7000");
    }

    #[test]
    fn app_env_wins_over_node_env() {
        let mut cfg = ServiceConfig::default();
        cfg.apply_overrides(env(&[("NODE_ENV", "production"), ("APP_ENV", "staging")]));
        assert_eq!(cfg.environment, "staging");
    }

    #[test]
    fn unparsable_overrides_are_ignored() {
        let mut cfg = ServiceConfig::default();
        cfg.apply_overrides(env(&[
            ("PORT", "not-a-port"),
            ("CACHE_TTL_SECONDS", "-5"),
            ("ENABLE_CACHE", "maybe"),
            ("INJECTIVE_NETWORK", "devnet"),
            ("INDEXER_ENDPOINT", "   "),
        ]));
        assert_eq!(cfg.bind_addr, "0.0.0.0:3000");
        assert_eq!(cfg.cache.ttl_seconds, 30);
        assert!(cfg.cache.enabled);
        assert_eq!(cfg.injective.network, Network::Mainnet);
        assert_eq!(cfg.injective.indexer_endpoint, None);
    }

    #[test]
    fn zero_max_entries_means_unbounded() {
        let mut cfg = ServiceConfig::default();
        cfg.apply_overrides(env(&[("CACHE_MAX_ENTRIES", "0")]));
        assert_eq!(cfg.cache.max_entries, None);
    }
}
