use std::env;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_or(profile: &str, key: &str, default: &str) -> String {
    profiled_env_opt(profile, key).unwrap_or_else(|| default.to_string())
}

fn profiled_env_parse<T: std::str::FromStr>(profile: &str, key: &str, default: T) -> T {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub workflows: WorkflowsConfig,
    pub cache: CacheConfig,
    pub opensearch: OpenSearchConfig,
    pub model: ModelConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `DIRECTOR_PROFILE` env var. When set (e.g. `PROD`),
    /// every key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Self {
        let profile = env_or("DIRECTOR_PROFILE", "").to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();
        let storage = StorageConfig::from_env_profiled(p);
        Self {
            profile: p.to_string(),
            server: ServerConfig::from_env_profiled(p),
            workflows: WorkflowsConfig::from_env_profiled(p, &storage),
            storage,
            cache: CacheConfig::from_env_profiled(p),
            opensearch: OpenSearchConfig::from_env_profiled(p),
            model: ModelConfig::from_env_profiled(p),
        }
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Print a redacted summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!("  server:      {}:{}", self.server.host, self.server.port);
        tracing::info!("  storage:     home={}, metrics={}", self.storage.home.display(), self.storage.metrics_root.display());
        tracing::info!("  workflows:   file={}, default_retention={}", self.workflows.file.display(), self.workflows.default_retention_days);
        tracing::info!("  cache:       window={}s, max_entries={}", self.cache.window_secs, self.cache.max_entries);
        tracing::info!("  opensearch:  host={}, index={}", self.opensearch.host, self.opensearch.index);
        tracing::info!("  model:       url={}", self.model.url);
    }

    /// Return a redacted view safe for API responses (no secrets).
    pub fn redacted_summary(&self) -> serde_json::Value {
        serde_json::json!({
            "profile": self.profile_label(),
            "server": { "host": self.server.host, "port": self.server.port },
            "storage": { "home": self.storage.home, "metrics_root": self.storage.metrics_root },
            "workflows": {
                "file": self.workflows.file,
                "default_retention_days": self.workflows.default_retention_days,
            },
            "cache": { "window_secs": self.cache.window_secs, "max_entries": self.cache.max_entries },
            "opensearch": {
                "host": self.opensearch.host,
                "port": self.opensearch.port,
                "index": self.opensearch.index,
                "authenticated": self.opensearch.username.is_some(),
            },
            "model": { "url": self.model.url, "timeout_secs": self.model.timeout_secs },
        })
    }
}

// ── Server ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_origin: String,
}

impl ServerConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            host: profiled_env_or(p, "HOST", "0.0.0.0"),
            port: profiled_env_parse(p, "PORT", 5000),
            cors_origin: profiled_env_or(p, "CORS_ORIGIN", "*"),
        }
    }
}

// ── Storage ───────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Director home directory (workflow definitions live here).
    pub home: PathBuf,
    /// Root of the content-addressed metrics tree.
    pub metrics_root: PathBuf,
}

impl StorageConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            home: PathBuf::from(profiled_env_or(p, "DIRECTOR_HOME", ".")),
            metrics_root: PathBuf::from(profiled_env_or(p, "GRIMOIRELAB_CONFIG_FOLDER", "analysis_data")),
        }
    }
}

// ── Workflows ─────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowsConfig {
    pub file: PathBuf,
    /// Retention applied to workflows without their own `retention` key.
    /// Negative disables cleanup.
    pub default_retention_days: i64,
}

impl WorkflowsConfig {
    fn from_env_profiled(p: &str, storage: &StorageConfig) -> Self {
        let file = profiled_env_opt(p, "DIRECTOR_WORKFLOWS_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|| storage.home.join("workflows.yml"));
        Self {
            file,
            default_retention_days: profiled_env_parse(p, "DIRECTOR_DEFAULT_RETENTION", -1),
        }
    }
}

// ── Prediction cache ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub window_secs: u64,
    pub max_entries: usize,
}

impl CacheConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            window_secs: profiled_env_parse(p, "PREDICTION_CACHE_WINDOW_SECS", 3600),
            max_entries: profiled_env_parse(p, "PREDICTION_CACHE_MAX_ENTRIES", 1024),
        }
    }

    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

// ── OpenSearch (activity index) ───────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenSearchConfig {
    pub host: String,
    pub port: u16,
    pub index: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub use_ssl: bool,
    pub max_retries: u32,
}

impl OpenSearchConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            host: profiled_env_or(p, "OPENSEARCH_HOST", "localhost"),
            port: profiled_env_parse(p, "OPENSEARCH_PORT", 9200),
            index: profiled_env_or(p, "OPENSEARCH_INDEX", "git_enriched"),
            username: profiled_env_opt(p, "OPENSEARCH_USERNAME"),
            password: profiled_env_opt(p, "OPENSEARCH_PASSWORD"),
            use_ssl: profiled_env_or(p, "OPENSEARCH_USE_SSL", "false") == "true",
            max_retries: profiled_env_parse(p, "SEARCH_MAX_RETRIES", 3),
        }
    }

    pub fn base_url(&self) -> String {
        let scheme = if self.use_ssl { "https" } else { "http" };
        format!("{}://{}:{}", scheme, self.host, self.port)
    }
}

// ── Prediction model ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    pub url: String,
    pub timeout_secs: u64,
}

impl ModelConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            url: profiled_env_or(p, "MODEL_URL", "http://localhost:8501/v1/models/activity:predict"),
            timeout_secs: profiled_env_parse(p, "PREDICTION_TIMEOUT_SECS", 30),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
