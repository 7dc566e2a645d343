//! Repository source URLs: allow-list validation and content-addressed
//! storage paths.

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use url::Url;

use crate::error::DirectorError;

/// Hosts we accept repository sources from.
pub const SUPPORTED_DOMAINS: &[&str] = &["gitee.com", "github.com", "raw.githubusercontent.com"];

const METRICS_DIR: &str = "metrics";
const METRICS_FILE: &str = "project.json";

/// A repository URL whose host is on the supported allow-list.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceUrl {
    raw: String,
    url: Url,
}

impl SourceUrl {
    /// Parse and validate a source URL. A missing scheme is treated as https.
    pub fn parse(raw: &str) -> Result<Self, DirectorError> {
        let trimmed = raw.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            return Err(DirectorError::UnsupportedSource("empty source url".into()));
        }

        let candidate = if trimmed.contains("://") || trimmed.starts_with("http:/") || trimmed.starts_with("https:/") {
            trimmed.to_string()
        } else {
            format!("https://{}", trimmed)
        };

        let url = Url::parse(&candidate)
            .map_err(|e| DirectorError::UnsupportedSource(format!("{}: {}", raw, e)))?;

        let host = url.host_str().unwrap_or_default().to_ascii_lowercase();
        if !SUPPORTED_DOMAINS.contains(&host.as_str()) {
            return Err(DirectorError::UnsupportedSource(format!(
                "{} (host '{}' not in {:?})",
                raw, host, SUPPORTED_DOMAINS
            )));
        }

        Ok(Self { raw: trimmed.to_string(), url })
    }

    /// Normalized `https://host/path` form used as the cache key and
    /// the search-index origin.
    pub fn canonical(&self) -> String {
        let host = self.url.host_str().unwrap_or_default().to_ascii_lowercase();
        let path = self.url.path().trim_end_matches('/');
        format!("https://{}{}", host, path)
    }
}

impl std::fmt::Display for SourceUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Lowercase hex SHA-256 of a string.
pub fn hash_string(s: &str) -> String {
    hex::encode(Sha256::digest(s.as_bytes()))
}

/// Directory holding the analysis artifacts of a source:
/// `{root}/{h[..2]}/{h[2..]}`.
pub fn project_dir(root: &Path, source: &str) -> PathBuf {
    let hash = hash_string(source);
    root.join(&hash[..2]).join(&hash[2..])
}

/// Path of the persisted metrics snapshot for a source.
pub fn metrics_path(root: &Path, source: &str) -> PathBuf {
    project_dir(root, source).join(METRICS_DIR).join(METRICS_FILE)
}
