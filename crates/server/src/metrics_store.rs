//! Read-only access to persisted metrics snapshots.
//!
//! Snapshots live in a content-addressed tree keyed by the SHA-256 of the
//! source URL; see [`director_core::source::metrics_path`].

use std::io::ErrorKind;
use std::path::PathBuf;

use tracing::debug;

use director_core::source::metrics_path;
use director_core::DirectorError;

#[derive(Debug, Clone)]
pub struct MetricsStore {
    root: PathBuf,
}

impl MetricsStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Load the snapshot for `source`. `Ok(None)` when none has been written.
    pub async fn load(&self, source: &str) -> Result<Option<serde_json::Value>, DirectorError> {
        let path = metrics_path(&self.root, source);
        debug!(source = %source, path = %path.display(), "metrics lookup");

        let content = match tokio::fs::read_to_string(&path).await {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(DirectorError::Io(e)),
        };
        Ok(Some(serde_json::from_str(&content)?))
    }
}
