//! Build history log
//!
//! Writes one JSON line per finished build to `<state>/history.jsonl`.
//! Failures here are logged and dropped; history never blocks a build.

use crate::build::session::BuildSession;
use crate::config::{schema::Config, ConfigManager};
use crate::error::{TexsyncError, TexsyncResult};
use chrono::Utc;
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::warn;

/// Append-only JSON-lines history of finished builds
pub struct BuildHistory {
    enabled: bool,
    path: PathBuf,
}

impl BuildHistory {
    /// Create a history log from config
    pub fn new(config: &Config) -> Self {
        Self {
            enabled: config.general.history,
            path: ConfigManager::history_path(),
        }
    }

    /// History log at an explicit path
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            enabled: true,
            path: path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Record a finished session
    pub async fn record(&self, project_id: &str, session: &BuildSession) {
        if !self.enabled {
            return;
        }

        let entry = serde_json::json!({
            "timestamp": Utc::now().to_rfc3339(),
            "project_id": project_id,
            "build_id": session.build_id,
            "state": session.state,
            "message": session.message,
            "duration_ms": session.duration().map(|d| d.num_milliseconds()),
        });

        let mut line = match serde_json::to_string(&entry) {
            Ok(s) => s,
            Err(e) => {
                warn!("Failed to serialize build history entry: {}", e);
                return;
            }
        };
        line.push('\n');

        if let Err(e) = self.append(&line).await {
            warn!("Failed to write build history: {}", e);
        }
    }

    /// Last `limit` entries, oldest first (0 = all)
    pub async fn tail(&self, limit: usize) -> TexsyncResult<Vec<serde_json::Value>> {
        if !self.path.exists() {
            return Ok(vec![]);
        }

        let content = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            TexsyncError::io(format!("reading history {}", self.path.display()), e)
        })?;

        let entries: Vec<serde_json::Value> = content
            .lines()
            .filter_map(|line| serde_json::from_str(line).ok())
            .collect();

        let skip = if limit == 0 {
            0
        } else {
            entries.len().saturating_sub(limit)
        };
        Ok(entries.into_iter().skip(skip).collect())
    }

    async fn append(&self, line: &str) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;

        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}
