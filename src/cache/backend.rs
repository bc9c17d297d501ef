//! Persistence backends for the sync cache
//!
//! The cache itself is an in-memory map; a backend only has to round-trip
//! whole project namespaces.

use crate::cache::store::ProjectCache;
use crate::error::{TexsyncError, TexsyncResult};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::debug;

/// Storage medium for project cache namespaces
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Load a namespace, `None` if it was never stored
    async fn load(&self, project_id: &str) -> TexsyncResult<Option<ProjectCache>>;

    /// Replace the stored namespace
    async fn store(&self, cache: &ProjectCache) -> TexsyncResult<()>;

    /// Drop a namespace; missing namespaces are not an error
    async fn remove(&self, project_id: &str) -> TexsyncResult<()>;
}

/// One pretty-printed JSON file per project
pub struct JsonFileBackend {
    dir: PathBuf,
}

impl JsonFileBackend {
    /// Store namespaces under `dir`
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory holding the namespace files
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File backing one project namespace
    pub fn path_for(&self, project_id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", project_id))
    }
}

#[async_trait]
impl CacheBackend for JsonFileBackend {
    async fn load(&self, project_id: &str) -> TexsyncResult<Option<ProjectCache>> {
        let path = self.path_for(project_id);

        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&path)
            .await
            .map_err(|e| TexsyncError::io(format!("reading sync cache {}", path.display()), e))?;

        let cache: ProjectCache =
            serde_json::from_str(&content).map_err(|e| TexsyncError::CacheRead {
                path: path.clone(),
                reason: e.to_string(),
            })?;

        debug!(
            "Loaded {} cache entries for project {}",
            cache.entries.len(),
            project_id
        );
        Ok(Some(cache))
    }

    async fn store(&self, cache: &ProjectCache) -> TexsyncResult<()> {
        fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| TexsyncError::io("creating sync cache directory", e))?;

        let path = self.path_for(&cache.project_id);
        let tmp = path.with_extension("json.tmp");
        let content = serde_json::to_string_pretty(cache)?;

        // Readers only ever see a complete namespace
        fs::write(&tmp, content)
            .await
            .map_err(|e| TexsyncError::io(format!("writing sync cache {}", tmp.display()), e))?;
        fs::rename(&tmp, &path)
            .await
            .map_err(|e| TexsyncError::io(format!("replacing sync cache {}", path.display()), e))?;

        Ok(())
    }

    async fn remove(&self, project_id: &str) -> TexsyncResult<()> {
        let path = self.path_for(project_id);
        if path.exists() {
            fs::remove_file(&path).await.map_err(|e| {
                TexsyncError::io(format!("removing sync cache {}", path.display()), e)
            })?;
        }
        Ok(())
    }
}

/// Process-local backend, nothing survives a restart
#[derive(Default)]
pub struct MemoryBackend {
    namespaces: Mutex<HashMap<String, ProjectCache>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheBackend for MemoryBackend {
    async fn load(&self, project_id: &str) -> TexsyncResult<Option<ProjectCache>> {
        Ok(self.namespaces.lock().await.get(project_id).cloned())
    }

    async fn store(&self, cache: &ProjectCache) -> TexsyncResult<()> {
        self.namespaces
            .lock()
            .await
            .insert(cache.project_id.clone(), cache.clone());
        Ok(())
    }

    async fn remove(&self, project_id: &str) -> TexsyncResult<()> {
        self.namespaces.lock().await.remove(project_id);
        Ok(())
    }
}
