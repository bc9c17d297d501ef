//! Per-project sync cache
//!
//! Maps file name to the fingerprint that was part of the last successful
//! build, plus aggregate counters. Only the build controller writes to it.

use crate::cache::backend::CacheBackend;
use crate::error::{TexsyncError, TexsyncResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info};

/// Last-synced state of one file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub project_id: String,
    pub file_name: String,
    pub file_hash: String,
    pub last_modified_at_client: Option<DateTime<Utc>>,
    pub size_bytes: u64,
}

/// One project's namespace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectCache {
    pub project_id: String,

    /// At most one entry per file name
    #[serde(default)]
    pub entries: BTreeMap<String, CacheEntry>,

    /// Successful builds recorded against this namespace
    #[serde(default)]
    pub build_count: u64,

    /// When the namespace last matched a successful build
    #[serde(default)]
    pub last_synced_at: Option<DateTime<Utc>>,

    /// Id of the most recent successful build
    #[serde(default)]
    pub last_build_id: Option<String>,
}

impl ProjectCache {
    /// Create an empty namespace
    pub fn new(project_id: &str) -> Self {
        Self {
            project_id: project_id.to_string(),
            entries: BTreeMap::new(),
            build_count: 0,
            last_synced_at: None,
            last_build_id: None,
        }
    }
}

/// Aggregate view of a namespace for display
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    pub total_bytes: u64,
    pub build_count: u64,
    pub last_synced_at: Option<DateTime<Utc>>,
}

/// Sync cache over a pluggable persistence backend
pub struct SyncCache {
    backend: Box<dyn CacheBackend>,
    projects: HashMap<String, ProjectCache>,
    current: Option<String>,
}

impl SyncCache {
    /// Create a cache with no namespaces loaded
    pub fn new(backend: Box<dyn CacheBackend>) -> Self {
        Self {
            backend,
            projects: HashMap::new(),
            current: None,
        }
    }

    /// Load or create the namespace for `project_id`.
    ///
    /// Idempotent: an already loaded or persisted namespace is kept as is.
    pub async fn initialize_project(&mut self, project_id: &str) -> TexsyncResult<()> {
        if self.projects.contains_key(project_id) {
            return Ok(());
        }

        let cache = match self.backend.load(project_id).await? {
            Some(cache) => {
                debug!(
                    "Restored sync cache for {} ({} entries)",
                    project_id,
                    cache.entries.len()
                );
                cache
            }
            None => {
                debug!("Created empty sync cache for {}", project_id);
                ProjectCache::new(project_id)
            }
        };

        self.projects.insert(project_id.to_string(), cache);
        Ok(())
    }

    /// Select the namespace that defaults apply to
    pub fn set_current_project(&mut self, project_id: &str) {
        self.current = Some(project_id.to_string());
    }

    /// Currently selected namespace
    pub fn current_project(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// Full namespace, if loaded
    pub fn project(&self, project_id: &str) -> Option<&ProjectCache> {
        self.projects.get(project_id)
    }

    pub fn entries(&self, project_id: &str) -> Option<&BTreeMap<String, CacheEntry>> {
        self.projects.get(project_id).map(|p| &p.entries)
    }

    pub fn entry(&self, project_id: &str, file_name: &str) -> Option<&CacheEntry> {
        self.projects.get(project_id)?.entries.get(file_name)
    }

    /// `file_name -> file_hash` for a namespace (empty if unknown)
    pub fn known_hashes(&self, project_id: &str) -> BTreeMap<String, String> {
        self.entries(project_id)
            .map(|entries| {
                entries
                    .iter()
                    .map(|(name, entry)| (name.clone(), entry.file_hash.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Upsert an entry; the last write wins
    pub fn add_cache_entry(&mut self, project_id: &str, file_name: &str, mut entry: CacheEntry) {
        entry.project_id = project_id.to_string();
        entry.file_name = file_name.to_string();
        self.namespace_mut(project_id)
            .entries
            .insert(file_name.to_string(), entry);
    }

    pub fn increment_build_count(&mut self, project_id: &str) {
        self.namespace_mut(project_id).build_count += 1;
    }

    /// Advance `last_synced_at`; an older timestamp is ignored
    pub fn update_last_synced(&mut self, project_id: &str, at: DateTime<Utc>) {
        let namespace = self.namespace_mut(project_id);
        if namespace.last_synced_at.is_none_or(|prev| at > prev) {
            namespace.last_synced_at = Some(at);
        }
    }

    /// Remember the build that the current entries belong to
    pub fn record_build_id(&mut self, project_id: &str, build_id: &str) {
        self.namespace_mut(project_id).last_build_id = Some(build_id.to_string());
    }

    pub fn stats(&self, project_id: &str) -> Option<CacheStats> {
        self.projects.get(project_id).map(|p| CacheStats {
            entries: p.entries.len(),
            total_bytes: p.entries.values().map(|e| e.size_bytes).sum(),
            build_count: p.build_count,
            last_synced_at: p.last_synced_at,
        })
    }

    /// Persist one namespace through the backend
    pub async fn flush(&self, project_id: &str) -> TexsyncResult<()> {
        let cache = self
            .projects
            .get(project_id)
            .ok_or_else(|| TexsyncError::CachePersist {
                project_id: project_id.to_string(),
                reason: "namespace not initialized".to_string(),
            })?;
        self.backend.store(cache).await
    }

    /// Drop every entry and counter for a project, in memory and on disk
    pub async fn clear_project(&mut self, project_id: &str) -> TexsyncResult<()> {
        self.backend.remove(project_id).await?;
        if let Some(namespace) = self.projects.get_mut(project_id) {
            *namespace = ProjectCache::new(project_id);
        }
        info!("Cleared sync cache for {}", project_id);
        Ok(())
    }

    fn namespace_mut(&mut self, project_id: &str) -> &mut ProjectCache {
        self.projects
            .entry(project_id.to_string())
            .or_insert_with(|| ProjectCache::new(project_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::backend::{JsonFileBackend, MemoryBackend};
    use tempfile::TempDir;

    fn entry(hash: &str, size: u64) -> CacheEntry {
        CacheEntry {
            project_id: String::new(),
            file_name: String::new(),
            file_hash: hash.to_string(),
            last_modified_at_client: None,
            size_bytes: size,
        }
    }

    #[tokio::test]
    async fn initialize_is_idempotent() {
        let mut cache = SyncCache::new(Box::new(MemoryBackend::new()));
        cache.initialize_project("p1").await.unwrap();
        cache.add_cache_entry("p1", "main.tex", entry("h1", 10));

        cache.initialize_project("p1").await.unwrap();

        assert_eq!(cache.entry("p1", "main.tex").unwrap().file_hash, "h1");
    }

    #[tokio::test]
    async fn switching_projects_preserves_caches() {
        let mut cache = SyncCache::new(Box::new(MemoryBackend::new()));
        cache.initialize_project("p1").await.unwrap();
        cache.set_current_project("p1");
        cache.add_cache_entry("p1", "a.tex", entry("h1", 1));

        cache.initialize_project("p2").await.unwrap();
        cache.set_current_project("p2");
        cache.initialize_project("p1").await.unwrap();
        cache.set_current_project("p1");

        assert_eq!(cache.current_project(), Some("p1"));
        assert_eq!(cache.entries("p1").unwrap().len(), 1);
        assert!(cache.entries("p2").unwrap().is_empty());
    }

    #[test]
    fn add_entry_overwrites_and_normalizes() {
        let mut cache = SyncCache::new(Box::new(MemoryBackend::new()));
        cache.add_cache_entry("p1", "main.tex", entry("h1", 10));
        cache.add_cache_entry("p1", "main.tex", entry("h2", 12));

        let stored = cache.entry("p1", "main.tex").unwrap();
        assert_eq!(stored.file_hash, "h2");
        assert_eq!(stored.project_id, "p1");
        assert_eq!(stored.file_name, "main.tex");
        assert_eq!(cache.entries("p1").unwrap().len(), 1);
    }

    #[test]
    fn last_synced_never_moves_backwards() {
        let mut cache = SyncCache::new(Box::new(MemoryBackend::new()));
        let now = Utc::now();
        cache.update_last_synced("p1", now);
        cache.update_last_synced("p1", now - chrono::Duration::minutes(5));

        assert_eq!(cache.project("p1").unwrap().last_synced_at, Some(now));
    }

    #[tokio::test]
    async fn entries_survive_reload() {
        let temp = TempDir::new().unwrap();
        let names = ["main.tex", "refs.bib", "figures/plot.png", "chapters/intro.tex"];

        {
            let mut cache = SyncCache::new(Box::new(JsonFileBackend::new(temp.path())));
            cache.initialize_project("p1").await.unwrap();
            for (i, name) in names.iter().enumerate() {
                cache.add_cache_entry("p1", name, entry(&format!("hash-{i}"), i as u64));
            }
            cache.increment_build_count("p1");
            cache.flush("p1").await.unwrap();
        }

        let mut reloaded = SyncCache::new(Box::new(JsonFileBackend::new(temp.path())));
        reloaded.initialize_project("p1").await.unwrap();

        let hashes = reloaded.known_hashes("p1");
        assert_eq!(hashes.len(), names.len());
        for (i, name) in names.iter().enumerate() {
            assert_eq!(hashes.get(*name), Some(&format!("hash-{i}")));
        }
        assert_eq!(reloaded.stats("p1").unwrap().build_count, 1);
    }

    #[tokio::test]
    async fn clear_project_resets_namespace() {
        let mut cache = SyncCache::new(Box::new(MemoryBackend::new()));
        cache.initialize_project("p1").await.unwrap();
        cache.add_cache_entry("p1", "main.tex", entry("h1", 10));
        cache.increment_build_count("p1");
        cache.flush("p1").await.unwrap();

        cache.clear_project("p1").await.unwrap();

        let stats = cache.stats("p1").unwrap();
        assert_eq!(stats.entries, 0);
        assert_eq!(stats.build_count, 0);
    }

    #[tokio::test]
    async fn flush_uninitialized_fails() {
        let cache = SyncCache::new(Box::new(MemoryBackend::new()));
        let err = cache.flush("missing").await.unwrap_err();
        assert!(matches!(err, TexsyncError::CachePersist { .. }));
    }
}
