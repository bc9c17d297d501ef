//! Project identity and file discovery
//!
//! A project is identified by a stable id derived from its canonical root
//! path, so reopening the same directory lands in the same sync cache
//! namespace while moving the project starts a fresh one.

use crate::error::{TexsyncError, TexsyncResult};
use globset::{Glob, GlobSet, GlobSetBuilder};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

/// An opened LaTeX project
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    /// Stable id derived from the root path
    pub id: String,
    /// Display name (root directory name)
    pub name: String,
    /// Canonical root directory
    pub root: PathBuf,
}

/// A candidate file for a build
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectFile {
    /// Project-relative name with `/` separators
    pub name: String,
    /// Absolute path on disk
    pub path: PathBuf,
}

impl Project {
    /// Open a project rooted at `root`
    pub fn open(root: &Path) -> TexsyncResult<Self> {
        let root = root
            .canonicalize()
            .map_err(|_| TexsyncError::ProjectNotFound(root.to_path_buf()))?;
        if !root.is_dir() {
            return Err(TexsyncError::ProjectNotFound(root));
        }

        let name = root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "project".to_string());

        Ok(Self {
            id: project_id_for(&root),
            name,
            root,
        })
    }

    /// Collect every candidate file under the project root.
    ///
    /// Hidden entries are skipped along with everything below them, as are
    /// files whose project-relative name matches one of the `exclude`
    /// globs. The result is sorted by name.
    pub async fn collect_files(&self, exclude: &[String]) -> TexsyncResult<Vec<ProjectFile>> {
        let excluded = exclude_set(exclude)?;
        let root = self.root.clone();

        let files = tokio::task::spawn_blocking(move || walk(&root, &excluded))
            .await
            .map_err(|e| TexsyncError::Internal(format!("file walk failed: {}", e)))??;

        debug!("Collected {} files in {}", files.len(), self.root.display());
        Ok(files)
    }
}

/// Compile `build.exclude` patterns into one matcher
pub fn exclude_set(patterns: &[String]) -> TexsyncResult<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|source| TexsyncError::ExcludePattern {
            pattern: pattern.clone(),
            source,
        })?;
        builder.add(glob);
    }
    builder.build().map_err(|source| TexsyncError::ExcludePattern {
        pattern: patterns.join(", "),
        source,
    })
}

fn walk(root: &Path, excluded: &GlobSet) -> TexsyncResult<Vec<ProjectFile>> {
    let mut files = Vec::new();
    let walker = WalkDir::new(root)
        .min_depth(1)
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry));

    for entry in walker {
        let entry = entry
            .map_err(|e| TexsyncError::io(format!("walking {}", root.display()), e.into()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(name) = relative_name(root, entry.path()) else {
            continue;
        };
        if excluded.is_match(&name) {
            continue;
        }
        files.push(ProjectFile {
            name,
            path: entry.into_path(),
        });
    }

    files.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(files)
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_string_lossy().starts_with('.')
}

/// Derive the project id for a root path: first 8 bytes of SHA-256, hex
pub fn project_id_for(root: &Path) -> String {
    let mut hasher = Sha256::new();
    hasher.update(root.to_string_lossy().as_bytes());
    let digest = hasher.finalize();
    hex::encode(&digest[..8])
}

/// Project-relative name with forward slashes, independent of platform
pub fn relative_name(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}
