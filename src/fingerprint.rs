//! Content fingerprints for delta sync
//!
//! A fingerprint is the lowercase hex SHA-256 of a file's bytes. It never
//! depends on the file name or metadata, so the same content hashes the
//! same on every platform.

use crate::error::{TexsyncError, TexsyncResult};
use crate::project::ProjectFile;
use chrono::{DateTime, Utc};
use futures_util::stream::{self, StreamExt, TryStreamExt};
use sha2::{Digest, Sha256};
use tokio::fs;
use tracing::debug;

/// Fingerprint of one file, recomputed on every build attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileChecksum {
    /// Project-relative name
    pub file_name: String,
    /// Hex SHA-256 of the content
    pub content_hash: String,
    /// Size in bytes (informational)
    pub size_bytes: u64,
    /// Local modification time (informational)
    pub modified_at: Option<DateTime<Utc>>,
}

/// Hash a byte slice
pub fn fingerprint_bytes(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    hex::encode(hasher.finalize())
}

/// Read and hash a single project file
pub async fn fingerprint_file(file: &ProjectFile) -> TexsyncResult<FileChecksum> {
    let content = fs::read(&file.path)
        .await
        .map_err(|e| TexsyncError::Fingerprint {
            file: file.name.clone(),
            source: e,
        })?;

    let modified_at = fs::metadata(&file.path)
        .await
        .ok()
        .and_then(|m| m.modified().ok())
        .map(DateTime::<Utc>::from);

    Ok(FileChecksum {
        file_name: file.name.clone(),
        content_hash: fingerprint_bytes(&content),
        size_bytes: content.len() as u64,
        modified_at,
    })
}

/// Hash every file, up to `concurrency` at a time.
///
/// `on_progress(processed, total)` fires once per finished file with a
/// strictly increasing `processed`. The first unreadable file fails the
/// whole call; results come back in input order.
pub async fn fingerprint_all<F>(
    files: &[ProjectFile],
    concurrency: usize,
    mut on_progress: F,
) -> TexsyncResult<Vec<FileChecksum>>
where
    F: FnMut(usize, usize),
{
    let total = files.len();
    let mut processed = 0;

    let mut indexed: Vec<(usize, FileChecksum)> = stream::iter(files.iter().enumerate())
        .map(|(index, file)| async move { fingerprint_file(file).await.map(|c| (index, c)) })
        .buffer_unordered(concurrency.max(1))
        .inspect_ok(|_| {
            processed += 1;
            on_progress(processed, total);
        })
        .try_collect()
        .await?;

    indexed.sort_by_key(|(index, _)| *index);
    debug!("Fingerprinted {} files", total);
    Ok(indexed.into_iter().map(|(_, checksum)| checksum).collect())
}
