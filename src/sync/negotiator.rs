//! Delta-sync negotiation
//!
//! Turns the project's files into the smallest upload the server can
//! build from: every fingerprint is announced, and only files whose hash
//! the server does not already hold are sent.

use crate::build::Engine;
use crate::error::{TexsyncError, TexsyncResult};
use crate::fingerprint::{self, FileChecksum};
use crate::project::{Project, ProjectFile};
use crate::remote::{BuildInitRequest, CompileService, ExistingFile, UploadFile, UploadManifest};
use std::collections::{BTreeMap, HashMap};
use tokio::fs;
use tracing::{debug, info, warn};

/// Inputs for one delta-synced build attempt
#[derive(Debug, Clone)]
pub struct SyncRequest {
    pub project: Project,
    pub files: Vec<ProjectFile>,
    pub main_file: String,
    pub engine: Engine,
    pub shell_escape: bool,
}

/// Outcome of negotiation for one build attempt
#[derive(Debug, Clone)]
pub struct DeltaManifest {
    /// Id the server assigned at build-init
    pub build_id: String,
    /// Files the server already holds, name -> fingerprint
    pub cached_files: BTreeMap<String, String>,
    /// Files that are new or changed on the server side
    pub files_to_upload: Vec<ProjectFile>,
    /// Every fingerprint computed for this attempt
    pub checksums: Vec<FileChecksum>,
    /// Comparison with the local sync cache, for display
    pub changes: ChangeSummary,
}

/// How the current files differ from the last successful sync
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSummary {
    pub unchanged: Vec<String>,
    pub modified: Vec<String>,
    pub added: Vec<String>,
    /// Cached names no longer in the project (kept, not evicted)
    pub removed: Vec<String>,
}

/// Split files into server-cached references and uploads.
///
/// A file is cached only when `known` holds the same name with an equal
/// hash; size and modification time play no part.
pub fn plan_upload(
    files: &[ProjectFile],
    checksums: &[FileChecksum],
    known: &HashMap<String, String>,
) -> (BTreeMap<String, String>, Vec<ProjectFile>) {
    let hashes: HashMap<&str, &str> = checksums
        .iter()
        .map(|c| (c.file_name.as_str(), c.content_hash.as_str()))
        .collect();

    let mut cached = BTreeMap::new();
    let mut upload = Vec::new();

    for file in files {
        let Some(hash) = hashes.get(file.name.as_str()) else {
            upload.push(file.clone());
            continue;
        };
        match known.get(&file.name) {
            Some(existing) if existing.as_str() == *hash => {
                cached.insert(file.name.clone(), hash.to_string());
            }
            _ => upload.push(file.clone()),
        }
    }

    (cached, upload)
}

/// Compare fingerprints with the hashes recorded in the local cache
pub fn summarize_changes(
    checksums: &[FileChecksum],
    cached: &BTreeMap<String, String>,
) -> ChangeSummary {
    let mut summary = ChangeSummary::default();

    for checksum in checksums {
        match cached.get(&checksum.file_name) {
            Some(hash) if *hash == checksum.content_hash => {
                summary.unchanged.push(checksum.file_name.clone())
            }
            Some(_) => summary.modified.push(checksum.file_name.clone()),
            None => summary.added.push(checksum.file_name.clone()),
        }
    }

    let current: std::collections::HashSet<&str> =
        checksums.iter().map(|c| c.file_name.as_str()).collect();
    summary.removed = cached
        .keys()
        .filter(|name| !current.contains(name.as_str()))
        .cloned()
        .collect();

    summary
}

fn server_hashes(existing: HashMap<String, ExistingFile>) -> HashMap<String, String> {
    existing
        .into_iter()
        .map(|(name, file)| (name, file.checksum))
        .collect()
}

/// Drives build-init and upload against a compile service
pub struct Negotiator<'a> {
    service: &'a dyn CompileService,
    hash_concurrency: usize,
}

impl<'a> Negotiator<'a> {
    pub fn new(service: &'a dyn CompileService, hash_concurrency: usize) -> Self {
        Self {
            service,
            hash_concurrency,
        }
    }

    /// Fingerprint, announce, and classify.
    ///
    /// `local` is the last-synced hash map from the sync cache; it only
    /// feeds the change summary.
    pub async fn negotiate<F>(
        &self,
        request: &SyncRequest,
        local: &BTreeMap<String, String>,
        on_progress: F,
    ) -> TexsyncResult<DeltaManifest>
    where
        F: FnMut(usize, usize),
    {
        if !request.files.iter().any(|f| f.name == request.main_file) {
            return Err(TexsyncError::MainFileMissing {
                main_file: request.main_file.clone(),
            });
        }

        let checksums =
            fingerprint::fingerprint_all(&request.files, self.hash_concurrency, on_progress)
                .await?;

        let changes = summarize_changes(&checksums, local);
        debug!(
            "Local changes: {} unchanged, {} modified, {} added",
            changes.unchanged.len(),
            changes.modified.len(),
            changes.added.len()
        );
        if !changes.removed.is_empty() {
            warn!(
                "{} cached files are no longer in the project and stay in the cache: {}",
                changes.removed.len(),
                changes.removed.join(", ")
            );
        }

        let init = BuildInitRequest {
            project_id: request.project.id.clone(),
            project_name: request.project.name.clone(),
            main_file: request.main_file.clone(),
            engine: request.engine,
            shell_escape: request.shell_escape,
            file_checksums: checksums
                .iter()
                .map(|c| (c.file_name.clone(), c.content_hash.clone()))
                .collect(),
        };
        let response = self.service.init_build(&init).await?;

        let known = server_hashes(response.existing_files);
        let (cached_files, files_to_upload) = plan_upload(&request.files, &checksums, &known);

        info!(
            "Build {}: {} to upload, {} cached",
            response.build_id,
            files_to_upload.len(),
            cached_files.len()
        );

        Ok(DeltaManifest {
            build_id: response.build_id,
            cached_files,
            files_to_upload,
            checksums,
            changes,
        })
    }

    /// Send the manifest and the bytes of every file to upload.
    ///
    /// An empty upload set still sends the manifest. Each file must still
    /// hash to the fingerprint announced at build-init; a file saved in
    /// between aborts the attempt before anything is sent.
    pub async fn upload(&self, request: &SyncRequest, delta: &DeltaManifest) -> TexsyncResult<()> {
        let manifest = UploadManifest {
            cached_files: delta.cached_files.clone(),
            main_file: request.main_file.clone(),
            engine: request.engine,
            shell_escape: request.shell_escape,
        };

        let announced: HashMap<&str, &str> = delta
            .checksums
            .iter()
            .map(|c| (c.file_name.as_str(), c.content_hash.as_str()))
            .collect();

        let mut files = Vec::with_capacity(delta.files_to_upload.len());
        for file in &delta.files_to_upload {
            let content = fs::read(&file.path)
                .await
                .map_err(|e| TexsyncError::Fingerprint {
                    file: file.name.clone(),
                    source: e,
                })?;
            let hash = fingerprint::fingerprint_bytes(&content);
            if announced.get(file.name.as_str()).copied() != Some(hash.as_str()) {
                warn!("{} changed since it was fingerprinted, aborting upload", file.name);
                return Err(TexsyncError::ContentChanged {
                    file: file.name.clone(),
                });
            }
            files.push(UploadFile {
                name: file.name.clone(),
                content,
            });
        }

        self.service.upload(&delta.build_id, &manifest, files).await
    }
}
