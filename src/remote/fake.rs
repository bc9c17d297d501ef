//! In-process compile service for unit tests

use super::{
    BuildAck, BuildInitRequest, BuildInitResponse, CompileService, EditQuery, EditResult,
    ExistingFile, LegacyBuildRequest, UploadFile, UploadManifest, ViewQuery, ViewResult,
};
use crate::error::{TexsyncError, TexsyncResult};
use crate::fingerprint::fingerprint_bytes;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

/// One received upload
#[derive(Debug, Clone)]
pub struct RecordedUpload {
    pub build_id: String,
    pub manifest: UploadManifest,
    pub file_names: Vec<String>,
}

#[derive(Debug, Default)]
pub struct FakeState {
    /// What the server holds, name -> hash
    pub files: HashMap<String, String>,
    pub init_requests: Vec<BuildInitRequest>,
    pub uploads: Vec<RecordedUpload>,
    pub triggers: Vec<LegacyBuildRequest>,
    pub view_queries: Vec<(String, ViewQuery)>,
    pub edit_queries: Vec<(String, EditQuery)>,
    pub fail_init: bool,
    pub fail_upload: bool,
    /// Ack id for legacy triggers; `None` leaves the id to the first push
    pub legacy_ack_id: Option<String>,
    pub view_result: Option<ViewResult>,
    pub edit_result: Option<EditResult>,
    /// Overwrite a local file while build-init is in flight
    pub save_during_init: Option<(PathBuf, Vec<u8>)>,
    next_build: u32,
}

#[derive(Debug, Default)]
pub struct FakeCompileService {
    pub state: Mutex<FakeState>,
}

impl FakeCompileService {
    pub fn with<R>(&self, f: impl FnOnce(&mut FakeState) -> R) -> R {
        let mut state = self.state.lock().unwrap();
        f(&mut state)
    }
}

#[async_trait]
impl CompileService for FakeCompileService {
    async fn init_build(&self, request: &BuildInitRequest) -> TexsyncResult<BuildInitResponse> {
        self.with(|state| {
            state.init_requests.push(request.clone());
            if let Some((path, content)) = state.save_during_init.take() {
                std::fs::write(path, content).unwrap();
            }
            if state.fail_init {
                return Err(TexsyncError::ServerRejected {
                    operation: "build-init".to_string(),
                    status: 503,
                });
            }
            state.next_build += 1;
            Ok(BuildInitResponse {
                build_id: format!("b{}", state.next_build),
                existing_files: state
                    .files
                    .iter()
                    .map(|(name, hash)| {
                        (
                            name.clone(),
                            ExistingFile {
                                checksum: hash.clone(),
                            },
                        )
                    })
                    .collect(),
            })
        })
    }

    async fn upload(
        &self,
        build_id: &str,
        manifest: &UploadManifest,
        files: Vec<UploadFile>,
    ) -> TexsyncResult<()> {
        self.with(|state| {
            if state.fail_upload {
                return Err(TexsyncError::ServerRejected {
                    operation: "upload".to_string(),
                    status: 500,
                });
            }
            for file in &files {
                state
                    .files
                    .insert(file.name.clone(), fingerprint_bytes(&file.content));
            }
            state.uploads.push(RecordedUpload {
                build_id: build_id.to_string(),
                manifest: manifest.clone(),
                file_names: files.into_iter().map(|f| f.name).collect(),
            });
            Ok(())
        })
    }

    async fn trigger_build(
        &self,
        _project_id: &str,
        request: &LegacyBuildRequest,
    ) -> TexsyncResult<BuildAck> {
        self.with(|state| {
            state.triggers.push(request.clone());
            Ok(BuildAck {
                build_id: state.legacy_ack_id.clone(),
            })
        })
    }

    async fn synctex_view(
        &self,
        build_id: &str,
        query: &ViewQuery,
    ) -> TexsyncResult<Option<ViewResult>> {
        self.with(|state| {
            state
                .view_queries
                .push((build_id.to_string(), query.clone()));
            Ok(state.view_result.clone())
        })
    }

    async fn synctex_edit(
        &self,
        build_id: &str,
        query: &EditQuery,
    ) -> TexsyncResult<Option<EditResult>> {
        self.with(|state| {
            state
                .edit_queries
                .push((build_id.to_string(), query.clone()));
            Ok(state.edit_result.clone())
        })
    }
}
