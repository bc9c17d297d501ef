//! Remote compile server
//!
//! The core only talks to the compiler through [`CompileService`], so the
//! build controller and SyncTeX mapper can run against the HTTP client or
//! an in-process fake.

#[cfg(test)]
pub(crate) mod fake;
mod http;
pub mod types;

pub use http::{resolve_token, HttpCompileService, TOKEN_ENV};
pub use types::{
    BuildAck, BuildInitRequest, BuildInitResponse, EditQuery, EditResult, ExistingFile,
    LegacyBuildRequest, StatusEvent, UploadFile, UploadManifest, ViewQuery, ViewResult,
};

use crate::error::TexsyncResult;
use async_trait::async_trait;

/// Requests the core issues against the compile server
#[async_trait]
pub trait CompileService: Send + Sync {
    /// Announce a build with the full checksum map
    async fn init_build(&self, request: &BuildInitRequest) -> TexsyncResult<BuildInitResponse>;

    /// Send the manifest and every changed file for `build_id`
    async fn upload(
        &self,
        build_id: &str,
        manifest: &UploadManifest,
        files: Vec<UploadFile>,
    ) -> TexsyncResult<()>;

    /// Fire a build without delta sync; status arrives over the channel
    async fn trigger_build(
        &self,
        project_id: &str,
        request: &LegacyBuildRequest,
    ) -> TexsyncResult<BuildAck>;

    /// Forward search, `None` when the position has no mapping
    async fn synctex_view(
        &self,
        build_id: &str,
        query: &ViewQuery,
    ) -> TexsyncResult<Option<ViewResult>>;

    /// Inverse search, `None` when the point has no mapping
    async fn synctex_edit(
        &self,
        build_id: &str,
        query: &EditQuery,
    ) -> TexsyncResult<Option<EditResult>>;
}
