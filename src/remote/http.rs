//! HTTP client for the compile server
//!
//! ureq is blocking, so every request runs on the blocking pool.

use crate::config::schema::ServerConfig;
use crate::error::{TexsyncError, TexsyncResult};
use crate::remote::types::{
    BuildAck, BuildInitRequest, BuildInitResponse, EditQuery, EditResult, LegacyBuildRequest,
    UploadFile, UploadManifest, ViewQuery, ViewResult,
};
use crate::remote::CompileService;
use crate::sync::multipart;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;
use ureq::http::Response;
use ureq::Agent;

/// Environment variable that overrides `server.token`
pub const TOKEN_ENV: &str = "TEXSYNC_TOKEN";

/// [`CompileService`] over HTTP + JSON
#[derive(Clone)]
pub struct HttpCompileService {
    base_url: String,
    token: Option<String>,
    agent: Agent,
}

impl HttpCompileService {
    /// Build a client from server settings
    pub fn new(server: &ServerConfig) -> TexsyncResult<Self> {
        let base_url = server
            .url
            .as_deref()
            .map(|u| u.trim_end_matches('/').to_string())
            .filter(|u| !u.is_empty())
            .ok_or(TexsyncError::ServerNotConfigured)?;

        let config = Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(server.timeout_secs.max(1))))
            .build();

        Ok(Self {
            base_url,
            token: resolve_token(server),
            agent: Agent::new_with_config(config),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorization(&self) -> Option<String> {
        self.token.as_ref().map(|t| format!("Bearer {}", t))
    }
}

/// Token from `TEXSYNC_TOKEN`, falling back to the config value
pub fn resolve_token(server: &ServerConfig) -> Option<String> {
    std::env::var(TOKEN_ENV)
        .ok()
        .filter(|t| !t.is_empty())
        .or_else(|| server.token.clone())
}

async fn blocking<T, F>(f: F) -> TexsyncResult<T>
where
    F: FnOnce() -> TexsyncResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| TexsyncError::Internal(format!("HTTP worker failed: {}", e)))?
}

fn read_json<T: DeserializeOwned>(
    operation: &str,
    url: &str,
    mut response: Response<ureq::Body>,
) -> TexsyncResult<T> {
    response
        .body_mut()
        .read_json::<T>()
        .map_err(|e| TexsyncError::Protocol(format!("{} response from {}: {}", operation, url, e)))
}

/// 404 and 204 mean "no mapping", as does a JSON `null` body
fn read_optional<T: DeserializeOwned>(
    operation: &str,
    url: &str,
    result: Result<Response<ureq::Body>, ureq::Error>,
) -> TexsyncResult<Option<T>> {
    match result {
        Ok(response) if response.status().as_u16() == 204 => Ok(None),
        Ok(response) => read_json::<Option<T>>(operation, url, response),
        Err(ureq::Error::StatusCode(404)) => Ok(None),
        Err(e) => Err(TexsyncError::http(operation, url, e)),
    }
}

#[async_trait]
impl CompileService for HttpCompileService {
    async fn init_build(&self, request: &BuildInitRequest) -> TexsyncResult<BuildInitResponse> {
        let url = self.url(&format!("/projects/{}/builds/init", request.project_id));
        let auth = self.authorization();
        let agent = self.agent.clone();
        let request = request.clone();

        blocking(move || {
            debug!("POST {} ({} checksums)", url, request.file_checksums.len());
            let mut builder = agent.post(&url);
            if let Some(auth) = auth {
                builder = builder.header("Authorization", auth);
            }
            let response = builder
                .send_json(&request)
                .map_err(|e| TexsyncError::http("build-init", &url, e))?;
            read_json("build-init", &url, response)
        })
        .await
    }

    async fn upload(
        &self,
        build_id: &str,
        manifest: &UploadManifest,
        files: Vec<UploadFile>,
    ) -> TexsyncResult<()> {
        let url = self.url(&format!("/builds/{}/files", build_id));
        let auth = self.authorization();
        let agent = self.agent.clone();
        let body = multipart::encode_upload(manifest, &files)?;

        blocking(move || {
            debug!("POST {} ({} files, {} bytes)", url, files.len(), body.bytes.len());
            let mut builder = agent
                .post(&url)
                .header("Content-Type", body.content_type());
            if let Some(auth) = auth {
                builder = builder.header("Authorization", auth);
            }
            builder
                .send(body.bytes.as_slice())
                .map_err(|e| TexsyncError::http("upload", &url, e))?;
            Ok(())
        })
        .await
    }

    async fn trigger_build(
        &self,
        project_id: &str,
        request: &LegacyBuildRequest,
    ) -> TexsyncResult<BuildAck> {
        let url = self.url(&format!("/projects/{}/builds", project_id));
        let auth = self.authorization();
        let agent = self.agent.clone();
        let request = request.clone();

        blocking(move || {
            debug!("POST {}", url);
            let mut builder = agent.post(&url);
            if let Some(auth) = auth {
                builder = builder.header("Authorization", auth);
            }
            let mut response = builder
                .send_json(&request)
                .map_err(|e| TexsyncError::http("build", &url, e))?;

            // The ack body is optional
            let text = response
                .body_mut()
                .read_to_string()
                .map_err(|e| TexsyncError::Protocol(format!("build response from {}: {}", url, e)))?;
            if text.trim().is_empty() {
                return Ok(BuildAck::default());
            }
            Ok(serde_json::from_str(&text)?)
        })
        .await
    }

    async fn synctex_view(
        &self,
        build_id: &str,
        query: &ViewQuery,
    ) -> TexsyncResult<Option<ViewResult>> {
        let url = self.url(&format!("/builds/{}/synctex/view", build_id));
        let auth = self.authorization();
        let agent = self.agent.clone();
        let query = query.clone();

        blocking(move || {
            let mut builder = agent
                .get(&url)
                .query("file", &query.file)
                .query("line", query.line.to_string())
                .query("column", query.column.to_string());
            if let Some(auth) = auth {
                builder = builder.header("Authorization", auth);
            }
            read_optional("synctex view", &url, builder.call())
        })
        .await
    }

    async fn synctex_edit(
        &self,
        build_id: &str,
        query: &EditQuery,
    ) -> TexsyncResult<Option<EditResult>> {
        let url = self.url(&format!("/builds/{}/synctex/edit", build_id));
        let auth = self.authorization();
        let agent = self.agent.clone();
        let query = query.clone();

        blocking(move || {
            let mut builder = agent
                .get(&url)
                .query("page", query.page.to_string())
                .query("x", query.x.to_string())
                .query("y", query.y.to_string());
            if let Some(auth) = auth {
                builder = builder.header("Authorization", auth);
            }
            read_optional("synctex edit", &url, builder.call())
        })
        .await
    }
}
