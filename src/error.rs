//! Error types for texsync
//!
//! All modules use `TexsyncResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for texsync operations
pub type TexsyncResult<T> = Result<T, TexsyncError>;

/// All errors that can occur in texsync
#[derive(Error, Debug)]
pub enum TexsyncError {
    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No compile server configured")]
    ServerNotConfigured,

    // Project errors
    #[error("Project root not found: {0}")]
    ProjectNotFound(PathBuf),

    #[error("Main file {main_file} is not part of the project")]
    MainFileMissing { main_file: String },

    // Fingerprint errors
    #[error("Failed to fingerprint {file}: {source}")]
    Fingerprint {
        file: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{file} changed while the build was being prepared")]
    ContentChanged { file: String },

    #[error("Invalid exclude pattern {pattern}: {source}")]
    ExcludePattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    // Cache errors
    #[error("Failed to read sync cache {path}: {reason}")]
    CacheRead { path: PathBuf, reason: String },

    #[error("Failed to persist sync cache for project {project_id}: {reason}")]
    CachePersist { project_id: String, reason: String },

    // Remote compiler errors
    #[error("Request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: ureq::Error,
    },

    #[error("Compile server rejected {operation}: status {status}")]
    ServerRejected { operation: String, status: u16 },

    #[error("Unexpected response from compile server: {0}")]
    Protocol(String),

    // Status channel errors
    #[error("Status stream error: {0}")]
    StatusStream(String),

    #[error("No successful build available yet")]
    NoSuccessfulBuild,

    // Build outcome errors
    #[error("Build {build_id} failed: {message}")]
    BuildFailed { build_id: String, message: String },

    #[error("Lost the status channel while build {build_id} was {state}")]
    StatusUnavailable { build_id: String, state: String },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    User(String),
}

impl TexsyncError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create an HTTP transport error for a URL.
    ///
    /// Status-code errors are folded into `ServerRejected` so callers can
    /// match on the status without digging into ureq.
    pub fn http(operation: &str, url: impl Into<String>, source: ureq::Error) -> Self {
        match source {
            ureq::Error::StatusCode(status) => Self::ServerRejected {
                operation: operation.to_string(),
                status,
            },
            source => Self::Http {
                url: url.into(),
                source,
            },
        }
    }

    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http { .. } | Self::StatusStream(_) => true,
            Self::ServerRejected { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::ServerNotConfigured => {
                Some("Set server.url in config.toml or .texsync.toml")
            }
            Self::ServerRejected { status: 401, .. } | Self::ServerRejected { status: 403, .. } => {
                Some("Check server.token or the TEXSYNC_TOKEN environment variable")
            }
            Self::MainFileMissing { .. } => Some("Pass --main or set build.main_file"),
            Self::ContentChanged { .. } => Some("Run the build again once the file is saved"),
            Self::ExcludePattern { .. } => Some("Check build.exclude; patterns are globs like \"*.aux\""),
            Self::NoSuccessfulBuild => Some("Run: texsync build"),
            Self::StatusUnavailable { .. } => {
                Some("Check status.transport; the build may still finish on the server")
            }
            _ => None,
        }
    }
}
