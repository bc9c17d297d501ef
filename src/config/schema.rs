//! Configuration schema for texsync
//!
//! Global configuration is stored at `~/.config/texsync/config.toml`;
//! a project may override any value in `.texsync.toml` at its root.

use crate::build::Engine;
use serde::{Deserialize, Serialize};

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Remote compile server
    pub server: ServerConfig,

    /// Build defaults
    pub build: BuildConfig,

    /// Status channel settings
    pub status: StatusConfig,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log format: "text" or "json"
    pub log_format: String,

    /// Record finished builds in the history log
    pub history: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_format: "text".to_string(),
            history: true,
        }
    }
}

/// Remote compile server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Base URL, e.g. `https://compile.example.com/api`
    pub url: Option<String>,

    /// Bearer token forwarded on every request
    pub token: Option<String>,

    /// Per-request timeout in seconds (does not apply to the event stream)
    pub timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            url: None,
            token: None,
            timeout_secs: 60,
        }
    }
}

/// Build defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Main document, relative to the project root
    pub main_file: String,

    /// TeX engine
    pub engine: Engine,

    /// Allow \write18
    pub shell_escape: bool,

    /// Globs over project-relative names never sent to the server
    pub exclude: Vec<String>,

    /// Number of files hashed concurrently
    pub hash_concurrency: usize,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            main_file: "main.tex".to_string(),
            engine: Engine::Pdflatex,
            shell_escape: false,
            exclude: [
                "*.aux",
                "*.log",
                "*.out",
                "*.toc",
                "*.fls",
                "*.fdb_latexmk",
                "*.synctex.gz",
                "*.bbl",
                "*.blg",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            hash_concurrency: 8,
        }
    }
}

/// Status transport kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// Server-sent events over HTTP
    Sse,
    /// Newline-delimited JSON over TCP
    Socket,
}

/// Status channel settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusConfig {
    /// Which transport delivers build status pushes
    pub transport: TransportKind,

    /// `host:port` of the status socket (socket transport only)
    pub socket_addr: Option<String>,

    /// Delay before the first reconnect attempt
    pub base_delay_ms: u64,

    /// Added to the delay on every further attempt
    pub delay_increment_ms: u64,

    /// Upper bound on the reconnect delay
    pub max_delay_ms: u64,

    /// Consecutive failed attempts before giving up
    pub max_attempts: u32,
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            transport: TransportKind::Sse,
            socket_addr: None,
            base_delay_ms: 1000,
            delay_increment_ms: 1000,
            max_delay_ms: 10_000,
            max_attempts: 5,
        }
    }
}
