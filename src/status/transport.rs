//! Transports that carry build status pushes
//!
//! A transport only produces raw message strings; parsing and reconnects
//! belong to the channel.

use crate::config::schema::{Config, TransportKind};
use crate::error::{TexsyncError, TexsyncResult};
use crate::remote::resolve_token;
use async_trait::async_trait;
use std::io::{BufRead, BufReader};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncBufReadExt;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tracing::{debug, warn};
use ureq::Agent;

/// An open connection yielding raw messages
#[async_trait]
pub trait StatusStream: Send {
    /// Next message, `None` once the peer closed the stream
    async fn next_message(&mut self) -> TexsyncResult<Option<String>>;
}

/// Something the channel can (re)connect to
#[async_trait]
pub trait StatusTransport: Send + Sync {
    async fn connect(&self) -> TexsyncResult<Box<dyn StatusStream>>;

    /// Human-readable endpoint for logs
    fn describe(&self) -> String;
}

/// Build the transport selected in config for a project
pub fn transport_for(config: &Config, project_id: &str) -> TexsyncResult<Arc<dyn StatusTransport>> {
    match config.status.transport {
        TransportKind::Socket => {
            let addr = config.status.socket_addr.clone().ok_or_else(|| {
                TexsyncError::User("status.socket_addr is required for the socket transport".to_string())
            })?;
            Ok(Arc::new(SocketTransport::new(addr)))
        }
        TransportKind::Sse => {
            let base = config
                .server
                .url
                .as_deref()
                .map(|u| u.trim_end_matches('/'))
                .filter(|u| !u.is_empty())
                .ok_or(TexsyncError::ServerNotConfigured)?;
            Ok(Arc::new(SseTransport::new(
                format!("{}/projects/{}/events", base, project_id),
                resolve_token(&config.server),
            )))
        }
    }
}

/// Newline-delimited JSON over TCP
pub struct SocketTransport {
    addr: String,
}

impl SocketTransport {
    pub fn new(addr: impl Into<String>) -> Self {
        Self { addr: addr.into() }
    }
}

struct SocketStream {
    reader: tokio::io::BufReader<TcpStream>,
    buf: Vec<u8>,
}

#[async_trait]
impl StatusStream for SocketStream {
    async fn next_message(&mut self) -> TexsyncResult<Option<String>> {
        loop {
            self.buf.clear();
            let read = self
                .reader
                .read_until(b'\n', &mut self.buf)
                .await
                .map_err(|e| TexsyncError::StatusStream(e.to_string()))?;
            if read == 0 {
                return Ok(None);
            }
            match utf8_line(&self.buf) {
                Some(line) if !line.trim().is_empty() => return Ok(Some(line.to_string())),
                _ => continue,
            }
        }
    }
}

#[async_trait]
impl StatusTransport for SocketTransport {
    async fn connect(&self) -> TexsyncResult<Box<dyn StatusStream>> {
        let stream = TcpStream::connect(&self.addr)
            .await
            .map_err(|e| TexsyncError::StatusStream(format!("connecting to {}: {}", self.addr, e)))?;
        debug!("Status socket connected to {}", self.addr);
        Ok(Box::new(SocketStream {
            reader: tokio::io::BufReader::new(stream),
            buf: Vec::new(),
        }))
    }

    fn describe(&self) -> String {
        format!("tcp://{}", self.addr)
    }
}

/// Server-sent events over HTTP
pub struct SseTransport {
    url: String,
    token: Option<String>,
    agent: Agent,
}

impl SseTransport {
    pub fn new(url: impl Into<String>, token: Option<String>) -> Self {
        // No global timeout: the stream stays open for as long as the server likes
        let config = Agent::config_builder()
            .timeout_connect(Some(Duration::from_secs(10)))
            .build();
        Self {
            url: url.into(),
            token,
            agent: Agent::new_with_config(config),
        }
    }
}

struct SseStream {
    rx: mpsc::Receiver<Result<String, String>>,
}

#[async_trait]
impl StatusStream for SseStream {
    async fn next_message(&mut self) -> TexsyncResult<Option<String>> {
        match self.rx.recv().await {
            Some(Ok(message)) => Ok(Some(message)),
            Some(Err(e)) => Err(TexsyncError::StatusStream(e)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl StatusTransport for SseTransport {
    async fn connect(&self) -> TexsyncResult<Box<dyn StatusStream>> {
        let url = self.url.clone();
        let agent = self.agent.clone();
        let auth = self.token.as_ref().map(|t| format!("Bearer {}", t));

        let response = tokio::task::spawn_blocking(move || {
            let mut builder = agent.get(&url).header("Accept", "text/event-stream");
            if let Some(auth) = auth {
                builder = builder.header("Authorization", auth);
            }
            builder
                .call()
                .map_err(|e| TexsyncError::StatusStream(format!("connecting to {}: {}", url, e)))
        })
        .await
        .map_err(|e| TexsyncError::Internal(format!("SSE connect task failed: {}", e)))??;

        debug!("Event stream connected to {}", self.url);

        // The reader blocks for the lifetime of the stream
        let (tx, rx) = mpsc::channel(64);
        std::thread::spawn(move || {
            pump_events(BufReader::new(response.into_body().into_reader()), &tx);
        });

        Ok(Box::new(SseStream { rx }))
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}

/// Strip the line ending; lines that are not UTF-8 are logged and dropped
fn utf8_line(raw: &[u8]) -> Option<&str> {
    let raw = raw.strip_suffix(b"\n").unwrap_or(raw);
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    match std::str::from_utf8(raw) {
        Ok(line) => Some(line),
        Err(e) => {
            warn!("Dropping status line that is not UTF-8: {}", e);
            None
        }
    }
}

/// Decode an event stream into `tx` until EOF, a read error, or the
/// receiving channel is gone.
///
/// The receiver is checked before every read, so a dropped channel ends
/// the reader at the next line the server sends, keep-alive comments
/// included.
fn pump_events<R: BufRead>(mut reader: R, tx: &mpsc::Sender<Result<String, String>>) {
    let mut decoder = SseDecoder::default();
    let mut buf = Vec::new();

    loop {
        if tx.is_closed() {
            debug!("Status channel dropped, closing event stream");
            return;
        }

        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) => return,
            Ok(_) => {}
            Err(e) => {
                let _ = tx.blocking_send(Err(e.to_string()));
                return;
            }
        }

        let Some(line) = utf8_line(&buf) else {
            decoder.discard_event();
            continue;
        };
        if let Some(message) = decoder.push_line(line) {
            if tx.blocking_send(Ok(message)).is_err() {
                return;
            }
        }
    }
}

/// Incremental `text/event-stream` decoder.
///
/// Collects `data:` lines until a blank line ends the event. Comments and
/// other fields (`event:`, `id:`, `retry:`) are skipped.
#[derive(Debug, Default)]
pub struct SseDecoder {
    data: Vec<String>,
    discarded: bool,
}

impl SseDecoder {
    /// Drop the event being collected, including any lines that still
    /// arrive for it before the blank line
    pub fn discard_event(&mut self) {
        self.data.clear();
        self.discarded = true;
    }

    /// Feed one line (without its newline); returns a finished message
    pub fn push_line(&mut self, line: &str) -> Option<String> {
        let line = line.strip_suffix('\r').unwrap_or(line);

        if line.is_empty() {
            if std::mem::take(&mut self.discarded) {
                self.data.clear();
                return None;
            }
            if self.data.is_empty() {
                return None;
            }
            let message = self.data.join("\n");
            self.data.clear();
            return Some(message);
        }

        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        if field == "data" {
            self.data.push(value.to_string());
        }
        None
    }
}
