//! Build session state
//!
//! A session is in flight until it reaches `success` or `error`; nothing
//! moves it out of a terminal state.

use crate::remote::StatusEvent;
use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// TeX engine the server runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Engine {
    Pdflatex,
    Xelatex,
    Lualatex,
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Pdflatex => "pdflatex",
            Self::Xelatex => "xelatex",
            Self::Lualatex => "lualatex",
        };
        write!(f, "{}", name)
    }
}

/// Build status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildState {
    /// Accepted locally, no server push yet
    Queued,
    Running,
    Success,
    Error,
}

impl BuildState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success | Self::Error)
    }
}

impl fmt::Display for BuildState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Queued => write!(f, "queued"),
            Self::Running => write!(f, "running"),
            Self::Success => write!(f, "success"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// The one logical build a client tracks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildSession {
    pub build_id: String,
    pub state: BuildState,
    pub message: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,

    /// False while the server has not told us the build id yet
    #[serde(skip, default = "bound_default")]
    id_bound: bool,
}

fn bound_default() -> bool {
    true
}

/// Message shown before the server's first push
pub const QUEUED_MESSAGE: &str = "Build queued…";

/// Message for every build that could not be started
pub const START_FAILED_MESSAGE: &str = "Failed to start build";

/// Id for sessions the server has not named (yet)
pub fn local_build_id() -> String {
    format!("local-{}", Uuid::new_v4())
}

impl BuildSession {
    /// Optimistic session created as soon as a build is requested
    pub fn queued() -> Self {
        Self {
            build_id: local_build_id(),
            state: BuildState::Queued,
            message: QUEUED_MESSAGE.to_string(),
            started_at: Utc::now(),
            ended_at: None,
            id_bound: true,
        }
    }

    /// Terminal session for a build that never reached the server
    pub fn failed_to_start(mut self) -> Self {
        self.state = BuildState::Error;
        self.message = START_FAILED_MESSAGE.to_string();
        self.ended_at = Some(Utc::now());
        self
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// Adopt the server's build id
    pub(crate) fn bind(&mut self, build_id: &str) {
        self.build_id = build_id.to_string();
        self.id_bound = true;
    }

    /// Mark the id as unknown until the first push names it
    pub(crate) fn unbind(&mut self) {
        self.id_bound = false;
    }

    pub(crate) fn mark_running(&mut self, message: impl Into<String>) {
        self.state = BuildState::Running;
        self.message = message.into();
    }

    /// Whether a pushed event belongs to this session
    pub fn accepts(&self, event_id: &str) -> bool {
        !self.id_bound || self.build_id == event_id
    }

    /// Apply a pushed event, returning whether anything changed.
    ///
    /// Terminal sessions never change. A late `queued` never moves a
    /// running session backwards.
    pub(crate) fn apply(&mut self, event: &StatusEvent) -> bool {
        if self.is_terminal() || !self.accepts(&event.id) {
            return false;
        }

        if !self.id_bound {
            self.bind(&event.id);
        }

        let state = match (self.state, event.state) {
            (BuildState::Running, BuildState::Queued) => BuildState::Running,
            (_, incoming) => incoming,
        };

        let before = (self.state, self.message.clone());
        self.state = state;
        if !event.message.is_empty() {
            self.message = event.message.clone();
        }
        if let Some(started_at) = event.started_at {
            self.started_at = started_at;
        }
        if state.is_terminal() {
            self.ended_at = Some(event.ended_at.unwrap_or_else(Utc::now));
        }

        before != (self.state, self.message.clone()) || state.is_terminal()
    }

    /// Wall-clock duration for finished sessions
    pub fn duration(&self) -> Option<chrono::Duration> {
        self.ended_at.map(|end| end - self.started_at)
    }
}
