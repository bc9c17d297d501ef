//! texsync - build orchestration for LaTeX projects
//!
//! Fingerprints project files, uploads only what a remote compiler does
//! not already hold, tracks the one in-flight build through pushed status
//! events, and maps between source lines and PDF coordinates.
//!
//! The pieces, leaf first:
//!
//! - [`fingerprint`]: content hashes
//! - [`cache`]: per-project record of the last successful sync
//! - [`sync`]: build-init negotiation and the minimal upload
//! - [`build`]: session state and the lifecycle controller
//! - [`status`]: reconnecting push channel
//! - [`synctex`]: forward and inverse search
//! - [`remote`]: the compile server seam

pub mod build;
pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod fingerprint;
pub mod project;
pub mod remote;
pub mod status;
pub mod sync;
pub mod synctex;
pub mod ui;

pub use error::{TexsyncError, TexsyncResult};
