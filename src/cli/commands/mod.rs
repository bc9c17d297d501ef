//! CLI command implementations

pub mod build;
pub mod cache;
pub mod completions;
pub mod config;
pub mod history;
pub mod init;
pub mod synctex;

pub use build::execute as build;
pub use cache::execute as cache;
pub use completions::execute as completions;
pub use config::execute as config;
pub use history::execute as history;
pub use init::execute as init;
pub use synctex::execute as synctex;

use crate::error::{TexsyncError, TexsyncResult};
use crate::project::Project;
use std::path::Path;

/// Open the project at `path`, or the current directory
pub(crate) fn open_project(path: Option<&Path>) -> TexsyncResult<Project> {
    match path {
        Some(path) => Project::open(path),
        None => {
            let cwd = std::env::current_dir()
                .map_err(|e| TexsyncError::io("getting current directory", e))?;
            Project::open(&cwd)
        }
    }
}
