//! Build lifecycle
//!
//! Sessions, the controller that drives them, and the history log of
//! finished builds.

pub mod controller;
pub mod history;
pub mod session;

pub use controller::{BuildController, BuildOptions, BuildStart, StatusOutcome};
pub use history::BuildHistory;
pub use session::{
    local_build_id, BuildSession, BuildState, Engine, QUEUED_MESSAGE, START_FAILED_MESSAGE,
};
