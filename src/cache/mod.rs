//! Persistent sync cache
//!
//! Remembers, per project, which fingerprint each file had in the last
//! successful build.
//!
//! # Layout
//!
//! | Path | Content |
//! |------|---------|
//! | `<state>/cache/<project_id>.json` | one `ProjectCache` namespace |
//!
//! A namespace survives restarts and is only replaced wholesale, so a
//! reload yields exactly the entries that were last flushed.

pub mod backend;
pub mod store;

pub use backend::{CacheBackend, JsonFileBackend, MemoryBackend};
pub use store::{CacheEntry, CacheStats, ProjectCache, SyncCache};
