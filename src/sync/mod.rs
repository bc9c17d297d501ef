//! Delta synchronization with the compile server

pub mod multipart;
pub mod negotiator;

pub use negotiator::{
    plan_upload, summarize_changes, ChangeSummary, DeltaManifest, Negotiator, SyncRequest,
};
