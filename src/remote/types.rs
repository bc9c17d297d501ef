//! Wire types exchanged with the compile server
//!
//! All payloads use camelCase JSON.

use crate::build::{BuildState, Engine};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Opens a delta-synced build
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildInitRequest {
    pub project_id: String,
    pub project_name: String,
    pub main_file: String,
    pub engine: Engine,
    pub shell_escape: bool,
    /// Every candidate file, name -> fingerprint
    pub file_checksums: BTreeMap<String, String>,
}

/// What the server already holds for this project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExistingFile {
    pub checksum: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildInitResponse {
    pub build_id: String,
    #[serde(default)]
    pub existing_files: HashMap<String, ExistingFile>,
}

/// JSON part of the upload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadManifest {
    /// Files the server resolves from its own store, name -> fingerprint
    pub cached_files: BTreeMap<String, String>,
    pub main_file: String,
    pub engine: Engine,
    pub shell_escape: bool,
}

/// Binary part of the upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub name: String,
    pub content: Vec<u8>,
}

/// Single-shot build without delta sync
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyBuildRequest {
    pub main_file: String,
    pub engine: Engine,
    pub shell_escape: bool,
}

/// Acknowledgement of a legacy build trigger
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildAck {
    #[serde(default)]
    pub build_id: Option<String>,
}

/// Pushed build status
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusEvent {
    pub id: String,
    pub state: BuildState,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub ended_at: Option<DateTime<Utc>>,
}

/// Forward search input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewQuery {
    pub file: String,
    pub line: u32,
    pub column: u32,
}

/// Forward search hit: where a source position lands in the PDF
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewResult {
    pub page: u32,
    pub x: f64,
    pub y: f64,
    pub file: String,
    pub line: u32,
}

/// Inverse search input
#[derive(Debug, Clone, PartialEq)]
pub struct EditQuery {
    pub page: u32,
    pub x: f64,
    pub y: f64,
}

/// Inverse search hit: source position under a PDF point
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditResult {
    pub file: String,
    pub line: u32,
    #[serde(alias = "column")]
    pub col: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_request_uses_camel_case() {
        let request = BuildInitRequest {
            project_id: "p1".to_string(),
            project_name: "thesis".to_string(),
            main_file: "main.tex".to_string(),
            engine: Engine::Xelatex,
            shell_escape: true,
            file_checksums: BTreeMap::from([("main.tex".to_string(), "h1".to_string())]),
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["projectId"], "p1");
        assert_eq!(json["shellEscape"], true);
        assert_eq!(json["engine"], "xelatex");
        assert_eq!(json["fileChecksums"]["main.tex"], "h1");
    }

    #[test]
    fn init_response_tolerates_missing_existing_files() {
        let response: BuildInitResponse = serde_json::from_str(r#"{"buildId":"b1"}"#).unwrap();
        assert_eq!(response.build_id, "b1");
        assert!(response.existing_files.is_empty());
    }

    #[test]
    fn status_event_parses_optional_timestamps() {
        let event: StatusEvent = serde_json::from_str(
            r#"{"id":"b1","state":"success","message":"done","endedAt":"2024-05-01T10:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(event.state, BuildState::Success);
        assert!(event.started_at.is_none());
        assert!(event.ended_at.is_some());
    }

    #[test]
    fn edit_result_accepts_column_alias() {
        let result: EditResult =
            serde_json::from_str(r#"{"file":"main.tex","line":12,"column":4}"#).unwrap();
        assert_eq!(result.col, 4);
    }
}
