//! `multipart/form-data` encoding for build uploads
//!
//! The upload is one manifest part (JSON) followed by one `files` part per
//! changed file, in that order.

use crate::error::TexsyncResult;
use crate::remote::{UploadFile, UploadManifest};
use uuid::Uuid;

/// An encoded request body and its content type
#[derive(Debug, Clone)]
pub struct MultipartBody {
    pub boundary: String,
    pub bytes: Vec<u8>,
}

impl MultipartBody {
    /// Value for the `Content-Type` header
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }
}

/// Encode the upload with a fresh random boundary
pub fn encode_upload(manifest: &UploadManifest, files: &[UploadFile]) -> TexsyncResult<MultipartBody> {
    let boundary = format!("texsync-{}", Uuid::new_v4().simple());
    encode_with_boundary(&boundary, manifest, files)
}

fn encode_with_boundary(
    boundary: &str,
    manifest: &UploadManifest,
    files: &[UploadFile],
) -> TexsyncResult<MultipartBody> {
    let manifest_json = serde_json::to_vec(manifest)?;
    let mut bytes = Vec::with_capacity(
        manifest_json.len() + files.iter().map(|f| f.content.len() + 256).sum::<usize>() + 256,
    );

    push_part(
        &mut bytes,
        boundary,
        "form-data; name=\"manifest\"",
        "application/json",
        &manifest_json,
    );

    for file in files {
        let disposition = format!(
            "form-data; name=\"files\"; filename=\"{}\"",
            escape_quoted(&file.name)
        );
        push_part(
            &mut bytes,
            boundary,
            &disposition,
            "application/octet-stream",
            &file.content,
        );
    }

    bytes.extend_from_slice(format!("--{}--\r\n", boundary).as_bytes());

    Ok(MultipartBody {
        boundary: boundary.to_string(),
        bytes,
    })
}

fn push_part(out: &mut Vec<u8>, boundary: &str, disposition: &str, content_type: &str, body: &[u8]) {
    out.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
    out.extend_from_slice(format!("Content-Disposition: {}\r\n", disposition).as_bytes());
    out.extend_from_slice(format!("Content-Type: {}\r\n\r\n", content_type).as_bytes());
    out.extend_from_slice(body);
    out.extend_from_slice(b"\r\n");
}

/// Percent-escape characters that would break a quoted header parameter
fn escape_quoted(value: &str) -> String {
    value
        .replace('"', "%22")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}
