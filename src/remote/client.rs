use serde::Deserialize;
use std::time::Duration;
use uuid::Uuid;

use crate::core::media::{FileDescriptor, MediaKind};

/// Failures talking to the library service. Catalog failures are recovered
/// by keeping the previous listing; only upload failures reach the user.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    #[error("request failed: {0}")]
    Http(#[from] ureq::Error),
}

#[derive(Debug, Deserialize)]
struct FolderResponse {
    path: String,
}

#[derive(Debug, Deserialize)]
struct WireFile {
    name: String,
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadResponse {
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
}

impl UploadResponse {
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

/// Blocking client for the library service. Cheap to clone (the agent holds
/// its connection pool behind an Arc); every call runs on a worker thread.
#[derive(Clone)]
pub struct LibraryClient {
    base_url: String,
    agent: ureq::Agent,
}

impl LibraryClient {
    pub fn new(base_url: &str) -> Self {
        // Error statuses are handled as data: the upload endpoint reports
        // failures as JSON bodies on 4xx/5xx responses.
        let agent = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(30)))
            .http_status_as_error(false)
            .build()
            .new_agent();

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            agent,
        }
    }

    /// `GET /api/folder` — the directory the service is exposing.
    pub fn fetch_folder(&self) -> Result<String, RemoteError> {
        let mut response = self
            .agent
            .get(format!("{}/api/folder", self.base_url))
            .call()?;
        let folder: FolderResponse = response.body_mut().read_json()?;
        Ok(folder.path)
    }

    /// `GET /api/files` — the ordered listing, in server order.
    pub fn fetch_files(&self) -> Result<Vec<FileDescriptor>, RemoteError> {
        let mut response = self
            .agent
            .get(format!("{}/api/files", self.base_url))
            .call()?;
        let files: Vec<WireFile> = response.body_mut().read_json()?;
        Ok(files
            .into_iter()
            .map(|f| FileDescriptor {
                kind: MediaKind::from_wire(&f.kind),
                name: f.name,
            })
            .collect())
    }

    /// Where the raw bytes of a file live.
    pub fn file_url(&self, name: &str) -> String {
        format!("{}/files/{}", self.base_url, encode_path_segment(name))
    }

    /// Fetch the raw bytes of a file.
    pub fn download(&self, name: &str) -> Result<Vec<u8>, RemoteError> {
        let mut response = self.agent.get(self.file_url(name)).call()?;
        Ok(response.body_mut().read_to_vec()?)
    }

    /// `POST /api/upload` — multipart form with a single `file` field.
    pub fn upload(&self, file_name: &str, bytes: &[u8]) -> Result<UploadResponse, RemoteError> {
        let boundary = format!("media-wall-{}", Uuid::new_v4().simple());
        let body = multipart_body(&boundary, file_name, bytes);

        let mut response = self
            .agent
            .post(format!("{}/api/upload", self.base_url))
            .header(
                "Content-Type",
                format!("multipart/form-data; boundary={}", boundary),
            )
            .send(&body[..])?;
        Ok(response.body_mut().read_json()?)
    }
}

/// Percent-encode one path segment. Server file names routinely contain
/// spaces and non-ASCII characters.
fn encode_path_segment(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for byte in name.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

fn multipart_body(boundary: &str, file_name: &str, bytes: &[u8]) -> Vec<u8> {
    let mut body = Vec::with_capacity(bytes.len() + 256);
    body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\n",
            file_name.replace('"', "_")
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());
    body
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_path_segment() {
        assert_eq!(encode_path_segment("plain.mp4"), "plain.mp4");
        assert_eq!(
            encode_path_segment("WhatsApp Video 2025.mp4"),
            "WhatsApp%20Video%202025.mp4"
        );
        assert_eq!(encode_path_segment("a&b?.html"), "a%26b%3F.html");
        assert_eq!(encode_path_segment("привет.mp3"), "%D0%BF%D1%80%D0%B8%D0%B2%D0%B5%D1%82.mp3");
    }

    #[test]
    fn test_file_url_joins_and_encodes() {
        let client = LibraryClient::new("http://localhost:5001/");
        assert_eq!(
            client.file_url("my file.mp4"),
            "http://localhost:5001/files/my%20file.mp4"
        );
    }

    #[test]
    fn test_wire_file_parsing() {
        let files: Vec<WireFile> = serde_json::from_str(
            r#"[{"name": "a.mp4", "type": "video"}, {"name": "b.xyz", "type": "weird"}]"#,
        )
        .unwrap();
        assert_eq!(files.len(), 2);
        assert_eq!(MediaKind::from_wire(&files[0].kind), MediaKind::Video);
        assert_eq!(MediaKind::from_wire(&files[1].kind), MediaKind::Unknown);
    }

    #[test]
    fn test_upload_response_status() {
        let ok: UploadResponse = serde_json::from_str(r#"{"status": "success"}"#).unwrap();
        assert!(ok.is_success());
        assert!(ok.message.is_none());

        let err: UploadResponse =
            serde_json::from_str(r#"{"status": "error", "message": "Format not allowed"}"#)
                .unwrap();
        assert!(!err.is_success());
        assert_eq!(err.message.as_deref(), Some("Format not allowed"));
    }

    #[test]
    fn test_multipart_body_shape() {
        let body = multipart_body("XYZ", "song.mp3", b"abc");
        let text = String::from_utf8_lossy(&body);
        assert!(text.starts_with("--XYZ\r\n"));
        assert!(text.contains("Content-Disposition: form-data; name=\"file\"; filename=\"song.mp3\""));
        assert!(text.contains("abc"));
        assert!(text.ends_with("\r\n--XYZ--\r\n"));
    }
}
