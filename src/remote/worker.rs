use std::path::PathBuf;
use std::thread;
use tokio::sync::broadcast;

use crate::core::media::FileDescriptor;
use crate::remote::client::LibraryClient;

/// Completion notices from the library service, drained by the UI once per
/// frame. Deliveries can arrive in any order relative to user actions; the
/// receiving side treats them as last-write-wins.
#[derive(Debug, Clone)]
pub enum RemoteEvent {
    Catalog {
        folder: String,
        files: Vec<FileDescriptor>,
    },
    CatalogFailed {
        reason: String,
    },
    Uploaded {
        file_name: String,
    },
    UploadFailed {
        reason: String,
    },
    DocumentFetched {
        name: String,
        byte_len: usize,
        title: Option<String>,
    },
    DocumentFailed {
        name: String,
    },
}

/// Runs library-service requests on background threads and reports results
/// over a broadcast channel.
pub struct RemoteWorker {
    client: LibraryClient,
    event_sender: broadcast::Sender<RemoteEvent>,
}

impl RemoteWorker {
    pub fn new(client: LibraryClient) -> (Self, broadcast::Receiver<RemoteEvent>) {
        let (event_sender, event_receiver) = broadcast::channel(32);
        (
            Self {
                client,
                event_sender,
            },
            event_receiver,
        )
    }

    pub fn client(&self) -> &LibraryClient {
        &self.client
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RemoteEvent> {
        self.event_sender.subscribe()
    }

    /// Fetch folder path and listing. There is no cancellation: if two
    /// refreshes overlap, whichever lands last wins the catalog.
    pub fn refresh_catalog(&self) {
        let client = self.client.clone();
        let sender = self.event_sender.clone();

        thread::spawn(move || {
            let result = client
                .fetch_folder()
                .and_then(|folder| client.fetch_files().map(|files| (folder, files)));

            let event = match result {
                Ok((folder, files)) => RemoteEvent::Catalog { folder, files },
                Err(e) => {
                    log::warn!("Catalog refresh failed: {}", e);
                    RemoteEvent::CatalogFailed {
                        reason: e.to_string(),
                    }
                }
            };
            if sender.send(event).is_err() {
                log::debug!("Catalog event dropped: no receiver");
            }
        });
    }

    /// Read a local file and push it to the service.
    pub fn upload(&self, path: PathBuf) {
        let client = self.client.clone();
        let sender = self.event_sender.clone();

        thread::spawn(move || {
            let file_name = path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("upload.bin")
                .to_string();

            let event = match std::fs::read(&path) {
                Ok(bytes) => match client.upload(&file_name, &bytes) {
                    Ok(response) if response.is_success() => {
                        log::info!("Uploaded {} ({} bytes)", file_name, bytes.len());
                        RemoteEvent::Uploaded { file_name }
                    }
                    Ok(response) => RemoteEvent::UploadFailed {
                        reason: response
                            .message
                            .unwrap_or_else(|| "upload rejected".to_string()),
                    },
                    Err(e) => {
                        log::warn!("Upload of {} failed: {}", file_name, e);
                        RemoteEvent::UploadFailed {
                            reason: e.to_string(),
                        }
                    }
                },
                Err(e) => {
                    log::warn!("Could not read {}: {}", path.display(), e);
                    RemoteEvent::UploadFailed {
                        reason: format!("could not read {}: {}", path.display(), e),
                    }
                }
            };

            if sender.send(event).is_err() {
                log::debug!("Upload event dropped: no receiver");
            }
        });
    }

    /// Fetch an embedded document so the tile can show something about it.
    pub fn fetch_document(&self, name: String) {
        let client = self.client.clone();
        let sender = self.event_sender.clone();

        thread::spawn(move || {
            let event = match client.download(&name) {
                Ok(bytes) => RemoteEvent::DocumentFetched {
                    title: document_title(&bytes),
                    byte_len: bytes.len(),
                    name,
                },
                Err(e) => {
                    log::warn!("Document fetch for {} failed: {}", name, e);
                    RemoteEvent::DocumentFailed { name }
                }
            };
            if sender.send(event).is_err() {
                log::debug!("Document event dropped: no receiver");
            }
        });
    }
}

/// Best-effort `<title>` extraction; anything unparseable just has no title.
fn document_title(bytes: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(bytes);
    let lower = text.to_lowercase();
    let start = lower.find("<title")?;
    let open_end = lower[start..].find('>')? + start + 1;
    let close = lower[open_end..].find("</title")? + open_end;
    let title = text[open_end..close].trim();
    if title.is_empty() {
        None
    } else {
        Some(title.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_title_extraction() {
        assert_eq!(
            document_title(b"<html><head><title>Intro</title></head></html>"),
            Some("Intro".to_string())
        );
        assert_eq!(
            document_title(b"<TITLE lang=\"en\"> Spaced </TITLE>"),
            Some("Spaced".to_string())
        );
        assert_eq!(document_title(b"<html><body>no title</body></html>"), None);
        assert_eq!(document_title(b"<title></title>"), None);
        assert_eq!(document_title(&[0xff, 0xfe, 0x00]), None);
    }
}
