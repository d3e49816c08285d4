use std::collections::{HashMap, HashSet};
use std::sync::{mpsc, Arc, Mutex};
use std::thread;

use crate::core::media::MediaKind;
use crate::playback::ffmpeg;
use crate::remote::client::LibraryClient;

/// Largest edge kept when decoding tile art. Tiles are small; full-size
/// photos would waste texture memory.
const MAX_ART_EDGE: u32 = 1024;

#[derive(Debug, Clone)]
struct ArtRequest {
    name: String,
    kind: MediaKind,
}

/// Background loader for tile art: decoded images for image files, ffmpeg
/// poster frames for videos. Results are plain `ColorImage`s; the UI thread
/// turns them into textures when it picks them up.
pub struct ArtWorker {
    request_sender: mpsc::Sender<ArtRequest>,
    ready: Arc<Mutex<HashMap<String, egui::ColorImage>>>,
    pending: Arc<Mutex<HashSet<String>>>,
}

impl ArtWorker {
    pub fn new(client: LibraryClient) -> Self {
        let (request_sender, request_receiver) = mpsc::channel::<ArtRequest>();
        let ready = Arc::new(Mutex::new(HashMap::new()));
        let pending = Arc::new(Mutex::new(HashSet::new()));

        let worker_ready = Arc::clone(&ready);
        let worker_pending = Arc::clone(&pending);
        thread::spawn(move || {
            while let Ok(request) = request_receiver.recv() {
                let result = match request.kind {
                    MediaKind::Image => client
                        .download(&request.name)
                        .map_err(|e| e.to_string())
                        .and_then(|bytes| decode_art(&bytes)),
                    MediaKind::Video => ffmpeg::extract_poster(&client.file_url(&request.name))
                        .map_err(|e| e.to_string())
                        .and_then(|bytes| decode_art(&bytes)),
                    _ => Err("kind has no art".to_string()),
                };

                match result {
                    Ok(art) => {
                        log::debug!("Art ready for {}", request.name);
                        if let Ok(mut ready) = worker_ready.lock() {
                            ready.insert(request.name.clone(), art);
                        }
                    }
                    // A tile without art still renders; this is cosmetic.
                    Err(e) => log::debug!("No art for {}: {}", request.name, e),
                }

                if let Ok(mut pending) = worker_pending.lock() {
                    pending.remove(&request.name);
                }
            }
        });

        Self {
            request_sender,
            ready,
            pending,
        }
    }

    /// Queue art generation unless it is already pending or delivered.
    pub fn request(&self, name: &str, kind: MediaKind) {
        if !matches!(kind, MediaKind::Image | MediaKind::Video) {
            return;
        }
        if let Ok(ready) = self.ready.lock() {
            if ready.contains_key(name) {
                return;
            }
        }
        if let Ok(mut pending) = self.pending.lock() {
            if !pending.insert(name.to_string()) {
                return;
            }
        }
        if self
            .request_sender
            .send(ArtRequest {
                name: name.to_string(),
                kind,
            })
            .is_err()
        {
            log::error!("Art worker is gone; no art for {}", name);
        }
    }

    /// Take a finished image; the caller uploads it as a texture.
    pub fn take(&self, name: &str) -> Option<egui::ColorImage> {
        self.ready.lock().ok()?.remove(name)
    }

    /// Forget any art for a removed item.
    pub fn discard(&self, name: &str) {
        if let Ok(mut ready) = self.ready.lock() {
            ready.remove(name);
        }
    }
}

fn decode_art(bytes: &[u8]) -> Result<egui::ColorImage, String> {
    let image = image::load_from_memory(bytes).map_err(|e| e.to_string())?;
    let image = image.thumbnail(MAX_ART_EDGE, MAX_ART_EDGE).to_rgba8();
    let size = [image.width() as usize, image.height() as usize];
    Ok(egui::ColorImage::from_rgba_unmultiplied(
        size,
        image.as_flat_samples().as_slice(),
    ))
}
