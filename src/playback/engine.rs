use lru::LruCache;
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};
use std::collections::HashMap;
use std::io::Cursor;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use tokio::sync::broadcast;

use crate::core::media::MediaKind;
use crate::playback::ffmpeg;
use crate::remote::client::LibraryClient;

/// How many fetched/rendered media payloads to keep around. Restarting
/// everything on play-all hits this cache instead of the network.
const BYTES_CACHE_ENTRIES: usize = 32;

/// Who owns a sink: one per grid item, plus the dedicated fullscreen-overlay
/// and background-music slots. The overlay never reuses an item's sink, so
/// the two cannot fight over one stream's state.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SlotKey {
    Item(String),
    Overlay,
    Music,
}

#[derive(Debug, Clone)]
pub enum PlaybackEvent {
    /// The stream is decoded and audible; the app re-syncs desired state on
    /// delivery (the user may have paused or removed the item meanwhile).
    Started { slot: SlotKey },
    /// The stream could not start. Expected: no output device, undecodable
    /// payload, ffmpeg missing or saturated. The item just stays paused.
    Rejected { slot: SlotKey, reason: String },
}

/// Bytes shared between the cache and live decoders without copying.
#[derive(Clone)]
struct SharedBytes(Arc<Vec<u8>>);

impl AsRef<[u8]> for SharedBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

struct EngineShared {
    sinks: Mutex<HashMap<SlotKey, Sink>>,
    /// Start tokens. A start may only install its sink if its token is still
    /// the current one for the slot; stop() and newer starts invalidate it.
    /// This is what keeps a slow fetch from resurrecting a removed item.
    tokens: Mutex<HashMap<SlotKey, u64>>,
    bytes_cache: Mutex<LruCache<String, Arc<Vec<u8>>>>,
}

/// Executes the audio side of grid effects: per-item rodio sinks, the
/// overlay slot, and the background-music slot.
pub struct PlaybackEngine {
    _stream: Option<OutputStream>,
    handle: Option<OutputStreamHandle>,
    client: LibraryClient,
    shared: Arc<EngineShared>,
    next_token: AtomicU64,
    event_sender: broadcast::Sender<PlaybackEvent>,
}

impl PlaybackEngine {
    pub fn new(client: LibraryClient) -> (Self, broadcast::Receiver<PlaybackEvent>) {
        let (event_sender, event_receiver) = broadcast::channel(32);

        let (stream, handle) = match OutputStream::try_default() {
            Ok((stream, handle)) => (Some(stream), Some(handle)),
            Err(e) => {
                // Not fatal: every start will be rejected and the grid keeps
                // working silently.
                log::warn!("No audio output device ({}), playback disabled", e);
                (None, None)
            }
        };

        let engine = Self {
            _stream: stream,
            handle,
            client,
            shared: Arc::new(EngineShared {
                sinks: Mutex::new(HashMap::new()),
                tokens: Mutex::new(HashMap::new()),
                bytes_cache: Mutex::new(LruCache::new(
                    NonZeroUsize::new(BYTES_CACHE_ENTRIES).unwrap(),
                )),
            }),
            next_token: AtomicU64::new(0),
            event_sender,
        };
        (engine, event_receiver)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PlaybackEvent> {
        self.event_sender.subscribe()
    }

    pub fn output_available(&self) -> bool {
        self.handle.is_some()
    }

    pub fn has_item(&self, name: &str) -> bool {
        self.shared
            .sinks
            .lock()
            .map(|sinks| sinks.contains_key(&SlotKey::Item(name.to_string())))
            .unwrap_or(false)
    }

    // -- grid item slots ---------------------------------------------------

    /// Start (or restart from zero) an item's stream. A newer start for the
    /// same slot supersedes any in-flight one.
    pub fn start_item(&self, name: &str, kind: MediaKind, muted: bool) {
        self.start_slot(SlotKey::Item(name.to_string()), name, kind, muted, true);
    }

    pub fn pause_item(&self, name: &str) {
        self.with_sink(&SlotKey::Item(name.to_string()), |sink| sink.pause());
    }

    pub fn resume_item(&self, name: &str) {
        self.with_sink(&SlotKey::Item(name.to_string()), |sink| sink.play());
    }

    pub fn stop_item(&self, name: &str) {
        self.stop_slot(&SlotKey::Item(name.to_string()));
    }

    pub fn set_item_rate(&self, name: &str, rate: f32) {
        self.with_sink(&SlotKey::Item(name.to_string()), |sink| {
            sink.set_speed(rate)
        });
    }

    pub fn set_item_muted(&self, name: &str, muted: bool) {
        self.with_sink(&SlotKey::Item(name.to_string()), |sink| {
            sink.set_volume(if muted { 0.0 } else { 1.0 })
        });
    }

    // -- dedicated slots ---------------------------------------------------

    pub fn start_overlay(&self, name: &str, kind: MediaKind) {
        // The overlay plays audible and once through, like a focused viewer.
        self.start_slot(SlotKey::Overlay, name, kind, false, false);
    }

    pub fn stop_overlay(&self) {
        self.stop_slot(&SlotKey::Overlay);
    }

    pub fn start_music(&self, name: &str) {
        self.start_slot(SlotKey::Music, name, MediaKind::Audio, false, true);
    }

    pub fn stop_music(&self) {
        self.stop_slot(&SlotKey::Music);
    }

    pub fn pause_music(&self) {
        self.with_sink(&SlotKey::Music, |sink| sink.pause());
    }

    pub fn resume_music(&self) {
        self.with_sink(&SlotKey::Music, |sink| sink.play());
    }

    pub fn has_music(&self) -> bool {
        self.shared
            .sinks
            .lock()
            .map(|sinks| sinks.contains_key(&SlotKey::Music))
            .unwrap_or(false)
    }

    // -- internals ---------------------------------------------------------

    fn start_slot(&self, slot: SlotKey, name: &str, kind: MediaKind, muted: bool, looped: bool) {
        let Some(handle) = self.handle.clone() else {
            self.reject(slot, "no audio output device".to_string());
            return;
        };
        if kind == MediaKind::Video && !ffmpeg::is_available() {
            self.reject(slot, "ffmpeg is not available".to_string());
            return;
        }

        let token = self.issue_token(&slot);
        let shared = Arc::clone(&self.shared);
        let client = self.client.clone();
        let sender = self.event_sender.clone();
        let name = name.to_string();

        thread::spawn(move || {
            let bytes = match fetch_bytes(&shared, &client, &name, kind) {
                Ok(bytes) => bytes,
                Err(reason) => {
                    log::info!("Could not fetch stream for {}: {}", name, reason);
                    let _ = sender.send(PlaybackEvent::Rejected { slot, reason });
                    return;
                }
            };

            let sink = match Sink::try_new(&handle) {
                Ok(sink) => sink,
                Err(e) => {
                    let _ = sender.send(PlaybackEvent::Rejected {
                        slot,
                        reason: e.to_string(),
                    });
                    return;
                }
            };
            sink.set_volume(if muted { 0.0 } else { 1.0 });

            let cursor = Cursor::new(SharedBytes(bytes));
            let appended = if looped {
                Decoder::new_looped(cursor)
                    .map(|source| sink.append(source))
                    .map_err(|e| e.to_string())
            } else {
                Decoder::new(cursor)
                    .map(|source| sink.append(source))
                    .map_err(|e| e.to_string())
            };
            if let Err(reason) = appended {
                log::info!("Undecodable stream for {}: {}", name, reason);
                let _ = sender.send(PlaybackEvent::Rejected { slot, reason });
                return;
            }

            // Install only if this start is still the current one; otherwise
            // dropping the sink stops the sound before it is ever heard.
            {
                let tokens = shared.tokens.lock().unwrap();
                if tokens.get(&slot) != Some(&token) {
                    log::debug!("Discarding stream for {:?}: superseded or stopped", slot);
                    return;
                }
                shared.sinks.lock().unwrap().insert(slot.clone(), sink);
            }
            let _ = sender.send(PlaybackEvent::Started { slot });
        });
    }

    fn stop_slot(&self, slot: &SlotKey) {
        self.shared.tokens.lock().unwrap().remove(slot);
        if let Some(sink) = self.shared.sinks.lock().unwrap().remove(slot) {
            sink.stop();
        }
    }

    fn with_sink(&self, slot: &SlotKey, f: impl FnOnce(&Sink)) {
        // Operating on a missing sink is the normal stale-reference case.
        if let Some(sink) = self.shared.sinks.lock().unwrap().get(slot) {
            f(sink);
        }
    }

    fn issue_token(&self, slot: &SlotKey) -> u64 {
        let token = self.next_token.fetch_add(1, Ordering::SeqCst) + 1;
        self.shared.tokens.lock().unwrap().insert(slot.clone(), token);
        token
    }

    fn reject(&self, slot: SlotKey, reason: String) {
        log::info!("Playback rejected for {:?}: {}", slot, reason);
        let _ = self.event_sender.send(PlaybackEvent::Rejected { slot, reason });
    }
}

/// Get the payload for a stream, preferring the cache. Audio files are the
/// raw server bytes; video files are rendered to WAV through ffmpeg.
fn fetch_bytes(
    shared: &EngineShared,
    client: &LibraryClient,
    name: &str,
    kind: MediaKind,
) -> Result<Arc<Vec<u8>>, String> {
    if let Ok(mut cache) = shared.bytes_cache.lock() {
        if let Some(bytes) = cache.get(name) {
            return Ok(Arc::clone(bytes));
        }
    }

    let bytes = match kind {
        MediaKind::Video => ffmpeg::render_wav(&client.file_url(name)).map_err(|e| e.to_string())?,
        _ => client.download(name).map_err(|e| e.to_string())?,
    };

    let bytes = Arc::new(bytes);
    if let Ok(mut cache) = shared.bytes_cache.lock() {
        cache.put(name.to_string(), Arc::clone(&bytes));
    }
    Ok(bytes)
}
