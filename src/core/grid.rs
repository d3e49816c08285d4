use std::collections::HashSet;
use std::time::{Duration, Instant};

use crate::core::media::{FileDescriptor, MediaKind};

pub const DEFAULT_HOVER_RATE: f32 = 1.5;
pub const DEFAULT_HOVER_LEAVE_DELAY_MS: u64 = 50;
pub const DEFAULT_DOCUMENT_RELOAD_DELAY_MS: u64 = 10;

/// Transport state of a native (video/audio) surface.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackState {
    pub playing: bool,
    pub muted: bool,
    pub rate: f32,
}

/// Where an embedded document currently is in its blank/restore cycle.
///
/// Embedded documents have no transport API: "pause" swaps the source out for
/// a blank placeholder and "resume" restores it. A forced reload passes
/// through `Reloading` so the restore happens a beat later and the surface
/// treats it as a fresh navigation instead of a no-op.
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentPhase {
    Loaded,
    Blanked,
    Reloading { restore_at: Instant },
}

/// The playback surface owned by a grid item. The pausable-media vs
/// reloadable-document split is a real capability difference and is kept
/// explicit rather than hidden behind a shared transport interface.
#[derive(Debug, Clone, PartialEq)]
pub enum Surface {
    Native(PlaybackState),
    Document { phase: DocumentPhase },
    Still,
}

/// One rendered, playable unit corresponding to one file.
#[derive(Debug, Clone)]
pub struct GridItem {
    pub name: String,
    pub kind: MediaKind,
    pub surface: Surface,
    pub hovered: bool,
    hover_leave_at: Option<Instant>,
}

impl GridItem {
    fn new(descriptor: &FileDescriptor) -> Self {
        let surface = match descriptor.kind {
            MediaKind::Html => Surface::Document {
                phase: DocumentPhase::Loaded,
            },
            // Unattended video autoplay starts muted; audio is audible from
            // the start.
            MediaKind::Video => Surface::Native(PlaybackState {
                playing: true,
                muted: true,
                rate: 1.0,
            }),
            MediaKind::Audio => Surface::Native(PlaybackState {
                playing: true,
                muted: false,
                rate: 1.0,
            }),
            MediaKind::Image | MediaKind::Unknown => Surface::Still,
        };

        Self {
            name: descriptor.name.clone(),
            kind: descriptor.kind,
            surface,
            hovered: false,
            hover_leave_at: None,
        }
    }

    pub fn playback(&self) -> Option<&PlaybackState> {
        match &self.surface {
            Surface::Native(state) => Some(state),
            _ => None,
        }
    }

    pub fn document_phase(&self) -> Option<&DocumentPhase> {
        match &self.surface {
            Surface::Document { phase } => Some(phase),
            _ => None,
        }
    }
}

/// Everything a UI affordance can ask the grid to do. Commands are consumed
/// by `GridState::apply`, the single transition function, so behavior is
/// testable without a live rendering surface.
#[derive(Debug, Clone)]
pub enum Command {
    Add(FileDescriptor),
    Remove(String),
    TogglePlayback(String),
    ToggleMute(String),
    HoverEnter(String),
    HoverLeave(String),
    /// Global transport: restart everything from zero.
    PlayAll,
    /// Global transport: one aggregate decision, all-play or all-pause.
    ToggleAll,
    /// The playback engine could not start this item's stream.
    PlaybackRejected(String),
    /// Commit deferred transitions (hover-leave debounce, document restores).
    Tick,
}

/// Side effects requested by a transition, executed by the playback engine
/// and the document/image loaders. The state machine itself never touches a
/// sink or a socket.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    AudioStart { name: String, kind: MediaKind, muted: bool },
    AudioRestart { name: String, kind: MediaKind, muted: bool },
    AudioPause { name: String },
    AudioResume { name: String },
    AudioStop { name: String },
    AudioSetRate { name: String, rate: f32 },
    AudioSetMuted { name: String, muted: bool },
    DocumentLoad { name: String },
    DocumentBlank { name: String },
    DocumentRestore { name: String },
    ImageLoad { name: String },
    /// The member set changed: persist the session, refresh placeholder and
    /// sidebar badges.
    MembershipChanged,
}

/// Grid membership plus every live item, owned by the top-level app and
/// mutated only through `apply`.
#[derive(Debug)]
pub struct GridState {
    items: Vec<GridItem>,
    members: HashSet<String>,
    hover_rate: f32,
    hover_leave_delay: Duration,
    document_reload_delay: Duration,
}

impl Default for GridState {
    fn default() -> Self {
        Self::new(
            DEFAULT_HOVER_RATE,
            Duration::from_millis(DEFAULT_HOVER_LEAVE_DELAY_MS),
            Duration::from_millis(DEFAULT_DOCUMENT_RELOAD_DELAY_MS),
        )
    }
}

impl GridState {
    pub fn new(
        hover_rate: f32,
        hover_leave_delay: Duration,
        document_reload_delay: Duration,
    ) -> Self {
        Self {
            items: Vec::new(),
            members: HashSet::new(),
            hover_rate,
            hover_leave_delay,
            document_reload_delay,
        }
    }

    pub fn items(&self) -> &[GridItem] {
        &self.items
    }

    pub fn item(&self, name: &str) -> Option<&GridItem> {
        self.items.iter().find(|i| i.name == name)
    }

    fn item_mut(&mut self, name: &str) -> Option<&mut GridItem> {
        self.items.iter_mut().find(|i| i.name == name)
    }

    pub fn is_member(&self, name: &str) -> bool {
        self.members.contains(name)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Member names in grid order, the shape the session store persists.
    pub fn member_names(&self) -> Vec<String> {
        self.items.iter().map(|i| i.name.clone()).collect()
    }

    /// The single state-transition function. Every mutation of membership,
    /// transport state, and hover state goes through here.
    pub fn apply(&mut self, command: Command, now: Instant) -> Vec<Effect> {
        match command {
            Command::Add(descriptor) => self.add(descriptor),
            Command::Remove(name) => self.remove(&name),
            Command::TogglePlayback(name) => self.toggle_playback(&name),
            Command::ToggleMute(name) => self.toggle_mute(&name),
            Command::HoverEnter(name) => self.hover_enter(&name),
            Command::HoverLeave(name) => self.hover_leave(&name, now),
            Command::PlayAll => self.play_all(now),
            Command::ToggleAll => self.toggle_all(),
            Command::PlaybackRejected(name) => self.playback_rejected(&name),
            Command::Tick => self.tick(now),
        }
    }

    fn add(&mut self, descriptor: FileDescriptor) -> Vec<Effect> {
        // Double-clicks and repeated drops are expected; adding twice is a
        // contract-level no-op, not an error.
        if self.members.contains(&descriptor.name) {
            log::debug!("{} is already on the grid", descriptor.name);
            return Vec::new();
        }

        self.members.insert(descriptor.name.clone());
        let item = GridItem::new(&descriptor);
        log::info!("Added {} ({:?}) to the grid", item.name, item.kind);

        let mut effects = Vec::new();
        match descriptor.kind {
            MediaKind::Html => effects.push(Effect::DocumentLoad {
                name: descriptor.name.clone(),
            }),
            MediaKind::Video => effects.push(Effect::AudioStart {
                name: descriptor.name.clone(),
                kind: MediaKind::Video,
                muted: true,
            }),
            MediaKind::Audio => effects.push(Effect::AudioStart {
                name: descriptor.name.clone(),
                kind: MediaKind::Audio,
                muted: false,
            }),
            MediaKind::Image => effects.push(Effect::ImageLoad {
                name: descriptor.name.clone(),
            }),
            MediaKind::Unknown => {}
        }

        self.items.push(item);
        effects.push(Effect::MembershipChanged);
        effects
    }

    fn remove(&mut self, name: &str) -> Vec<Effect> {
        let Some(index) = self.items.iter().position(|i| i.name == name) else {
            return Vec::new();
        };

        let item = self.items.remove(index);
        self.members.remove(name);
        log::info!("Removed {} from the grid", name);

        let mut effects = Vec::new();
        // Stop native playback before the surface is discarded, otherwise a
        // detached sink keeps producing sound.
        if item.playback().is_some() {
            effects.push(Effect::AudioStop {
                name: name.to_string(),
            });
        }
        effects.push(Effect::MembershipChanged);
        effects
    }

    fn toggle_playback(&mut self, name: &str) -> Vec<Effect> {
        let hover_rate = self.hover_rate;
        let Some(item) = self.item_mut(name) else {
            return Vec::new();
        };

        let hovered = item.hovered;
        match &mut item.surface {
            Surface::Native(state) => {
                if state.playing {
                    state.playing = false;
                    vec![Effect::AudioPause {
                        name: name.to_string(),
                    }]
                } else {
                    state.playing = true;
                    let mut effects = vec![Effect::AudioResume {
                        name: name.to_string(),
                    }];
                    // Resuming under the pointer picks the hover rate back up.
                    if hovered {
                        state.rate = hover_rate;
                        effects.push(Effect::AudioSetRate {
                            name: name.to_string(),
                            rate: hover_rate,
                        });
                    }
                    effects
                }
            }
            Surface::Document { phase } => match phase {
                DocumentPhase::Loaded | DocumentPhase::Reloading { .. } => {
                    *phase = DocumentPhase::Blanked;
                    vec![Effect::DocumentBlank {
                        name: name.to_string(),
                    }]
                }
                DocumentPhase::Blanked => {
                    *phase = DocumentPhase::Loaded;
                    vec![Effect::DocumentRestore {
                        name: name.to_string(),
                    }]
                }
            },
            Surface::Still => Vec::new(),
        }
    }

    fn toggle_mute(&mut self, name: &str) -> Vec<Effect> {
        let Some(item) = self.item_mut(name) else {
            return Vec::new();
        };
        // Mute only exists on native media; documents and stills are never
        // affected.
        match &mut item.surface {
            Surface::Native(state) => {
                state.muted = !state.muted;
                vec![Effect::AudioSetMuted {
                    name: name.to_string(),
                    muted: state.muted,
                }]
            }
            _ => Vec::new(),
        }
    }

    fn hover_enter(&mut self, name: &str) -> Vec<Effect> {
        let hover_rate = self.hover_rate;
        let Some(item) = self.item_mut(name) else {
            return Vec::new();
        };

        // Re-entering cancels a pending debounced leave so the pointer
        // crossing internal tile boundaries does not flicker the rate.
        item.hover_leave_at = None;
        if item.hovered {
            return Vec::new();
        }
        item.hovered = true;

        match &mut item.surface {
            // Speed-up only applies to media that is actually playing.
            Surface::Native(state) if state.playing => {
                state.rate = hover_rate;
                vec![Effect::AudioSetRate {
                    name: name.to_string(),
                    rate: hover_rate,
                }]
            }
            _ => Vec::new(),
        }
    }

    fn hover_leave(&mut self, name: &str, now: Instant) -> Vec<Effect> {
        let delay = self.hover_leave_delay;
        if let Some(item) = self.item_mut(name) {
            if item.hovered && item.hover_leave_at.is_none() {
                item.hover_leave_at = Some(now + delay);
            }
        }
        Vec::new()
    }

    fn play_all(&mut self, now: Instant) -> Vec<Effect> {
        let restore_at = now + self.document_reload_delay;
        let mut effects = Vec::new();

        for item in &mut self.items {
            match &mut item.surface {
                Surface::Native(state) => {
                    state.playing = true;
                    state.rate = 1.0;
                    effects.push(Effect::AudioRestart {
                        name: item.name.clone(),
                        kind: item.kind,
                        muted: state.muted,
                    });
                }
                Surface::Document { phase } => {
                    // Blank now, restore on a later tick; restoring in the
                    // same instant would not register as a fresh navigation.
                    *phase = DocumentPhase::Reloading { restore_at };
                    effects.push(Effect::DocumentBlank {
                        name: item.name.clone(),
                    });
                }
                Surface::Still => {}
            }
        }
        effects
    }

    fn toggle_all(&mut self) -> Vec<Effect> {
        // One decision over the aggregate: a half-playing grid is driven
        // fully paused, and a fully paused grid fully playing.
        let any_playing = self
            .items
            .iter()
            .any(|i| i.playback().map(|s| s.playing).unwrap_or(false));

        let mut effects = Vec::new();
        for item in &mut self.items {
            if let Surface::Native(state) = &mut item.surface {
                if any_playing && state.playing {
                    state.playing = false;
                    effects.push(Effect::AudioPause {
                        name: item.name.clone(),
                    });
                } else if !any_playing {
                    state.playing = true;
                    effects.push(Effect::AudioResume {
                        name: item.name.clone(),
                    });
                }
            }
        }
        effects
    }

    fn playback_rejected(&mut self, name: &str) -> Vec<Effect> {
        if let Some(item) = self.item_mut(name) {
            if let Surface::Native(state) = &mut item.surface {
                // Expected under autoplay restrictions and on missing
                // decoders; the item just shows as paused.
                log::info!("Playback start rejected for {}; leaving it paused", name);
                state.playing = false;
            }
        }
        Vec::new()
    }

    fn tick(&mut self, now: Instant) -> Vec<Effect> {
        let mut effects = Vec::new();

        for item in &mut self.items {
            if let Some(deadline) = item.hover_leave_at {
                if now >= deadline {
                    item.hover_leave_at = None;
                    item.hovered = false;
                    if let Surface::Native(state) = &mut item.surface {
                        if (state.rate - 1.0).abs() > f32::EPSILON {
                            state.rate = 1.0;
                            effects.push(Effect::AudioSetRate {
                                name: item.name.clone(),
                                rate: 1.0,
                            });
                        }
                    }
                }
            }

            if let Surface::Document { phase } = &mut item.surface {
                if let DocumentPhase::Reloading { restore_at } = phase {
                    if now >= *restore_at {
                        *phase = DocumentPhase::Loaded;
                        effects.push(Effect::DocumentRestore {
                            name: item.name.clone(),
                        });
                    }
                }
            }
        }
        effects
    }
}
