use eframe::egui;
use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};
use tokio::sync::broadcast;

use crate::core::media::MediaKind;
use crate::core::{
    AppConfig, BackgroundMusic, Command, DocumentPhase, Effect, GridState, MediaCatalog,
    MusicEffect, SessionStore,
};
use crate::playback::ffmpeg;
use crate::playback::{ArtWorker, PlaybackEngine, PlaybackEvent, SlotKey};
use crate::remote::{LibraryClient, RemoteEvent, RemoteWorker};

/// What we know about a fetched embedded document, shown on its tile.
#[derive(Debug, Clone)]
pub struct DocumentInfo {
    pub byte_len: usize,
    pub title: Option<String>,
}

/// The fullscreen surface. It gets its own audio slot and never borrows the
/// grid item's, so closing it cannot disturb the wall.
#[derive(Debug, Clone)]
pub struct OverlayView {
    pub name: String,
    pub kind: MediaKind,
}

pub struct MediaWallApp {
    pub config: AppConfig,
    pub catalog: MediaCatalog,
    pub grid: GridState,
    pub session: SessionStore,
    pub music: BackgroundMusic,
    pub worker: RemoteWorker,
    pub remote_receiver: broadcast::Receiver<RemoteEvent>,
    pub engine: PlaybackEngine,
    pub playback_receiver: broadcast::Receiver<PlaybackEvent>,
    pub art: ArtWorker,
    pub sidebar_open: bool,
    pub overlay: Option<OverlayView>,
    pub documents: HashMap<String, DocumentInfo>,
    pub tile_textures: HashMap<String, egui::TextureHandle>,
    pub zoom: f32,
    pub status_message: String,
    /// Session reconciliation runs once, on the first successful listing.
    pub hydrated: bool,
    pub hovered_last_frame: HashSet<String>,
}

impl MediaWallApp {
    pub fn new(cc: &eframe::CreationContext<'_>) -> anyhow::Result<Self> {
        let mut visuals = egui::Visuals::dark();
        visuals.override_text_color = Some(egui::Color32::WHITE);
        cc.egui_ctx.set_visuals(visuals);

        let config = AppConfig::load()?;
        let client = LibraryClient::new(&config.server_url);

        let (worker, remote_receiver) = RemoteWorker::new(client.clone());
        let (engine, playback_receiver) = PlaybackEngine::new(client.clone());
        let art = ArtWorker::new(client);

        let session = SessionStore::load(AppConfig::session_path(), config.persist_session);
        let grid = GridState::new(
            config.hover_rate,
            Duration::from_millis(config.hover_leave_delay_ms),
            Duration::from_millis(config.document_reload_delay_ms),
        );

        // Probe early so the first video add does not pay for it.
        ffmpeg::is_available();

        log::info!("Fetching initial listing from {}", config.server_url);
        worker.refresh_catalog();

        let zoom = config.default_zoom;
        Ok(Self {
            config,
            catalog: MediaCatalog::new(),
            grid,
            session,
            music: BackgroundMusic::new(),
            worker,
            remote_receiver,
            engine,
            playback_receiver,
            art,
            sidebar_open: false,
            overlay: None,
            documents: HashMap::new(),
            tile_textures: HashMap::new(),
            zoom,
            status_message: String::new(),
            hydrated: false,
            hovered_last_frame: HashSet::new(),
        })
    }

    /// Run a grid command and execute whatever effects it produces.
    pub fn dispatch(&mut self, command: Command) {
        let effects = self.grid.apply(command, Instant::now());
        for effect in effects {
            self.run_effect(effect);
        }
    }

    fn run_effect(&mut self, effect: Effect) {
        match effect {
            Effect::AudioStart { name, kind, muted }
            | Effect::AudioRestart { name, kind, muted } => {
                self.engine.start_item(&name, kind, muted);
                if kind == MediaKind::Video {
                    self.art.request(&name, kind);
                }
            }
            Effect::AudioPause { name } => self.engine.pause_item(&name),
            Effect::AudioResume { name } => {
                if self.engine.has_item(&name) {
                    self.engine.resume_item(&name);
                } else if let Some(item) = self.grid.item(&name) {
                    // The original start was rejected; pressing play is the
                    // retry.
                    if let Some(state) = item.playback() {
                        self.engine.start_item(&name, item.kind, state.muted);
                    }
                }
            }
            Effect::AudioStop { name } => self.engine.stop_item(&name),
            Effect::AudioSetRate { name, rate } => self.engine.set_item_rate(&name, rate),
            Effect::AudioSetMuted { name, muted } => self.engine.set_item_muted(&name, muted),
            Effect::DocumentLoad { name } | Effect::DocumentRestore { name } => {
                self.documents.remove(&name);
                self.worker.fetch_document(name);
            }
            Effect::DocumentBlank { name } => {
                self.documents.remove(&name);
            }
            Effect::ImageLoad { name } => self.art.request(&name, MediaKind::Image),
            Effect::MembershipChanged => {
                self.session.record(self.grid.member_names());
                self.prune_item_resources();
            }
        }
    }

    /// Drop per-item caches for names that left the grid.
    fn prune_item_resources(&mut self) {
        let grid = &self.grid;
        let gone: Vec<String> = self
            .tile_textures
            .keys()
            .chain(self.documents.keys())
            .filter(|name| !grid.is_member(name))
            .cloned()
            .collect();
        for name in gone {
            self.tile_textures.remove(&name);
            self.documents.remove(&name);
            self.art.discard(&name);
        }
    }

    // -- event drains ------------------------------------------------------

    fn process_remote_events(&mut self) {
        while let Ok(event) = self.remote_receiver.try_recv() {
            self.handle_remote_event(event);
        }
    }

    pub fn handle_remote_event(&mut self, event: RemoteEvent) {
        match event {
            RemoteEvent::Catalog { folder, files } => {
                self.catalog.replace(folder, files);
                if let Some(MusicEffect::Stop) = self.music.reconcile(&self.catalog) {
                    self.engine.stop_music();
                }
                if !self.hydrated {
                    self.hydrated = true;
                    for descriptor in self.session.hydrate(&self.catalog) {
                        self.dispatch(Command::Add(descriptor));
                    }
                }
            }
            RemoteEvent::CatalogFailed { reason } => {
                // The previous catalog stays; the wall keeps working on
                // stale data.
                self.status_message = format!("Listing refresh failed: {}", reason);
            }
            RemoteEvent::Uploaded { file_name } => {
                self.status_message = format!("Uploaded {}", file_name);
                self.worker.refresh_catalog();
            }
            RemoteEvent::UploadFailed { reason } => {
                self.status_message = format!("Upload failed: {}", reason);
            }
            RemoteEvent::DocumentFetched {
                name,
                byte_len,
                title,
            } => {
                // A delivery for a removed or since-blanked document is stale.
                let wanted = self
                    .grid
                    .item(&name)
                    .map(|item| matches!(item.document_phase(), Some(DocumentPhase::Loaded)))
                    .unwrap_or(false);
                if wanted {
                    self.documents
                        .insert(name, DocumentInfo { byte_len, title });
                }
            }
            RemoteEvent::DocumentFailed { .. } => {}
        }
    }

    fn process_playback_events(&mut self) {
        while let Ok(event) = self.playback_receiver.try_recv() {
            self.handle_playback_event(event);
        }
    }

    pub fn handle_playback_event(&mut self, event: PlaybackEvent) {
        match event {
            PlaybackEvent::Started {
                slot: SlotKey::Item(name),
            } => match self.grid.item(&name) {
                // Removed while the stream was still loading.
                None => self.engine.stop_item(&name),
                Some(item) => {
                    // Re-sync: the user may have paused, muted or hovered
                    // while the stream was loading.
                    if let Some(state) = item.playback() {
                        let (playing, muted, rate) = (state.playing, state.muted, state.rate);
                        if !playing {
                            self.engine.pause_item(&name);
                        }
                        self.engine.set_item_muted(&name, muted);
                        self.engine.set_item_rate(&name, rate);
                    }
                }
            },
            PlaybackEvent::Rejected {
                slot: SlotKey::Item(name),
                ..
            } => self.dispatch(Command::PlaybackRejected(name)),
            PlaybackEvent::Rejected {
                slot: SlotKey::Music,
                reason,
            } => {
                self.music.mark_rejected();
                self.status_message = format!("Background music failed: {}", reason);
            }
            PlaybackEvent::Started { .. } | PlaybackEvent::Rejected { .. } => {}
        }
    }

    // -- transport ---------------------------------------------------------

    pub fn play_all(&mut self) {
        self.dispatch(Command::PlayAll);
        if let Some(MusicEffect::Start(name)) = self.music.on_play_all() {
            self.engine.start_music(&name);
        }
    }

    pub fn toggle_all_playback(&mut self) {
        self.dispatch(Command::ToggleAll);
    }

    pub fn select_music(&mut self, selection: Option<String>) {
        if let Some(MusicEffect::Stop) = self.music.select(selection) {
            self.engine.stop_music();
        }
    }

    pub fn toggle_music(&mut self) {
        match self.music.toggle() {
            Some(MusicEffect::Start(name)) => {
                // Resume where it paused if the stream is still around.
                if self.engine.has_music() {
                    self.engine.resume_music();
                } else {
                    self.engine.start_music(&name);
                }
            }
            Some(MusicEffect::Stop) => self.engine.pause_music(),
            None => {}
        }
    }

    // -- overlay -----------------------------------------------------------

    pub fn open_overlay(&mut self, name: &str) {
        let Some(item) = self.grid.item(name) else {
            return;
        };
        let kind = item.kind;
        log::debug!("Opening overlay for {}", name);
        self.overlay = Some(OverlayView {
            name: name.to_string(),
            kind,
        });
        if kind.is_native() {
            self.engine.start_overlay(name, kind);
        }
    }

    pub fn close_overlay(&mut self) {
        if self.overlay.take().is_some() {
            // The dedicated surface goes down with the modal; nothing keeps
            // playing invisibly.
            self.engine.stop_overlay();
        }
    }

    /// Files dropped onto the window go to the upload endpoint; the listing
    /// refresh after a successful upload makes them pickable.
    fn handle_dropped_files(&mut self, ctx: &egui::Context) {
        let dropped: Vec<std::path::PathBuf> = ctx.input(|i| {
            i.raw
                .dropped_files
                .iter()
                .filter_map(|f| f.path.clone())
                .collect()
        });
        for path in dropped {
            self.status_message = format!("Uploading {}…", path.display());
            self.worker.upload(path);
        }
    }

    // -- keyboard ----------------------------------------------------------

    fn handle_keyboard(&mut self, ctx: &egui::Context) {
        let typing = ctx.wants_keyboard_input();
        if !typing && ctx.input(|i| i.key_pressed(egui::Key::Space)) {
            self.toggle_all_playback();
        }
        if ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
            self.handle_escape();
        }
    }

    /// The overlay outranks the sidebar.
    pub fn handle_escape(&mut self) {
        if self.overlay.is_some() {
            self.close_overlay();
        } else if self.sidebar_open {
            self.sidebar_open = false;
        }
    }

    // -- textures ----------------------------------------------------------

    /// Promote finished art into textures for items that lack one.
    fn collect_ready_art(&mut self, ctx: &egui::Context) {
        let mut fresh = Vec::new();
        for item in self.grid.items() {
            if matches!(item.kind, MediaKind::Image | MediaKind::Video)
                && !self.tile_textures.contains_key(&item.name)
            {
                if let Some(art) = self.art.take(&item.name) {
                    fresh.push((item.name.clone(), art));
                }
            }
        }
        for (name, art) in fresh {
            let texture = ctx.load_texture(format!("art-{}", name), art, Default::default());
            self.tile_textures.insert(name, texture);
        }
    }

    // -- chrome ------------------------------------------------------------

    fn show_toolbar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            ui.horizontal_wrapped(|ui| {
                if ui.button("➕ Add files").clicked() {
                    self.sidebar_open = !self.sidebar_open;
                }
                if ui.button("▶ Play all").clicked() {
                    self.play_all();
                }
                if ui.button("⟳ Refresh").clicked() {
                    self.worker.refresh_catalog();
                }

                ui.separator();
                ui.label("Zoom");
                ui.add(egui::Slider::new(&mut self.zoom, 0.5..=2.0).show_value(false));
                ui.label(format!("{:.0}%", self.zoom * 100.0));

                ui.separator();
                self.show_music_controls(ui);
            });
        });
    }

    fn show_music_controls(&mut self, ui: &mut egui::Ui) {
        let mut selection = self.music.selected().map(str::to_string);
        let mut changed = false;

        egui::ComboBox::from_id_source("bg_music")
            .selected_text(selection.as_deref().unwrap_or("No music").to_string())
            .show_ui(ui, |ui| {
                if ui
                    .selectable_label(selection.is_none(), "No music")
                    .clicked()
                {
                    selection = None;
                    changed = true;
                }
                for file in self.catalog.audio_files() {
                    let picked = selection.as_deref() == Some(file.name.as_str());
                    if ui.selectable_label(picked, &file.name).clicked() {
                        selection = Some(file.name.clone());
                        changed = true;
                    }
                }
            });
        if changed {
            self.select_music(selection);
        }

        let label = if self.music.is_playing() {
            "⏸ Music"
        } else {
            "▶ Music"
        };
        if ui
            .add_enabled(self.music.selected().is_some(), egui::Button::new(label))
            .clicked()
        {
            self.toggle_music();
        }
    }

    fn show_status_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                match self.catalog.folder() {
                    Some(folder) => ui.label(format!("📁 {}", folder)),
                    None => ui.label(format!("📁 waiting for {}…", self.config.server_url)),
                };

                if !self.status_message.is_empty() {
                    ui.separator();
                    ui.label(&self.status_message);
                }

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if let Some(at) = self.catalog.refreshed_at() {
                        ui.label(format!("listing from {}", at.format("%H:%M:%S")));
                    }
                    ui.label(format!("{} on the wall", self.grid.len()));
                });
            });
        });
    }
}

impl eframe::App for MediaWallApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Deliveries from the workers, then deferred state transitions.
        self.process_remote_events();
        self.process_playback_events();
        self.dispatch(Command::Tick);

        self.handle_keyboard(ctx);
        self.handle_dropped_files(ctx);
        self.collect_ready_art(ctx);

        self.show_toolbar(ctx);
        self.show_status_bar(ctx);
        self.show_sidebar(ctx);
        self.show_grid(ctx);
        self.show_overlay_window(ctx);

        // Deferred transitions (hover debounce, document restores) need the
        // loop to come back around even without input.
        ctx.request_repaint_after(Duration::from_millis(33));
    }
}
