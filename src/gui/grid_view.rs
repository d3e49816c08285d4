use eframe::egui;
use std::collections::HashSet;

use crate::core::media::MediaKind;
use crate::core::{Command, DocumentPhase, GridItem, Surface};
use crate::gui::app::{DocumentInfo, MediaWallApp};

const TILE_BASE_WIDTH: f32 = 280.0;
const TILE_BASE_HEIGHT: f32 = 220.0;

impl MediaWallApp {
    pub fn show_grid(&mut self, ctx: &egui::Context) {
        let tile_size = egui::vec2(TILE_BASE_WIDTH * self.zoom, TILE_BASE_HEIGHT * self.zoom);
        let mut commands: Vec<Command> = Vec::new();
        let mut overlay_request: Option<String> = None;
        let mut hovered_now: HashSet<String> = HashSet::new();

        egui::CentralPanel::default().show(ctx, |ui| {
            if self.grid.is_empty() {
                ui.centered_and_justified(|ui| {
                    ui.vertical_centered(|ui| {
                        ui.heading("Nothing on the wall yet");
                        ui.label("Press ➕ Add files and pick something from the library.");
                    });
                });
                return;
            }

            egui::ScrollArea::vertical()
                .auto_shrink([false; 2])
                .show(ui, |ui| {
                    ui.horizontal_wrapped(|ui| {
                        for item in self.grid.items() {
                            let texture = self.tile_textures.get(&item.name);
                            let document = self.documents.get(&item.name);
                            let hovered = tile_ui(
                                ui,
                                item,
                                texture,
                                document,
                                tile_size,
                                &mut commands,
                                &mut overlay_request,
                            );
                            if hovered {
                                hovered_now.insert(item.name.clone());
                            }
                        }
                    });
                });
        });

        // Hover is edge-triggered into the state machine: enter fires
        // immediately, leave goes through the debounce in the grid.
        let entered: Vec<String> = hovered_now
            .difference(&self.hovered_last_frame)
            .cloned()
            .collect();
        let left: Vec<String> = self
            .hovered_last_frame
            .difference(&hovered_now)
            .cloned()
            .collect();
        self.hovered_last_frame = hovered_now;

        for name in entered {
            commands.push(Command::HoverEnter(name));
        }
        for name in left {
            commands.push(Command::HoverLeave(name));
        }

        for command in commands {
            self.dispatch(command);
        }
        if let Some(name) = overlay_request {
            self.open_overlay(&name);
        }
    }
}

/// Draw one tile; returns whether the pointer is over it. Clicking the tile
/// body asks for the fullscreen overlay, the small buttons drive the item.
fn tile_ui(
    ui: &mut egui::Ui,
    item: &GridItem,
    texture: Option<&egui::TextureHandle>,
    document: Option<&DocumentInfo>,
    tile_size: egui::Vec2,
    commands: &mut Vec<Command>,
    overlay_request: &mut Option<String>,
) -> bool {
    let stroke = if item.hovered {
        egui::Stroke::new(2.0, egui::Color32::LIGHT_BLUE)
    } else {
        ui.style().visuals.widgets.noninteractive.bg_stroke
    };

    let frame = egui::Frame::group(ui.style())
        .stroke(stroke)
        .inner_margin(6.0);

    let response = frame
        .show(ui, |ui| {
            ui.set_min_size(tile_size);
            ui.set_max_size(tile_size);

            ui.vertical(|ui| {
                let art_size = egui::vec2(tile_size.x - 12.0, tile_size.y - 64.0);
                tile_art(ui, item, texture, document, art_size);

                ui.add(
                    egui::Label::new(egui::RichText::new(&item.name).small())
                        .truncate(),
                );

                ui.horizontal(|ui| {
                    tile_controls(ui, item, commands);
                });
            });
        })
        .response;

    let response = response.interact(egui::Sense::click());
    if response.clicked() {
        *overlay_request = Some(item.name.clone());
    }
    response.hovered()
}

fn tile_art(
    ui: &mut egui::Ui,
    item: &GridItem,
    texture: Option<&egui::TextureHandle>,
    document: Option<&DocumentInfo>,
    art_size: egui::Vec2,
) {
    ui.allocate_ui(art_size, |ui| {
        ui.set_min_size(art_size);
        match item.kind {
            MediaKind::Image | MediaKind::Video => {
                if let Some(texture) = texture {
                    ui.add(
                        egui::Image::new(texture)
                            .fit_to_exact_size(art_size)
                            .maintain_aspect_ratio(true),
                    );
                } else {
                    big_glyph(ui, if item.kind == MediaKind::Video { "🎬" } else { "🖼" });
                }
            }
            MediaKind::Audio => big_glyph(ui, "🎵"),
            MediaKind::Html => {
                ui.centered_and_justified(|ui| {
                    ui.vertical_centered(|ui| match item.document_phase() {
                        Some(DocumentPhase::Blanked) => {
                            ui.label("⏸ blanked");
                        }
                        _ => match document {
                            Some(info) => {
                                ui.label(info.title.as_deref().unwrap_or("HTML document"));
                                ui.small(format!("{} bytes", info.byte_len));
                            }
                            None => {
                                ui.label("HTML document");
                                ui.small("loading…");
                            }
                        },
                    });
                });
            }
            MediaKind::Unknown => big_glyph(ui, "📄"),
        }
    });
}

fn big_glyph(ui: &mut egui::Ui, glyph: &str) {
    ui.centered_and_justified(|ui| {
        ui.label(egui::RichText::new(glyph).size(48.0));
    });
}

fn tile_controls(ui: &mut egui::Ui, item: &GridItem, commands: &mut Vec<Command>) {
    match &item.surface {
        Surface::Native(state) => {
            let label = if state.playing { "⏸" } else { "▶" };
            if ui.small_button(label).clicked() {
                commands.push(Command::TogglePlayback(item.name.clone()));
            }
            let mute_label = if state.muted { "🔇" } else { "🔊" };
            if ui.small_button(mute_label).clicked() {
                commands.push(Command::ToggleMute(item.name.clone()));
            }
            if state.rate != 1.0 {
                ui.small(format!("{:.1}×", state.rate));
            }
        }
        Surface::Document { phase } => {
            let label = match phase {
                DocumentPhase::Blanked => "▶",
                _ => "⏸",
            };
            if ui.small_button(label).clicked() {
                commands.push(Command::TogglePlayback(item.name.clone()));
            }
        }
        Surface::Still => {}
    }

    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
        if ui.small_button("✖ Remove").clicked() {
            commands.push(Command::Remove(item.name.clone()));
        }
    });
}
