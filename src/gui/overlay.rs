use eframe::egui;

use crate::core::media::MediaKind;
use crate::gui::app::MediaWallApp;

impl MediaWallApp {
    /// Fullscreen modal showing exactly one item on its own dedicated
    /// surface, independent of the grid's playback state.
    pub fn show_overlay_window(&mut self, ctx: &egui::Context) {
        let (name, kind) = match &self.overlay {
            Some(view) => (view.name.clone(), view.kind),
            None => return,
        };

        let screen = ctx.screen_rect();
        let mut close = false;

        // Dim the wall behind the modal.
        egui::Area::new(egui::Id::new("overlay_backdrop"))
            .fixed_pos(screen.min)
            .order(egui::Order::Middle)
            .show(ctx, |ui| {
                let (rect, response) =
                    ui.allocate_exact_size(screen.size(), egui::Sense::click());
                ui.painter()
                    .rect_filled(rect, 0.0, egui::Color32::from_black_alpha(200));
                if response.clicked() {
                    close = true;
                }
            });

        egui::Window::new(&name)
            .order(egui::Order::Foreground)
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .fixed_size(screen.size() * 0.8)
            .show(ctx, |ui| {
                let content_size = egui::vec2(
                    ui.available_width(),
                    (screen.height() * 0.8 - 60.0).max(120.0),
                );
                ui.allocate_ui(content_size, |ui| {
                    ui.set_min_size(content_size);
                    match kind {
                        MediaKind::Image | MediaKind::Video => {
                            if let Some(texture) = self.tile_textures.get(&name) {
                                ui.centered_and_justified(|ui| {
                                    ui.add(
                                        egui::Image::new(texture)
                                            .fit_to_exact_size(content_size)
                                            .maintain_aspect_ratio(true),
                                    );
                                });
                            } else {
                                overlay_glyph(ui, "🎬");
                            }
                        }
                        MediaKind::Audio => overlay_glyph(ui, "🎵"),
                        MediaKind::Html => {
                            ui.centered_and_justified(|ui| {
                                ui.vertical_centered(|ui| match self.documents.get(&name) {
                                    Some(info) => {
                                        ui.heading(info.title.as_deref().unwrap_or(&name));
                                        ui.small(format!("{} bytes", info.byte_len));
                                    }
                                    None => {
                                        ui.heading(&name);
                                    }
                                });
                            });
                        }
                        MediaKind::Unknown => overlay_glyph(ui, "📄"),
                    }
                });

                ui.vertical_centered(|ui| {
                    if ui.button("Close").clicked() {
                        close = true;
                    }
                });
            });

        if close {
            self.close_overlay();
        }
    }
}

fn overlay_glyph(ui: &mut egui::Ui, glyph: &str) {
    ui.centered_and_justified(|ui| {
        ui.label(egui::RichText::new(glyph).size(96.0));
    });
}
