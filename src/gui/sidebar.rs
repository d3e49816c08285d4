use eframe::egui;

use crate::core::media::FileDescriptor;
use crate::core::Command;
use crate::gui::app::MediaWallApp;

impl MediaWallApp {
    /// The library panel: everything the service exposes, with an "added"
    /// badge computed from the grid every frame so the two can never drift.
    pub fn show_sidebar(&mut self, ctx: &egui::Context) {
        if !self.sidebar_open {
            return;
        }

        let files: Vec<FileDescriptor> = self.catalog.files().to_vec();
        let mut to_add: Option<FileDescriptor> = None;
        let mut close = false;
        let mut upload_path = None;

        egui::SidePanel::right("library_panel")
            .default_width(320.0)
            .min_width(260.0)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("Library");
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.button("✖").clicked() {
                            close = true;
                        }
                    });
                });

                if ui.button("⬆ Upload a file…").clicked() {
                    upload_path = rfd::FileDialog::new().pick_file();
                }
                ui.separator();

                if files.is_empty() {
                    ui.label("The watched folder has no playable files.");
                    return;
                }

                egui::ScrollArea::vertical().show(ui, |ui| {
                    for file in &files {
                        let added = self.grid.is_member(&file.name);
                        ui.horizontal(|ui| {
                            ui.add_sized(
                                [52.0, 18.0],
                                egui::Label::new(
                                    egui::RichText::new(file.kind.label()).small().weak(),
                                ),
                            );
                            let response = ui.selectable_label(added, &file.name);
                            if added {
                                ui.small("added");
                            }
                            // Clicking an already-added entry is a no-op by
                            // contract, not an error.
                            if response.clicked() && !added {
                                to_add = Some(file.clone());
                            }
                        });
                    }
                });
            });

        if let Some(path) = upload_path {
            self.status_message = format!("Uploading {}…", path.display());
            self.worker.upload(path);
        }
        if let Some(descriptor) = to_add {
            self.dispatch(Command::Add(descriptor));
            self.sidebar_open = false;
        }
        if close {
            self.sidebar_open = false;
        }
    }
}
