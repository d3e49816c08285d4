mod core;
mod gui;
mod playback;
mod remote;

use eframe::egui;
use gui::MediaWallApp;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 900.0])
            .with_title("Media Wall - Live Grid Player"),
        ..Default::default()
    };

    eframe::run_native(
        "Media Wall",
        options,
        Box::new(|cc| {
            match MediaWallApp::new(cc) {
                Ok(app) => Ok(Box::new(app)),
                Err(e) => {
                    eprintln!("Failed to initialize app: {}", e);
                    std::process::exit(1);
                }
            }
        }),
    ).map_err(|e| anyhow::anyhow!("Failed to run app: {}", e))?;

    Ok(())
}
