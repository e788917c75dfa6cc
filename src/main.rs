#![windows_subsystem = "windows"]

use blendlab::app::BlendLabApp;
use blendlab::logger;
use eframe::egui;

fn main() -> Result<(), eframe::Error> {
    // Initialize session log (overwrites previous session log)
    logger::init();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_title("BlendLab"),
        ..Default::default()
    };

    eframe::run_native(
        "BlendLab",
        options,
        Box::new(|cc| Box::new(BlendLabApp::new(cc))),
    )
}
