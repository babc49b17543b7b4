mod app;
mod color;
mod state;
mod ui;

use std::path::Path;

use app::SpeViewerApp;
use eframe::egui;
use state::AppState;

fn main() -> eframe::Result {
    env_logger::init();

    // Optional file to open on start-up.
    let mut state = AppState::default();
    if let Some(arg) = std::env::args_os().nth(1) {
        let path = Path::new(&arg);
        match rusty_spe::data::parser::load_file(path) {
            Ok(parsed) => state.set_spectrum(parsed),
            Err(e) => {
                log::error!("Failed to load file: {e:#}");
                state.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Rusty SPE – Spectrum Viewer",
        options,
        Box::new(|_cc| Ok(Box::new(SpeViewerApp::with_state(state)))),
    )
}
