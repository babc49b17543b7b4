use eframe::egui;

use crate::state::AppState;
use crate::ui::{panels, plot};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct SpeViewerApp {
    pub state: AppState,
}

impl SpeViewerApp {
    /// Start with a spectrum already loaded (path given on the command line).
    pub fn with_state(state: AppState) -> Self {
        Self { state }
    }
}

impl eframe::App for SpeViewerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: header fields and ROI results ----
        egui::SidePanel::left("spectrum_panel")
            .default_width(300.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &self.state);
            });

        // ---- Central panel: plot ----
        egui::CentralPanel::default().show(ctx, |ui| {
            plot::spectrum_plot(ui, &self.state);
        });
    }
}
