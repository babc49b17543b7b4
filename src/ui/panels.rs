use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use egui_extras::{Column, TableBuilder};

use rusty_spe::config::RoiIndexing;
use rusty_spe::data::model::FieldValue;

use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – header fields and ROI analysis
// ---------------------------------------------------------------------------

/// Render the left panel.
pub fn side_panel(ui: &mut Ui, state: &AppState) {
    ui.heading("Spectrum");
    ui.separator();

    let spectrum = match &state.spectrum {
        Some(sp) => sp,
        None => {
            ui.label("No spectrum loaded.");
            return;
        }
    };

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            // ---- Header fields ----
            egui::Grid::new("spectrum_fields")
                .num_columns(2)
                .striped(true)
                .show(ui, |ui: &mut Ui| {
                    for (key, value) in spectrum.fields() {
                        // Long lists have their own sections below.
                        if matches!(value, FieldValue::Rois(_) | FieldValue::Rows(_)) {
                            continue;
                        }
                        ui.strong(key);
                        ui.label(value.to_string());
                        ui.end_row();
                    }
                });
            ui.separator();

            // ---- Total count rate ----
            ui.strong("Total count rate");
            match &state.total_rate {
                Some(Ok(cr)) => {
                    ui.label(format!("{:.3} ± {:.3} cps", cr.rate, cr.uncertainty));
                }
                Some(Err(e)) => {
                    ui.label(RichText::new(e.to_string()).color(Color32::RED));
                }
                None => {}
            }
            ui.separator();

            // ---- ROI table ----
            ui.strong(format!("Regions of interest ({})", spectrum.rois().len()));
            if spectrum.rois().is_empty() {
                ui.label("None defined in file.");
            } else {
                roi_table(ui, state);
            }

            // ---- Calibrations ----
            for (title, rows) in [
                ("Energy fit", spectrum.energy_fit()),
                ("MCA calibration", spectrum.mca_calibration()),
                ("Shape calibration", spectrum.shape_calibration()),
            ] {
                let Some(rows) = rows else {
                    continue;
                };
                egui::CollapsingHeader::new(RichText::new(title).strong())
                    .default_open(false)
                    .show(ui, |ui: &mut Ui| {
                        for row in rows {
                            let cells: Vec<String> = row.iter().map(|v| format!("{v}")).collect();
                            ui.monospace(cells.join("  "));
                        }
                    });
            }

            // ---- Parser diagnostics ----
            if !state.warnings.is_empty() {
                egui::CollapsingHeader::new(
                    RichText::new(format!("Warnings ({})", state.warnings.len()))
                        .color(Color32::YELLOW),
                )
                .default_open(true)
                .show(ui, |ui: &mut Ui| {
                    for w in &state.warnings {
                        ui.label(w.to_string());
                    }
                });
            }
        });
}

fn roi_table(ui: &mut Ui, state: &AppState) {
    let Some(spectrum) = &state.spectrum else {
        return;
    };

    TableBuilder::new(ui)
        .striped(true)
        .vscroll(false)
        .column(Column::auto())
        .column(Column::auto())
        .column(Column::auto())
        .column(Column::remainder())
        .header(20.0, |mut header| {
            header.col(|ui| {
                ui.strong("ROI");
            });
            header.col(|ui| {
                ui.strong("Background");
            });
            header.col(|ui| {
                ui.strong("Net");
            });
            header.col(|ui| {
                ui.strong("± σ");
            });
        })
        .body(|mut body| {
            for (idx, (roi, result)) in spectrum.rois().iter().zip(&state.roi_results).enumerate() {
                let color = state.roi_colors.get(idx).copied().unwrap_or(Color32::GRAY);
                body.row(18.0, |mut row| {
                    row.col(|ui| {
                        ui.label(RichText::new(roi.to_string()).color(color));
                    });
                    match result {
                        Ok(r) => {
                            row.col(|ui| {
                                ui.label(format!("{:.2}", r.background));
                            });
                            row.col(|ui| {
                                ui.label(format!("{:.2}", r.net));
                            });
                            row.col(|ui| {
                                ui.label(format!("{:.2}", r.net_uncertainty));
                            });
                        }
                        Err(e) => {
                            row.col(|ui| {
                                ui.label(RichText::new("—").color(Color32::RED));
                            });
                            row.col(|ui| {
                                ui.label(RichText::new("—").color(Color32::RED));
                            });
                            row.col(|ui| {
                                ui.label(RichText::new(e.to_string()).color(Color32::RED));
                            });
                        }
                    }
                });
            }
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(sp) = &state.spectrum {
            ui.label(format!(
                "{} channels, {} ROIs",
                sp.counts().len(),
                sp.rois().len()
            ));
        }

        ui.separator();

        ui.label("ROI bounds:");
        let current = state.options.roi_indexing;
        egui::ComboBox::from_id_salt("roi_indexing")
            .selected_text(current.to_string())
            .show_ui(ui, |ui: &mut Ui| {
                for mode in RoiIndexing::ALL {
                    if ui.selectable_label(current == mode, mode.to_string()).clicked() {
                        state.set_roi_indexing(mode);
                    }
                }
            });

        if ui.selectable_label(state.show_rois, "Shade ROIs").clicked() {
            state.show_rois = !state.show_rois;
        }

        if let Some(msg) = &state.status_message {
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open SPE spectrum")
        .add_filter("SPE spectra", &["spe", "Spe", "SPE"])
        .add_filter("All files", &["*"])
        .pick_file();

    if let Some(path) = file {
        match rusty_spe::data::parser::load_file(&path) {
            Ok(parsed) => {
                log::info!(
                    "Loaded {} with {} channels and {} ROIs",
                    path.display(),
                    parsed.spectrum.counts().len(),
                    parsed.spectrum.rois().len()
                );
                state.set_spectrum(parsed);
            }
            Err(e) => {
                log::error!("Failed to load file: {e:#}");
                state.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }
}
