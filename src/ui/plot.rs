use eframe::egui::{Color32, Stroke, Ui};
use egui_plot::{Line, Plot, PlotPoints, Polygon};

use crate::color::translucent;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Spectrum plot (central panel)
// ---------------------------------------------------------------------------

/// Render channel vs count rate for the loaded spectrum, with ROI spans shaded.
pub fn spectrum_plot(ui: &mut Ui, state: &AppState) {
    let spectrum = match &state.spectrum {
        Some(sp) => sp,
        None => {
            ui.centered_and_justified(|ui: &mut Ui| {
                ui.heading("Open an SPE file to view its spectrum  (File → Open…)");
            });
            return;
        }
    };

    ui.heading(spectrum.filename());

    let y_label = if state.plots_rate() {
        "Count Rate (cps)"
    } else {
        "Counts"
    };
    let y_max = state
        .rate_series
        .iter()
        .map(|p| p[1])
        .fold(0.0_f64, f64::max);

    Plot::new("spectrum_plot")
        .legend(egui_plot::Legend::default())
        .x_axis_label("Channel Number")
        .y_axis_label(y_label)
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            if state.show_rois {
                for (idx, roi) in spectrum.rois().iter().enumerate() {
                    let color = state
                        .roi_colors
                        .get(idx)
                        .copied()
                        .unwrap_or(Color32::GRAY);
                    let (lo, hi) = state.roi_channel_span(roi);

                    let span: PlotPoints = vec![[lo, 0.0], [hi, 0.0], [hi, y_max], [lo, y_max]].into();
                    let polygon = Polygon::new(span)
                        .name(format!("ROI {} {roi}", idx + 1))
                        .fill_color(translucent(color, 48))
                        .stroke(Stroke::new(1.0, color));

                    plot_ui.polygon(polygon);
                }
            }

            let points: PlotPoints = state.rate_series.iter().copied().collect();
            let line = Line::new(points)
                .name(spectrum.filename())
                .color(Color32::LIGHT_BLUE)
                .width(1.5);

            plot_ui.line(line);
        });
}
