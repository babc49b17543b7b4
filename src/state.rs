use eframe::egui::Color32;

use rusty_spe::config::{AnalysisOptions, RoiIndexing};
use rusty_spe::data::analysis::{channel_rates, count_rate, roi_analysis, CountRate, RoiAnalysis};
use rusty_spe::data::model::{Roi, Spectrum};
use rusty_spe::data::parser::{ParseWarning, Parsed};
use rusty_spe::error::DomainError;

use crate::color::generate_palette;

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    /// Loaded spectrum (None until user loads a file).
    pub spectrum: Option<Spectrum>,

    /// Diagnostics reported while parsing the loaded file.
    pub warnings: Vec<ParseWarning>,

    pub options: AnalysisOptions,

    /// Count rate over the whole spectrum.
    pub total_rate: Option<Result<CountRate, DomainError>>,

    /// One entry per ROI of the loaded spectrum.
    pub roi_results: Vec<Result<RoiAnalysis, DomainError>>,

    /// `[channel, cps]` points for the plot (cached).
    pub rate_series: Vec<[f64; 2]>,

    /// One colour per ROI.
    pub roi_colors: Vec<Color32>,

    /// Whether ROI spans are shaded on the plot.
    pub show_rois: bool,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            spectrum: None,
            warnings: Vec::new(),
            options: AnalysisOptions::default(),
            total_rate: None,
            roi_results: Vec::new(),
            rate_series: Vec::new(),
            roi_colors: Vec::new(),
            show_rois: true,
            status_message: None,
        }
    }
}

impl AppState {
    /// Ingest a newly parsed file and run the analysis on it.
    pub fn set_spectrum(&mut self, parsed: Parsed) {
        let Parsed { spectrum, warnings } = parsed;

        self.rate_series = match channel_rates(&spectrum) {
            Ok(series) => series,
            Err(e) => {
                log::warn!("{}: plotting raw counts, {e}", spectrum.filename());
                spectrum
                    .counts()
                    .iter()
                    .enumerate()
                    .map(|(i, &c)| [(spectrum.channel_range().first + i) as f64, c as f64])
                    .collect()
            }
        };
        self.roi_colors = generate_palette(spectrum.rois().len());
        self.warnings = warnings;
        self.spectrum = Some(spectrum);
        self.reanalyze();

        self.status_message = None;
    }

    /// Recompute count rate and ROI results after a spectrum or option change.
    pub fn reanalyze(&mut self) {
        let Some(sp) = &self.spectrum else {
            return;
        };
        self.total_rate = Some(count_rate(sp, None));
        self.roi_results = roi_analysis(sp, None, &self.options);
    }

    pub fn set_roi_indexing(&mut self, indexing: RoiIndexing) {
        if self.options.roi_indexing != indexing {
            self.options.roi_indexing = indexing;
            self.reanalyze();
        }
    }

    /// Whether the y axis is in counts per second (live time known) or raw counts.
    pub fn plots_rate(&self) -> bool {
        self.spectrum
            .as_ref()
            .is_some_and(|sp| channel_rates(sp).is_ok())
    }

    /// Absolute channel span of an ROI under the current indexing mode.
    pub fn roi_channel_span(&self, roi: &Roi) -> (f64, f64) {
        let first = match (&self.spectrum, self.options.roi_indexing) {
            (Some(sp), RoiIndexing::Offset) => sp.channel_range().first,
            _ => 0,
        };
        ((first + roi.low) as f64, (first + roi.high) as f64)
    }
}
