use std::io::Write;

use serde::Serialize;

use crate::error::{DomainError, ExportError};

use super::analysis::{channel_rates, RoiAnalysis};
use super::model::{Roi, Spectrum};

#[derive(Serialize)]
struct ChannelRow {
    channel: usize,
    counts: u64,
    rate: f64,
}

#[derive(Serialize)]
struct RoiRow {
    low: usize,
    high: usize,
    background: Option<f64>,
    gross: Option<f64>,
    adjusted_gross: Option<f64>,
    net: Option<f64>,
    net_uncertainty: Option<f64>,
    error: Option<String>,
}

/// Write `channel,counts,rate` for every recorded channel.
pub fn write_channels_csv<W: Write>(spectrum: &Spectrum, writer: W) -> Result<(), ExportError> {
    let rates = channel_rates(spectrum)?;
    let mut wtr = csv::Writer::from_writer(writer);
    for (&counts, [channel, rate]) in spectrum.counts().iter().zip(rates) {
        wtr.serialize(ChannelRow {
            channel: channel as usize,
            counts,
            rate,
        })?;
    }
    wtr.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// Write one row per ROI result. Failed regions keep their bounds and carry
/// the error message with the numeric columns left empty.
pub fn write_roi_csv<W: Write>(
    regions: &[Roi],
    results: &[Result<RoiAnalysis, DomainError>],
    writer: W,
) -> Result<(), ExportError> {
    let mut wtr = csv::Writer::from_writer(writer);
    for (roi, result) in regions.iter().zip(results) {
        let row = match result {
            Ok(r) => RoiRow {
                low: roi.low,
                high: roi.high,
                background: Some(r.background),
                gross: Some(r.gross),
                adjusted_gross: Some(r.adjusted_gross),
                net: Some(r.net),
                net_uncertainty: Some(r.net_uncertainty),
                error: None,
            },
            Err(e) => RoiRow {
                low: roi.low,
                high: roi.high,
                background: None,
                gross: None,
                adjusted_gross: None,
                net: None,
                net_uncertainty: None,
                error: Some(e.to_string()),
            },
        };
        wtr.serialize(row)?;
    }
    wtr.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// Pretty-printed JSON of the whole spectrum record.
pub fn spectrum_to_json(spectrum: &Spectrum) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(spectrum)?)
}
