use serde::Serialize;

use crate::config::{AnalysisOptions, RoiIndexing};
use crate::error::DomainError;

use super::model::{Roi, Spectrum};

/// Channels on each side of an ROI used to estimate the continuum.
const EDGE_CHANNELS: usize = 3;

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Inclusive pair of positions within `counts`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelRegion {
    pub low: usize,
    pub high: usize,
}

impl ChannelRegion {
    pub fn new(low: usize, high: usize) -> Self {
        ChannelRegion { low, high }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CountRate {
    /// Summed counts over the region.
    pub gross: u64,
    /// Counts per live second.
    pub rate: f64,
    /// One-sigma Poisson uncertainty of `rate`.
    pub uncertainty: f64,
}

/// Background-subtracted peak area for one ROI.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RoiAnalysis {
    pub roi: Roi,
    pub background: f64,
    pub gross: f64,
    pub adjusted_gross: f64,
    pub net: f64,
    pub net_uncertainty: f64,
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

/// Count rate over `region`, or over the whole spectrum when `None`.
///
/// The uncertainty is `sqrt(gross) / live_time`: a sum of independent
/// Poisson counts has variance equal to the sum.
pub fn count_rate(spectrum: &Spectrum, region: Option<ChannelRegion>) -> Result<CountRate, DomainError> {
    let live = live_time(spectrum)?;
    let counts = spectrum.counts();

    let gross = match region {
        None if counts.is_empty() => 0,
        None => checked_sum(counts, 0, counts.len() - 1)?,
        Some(r) => {
            check_bounds(r.low, r.high, counts.len())?;
            checked_sum(counts, r.low, r.high)?
        }
    };

    Ok(CountRate {
        gross,
        rate: gross as f64 / live,
        uncertainty: (gross as f64).sqrt() / live,
    })
}

/// Net area and uncertainty for each region, in input order.
///
/// `regions` defaults to the spectrum's own `$ROI` list. Each region is
/// evaluated independently, so one bad region does not hide the others.
pub fn roi_analysis(
    spectrum: &Spectrum,
    regions: Option<&[Roi]>,
    options: &AnalysisOptions,
) -> Vec<Result<RoiAnalysis, DomainError>> {
    regions
        .unwrap_or(spectrum.rois())
        .iter()
        .map(|roi| analyze_roi(spectrum, *roi, options))
        .collect()
}

/// `[channel number, count rate]` for every recorded channel.
pub fn channel_rates(spectrum: &Spectrum) -> Result<Vec<[f64; 2]>, DomainError> {
    let live = live_time(spectrum)?;
    let first = spectrum.channel_range().first;
    Ok(spectrum
        .counts()
        .iter()
        .enumerate()
        .map(|(i, &c)| [(first + i) as f64, c as f64 / live])
        .collect())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn analyze_roi(spectrum: &Spectrum, roi: Roi, options: &AnalysisOptions) -> Result<RoiAnalysis, DomainError> {
    let (l, h) = resolve(spectrum, roi, options.roi_indexing)?;
    if l > h {
        return Err(DomainError::InvertedRegion { low: l, high: h });
    }
    let width = Roi::new(l, h).width();
    if width <= 2 * EDGE_CHANNELS {
        return Err(DomainError::DegenerateRoi {
            low: roi.low,
            high: roi.high,
            width,
        });
    }
    let c = spectrum.counts();
    check_bounds(l, h, c.len())?;

    let sum = |from: usize, to: usize| checked_sum(c, from, to).map(|s| s as f64);

    let edges = sum(l, l + EDGE_CHANNELS - 1)? + sum(h + 1 - EDGE_CHANNELS, h)?;
    let background = edges / 6.0 * width as f64;
    let gross = sum(l, h)?;
    let adjusted_gross = sum(l + EDGE_CHANNELS, h - EDGE_CHANNELS)?;

    // Width of the adjusted region, minus one.
    let inner = (h - l - 5) as f64;
    let net = adjusted_gross - background * inner / width as f64;
    let variance = adjusted_gross + background * (inner / 6.0) * ((h - l) as f64 - 5.0) / ((h - l) as f64 + 1.0);

    Ok(RoiAnalysis {
        roi,
        background,
        gross,
        adjusted_gross,
        net,
        net_uncertainty: variance.sqrt(),
    })
}

/// Map ROI bounds onto positions in `counts`.
fn resolve(spectrum: &Spectrum, roi: Roi, indexing: RoiIndexing) -> Result<(usize, usize), DomainError> {
    match indexing {
        RoiIndexing::Offset => Ok((roi.low, roi.high)),
        RoiIndexing::Absolute => {
            let first = spectrum.channel_range().first;
            let shift = |channel: usize| {
                channel
                    .checked_sub(first)
                    .ok_or(DomainError::RoiBelowFirstChannel { channel, first })
            };
            Ok((shift(roi.low)?, shift(roi.high)?))
        }
    }
}

fn check_bounds(low: usize, high: usize, len: usize) -> Result<(), DomainError> {
    if low > high {
        return Err(DomainError::InvertedRegion { low, high });
    }
    if high >= len {
        return Err(DomainError::RegionOutOfBounds { low, high, len });
    }
    Ok(())
}

/// Sum of `counts[low..=high]`, bounds already checked.
fn checked_sum(counts: &[u64], low: usize, high: usize) -> Result<u64, DomainError> {
    counts[low..=high]
        .iter()
        .try_fold(0u64, |acc, &c| acc.checked_add(c))
        .ok_or(DomainError::CountOverflow { low, high })
}

fn live_time(spectrum: &Spectrum) -> Result<f64, DomainError> {
    match spectrum.live_time() {
        None => Err(DomainError::MissingLiveTime),
        Some(t) if t > 0.0 && t.is_finite() => Ok(t),
        Some(t) => Err(DomainError::ZeroLiveTime(t)),
    }
}
