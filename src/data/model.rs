use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Channel geometry
// ---------------------------------------------------------------------------

/// Half-open channel interval `[first, last)` declared by the `$DATA` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelRange {
    pub first: usize,
    pub last: usize,
}

impl ChannelRange {
    /// Number of channels in the range.
    pub fn len(&self) -> usize {
        self.last.saturating_sub(self.first)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A region of interest with inclusive bounds, as listed in `$ROI`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roi {
    pub low: usize,
    pub high: usize,
}

impl Roi {
    pub fn new(low: usize, high: usize) -> Self {
        Roi { low, high }
    }

    /// Number of channels covered, bounds included.
    pub fn width(&self) -> usize {
        self.high.saturating_sub(self.low) + 1
    }
}

impl fmt::Display for Roi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.low, self.high)
    }
}

// ---------------------------------------------------------------------------
// FieldValue – one entry of the key → value enumeration
// ---------------------------------------------------------------------------

/// A dynamically-typed view of one spectrum field, used by summary
/// and table consumers that walk every field uniformly.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Rois(Vec<Roi>),
    /// Calibration coefficient rows.
    Rows(Vec<Vec<f64>>),
    Missing,
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) => write!(f, "{s}"),
            FieldValue::Integer(i) => write!(f, "{i}"),
            FieldValue::Float(v) => write!(f, "{v}"),
            FieldValue::Rois(rois) => {
                let parts: Vec<String> = rois.iter().map(Roi::to_string).collect();
                write!(f, "[{}]", parts.join(", "))
            }
            FieldValue::Rows(rows) => {
                let parts: Vec<String> = rows
                    .iter()
                    .map(|row| {
                        let cells: Vec<String> = row.iter().map(|v| v.to_string()).collect();
                        format!("[{}]", cells.join(", "))
                    })
                    .collect();
                write!(f, "[{}]", parts.join(", "))
            }
            FieldValue::Missing => write!(f, "<none>"),
        }
    }
}

impl FieldValue {
    fn text(value: &Option<String>) -> Self {
        value
            .as_ref()
            .map(|s| FieldValue::Text(s.clone()))
            .unwrap_or(FieldValue::Missing)
    }

    fn float(value: Option<f64>) -> Self {
        value.map(FieldValue::Float).unwrap_or(FieldValue::Missing)
    }

    fn rows(value: &Option<Vec<Vec<f64>>>) -> Self {
        value
            .as_ref()
            .map(|r| FieldValue::Rows(r.clone()))
            .unwrap_or(FieldValue::Missing)
    }
}

// ---------------------------------------------------------------------------
// Spectrum – one parsed SPE file
// ---------------------------------------------------------------------------

/// One fully parsed SPE file. Immutable once built by the parser.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Spectrum {
    filename: String,
    spec_id: Option<String>,
    spec_rem: Option<String>,
    date_mea: Option<String>,
    live_time: Option<f64>,
    real_time: Option<f64>,
    channel_range: ChannelRange,
    counts: Vec<u64>,
    rois: Vec<Roi>,
    energy_fit: Option<Vec<Vec<f64>>>,
    mca_cal: Option<Vec<Vec<f64>>>,
    shape_cal: Option<Vec<Vec<f64>>>,
}

/// Field-by-field accumulator the parser fills before freezing a [`Spectrum`].
#[derive(Debug, Default)]
pub(crate) struct SpectrumBuilder {
    pub spec_id: Option<String>,
    pub spec_rem: Option<String>,
    pub date_mea: Option<String>,
    pub meas_tim: Option<(f64, f64)>,
    pub data: Option<(ChannelRange, Vec<u64>)>,
    pub rois: Option<Vec<Roi>>,
    pub energy_fit: Option<Vec<Vec<f64>>>,
    pub mca_cal: Option<Vec<Vec<f64>>>,
    pub shape_cal: Option<Vec<Vec<f64>>>,
}

impl SpectrumBuilder {
    /// Freeze into a spectrum. `None` when `$DATA` never appeared.
    pub fn build(self, filename: &str) -> Option<Spectrum> {
        let (channel_range, counts) = self.data?;
        Some(Spectrum {
            filename: filename.to_string(),
            spec_id: self.spec_id,
            spec_rem: self.spec_rem,
            date_mea: self.date_mea,
            live_time: self.meas_tim.map(|(live, _)| live),
            real_time: self.meas_tim.map(|(_, real)| real),
            channel_range,
            counts,
            rois: self.rois.unwrap_or_default(),
            energy_fit: self.energy_fit,
            mca_cal: self.mca_cal,
            shape_cal: self.shape_cal,
        })
    }
}

impl Spectrum {
    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn spec_id(&self) -> Option<&str> {
        self.spec_id.as_deref()
    }

    pub fn remarks(&self) -> Option<&str> {
        self.spec_rem.as_deref()
    }

    /// Raw `mm/dd/yyyy hh:mm:ss` text, never interpreted.
    pub fn measurement_date(&self) -> Option<&str> {
        self.date_mea.as_deref()
    }

    pub fn live_time(&self) -> Option<f64> {
        self.live_time
    }

    pub fn real_time(&self) -> Option<f64> {
        self.real_time
    }

    pub fn channel_range(&self) -> ChannelRange {
        self.channel_range
    }

    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    pub fn rois(&self) -> &[Roi] {
        &self.rois
    }

    pub fn energy_fit(&self) -> Option<&[Vec<f64>]> {
        self.energy_fit.as_deref()
    }

    pub fn mca_calibration(&self) -> Option<&[Vec<f64>]> {
        self.mca_cal.as_deref()
    }

    pub fn shape_calibration(&self) -> Option<&[Vec<f64>]> {
        self.shape_cal.as_deref()
    }

    /// Every field as `(key, value)` in a fixed order.
    pub fn fields(&self) -> Vec<(&'static str, FieldValue)> {
        vec![
            ("filename", FieldValue::Text(self.filename.clone())),
            ("spec_id", FieldValue::text(&self.spec_id)),
            ("spec_rem", FieldValue::text(&self.spec_rem)),
            ("date_mea", FieldValue::text(&self.date_mea)),
            ("live_time", FieldValue::float(self.live_time)),
            ("real_time", FieldValue::float(self.real_time)),
            ("channels", FieldValue::Integer(self.counts.len() as i64)),
            ("roi", FieldValue::Rois(self.rois.clone())),
            ("ener_fit", FieldValue::rows(&self.energy_fit)),
            ("mca_cal", FieldValue::rows(&self.mca_cal)),
            ("shape_cal", FieldValue::rows(&self.shape_cal)),
        ]
    }
}

/// Plain-text summary: header fields, channel count, then ROI and calibration rows.
impl fmt::Display for Spectrum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (key, value) in self.fields() {
            match key {
                "live_time" | "real_time" => continue,
                "channels" => {
                    writeln!(
                        f,
                        "meas_tim: live {} s, real {} s",
                        FieldValue::float(self.live_time),
                        FieldValue::float(self.real_time)
                    )?;
                    writeln!(f, "channels: {value}")?;
                }
                _ => writeln!(f, "{key}: {value}")?,
            }
        }
        Ok(())
    }
}
