use std::path::PathBuf;

use thiserror::Error;

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Malformed or missing mandatory structure in SPE text.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FormatError {
    /// The text contains no non-blank section at all.
    #[error("no sections found in SPE text")]
    Empty,

    /// A mandatory section (currently only `DATA`) never appeared.
    #[error("missing mandatory section ${0}")]
    MissingSection(&'static str),

    #[error("${section}: '{token}' is not a valid integer")]
    InvalidInteger { section: &'static str, token: String },

    #[error("${section}: '{token}' is not a valid number")]
    InvalidFloat { section: &'static str, token: String },

    /// A section carried fewer values than it needs.
    #[error("${section}: expected {expected} values, found {found}")]
    MissingTokens {
        section: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("$DATA: channel range [{first}, {last}) ends before it starts")]
    InvalidChannelRange { first: usize, last: usize },

    #[error("$DATA: channel range [{first}, {last}) declares {declared} channels but {found} counts are listed")]
    ChannelCountMismatch {
        first: usize,
        last: usize,
        declared: usize,
        found: usize,
    },

    #[error("$ROI: line '{line}' is not a pair of channel numbers")]
    MalformedRoi { line: String },

    #[error("$ROI: low bound {low} is above high bound {high}")]
    InvertedRoi { low: usize, high: usize },
}

/// Failure to turn a file on disk into a spectrum.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Failed to read file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path}: {source}")]
    Format {
        path: PathBuf,
        #[source]
        source: FormatError,
    },
}

// ---------------------------------------------------------------------------
// Analysis
// ---------------------------------------------------------------------------

/// An analysis call received inputs it cannot compute on.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("live time is not set ($MEAS_TIM missing)")]
    MissingLiveTime,

    #[error("live time must be a positive number of seconds, got {0}")]
    ZeroLiveTime(f64),

    #[error("channels {low}..={high} fall outside the {len} recorded channels")]
    RegionOutOfBounds { low: usize, high: usize, len: usize },

    #[error("region low bound {low} is above high bound {high}")]
    InvertedRegion { low: usize, high: usize },

    /// The two 3-channel edge windows would overlap or cover the whole ROI.
    #[error("ROI {low}..={high} is {width} channels wide, at least 7 are needed")]
    DegenerateRoi { low: usize, high: usize, width: usize },

    #[error("ROI bound {channel} lies below the first recorded channel {first}")]
    RoiBelowFirstChannel { channel: usize, first: usize },

    #[error("counts in channels {low}..={high} overflow a 64-bit sum")]
    CountOverflow { low: usize, high: usize },
}

// ---------------------------------------------------------------------------
// Configuration / export
// ---------------------------------------------------------------------------

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("CSV export failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON export failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Domain(#[from] DomainError),
}
