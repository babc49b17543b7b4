use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// How ROI bounds map onto positions in the `counts` array.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoiIndexing {
    /// Bounds are zero-based positions within `counts`.
    #[default]
    Offset,
    /// Bounds are absolute channel numbers; the first recorded channel is
    /// subtracted before indexing.
    Absolute,
}

impl RoiIndexing {
    pub const ALL: [RoiIndexing; 2] = [RoiIndexing::Offset, RoiIndexing::Absolute];
}

impl fmt::Display for RoiIndexing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoiIndexing::Offset => write!(f, "offset"),
            RoiIndexing::Absolute => write!(f, "absolute"),
        }
    }
}

/// Options shared by every analysis call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisOptions {
    pub roi_indexing: RoiIndexing,
}

impl AnalysisOptions {
    /// Load options from a JSON file such as `{"roi_indexing": "absolute"}`.
    /// Keys left out keep their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }
}
