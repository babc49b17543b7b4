//! Reader and peak-area analysis for ORTEC SPE spectrum files.
//!
//! ```no_run
//! use std::path::Path;
//! use rusty_spe::config::AnalysisOptions;
//! use rusty_spe::data::{analysis, parser};
//!
//! let parsed = parser::load_file(Path::new("co60.spe")).unwrap();
//! let total = analysis::count_rate(&parsed.spectrum, None).unwrap();
//! println!("{:.2} ± {:.2} cps", total.rate, total.uncertainty);
//! for result in analysis::roi_analysis(&parsed.spectrum, None, &AnalysisOptions::default()) {
//!     println!("{result:?}");
//! }
//! ```

pub mod config;
pub mod data;
pub mod error;
