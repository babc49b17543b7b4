/// Data layer: core types, parsing, analysis and export.
///
/// Architecture:
/// ```text
///  .spe text
///        │
///        ▼
///   ┌──────────┐
///   │  parser   │  split on `$`, dispatch by field prefix → Spectrum
///   └──────────┘      (unknown fields → ParseWarning sink)
///        │
///        ▼
///   ┌──────────┐
///   │ Spectrum  │  immutable record: header, counts, ROIs, calibrations
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ analysis  │  count rate, ROI net area ± sigma, plot series
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  export   │  CSV / JSON
///   └──────────┘
/// ```

pub mod analysis;
pub mod export;
pub mod model;
pub mod parser;
