use std::io::Write;
use std::path::Path;

use rusty_spe::config::{AnalysisOptions, RoiIndexing};
use rusty_spe::data::analysis::{count_rate, roi_analysis};
use rusty_spe::data::model::Roi;
use rusty_spe::data::parser::{load_file, ParseWarning};
use rusty_spe::error::{FormatError, LoadError};

/// A MAESTRO-style file: padded counts, presets, every calibration block.
const MAESTRO: &str = "$SPEC_ID:
Ba-133 calibration run
$SPEC_REM:
DET# 2
DETDESC# GEM-20180
AP# GammaVision Version 6.08
$DATE_MEA:
07/22/2014 14:05:11
$MEAS_TIM:
1187 1200
$DATA:
256 272
      12
      11
      13
      12
      40
     120
     310
     420
     305
     118
      41
      13
      12
      11
      12
      10

$ROI:
2
256 271
0 15
$PRESETS:
None
0
0
$ENER_FIT:
0.000000 0.500000
$MCA_CAL:
3
-2.1E-001 5.0E-001 0.0E+000 keV
$SHAPE_CAL:
3
1.0E+000 0.0E+000 0.0E+000
";

fn write_spe(dir: &Path, name: &str, text: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(text.as_bytes()).unwrap();
    path
}

#[test]
fn test_load_maestro_file_rejects_unit_suffix() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_spe(dir.path(), "ba133.spe", MAESTRO);

    let err = load_file(&path).unwrap_err();
    match err {
        LoadError::Format { source, .. } => assert_eq!(
            source,
            FormatError::InvalidFloat {
                section: "MCA_CAL",
                token: "keV".to_string()
            }
        ),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_load_maestro_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_spe(dir.path(), "ba133.spe", &MAESTRO.replace(" keV", ""));

    let parsed = load_file(&path).unwrap();
    let sp = &parsed.spectrum;
    assert!(parsed.warnings.is_empty());
    assert_eq!(sp.filename(), path.display().to_string());
    assert_eq!(sp.remarks(), Some("DET# 2\nDETDESC# GEM-20180\nAP# GammaVision Version 6.08"));
    assert_eq!(sp.channel_range().first, 256);
    assert_eq!(sp.counts().len(), 16);
    assert_eq!(sp.rois(), &[Roi::new(256, 271), Roi::new(0, 15)]);
    assert_eq!(sp.mca_calibration(), Some(&[vec![-0.21, 0.5, 0.0]][..]));
    assert_eq!(sp.shape_calibration(), Some(&[vec![1.0, 0.0, 0.0]][..]));

    let total = count_rate(sp, None).unwrap();
    assert_eq!(total.gross, 1460);
    assert!((total.rate - 1460.0 / 1187.0).abs() < 1e-12);

    // File ROIs are absolute here: only the matching convention accepts each one.
    let offset = roi_analysis(sp, None, &AnalysisOptions::default());
    assert!(offset[0].is_err());
    assert!(offset[1].is_ok());

    let absolute = roi_analysis(
        sp,
        None,
        &AnalysisOptions {
            roi_indexing: RoiIndexing::Absolute,
        },
    );
    assert!(absolute[1].is_err());
    let a = absolute[0].as_ref().unwrap();
    let b = offset[1].as_ref().unwrap();
    assert_eq!(a.net, b.net);
    assert_eq!(a.net_uncertainty, b.net_uncertainty);

    // Edge windows: 12+11+13 and 11+12+10 → 69 / 6 × 16 = 184.
    assert!((a.background - 184.0).abs() < 1e-9);
    assert!((a.adjusted_gross - 1391.0).abs() < 1e-9);
    assert!((a.net - (1391.0 - 184.0 * 10.0 / 16.0)).abs() < 1e-9);
}

#[test]
fn test_load_file_with_unknown_section() {
    let dir = tempfile::tempdir().unwrap();
    let text = "$DATA:\n0 3\n1\n2\n3\n\n$FOOBAR:\nsomething\n";
    let path = write_spe(dir.path(), "foobar.spe", text);

    let parsed = load_file(&path).unwrap();
    assert_eq!(parsed.spectrum.counts(), &[1, 2, 3]);
    assert_eq!(
        parsed.warnings,
        vec![ParseWarning::UnknownField("foobar:".to_string())]
    );
}

#[test]
fn test_load_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_file(&dir.path().join("absent.spe")).unwrap_err();
    assert!(matches!(err, LoadError::Io { .. }));
    assert!(err.to_string().contains("absent.spe"));
}

#[test]
fn test_load_empty_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_spe(dir.path(), "empty.spe", "");
    let err = load_file(&path).unwrap_err();
    assert!(matches!(
        err,
        LoadError::Format {
            source: FormatError::Empty,
            ..
        }
    ));
}
