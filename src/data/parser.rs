use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::error::{FormatError, LoadError};

use super::model::{ChannelRange, Roi, Spectrum, SpectrumBuilder};

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Non-fatal findings reported while parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseWarning {
    /// A section header matched no known field prefix; the section was skipped.
    UnknownField(String),
    /// A field appeared more than once; the later section replaced the earlier one.
    DuplicateField(&'static str),
}

impl fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseWarning::UnknownField(header) => write!(f, "Unknown field: {header}"),
            ParseWarning::DuplicateField(name) => {
                write!(f, "Field ${name} appears more than once, keeping the last one")
            }
        }
    }
}

/// A spectrum together with the diagnostics gathered while parsing it.
#[derive(Debug, Clone)]
pub struct Parsed {
    pub spectrum: Spectrum,
    pub warnings: Vec<ParseWarning>,
}

/// Read an SPE file from disk and parse it, logging every warning.
pub fn load_file(path: &Path) -> Result<Parsed, LoadError> {
    let text = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let filename = path.display().to_string();
    let parsed = parse(&text, &filename).map_err(|source| LoadError::Format {
        path: path.to_path_buf(),
        source,
    })?;

    for warning in &parsed.warnings {
        log::warn!("{filename}: {warning}");
    }
    log::debug!(
        "{filename}: {} channels, {} ROIs",
        parsed.spectrum.counts().len(),
        parsed.spectrum.rois().len()
    );
    Ok(parsed)
}

/// Parse SPE text, collecting warnings into [`Parsed::warnings`].
pub fn parse(text: &str, filename: &str) -> Result<Parsed, FormatError> {
    let mut warnings = Vec::new();
    let spectrum = parse_with_sink(text, filename, &mut |w: ParseWarning| warnings.push(w))?;
    Ok(Parsed { spectrum, warnings })
}

/// Parse SPE text, handing every warning to `sink` as it is found.
///
/// Sections are `$`-delimited and may come in any order. The first line of a
/// section names the field; it is matched case-insensitively by prefix
/// against the prefix table below.
pub fn parse_with_sink<F>(text: &str, filename: &str, sink: &mut F) -> Result<Spectrum, FormatError>
where
    F: FnMut(ParseWarning),
{
    let mut builder = SpectrumBuilder::default();
    let mut seen_any = false;

    for section in text.split('$') {
        if section.trim().is_empty() {
            continue;
        }
        seen_any = true;

        let header = section.lines().next().unwrap_or("").to_lowercase();
        let Some(field) = classify(&header) else {
            sink(ParseWarning::UnknownField(header.trim().to_string()));
            continue;
        };
        log::debug!("{filename}: section ${}", field.name());

        let lines: Vec<&str> = section.lines().collect();
        let replaced = match field {
            Field::SpecId => builder.spec_id.replace(join_text(&lines)).is_some(),
            Field::SpecRem => builder.spec_rem.replace(join_text(&lines)).is_some(),
            Field::DateMea => builder.date_mea.replace(join_text(&lines)).is_some(),
            Field::MeasTim => builder.meas_tim.replace(parse_meas_tim(&lines)?).is_some(),
            Field::Data => builder.data.replace(parse_data(&lines)?).is_some(),
            Field::Roi => builder.rois.replace(parse_rois(&lines)?).is_some(),
            Field::EnerFit => builder
                .energy_fit
                .replace(parse_rows(field.name(), &lines, 1)?)
                .is_some(),
            Field::McaCal => builder
                .mca_cal
                .replace(parse_rows(field.name(), &lines, 2)?)
                .is_some(),
            Field::ShapeCal => builder
                .shape_cal
                .replace(parse_rows(field.name(), &lines, 2)?)
                .is_some(),
            Field::Presets => false,
        };
        if replaced {
            sink(ParseWarning::DuplicateField(field.name()));
        }
    }

    if !seen_any {
        return Err(FormatError::Empty);
    }
    builder
        .build(filename)
        .ok_or(FormatError::MissingSection("DATA"))
}

// ---------------------------------------------------------------------------
// Field dispatch
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    SpecId,
    SpecRem,
    DateMea,
    MeasTim,
    Data,
    Roi,
    EnerFit,
    McaCal,
    ShapeCal,
    Presets,
}

impl Field {
    fn name(self) -> &'static str {
        match self {
            Field::SpecId => "SPEC_ID",
            Field::SpecRem => "SPEC_REM",
            Field::DateMea => "DATE_MEA",
            Field::MeasTim => "MEAS_TIM",
            Field::Data => "DATA",
            Field::Roi => "ROI",
            Field::EnerFit => "ENER_FIT",
            Field::McaCal => "MCA_CAL",
            Field::ShapeCal => "SHAPE_CAL",
            Field::Presets => "PRESETS",
        }
    }
}

/// Header prefixes in match order. On-disk names carry trailing qualifiers
/// (`$DATA:`, `$MEAS_TIM:`), and the energy fit is spelled `ENER_FIT` in some
/// manual revisions and `ENERG_FIT` in others, so matching is by prefix.
const FIELDS: &[(&str, Field)] = &[
    ("spec_id", Field::SpecId),
    ("spec_rem", Field::SpecRem),
    ("date_mea", Field::DateMea),
    ("meas_tim", Field::MeasTim),
    ("data", Field::Data),
    ("roi", Field::Roi),
    ("ener_fit", Field::EnerFit),
    ("energ_fit", Field::EnerFit),
    ("mca_cal", Field::McaCal),
    ("shape_cal", Field::ShapeCal),
    ("presets", Field::Presets),
];

fn classify(header: &str) -> Option<Field> {
    FIELDS
        .iter()
        .find(|(prefix, _)| header.starts_with(prefix))
        .map(|&(_, field)| field)
}

// ---------------------------------------------------------------------------
// Section decoders
// ---------------------------------------------------------------------------

/// Everything after the header line, one line per payload line.
fn join_text(lines: &[&str]) -> String {
    lines.iter().skip(1).copied().collect::<Vec<_>>().join("\n")
}

fn parse_meas_tim(lines: &[&str]) -> Result<(f64, f64), FormatError> {
    let section = Field::MeasTim.name();
    let tokens: Vec<&str> = lines.iter().skip(1).flat_map(|l| l.split_whitespace()).collect();
    if tokens.len() < 2 {
        return Err(FormatError::MissingTokens {
            section,
            expected: 2,
            found: tokens.len(),
        });
    }
    let live = parse_float(section, tokens[0])?;
    let real = parse_float(section, tokens[1])?;
    Ok((live, real))
}

/// `$DATA`: header, `first last` range line, one count per line, terminator line.
fn parse_data(lines: &[&str]) -> Result<(ChannelRange, Vec<u64>), FormatError> {
    let section = Field::Data.name();
    let bounds: Vec<&str> = lines
        .get(1)
        .map(|l| l.split_whitespace().collect())
        .unwrap_or_default();
    if bounds.len() < 2 {
        return Err(FormatError::MissingTokens {
            section,
            expected: 2,
            found: bounds.len(),
        });
    }
    let first: usize = parse_int(section, bounds[0])?;
    let last: usize = parse_int(section, bounds[1])?;
    if last < first {
        return Err(FormatError::InvalidChannelRange { first, last });
    }
    let range = ChannelRange { first, last };

    let body = if lines.len() > 3 {
        &lines[2..lines.len() - 1]
    } else {
        &[][..]
    };
    let counts = body
        .iter()
        .map(|line| parse_int::<u64>(section, line.trim()))
        .collect::<Result<Vec<_>, _>>()?;

    if counts.len() != range.len() {
        return Err(FormatError::ChannelCountMismatch {
            first,
            last,
            declared: range.len(),
            found: counts.len(),
        });
    }
    Ok((range, counts))
}

/// `$ROI`: header, ROI count line, then one `low high` pair per line.
fn parse_rois(lines: &[&str]) -> Result<Vec<Roi>, FormatError> {
    let section = Field::Roi.name();
    payload(lines, 2)
        .map(|line| {
            let tokens: Vec<&str> = line.split_whitespace().collect();
            if tokens.len() != 2 {
                return Err(FormatError::MalformedRoi {
                    line: line.trim().to_string(),
                });
            }
            let low = parse_int(section, tokens[0])?;
            let high = parse_int(section, tokens[1])?;
            if low > high {
                return Err(FormatError::InvertedRoi { low, high });
            }
            Ok(Roi { low, high })
        })
        .collect()
}

/// Calibration sections: `skip` leading lines, then one coefficient row per line.
fn parse_rows(section: &'static str, lines: &[&str], skip: usize) -> Result<Vec<Vec<f64>>, FormatError> {
    payload(lines, skip)
        .map(|line| {
            line.split_whitespace()
                .map(|tok| parse_float(section, tok))
                .collect::<Result<Vec<f64>, _>>()
        })
        .collect()
}

fn payload<'a>(lines: &'a [&'a str], skip: usize) -> impl Iterator<Item = &'a str> + 'a {
    lines
        .iter()
        .skip(skip)
        .copied()
        .filter(|l| !l.trim().is_empty())
}

fn parse_int<T: FromStr>(section: &'static str, token: &str) -> Result<T, FormatError> {
    token.parse::<T>().map_err(|_| FormatError::InvalidInteger {
        section,
        token: token.to_string(),
    })
}

fn parse_float(section: &'static str, token: &str) -> Result<f64, FormatError> {
    token.parse::<f64>().map_err(|_| FormatError::InvalidFloat {
        section,
        token: token.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "$SPEC_ID:\nCs-137 point source\n\
$SPEC_REM:\nDET# 1\nDETDESC# HPGe\n\
$DATE_MEA:\n03/14/2015 09:26:53\n\
$MEAS_TIM:\n295 300\n\
$DATA:\n0 10\n10\n10\n10\n50\n50\n50\n50\n10\n10\n10\n\n\
$ROI:\n1\n0 9\n\
$PRESETS:\nNone\n0\n0\n\
$ENER_FIT:\n0.5 0.25\n\
$MCA_CAL:\n3\n1.0 2.0 3.0 keV\n";

    fn data_section(first: usize, counts: &[u64]) -> String {
        let mut s = format!("$DATA:\n{} {}\n", first, first + counts.len());
        for c in counts {
            s.push_str(&format!("{c}\n"));
        }
        s.push('\n');
        s
    }

    #[test]
    fn test_parse_full_sample() {
        let sample = SAMPLE.replace(" keV", "");
        let parsed = parse(&sample, "cs137.spe").unwrap();
        let sp = &parsed.spectrum;

        assert!(parsed.warnings.is_empty());
        assert_eq!(sp.filename(), "cs137.spe");
        assert_eq!(sp.spec_id(), Some("Cs-137 point source"));
        assert_eq!(sp.remarks(), Some("DET# 1\nDETDESC# HPGe"));
        assert_eq!(sp.measurement_date(), Some("03/14/2015 09:26:53"));
        assert_eq!(sp.live_time(), Some(295.0));
        assert_eq!(sp.real_time(), Some(300.0));
        assert_eq!(sp.channel_range(), ChannelRange { first: 0, last: 10 });
        assert_eq!(sp.counts(), &[10, 10, 10, 50, 50, 50, 50, 10, 10, 10]);
        assert_eq!(sp.rois(), &[Roi::new(0, 9)]);
        assert_eq!(sp.energy_fit(), Some(&[vec![0.5, 0.25]][..]));
        assert_eq!(sp.mca_calibration(), Some(&[vec![1.0, 2.0, 3.0]][..]));
        assert_eq!(sp.shape_calibration(), None);
    }

    #[test]
    fn test_calibration_rejects_unit_token() {
        let err = parse(SAMPLE, "cs137.spe").unwrap_err();
        assert_eq!(
            err,
            FormatError::InvalidFloat {
                section: "MCA_CAL",
                token: "keV".to_string()
            }
        );
    }

    #[test]
    fn test_data_length_matches_declared_range() {
        let counts: Vec<u64> = (0..32).collect();
        let text = data_section(100, &counts);
        let sp = parse(&text, "x.spe").unwrap().spectrum;
        assert_eq!(sp.counts().len(), 32);
        assert_eq!(sp.channel_range().len(), 32);
        assert_eq!(sp.channel_range().first, 100);
    }

    #[test]
    fn test_data_drops_final_terminator_line() {
        // No blank terminator: the last listed value is the one dropped.
        let text = "$DATA:\n0 2\n5\n6\n7\n";
        let sp = parse(text, "x.spe").unwrap().spectrum;
        assert_eq!(sp.counts(), &[5, 6]);
    }

    #[test]
    fn test_data_count_mismatch_is_format_error() {
        let text = "$DATA:\n0 5\n1\n2\n\n";
        assert_eq!(
            parse(text, "x.spe").unwrap_err(),
            FormatError::ChannelCountMismatch {
                first: 0,
                last: 5,
                declared: 5,
                found: 2
            }
        );
    }

    #[test]
    fn test_data_accepts_padded_counts() {
        let text = "$DATA:\n   0    3\n       12\n        0\n     4096\n\n";
        let sp = parse(text, "x.spe").unwrap().spectrum;
        assert_eq!(sp.counts(), &[12, 0, 4096]);
    }

    #[test]
    fn test_data_rejects_non_integer_count() {
        let text = "$DATA:\n0 2\n1\n2.5\n\n";
        assert_eq!(
            parse(text, "x.spe").unwrap_err(),
            FormatError::InvalidInteger {
                section: "DATA",
                token: "2.5".to_string()
            }
        );
    }

    #[test]
    fn test_data_missing_range_line() {
        let text = "$DATA:\n";
        assert!(matches!(
            parse(text, "x.spe").unwrap_err(),
            FormatError::MissingTokens { section: "DATA", .. }
        ));
    }

    #[test]
    fn test_data_inverted_range() {
        let text = "$DATA:\n5 2\n\n";
        assert_eq!(
            parse(text, "x.spe").unwrap_err(),
            FormatError::InvalidChannelRange { first: 5, last: 2 }
        );
    }

    #[test]
    fn test_empty_and_blank_text_rejected() {
        assert_eq!(parse("", "x.spe").unwrap_err(), FormatError::Empty);
        assert_eq!(parse("  \n$\n$  \n", "x.spe").unwrap_err(), FormatError::Empty);
    }

    #[test]
    fn test_missing_data_section() {
        let text = "$SPEC_ID:\nno data here\n";
        assert_eq!(
            parse(text, "x.spe").unwrap_err(),
            FormatError::MissingSection("DATA")
        );
    }

    #[test]
    fn test_unknown_field_reports_one_warning() {
        let text = format!("{}$FOOBAR:\nwhatever 1 2 3\n", data_section(0, &[1, 2, 3]));
        let parsed = parse(&text, "x.spe").unwrap();
        assert_eq!(parsed.spectrum.counts(), &[1, 2, 3]);
        assert_eq!(
            parsed.warnings,
            vec![ParseWarning::UnknownField("foobar:".to_string())]
        );
    }

    #[test]
    fn test_sink_receives_warnings_in_order() {
        let text = format!("$ALPHA:\n1\n{}$BETA:\n2\n", data_section(0, &[1]));
        let mut seen = Vec::new();
        parse_with_sink(&text, "x.spe", &mut |w: ParseWarning| seen.push(w.to_string())).unwrap();
        assert_eq!(seen, vec!["Unknown field: alpha:", "Unknown field: beta:"]);
    }

    #[test]
    fn test_header_match_is_case_insensitive_prefix() {
        let text = format!("$Meas_Tim: (live, real)\n10.5 12\n{}", data_section(0, &[4]));
        let sp = parse(&text, "x.spe").unwrap().spectrum;
        assert_eq!(sp.live_time(), Some(10.5));
        assert_eq!(sp.real_time(), Some(12.0));
    }

    #[test]
    fn test_energ_fit_spelling_accepted() {
        let text = format!("$ENERG_FIT:\n-0.3 0.1823\n{}", data_section(0, &[4]));
        let sp = parse(&text, "x.spe").unwrap().spectrum;
        assert_eq!(sp.energy_fit(), Some(&[vec![-0.3, 0.1823]][..]));
    }

    #[test]
    fn test_sections_order_independent() {
        let text = format!("$ROI:\n1\n0 1\n{}$MEAS_TIM:\n1 1\n", data_section(0, &[3, 4]));
        let sp = parse(&text, "x.spe").unwrap().spectrum;
        assert_eq!(sp.rois(), &[Roi::new(0, 1)]);
        assert_eq!(sp.live_time(), Some(1.0));
    }

    #[test]
    fn test_repeated_field_last_wins() {
        let text = format!(
            "$SPEC_ID:\nfirst\n{}$SPEC_ID:\nsecond\n",
            data_section(0, &[1])
        );
        let parsed = parse(&text, "x.spe").unwrap();
        assert_eq!(parsed.spectrum.spec_id(), Some("second"));
        assert_eq!(parsed.warnings, vec![ParseWarning::DuplicateField("SPEC_ID")]);
    }

    #[test]
    fn test_meas_tim_needs_two_tokens() {
        let text = format!("$MEAS_TIM:\n300\n{}", data_section(0, &[1]));
        assert_eq!(
            parse(&text, "x.spe").unwrap_err(),
            FormatError::MissingTokens {
                section: "MEAS_TIM",
                expected: 2,
                found: 1
            }
        );
    }

    #[test]
    fn test_meas_tim_bad_float() {
        let text = format!("$MEAS_TIM:\n300 abc\n{}", data_section(0, &[1]));
        assert_eq!(
            parse(&text, "x.spe").unwrap_err(),
            FormatError::InvalidFloat {
                section: "MEAS_TIM",
                token: "abc".to_string()
            }
        );
    }

    #[test]
    fn test_roi_rejects_inverted_pair() {
        let text = format!("$ROI:\n1\n9 2\n{}", data_section(0, &[1]));
        assert_eq!(
            parse(&text, "x.spe").unwrap_err(),
            FormatError::InvertedRoi { low: 9, high: 2 }
        );
    }

    #[test]
    fn test_roi_rejects_single_value_line() {
        let text = format!("$ROI:\n1\n9\n{}", data_section(0, &[1]));
        assert_eq!(
            parse(&text, "x.spe").unwrap_err(),
            FormatError::MalformedRoi {
                line: "9".to_string()
            }
        );
    }

    #[test]
    fn test_empty_roi_section() {
        let text = format!("$ROI:\n0\n{}", data_section(0, &[1]));
        let sp = parse(&text, "x.spe").unwrap().spectrum;
        assert!(sp.rois().is_empty());
    }

    #[test]
    fn test_crlf_line_endings() {
        let text = "$SPEC_ID:\r\nwindows file\r\n$DATA:\r\n0 2\r\n8\r\n9\r\n\r\n";
        let sp = parse(text, "x.spe").unwrap().spectrum;
        assert_eq!(sp.spec_id(), Some("windows file"));
        assert_eq!(sp.counts(), &[8, 9]);
    }

    #[test]
    fn test_text_field_drops_only_header_line() {
        let text = format!("$SPEC_REM:\nspec_rem mentioned again\n{}", data_section(0, &[1]));
        let sp = parse(&text, "x.spe").unwrap().spectrum;
        assert_eq!(sp.remarks(), Some("spec_rem mentioned again"));
    }

    #[test]
    fn test_classify_prefix_table() {
        assert_eq!(classify("data:"), Some(Field::Data));
        assert_eq!(classify("date_mea:"), Some(Field::DateMea));
        assert_eq!(classify("shape_cal:"), Some(Field::ShapeCal));
        assert_eq!(classify("presets:"), Some(Field::Presets));
        assert_eq!(classify("ener_data:"), None);
    }
}
