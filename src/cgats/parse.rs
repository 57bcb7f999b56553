use std::collections::BTreeMap;

use log::{debug, info, warn};

use crate::data::model::{LabColor, MeasurementMode, SpectralCurve, Xyz};
use crate::error::CgatsError;

use super::{Cmyk, CgatsColorSample, CgatsDocument};

/// Without a `SPECTRAL_SCALE` header, spectral values above this mean the
/// file stores percentages.
const PERCENT_THRESHOLD: f64 = 2.0;

/// Header keyword declaring the full-scale value of the spectral columns
/// (`1` for reflectance factors, `100` for percentages).
pub const SPECTRAL_SCALE_KEYWORD: &str = "SPECTRAL_SCALE";

// ---------------------------------------------------------------------------
// Field roles
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldRole {
    SampleName,
    SampleId,
    Lab(usize),
    Xyz(usize),
    Spectral(u32),
    Cmyk(usize),
    /// Zero-based channel of an n-colour ink set (`7CLR_1` → 0).
    Channel(usize),
    Other,
}

impl FieldRole {
    fn is_color_data(&self) -> bool {
        matches!(
            self,
            FieldRole::Lab(_)
                | FieldRole::Xyz(_)
                | FieldRole::Spectral(_)
                | FieldRole::Cmyk(_)
                | FieldRole::Channel(_)
        )
    }
}

const SPECTRAL_PREFIXES: [&str; 5] = ["SPECTRAL_NM_", "SPECTRAL_NM", "SPECTRAL_", "NM_", "R_"];

fn classify(field: &str) -> FieldRole {
    let upper = field.to_ascii_uppercase();
    match upper.as_str() {
        "SAMPLE_NAME" => return FieldRole::SampleName,
        "SAMPLE_ID" => return FieldRole::SampleId,
        "LAB_L" => return FieldRole::Lab(0),
        "LAB_A" => return FieldRole::Lab(1),
        "LAB_B" => return FieldRole::Lab(2),
        "XYZ_X" => return FieldRole::Xyz(0),
        "XYZ_Y" => return FieldRole::Xyz(1),
        "XYZ_Z" => return FieldRole::Xyz(2),
        "CMYK_C" => return FieldRole::Cmyk(0),
        "CMYK_M" => return FieldRole::Cmyk(1),
        "CMYK_Y" => return FieldRole::Cmyk(2),
        "CMYK_K" => return FieldRole::Cmyk(3),
        _ => {}
    }

    for prefix in SPECTRAL_PREFIXES {
        if let Some(rest) = upper.strip_prefix(prefix) {
            if let Some(nm) = parse_digits(rest) {
                return FieldRole::Spectral(nm);
            }
        }
    }

    if let Some((count, index)) = upper.split_once("CLR_") {
        if let (Some(_), Some(index)) = (parse_digits(count), parse_digits(index)) {
            if index >= 1 {
                return FieldRole::Channel(index as usize - 1);
            }
        }
    }

    FieldRole::Other
}

fn parse_digits(s: &str) -> Option<u32> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

// ---------------------------------------------------------------------------
// Tokenizing
// ---------------------------------------------------------------------------

/// Split a line on spaces/tabs.  Double-quoted tokens keep inner whitespace
/// and lose their quotes.
fn tokenize(line: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut quoted = false;

    for ch in line.chars() {
        match ch {
            '"' => {
                in_quotes = !in_quotes;
                quoted = true;
            }
            ' ' | '\t' if !in_quotes => {
                if !current.is_empty() || quoted {
                    tokens.push(std::mem::take(&mut current));
                }
                quoted = false;
            }
            _ => current.push(ch),
        }
    }
    if !current.is_empty() || quoted {
        tokens.push(current);
    }
    tokens
}

/// Lenient number parsing: accepts a decimal comma.
fn parse_number(token: &str) -> Option<f64> {
    token.trim().replace(',', ".").parse::<f64>().ok()
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Header,
    Format,
    BetweenBlocks,
    Data,
    Done,
}

/// Parse a CGATS text file.
///
/// Structural problems (missing keywords, no sample name field, no colour
/// data fields) are errors.  Unparseable cells are tolerated: Lab and XYZ
/// become NaN, spectral and ink values become 0.
pub fn parse_cgats(text: &str) -> Result<CgatsDocument, CgatsError> {
    let mut section = Section::Header;
    let mut identifier = None;
    let mut header = BTreeMap::new();
    let mut fields: Vec<String> = Vec::new();
    let mut rows: Vec<Vec<String>> = Vec::new();
    let mut pending: Vec<String> = Vec::new();
    let mut warnings = Vec::new();
    let mut seen_format_begin = false;
    let mut seen_format_end = false;
    let mut seen_data = false;

    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let tokens = tokenize(trimmed);
        let Some(first) = tokens.first() else {
            continue;
        };
        let keyword = first.to_ascii_uppercase();

        match section {
            Section::Header | Section::BetweenBlocks => match keyword.as_str() {
                "BEGIN_DATA_FORMAT" if section == Section::Header => {
                    seen_format_begin = true;
                    section = Section::Format;
                    seen_format_end |= take_format_tokens(&tokens[1..], &mut fields);
                    if seen_format_end {
                        section = Section::BetweenBlocks;
                    }
                }
                "BEGIN_DATA" => {
                    if !seen_format_end {
                        return Err(CgatsError::MissingKeyword("BEGIN_DATA_FORMAT"));
                    }
                    validate_fields(&fields)?;
                    seen_data = true;
                    section = take_data_tokens(&tokens[1..], &fields, &mut pending, &mut rows);
                }
                _ => {
                    if identifier.is_none() && header.is_empty() && tokens.len() == 1 {
                        identifier = Some(first.clone());
                    } else {
                        header.insert(keyword, tokens[1..].join(" "));
                    }
                }
            },
            Section::Format => {
                if take_format_tokens(&tokens, &mut fields) {
                    seen_format_end = true;
                    section = Section::BetweenBlocks;
                }
            }
            Section::Data => {
                section = take_data_tokens(&tokens, &fields, &mut pending, &mut rows);
            }
            Section::Done => break,
        }
    }

    if !seen_format_begin {
        return Err(CgatsError::MissingKeyword("BEGIN_DATA_FORMAT"));
    }
    if !seen_format_end {
        return Err(CgatsError::MissingKeyword("END_DATA_FORMAT"));
    }
    if !seen_data {
        return Err(CgatsError::MissingKeyword("BEGIN_DATA"));
    }
    if section != Section::Done {
        return Err(CgatsError::MissingKeyword("END_DATA"));
    }
    if !pending.is_empty() {
        let msg = format!(
            "incomplete final row dropped ({} of {} fields)",
            pending.len(),
            fields.len()
        );
        warn!("{msg}");
        warnings.push(msg);
    }

    let roles: Vec<FieldRole> = fields.iter().map(|f| classify(f)).collect();
    let mut samples: Vec<CgatsColorSample> = rows.iter().map(|row| build_sample(&roles, row)).collect();

    if let Some(scale) = spectral_scale(&header, &samples, &mut warnings) {
        info!("spectral data scaled by 1/{scale}");
        for sample in &mut samples {
            if let Some(curve) = sample.spectral.take() {
                sample.spectral = Some(curve.iter().map(|(wl, r)| (wl, r / scale)).collect());
            }
        }
    }

    let mode = header
        .get("MEASUREMENT_CONDITION")
        .and_then(|m| m.parse::<MeasurementMode>().ok());

    debug!("parsed CGATS: {} fields, {} samples", fields.len(), samples.len());

    Ok(CgatsDocument {
        identifier,
        header,
        fields,
        mode,
        samples,
        warnings,
    })
}

/// Divisor for the spectral columns, `None` when they are already 0..1.
///
/// A declared `SPECTRAL_SCALE` wins.  Without one, any value above
/// [`PERCENT_THRESHOLD`] marks the whole file as percentages.
fn spectral_scale(
    header: &BTreeMap<String, String>,
    samples: &[CgatsColorSample],
    warnings: &mut Vec<String>,
) -> Option<f64> {
    if let Some(declared) = header.get(SPECTRAL_SCALE_KEYWORD) {
        match parse_number(declared) {
            Some(scale) if scale > 0.0 && scale.is_finite() => {
                return (scale != 1.0).then_some(scale);
            }
            _ => {
                let msg = format!("ignoring invalid {SPECTRAL_SCALE_KEYWORD} \"{declared}\"");
                warn!("{msg}");
                warnings.push(msg);
            }
        }
    }

    samples
        .iter()
        .filter_map(|s| s.spectral.as_ref())
        .filter_map(SpectralCurve::max_value)
        .any(|v| v > PERCENT_THRESHOLD)
        .then_some(100.0)
}

/// Append field names; returns true once `END_DATA_FORMAT` is reached.
fn take_format_tokens(tokens: &[String], fields: &mut Vec<String>) -> bool {
    for token in tokens {
        if token.eq_ignore_ascii_case("END_DATA_FORMAT") {
            return true;
        }
        fields.push(token.clone());
    }
    false
}

/// Gather row tokens across physical lines until each row is complete.
fn take_data_tokens(
    tokens: &[String],
    fields: &[String],
    pending: &mut Vec<String>,
    rows: &mut Vec<Vec<String>>,
) -> Section {
    for token in tokens {
        if token.eq_ignore_ascii_case("END_DATA") {
            return Section::Done;
        }
        pending.push(token.clone());
        if pending.len() == fields.len() {
            rows.push(std::mem::take(pending));
        }
    }
    Section::Data
}

fn validate_fields(fields: &[String]) -> Result<(), CgatsError> {
    if fields.is_empty() {
        return Err(CgatsError::EmptyDataFormat);
    }
    let roles: Vec<FieldRole> = fields.iter().map(|f| classify(f)).collect();
    if !roles
        .iter()
        .any(|r| matches!(r, FieldRole::SampleName | FieldRole::SampleId))
    {
        return Err(CgatsError::MissingSampleName);
    }
    if !roles.iter().any(FieldRole::is_color_data) {
        return Err(CgatsError::NoColorData);
    }
    Ok(())
}

fn build_sample(roles: &[FieldRole], row: &[String]) -> CgatsColorSample {
    let mut name = None;
    let mut id = None;
    let mut lab = [f64::NAN; 3];
    let mut has_lab = false;
    let mut xyz = [f64::NAN; 3];
    let mut has_xyz = false;
    let mut spectral = BTreeMap::new();
    let mut cmyk = [0.0; 4];
    let mut has_cmyk = false;
    let mut channels: Vec<f64> = Vec::new();

    for (role, value) in roles.iter().zip(row) {
        match *role {
            FieldRole::SampleName => name = Some(value.clone()),
            FieldRole::SampleId => id = Some(value.clone()),
            FieldRole::Lab(i) => {
                has_lab = true;
                lab[i] = parse_number(value).unwrap_or(f64::NAN);
            }
            FieldRole::Xyz(i) => {
                has_xyz = true;
                xyz[i] = parse_number(value).unwrap_or(f64::NAN);
            }
            FieldRole::Spectral(nm) => {
                spectral.insert(nm, parse_number(value).unwrap_or(0.0));
            }
            FieldRole::Cmyk(i) => {
                has_cmyk = true;
                cmyk[i] = parse_number(value).unwrap_or(0.0);
            }
            FieldRole::Channel(i) => {
                if channels.len() <= i {
                    channels.resize(i + 1, 0.0);
                }
                channels[i] = parse_number(value).unwrap_or(0.0);
            }
            FieldRole::Other => {}
        }
    }

    let lab = (has_lab && lab.iter().any(|v| !v.is_nan()))
        .then(|| LabColor::new(lab[0], lab[1], lab[2]));
    let xyz = (has_xyz && xyz.iter().any(|v| !v.is_nan())).then(|| Xyz::new(xyz[0], xyz[1], xyz[2]));

    CgatsColorSample {
        name: name.or(id).unwrap_or_default(),
        lab,
        xyz,
        spectral: (!spectral.is_empty()).then(|| SpectralCurve::new(spectral)),
        cmyk: has_cmyk.then(|| Cmyk {
            c: cmyk[0],
            m: cmyk[1],
            y: cmyk[2],
            k: cmyk[3],
        }),
        channels,
    }
}
