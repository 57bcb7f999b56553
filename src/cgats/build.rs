use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, SecondsFormat, Utc};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::colorimetry::astm::WeightingTable;
use crate::cgats::parse::SPECTRAL_SCALE_KEYWORD;
use crate::colorimetry::convert::spectral_to_lab;
use crate::data::model::{LabColor, MeasurementMode, SpectralCurve};

// ---------------------------------------------------------------------------
// Export input / output
// ---------------------------------------------------------------------------

/// A stored measurement of a colour under one measurement mode.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lab: Option<LabColor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spectral: Option<SpectralCurve>,
}

impl Measurement {
    fn usable_spectral(&self) -> Option<&SpectralCurve> {
        self.spectral.as_ref().filter(|c| !c.is_empty())
    }

    fn is_usable(&self) -> bool {
        self.lab.is_some() || self.usable_spectral().is_some()
    }
}

/// A named colour with its measurements keyed by mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorReference {
    pub name: String,
    #[serde(default)]
    pub measurements: BTreeMap<MeasurementMode, Measurement>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportOptions {
    /// Export only this mode.  `None` takes the first available of M0..M3.
    pub mode: Option<MeasurementMode>,
    pub originator: String,
    pub descriptor: String,
    pub created: Option<DateTime<Utc>>,
}

impl Default for ExportOptions {
    fn default() -> Self {
        ExportOptions {
            mode: None,
            originator: "inkscope".to_string(),
            descriptor: "Color export".to_string(),
            created: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CgatsExport {
    pub content: String,
    pub exported: usize,
    pub skipped: usize,
    pub warnings: Vec<String>,
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

struct ExportRow<'a> {
    name: &'a str,
    spectral: Option<&'a SpectralCurve>,
    lab: Option<LabColor>,
}

fn select_measurement(
    color: &ColorReference,
    mode: Option<MeasurementMode>,
) -> Result<&Measurement, String> {
    if color.measurements.is_empty() {
        return Err(format!("Skipped \"{}\": no measurements", color.name));
    }
    let measurement = match mode {
        Some(mode) => color
            .measurements
            .get(&mode)
            .ok_or_else(|| format!("Skipped \"{}\": no {mode} measurement", color.name))?,
        None => MeasurementMode::ALL
            .iter()
            .find_map(|m| color.measurements.get(m))
            .ok_or_else(|| format!("Skipped \"{}\": no measurements", color.name))?,
    };
    if !measurement.is_usable() {
        return Err(format!(
            "Skipped \"{}\": measurement has neither spectral nor Lab data",
            color.name
        ));
    }
    Ok(measurement)
}

fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "'"))
}

fn number(value: f64) -> String {
    format!("{value:.4}")
}

/// Write `colors` as a CGATS file.
///
/// Spectral columns are the union of wavelengths across exported colours; Lab
/// columns are present when any exported colour has Lab (measured, or
/// computed from spectral data when `table` is given).  Colours without
/// usable data are skipped, each with a warning.
pub fn build_cgats(
    colors: &[ColorReference],
    options: &ExportOptions,
    table: Option<&WeightingTable>,
) -> CgatsExport {
    let mut warnings = Vec::new();
    let mut rows = Vec::new();

    for color in colors {
        match select_measurement(color, options.mode) {
            Ok(measurement) => {
                let spectral = measurement.usable_spectral();
                let lab = measurement.lab.or_else(|| {
                    let table = table?;
                    Some(spectral_to_lab(spectral?, table))
                });
                rows.push(ExportRow {
                    name: &color.name,
                    spectral,
                    lab,
                });
            }
            Err(reason) => {
                warn!("{reason}");
                warnings.push(reason);
            }
        }
    }

    let wavelengths: BTreeSet<u32> = rows
        .iter()
        .filter_map(|r| r.spectral)
        .flat_map(|c| c.wavelengths())
        .collect();
    let with_lab = rows.iter().any(|r| r.lab.is_some());

    let mut fields = vec!["SAMPLE_ID".to_string(), "SAMPLE_NAME".to_string()];
    fields.extend(wavelengths.iter().map(|wl| format!("SPECTRAL_NM{wl:03}")));
    if with_lab {
        fields.extend(["LAB_L", "LAB_A", "LAB_B"].map(String::from));
    }

    let mut lines = vec![
        "CGATS.17".to_string(),
        format!("ORIGINATOR {}", quote(&options.originator)),
        format!("DESCRIPTOR {}", quote(&options.descriptor)),
    ];
    if let Some(created) = options.created {
        lines.push(format!(
            "CREATED {}",
            quote(&created.to_rfc3339_opts(SecondsFormat::Secs, true))
        ));
    }
    if let Some(mode) = options.mode {
        lines.push(format!("MEASUREMENT_CONDITION {}", quote(&mode.to_string())));
    }
    if !wavelengths.is_empty() {
        lines.push(format!("KEYWORD {}", quote(SPECTRAL_SCALE_KEYWORD)));
        lines.push(format!("{SPECTRAL_SCALE_KEYWORD} 1"));
    }
    lines.push(format!("NUMBER_OF_FIELDS {}", fields.len()));
    lines.push("BEGIN_DATA_FORMAT".to_string());
    lines.push(fields.join("\t"));
    lines.push("END_DATA_FORMAT".to_string());
    lines.push(format!("NUMBER_OF_SETS {}", rows.len()));
    lines.push("BEGIN_DATA".to_string());

    for (index, row) in rows.iter().enumerate() {
        let mut cells = vec![(index + 1).to_string(), quote(row.name)];

        if !wavelengths.is_empty() {
            let missing = wavelengths
                .iter()
                .filter(|wl| row.spectral.and_then(|c| c.get(**wl)).is_none())
                .count();
            if missing > 0 {
                let msg = format!(
                    "\"{}\": {missing} of {} spectral values missing, written as 0",
                    row.name,
                    wavelengths.len()
                );
                debug!("{msg}");
                warnings.push(msg);
            }
            cells.extend(
                wavelengths
                    .iter()
                    .map(|wl| number(row.spectral.and_then(|c| c.get(*wl)).unwrap_or(0.0))),
            );
        }

        if with_lab {
            let lab = row.lab.unwrap_or_else(|| {
                warnings.push(format!("\"{}\": no Lab data, written as 0", row.name));
                LabColor::ZERO
            });
            cells.extend([number(lab.l), number(lab.a), number(lab.b)]);
        }

        lines.push(cells.join("\t"));
    }
    lines.push("END_DATA".to_string());

    let exported = rows.len();
    let skipped = colors.len() - exported;
    debug!("CGATS export: {exported} exported, {skipped} skipped");

    let content = if exported == 0 {
        warnings.push("No colors had exportable data".to_string());
        String::new()
    } else {
        let mut content = lines.join("\n");
        content.push('\n');
        content
    };

    CgatsExport {
        content,
        exported,
        skipped,
        warnings,
    }
}
