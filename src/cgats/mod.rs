//! CGATS exchange: reading measurement files and writing them back.
//!
//! ```text
//!   CGATS text ──► parse ──► CgatsDocument { header, fields, samples }
//!
//!   ColorReference[] ──► build ──► CgatsExport { content, exported, skipped, warnings }
//! ```
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::data::model::{LabColor, MeasurementMode, SpectralCurve, Xyz};

pub mod build;
pub mod parse;

pub use build::{build_cgats, CgatsExport, ColorReference, ExportOptions, Measurement};
pub use parse::parse_cgats;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Cmyk {
    pub c: f64,
    pub m: f64,
    pub y: f64,
    pub k: f64,
}

/// One row of a parsed file.  Only lives for the duration of an import.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CgatsColorSample {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lab: Option<LabColor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xyz: Option<Xyz>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spectral: Option<SpectralCurve>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cmyk: Option<Cmyk>,
    /// Ink values of an n-colour (`nCLR_i`) ink set, by channel.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub channels: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CgatsDocument {
    /// First line of the file, e.g. `CGATS.17`.
    pub identifier: Option<String>,
    /// Header keywords with unquoted values.
    pub header: BTreeMap<String, String>,
    pub fields: Vec<String>,
    /// From the `MEASUREMENT_CONDITION` keyword.
    pub mode: Option<MeasurementMode>,
    pub samples: Vec<CgatsColorSample>,
    pub warnings: Vec<String>,
}
