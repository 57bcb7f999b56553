use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ReferenceError;

// ---------------------------------------------------------------------------
// SpectralCurve – wavelength (nm) → reflectance
// ---------------------------------------------------------------------------

/// A measured reflectance curve.
///
/// Keys are integer wavelengths in nanometres, values are reflectance
/// fractions (nominally 0..1, instrument noise may exceed that range).
/// Serializes as a JSON object with string keys: `{"400": 0.21, ...}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpectralCurve(BTreeMap<u32, f64>);

impl SpectralCurve {
    pub fn new(values: BTreeMap<u32, f64>) -> Self {
        SpectralCurve(values)
    }

    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (u32, f64)>,
    {
        SpectralCurve(pairs.into_iter().collect())
    }

    /// Reflectance at an exact wavelength. No interpolation.
    pub fn get(&self, wavelength: u32) -> Option<f64> {
        self.0.get(&wavelength).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Wavelengths in ascending order.
    pub fn wavelengths(&self) -> impl Iterator<Item = u32> + '_ {
        self.0.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, f64)> + '_ {
        self.0.iter().map(|(&wl, &r)| (wl, r))
    }

    /// Combine with `other` wavelength by wavelength.  Only wavelengths
    /// present in both curves are visited; `f` returning `None` drops the
    /// wavelength.
    pub fn map_with<F>(&self, other: &SpectralCurve, mut f: F) -> SpectralCurve
    where
        F: FnMut(u32, f64, f64) -> Option<f64>,
    {
        SpectralCurve(
            self.0
                .iter()
                .filter_map(|(&wl, &r)| {
                    let o = other.get(wl)?;
                    f(wl, r, o).map(|v| (wl, v))
                })
                .collect(),
        )
    }

    /// Largest reflectance value, `None` for an empty curve.
    pub fn max_value(&self) -> Option<f64> {
        self.0.values().copied().reduce(f64::max)
    }
}

impl FromIterator<(u32, f64)> for SpectralCurve {
    fn from_iter<T: IntoIterator<Item = (u32, f64)>>(iter: T) -> Self {
        SpectralCurve::from_pairs(iter)
    }
}

// ---------------------------------------------------------------------------
// Tristimulus and CIE Lab values
// ---------------------------------------------------------------------------

/// CIE XYZ tristimulus values (scaled so the white point has Y ≈ 100).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Xyz {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Xyz {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// CIE L*a*b* colour.  L is 0..100 by construction; the range is not
/// enforced since real measurements can exceed it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LabColor {
    #[serde(rename = "L")]
    pub l: f64,
    pub a: f64,
    pub b: f64,
}

impl LabColor {
    pub const ZERO: LabColor = LabColor::new(0.0, 0.0, 0.0);

    pub const fn new(l: f64, a: f64, b: f64) -> Self {
        Self { l, a, b }
    }

    pub fn is_finite(&self) -> bool {
        self.l.is_finite() && self.a.is_finite() && self.b.is_finite()
    }
}

impl fmt::Display for LabColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L {:.2}  a {:.2}  b {:.2}", self.l, self.a, self.b)
    }
}

/// Cylindrical form of Lab: lightness, chroma and hue angle in degrees.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Lch {
    pub l: f64,
    pub c: f64,
    pub h: f64,
}

// ---------------------------------------------------------------------------
// MeasurementMode – ISO 13655 measurement condition
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MeasurementMode {
    M0,
    M1,
    M2,
    M3,
}

impl MeasurementMode {
    pub const ALL: [MeasurementMode; 4] = [
        MeasurementMode::M0,
        MeasurementMode::M1,
        MeasurementMode::M2,
        MeasurementMode::M3,
    ];
}

impl fmt::Display for MeasurementMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MeasurementMode::M0 => "M0",
            MeasurementMode::M1 => "M1",
            MeasurementMode::M2 => "M2",
            MeasurementMode::M3 => "M3",
        };
        f.write_str(s)
    }
}

impl FromStr for MeasurementMode {
    type Err = ReferenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "M0" => Ok(MeasurementMode::M0),
            "M1" => Ok(MeasurementMode::M1),
            "M2" => Ok(MeasurementMode::M2),
            "M3" => Ok(MeasurementMode::M3),
            _ => Err(ReferenceError::UnknownMode(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Tint – one step of an ink ramp
// ---------------------------------------------------------------------------

/// A measured ink sample at a percentage of full coverage.  The 0% tint is
/// the bare substrate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tint {
    pub percentage: f64,
    /// Name of the background the tint was measured on, e.g. "Substrate".
    #[serde(default = "default_background")]
    pub background: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<MeasurementMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spectral: Option<SpectralCurve>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lab: Option<LabColor>,
}

fn default_background() -> String {
    "Substrate".to_string()
}

impl Tint {
    pub fn new(percentage: f64, spectral: SpectralCurve) -> Self {
        Tint {
            percentage,
            background: default_background(),
            mode: None,
            spectral: Some(spectral),
            lab: None,
        }
    }

    /// Whether this tint is the bare substrate.
    pub fn is_substrate(&self) -> bool {
        self.percentage == 0.0
    }

    /// The spectral curve, if present and non-empty.
    pub fn usable_spectral(&self) -> Option<&SpectralCurve> {
        self.spectral.as_ref().filter(|c| !c.is_empty())
    }
}

// ---------------------------------------------------------------------------
// WeightingRow – one wavelength of an ASTM E308 weighting table
// ---------------------------------------------------------------------------

/// A raw reference-data row, as stored by the host.
///
/// White point columns are optional so incomplete datasets can be loaded;
/// conversions against such a table degrade to a zero Lab.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightingRow {
    pub illuminant: String,
    pub observer_angle: u32,
    pub table_number: u32,
    pub wavelength: u32,
    pub x_factor: f64,
    pub y_factor: f64,
    pub z_factor: f64,
    #[serde(default)]
    pub white_point_x: Option<f64>,
    #[serde(default)]
    pub white_point_y: Option<f64>,
    #[serde(default)]
    pub white_point_z: Option<f64>,
}

impl WeightingRow {
    /// White point of this row when all three components are present.
    pub fn white_point(&self) -> Option<Xyz> {
        Some(Xyz::new(
            self.white_point_x?,
            self.white_point_y?,
            self.white_point_z?,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spectral_curve_json_shape() {
        let curve: SpectralCurve =
            serde_json::from_str(r#"{"400": 0.2, "410": 0.25, "700": 0.9}"#).unwrap();
        assert_eq!(curve.len(), 3);
        assert_eq!(curve.get(410), Some(0.25));
        assert_eq!(curve.get(405), None);
        assert_eq!(curve.wavelengths().collect::<Vec<_>>(), vec![400, 410, 700]);

        let json = serde_json::to_string(&curve).unwrap();
        assert_eq!(json, r#"{"400":0.2,"410":0.25,"700":0.9}"#);
    }

    #[test]
    fn test_map_with_keeps_shared_wavelengths() {
        let a = SpectralCurve::from_pairs([(400, 0.2), (410, 0.4), (420, 0.6)]);
        let b = SpectralCurve::from_pairs([(410, 0.1), (420, 0.2), (430, 0.3)]);
        let sum = a.map_with(&b, |_, x, y| Some(x + y));
        assert_eq!(sum.len(), 2);
        assert!((sum.get(410).unwrap() - 0.5).abs() < 1e-12);
        assert!((sum.get(420).unwrap() - 0.8).abs() < 1e-12);

        let below_420 = a.map_with(&b, |wl, x, _| (wl < 420).then_some(x));
        assert_eq!(below_420.wavelengths().collect::<Vec<_>>(), vec![410]);
    }

    #[test]
    fn test_max_value() {
        assert_eq!(SpectralCurve::default().max_value(), None);
        let c = SpectralCurve::from_pairs([(400, 0.2), (410, 1.03), (420, 0.6)]);
        assert_eq!(c.max_value(), Some(1.03));
    }

    #[test]
    fn test_measurement_mode_parse() {
        assert_eq!("m1".parse::<MeasurementMode>().unwrap(), MeasurementMode::M1);
        assert_eq!(" M2 ".parse::<MeasurementMode>().unwrap(), MeasurementMode::M2);
        assert!("M4".parse::<MeasurementMode>().is_err());
        assert_eq!(MeasurementMode::M0.to_string(), "M0");
    }

    #[test]
    fn test_tint_defaults_from_json() {
        let tint: Tint =
            serde_json::from_str(r#"{"percentage": 50, "spectral": {"400": 0.3}}"#).unwrap();
        assert_eq!(tint.background, "Substrate");
        assert!(tint.lab.is_none());
        assert!(!tint.is_substrate());
        assert!(tint.usable_spectral().is_some());
    }

    #[test]
    fn test_lab_serializes_uppercase_l() {
        let json = serde_json::to_string(&LabColor::new(50.0, 1.0, -2.0)).unwrap();
        assert_eq!(json, r#"{"L":50.0,"a":1.0,"b":-2.0}"#);
    }

    #[test]
    fn test_row_white_point_requires_all_components() {
        let mut row = WeightingRow {
            illuminant: "D50".to_string(),
            observer_angle: 2,
            table_number: 5,
            wavelength: 400,
            x_factor: 0.1,
            y_factor: 0.1,
            z_factor: 0.1,
            white_point_x: Some(96.42),
            white_point_y: Some(100.0),
            white_point_z: Some(82.52),
        };
        assert_eq!(row.white_point(), Some(Xyz::new(96.42, 100.0, 82.52)));
        row.white_point_z = None;
        assert_eq!(row.white_point(), None);
    }
}
