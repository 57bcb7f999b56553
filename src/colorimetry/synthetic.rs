//! Self-consistent weighting tables built from analytic approximations.
//!
//! Real ASTM E308 tables are reference data supplied by the host.  These
//! synthetic tables use the Wyman–Sloan–Shirley multi-lobe fit of the CIE 1931
//! colour-matching functions ("Simple Analytic Approximations to the CIE XYZ
//! Color Matching Functions", JCGT 2013) weighted by a Planckian radiator at
//! the illuminant's correlated colour temperature.  They are close enough for
//! demos and tests but are not a substitute for the published tables.

use crate::data::model::WeightingRow;

use super::astm::{Illuminant, Observer, ReferenceData, WeightingKey, WeightingTable};

/// Second radiation constant c2 = h·c/k, in m·K.
const C2: f64 = 1.438_776_877e-2;

pub fn x_bar(lambda: f64) -> f64 {
    let t1 = (lambda - 442.0) * if lambda < 442.0 { 0.0624 } else { 0.0374 };
    let t2 = (lambda - 599.8) * if lambda < 599.8 { 0.0264 } else { 0.0323 };
    let t3 = (lambda - 501.1) * if lambda < 501.1 { 0.0490 } else { 0.0382 };
    0.362 * (-0.5 * t1 * t1).exp() + 1.056 * (-0.5 * t2 * t2).exp()
        - 0.065 * (-0.5 * t3 * t3).exp()
}

pub fn y_bar(lambda: f64) -> f64 {
    let t1 = (lambda - 568.8) * if lambda < 568.8 { 0.0213 } else { 0.0247 };
    let t2 = (lambda - 530.9) * if lambda < 530.9 { 0.0613 } else { 0.0322 };
    0.821 * (-0.5 * t1 * t1).exp() + 0.286 * (-0.5 * t2 * t2).exp()
}

pub fn z_bar(lambda: f64) -> f64 {
    let t1 = (lambda - 437.0) * if lambda < 437.0 { 0.0845 } else { 0.0278 };
    let t2 = (lambda - 459.0) * if lambda < 459.0 { 0.0385 } else { 0.0725 };
    1.217 * (-0.5 * t1 * t1).exp() + 0.681 * (-0.5 * t2 * t2).exp()
}

/// Relative spectral power of a blackbody at `cct` kelvin (unnormalised).
pub fn planck(lambda_nm: f64, cct: f64) -> f64 {
    let lambda = lambda_nm * 1e-9;
    1.0 / (lambda.powi(5) * ((C2 / (lambda * cct)).exp() - 1.0))
}

/// The usual 360–780 nm grid at 10 nm.
pub fn standard_wavelengths() -> Vec<u32> {
    (360..=780).step_by(10).collect()
}

/// Rows of a synthetic 2° table for `illuminant`, labelled with `table`.
///
/// The colour-matching fit is the 1931 2° observer only, so there is no
/// 10° variant.  Factors are scaled so that Σ y_factor = 100 and the white
/// point equals the column sums, so a perfect diffuser maps to L* = 100.
pub fn weighting_rows(
    illuminant: Illuminant,
    table: u32,
    wavelengths: &[u32],
) -> Vec<WeightingRow> {
    let cct = illuminant.nominal_cct();
    let raw: Vec<(u32, f64, f64, f64)> = wavelengths
        .iter()
        .map(|&wl| {
            let lambda = wl as f64;
            let s = planck(lambda, cct);
            (wl, s * x_bar(lambda), s * y_bar(lambda), s * z_bar(lambda))
        })
        .collect();

    let y_sum: f64 = raw.iter().map(|r| r.2).sum();
    let k = if y_sum > 0.0 { 100.0 / y_sum } else { 0.0 };

    let white_x: f64 = raw.iter().map(|r| r.1 * k).sum();
    let white_z: f64 = raw.iter().map(|r| r.3 * k).sum();
    let white_y: f64 = raw.iter().map(|r| r.2 * k).sum();

    raw.into_iter()
        .map(|(wavelength, x, y, z)| WeightingRow {
            illuminant: illuminant.name().to_string(),
            observer_angle: Observer::TwoDegree.degrees(),
            table_number: table,
            wavelength,
            x_factor: x * k,
            y_factor: y * k,
            z_factor: z * k,
            white_point_x: Some(white_x),
            white_point_y: Some(white_y),
            white_point_z: Some(white_z),
        })
        .collect()
}

pub fn weighting_table(illuminant: Illuminant, table: u32, wavelengths: &[u32]) -> WeightingTable {
    WeightingTable::new(weighting_rows(illuminant, table, wavelengths))
}

impl ReferenceData {
    /// Synthetic 2°, table 5 weighting tables for every known illuminant on
    /// the standard 360–780 nm grid.
    pub fn synthetic() -> Self {
        let wavelengths = standard_wavelengths();
        ReferenceData::from_tables(Illuminant::ALL.into_iter().map(|illuminant| {
            let key = WeightingKey::new(illuminant, Observer::TwoDegree, 5);
            (key, weighting_table(illuminant, key.table, &wavelengths))
        }))
    }
}
