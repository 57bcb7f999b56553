use crate::data::model::{LabColor, SpectralCurve, Xyz};

use super::astm::WeightingTable;

/// CIE ε: below this ratio the Lab transfer function is linear.
const EPSILON: f64 = 0.008856;
/// CIE κ: slope of the linear segment.
const KAPPA: f64 = 903.3;

/// Integrate a reflectance curve against a weighting table.
///
/// Only wavelengths present in both the curve and the table contribute; no
/// interpolation is done.  The table factors already carry the
/// normalisation, so the sums are the tristimulus values.
pub fn spectral_to_xyz(curve: &SpectralCurve, table: &WeightingTable) -> Xyz {
    table
        .rows()
        .iter()
        .filter_map(|row| curve.get(row.wavelength).map(|r| (r, row)))
        .fold(Xyz::default(), |acc, (r, row)| Xyz {
            x: acc.x + r * row.x_factor,
            y: acc.y + r * row.y_factor,
            z: acc.z + r * row.z_factor,
        })
}

/// Standard CIE XYZ → L*a*b* relative to `white`.
///
/// A white point with a non-positive component yields [`LabColor::ZERO`].
pub fn xyz_to_lab(xyz: Xyz, white: Xyz) -> LabColor {
    if !(white.x > 0.0 && white.y > 0.0 && white.z > 0.0) {
        return LabColor::ZERO;
    }

    let fx = lab_f(xyz.x / white.x);
    let fy = lab_f(xyz.y / white.y);
    let fz = lab_f(xyz.z / white.z);

    LabColor {
        l: 116.0 * fy - 16.0,
        a: 500.0 * (fx - fy),
        b: 200.0 * (fy - fz),
    }
}

fn lab_f(t: f64) -> f64 {
    if t > EPSILON {
        t.cbrt()
    } else {
        (KAPPA * t + 16.0) / 116.0
    }
}

/// Reflectance curve → Lab under the given (pre-selected) weighting table.
///
/// An empty table or one without a complete white point gives exactly
/// `{0, 0, 0}` instead of an error.
pub fn spectral_to_lab(curve: &SpectralCurve, table: &WeightingTable) -> LabColor {
    let Some(white) = table.white_point() else {
        return LabColor::ZERO;
    };
    xyz_to_lab(spectral_to_xyz(curve, table), white)
}
