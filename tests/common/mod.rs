//! Shared fixtures for integration tests.

#![allow(dead_code)]

use inkscope::colorimetry::astm::{Illuminant, Observer, WeightingKey, WeightingTable};
use inkscope::colorimetry::synthetic::{standard_wavelengths, weighting_table};
use inkscope::data::model::SpectralCurve;

/// The reference scenario curve used across tests.
pub fn scenario_curve() -> SpectralCurve {
    SpectralCurve::from_pairs([
        (400, 0.2),
        (450, 0.4),
        (500, 0.8),
        (550, 0.9),
        (600, 0.6),
        (650, 0.3),
        (700, 0.1),
    ])
}

pub fn key(illuminant: Illuminant) -> WeightingKey {
    WeightingKey::new(illuminant, Observer::TwoDegree, 5)
}

/// Synthetic 2°/table 5 weighting table on the 360–780 nm grid.
pub fn table(illuminant: Illuminant) -> WeightingTable {
    weighting_table(illuminant, 5, &standard_wavelengths())
}

/// Reflectance `value` at every wavelength of `table`.
pub fn flat_curve(table: &WeightingTable, value: f64) -> SpectralCurve {
    table.wavelengths().map(|wl| (wl, value)).collect()
}

/// Deterministic LCG for reproducible "random" inputs.
pub struct Lcg(u64);

impl Lcg {
    pub fn new(seed: u64) -> Self {
        Lcg(seed)
    }

    /// Uniform in [0, 1).
    pub fn next_f64(&mut self) -> f64 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (self.0 >> 11) as f64 / (1u64 << 53) as f64
    }

    pub fn range(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.next_f64()
    }
}
