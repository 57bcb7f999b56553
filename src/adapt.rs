//! Move an ink tint ramp from one substrate to another.
//!
//! The substrate's contribution is assumed separable from the ink film: each
//! tint curve is corrected wavelength by wavelength with the ratio (or the
//! difference) between the target and source substrate curves.  This is a
//! product heuristic, not a spectrophotometric model.

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::colorimetry::astm::{Illuminant, Observer, ReferenceData, WeightingKey};
use crate::colorimetry::convert::spectral_to_lab;
use crate::data::model::{MeasurementMode, SpectralCurve, Tint};
use crate::error::ReferenceError;

/// Below this source reflectance the ratio method falls back to a delta.
const MIN_SOURCE_REFLECTANCE: f64 = 1e-4;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdaptationMethod {
    /// `tint · target / source`
    #[default]
    Ratio,
    /// `tint + (target − source)`
    Delta,
}

impl std::str::FromStr for AdaptationMethod {
    type Err = ReferenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ratio" => Ok(AdaptationMethod::Ratio),
            "delta" => Ok(AdaptationMethod::Delta),
            _ => Err(ReferenceError::UnknownMethod(s.to_string())),
        }
    }
}

/// Measurement settings used to recompute Lab for adapted tints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdaptationSettings {
    pub mode: MeasurementMode,
    pub illuminant: Illuminant,
    pub observer: Observer,
    pub table: u32,
    #[serde(default)]
    pub method: AdaptationMethod,
    /// Background name written on adapted tints.
    #[serde(default = "default_target_background")]
    pub target_background: String,
}

fn default_target_background() -> String {
    "Substrate".to_string()
}

impl Default for AdaptationSettings {
    fn default() -> Self {
        AdaptationSettings {
            mode: MeasurementMode::M1,
            illuminant: Illuminant::D50,
            observer: Observer::TwoDegree,
            table: 5,
            method: AdaptationMethod::Ratio,
            target_background: default_target_background(),
        }
    }
}

impl AdaptationSettings {
    pub fn weighting_key(&self) -> WeightingKey {
        WeightingKey::new(self.illuminant, self.observer, self.table)
    }
}

/// Why a tint was passed through unadapted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    MissingTargetSubstrate,
    MissingSourceSubstrate,
    MissingTintSpectral,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SkipReason::MissingTargetSubstrate => "target substrate has no spectral data",
            SkipReason::MissingSourceSubstrate => "source substrate (0% tint) has no spectral data",
            SkipReason::MissingTintSpectral => "tint has no spectral data",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedTint {
    pub percentage: f64,
    pub reason: SkipReason,
}

/// Adapted tints in input order, plus every tint that was passed through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdaptationOutcome {
    pub tints: Vec<Tint>,
    pub skipped: Vec<SkippedTint>,
}

impl AdaptationOutcome {
    fn pass_through(tints: &[Tint], reason: SkipReason) -> Self {
        AdaptationOutcome {
            tints: tints.to_vec(),
            skipped: tints
                .iter()
                .map(|t| SkippedTint {
                    percentage: t.percentage,
                    reason,
                })
                .collect(),
        }
    }
}

/// Apply the substrate correction to one curve.
pub fn adapt_curve(
    tint: &SpectralCurve,
    source: &SpectralCurve,
    target: &SpectralCurve,
    method: AdaptationMethod,
) -> SpectralCurve {
    tint.map_with(source, |wl, r, s| {
        let t = target.get(wl)?;
        let adapted = match method {
            AdaptationMethod::Ratio if s > MIN_SOURCE_REFLECTANCE => r * t / s,
            AdaptationMethod::Ratio | AdaptationMethod::Delta => r + (t - s),
        };
        Some(adapted.max(0.0))
    })
}

/// Adapt a tint ramp measured on its own substrate (the 0% tint) to
/// `target_substrate`.
///
/// Never fails: a missing source or target substrate curve passes every tint
/// through unchanged, and a tint without spectral data is passed through on
/// its own.  Each pass-through is reported in [`AdaptationOutcome::skipped`].
pub fn adapt_tints(
    tints: &[Tint],
    target_substrate: Option<&SpectralCurve>,
    settings: &AdaptationSettings,
    reference: &ReferenceData,
) -> AdaptationOutcome {
    let Some(target) = target_substrate.filter(|c| !c.is_empty()) else {
        warn!("tint adaptation skipped: {}", SkipReason::MissingTargetSubstrate);
        return AdaptationOutcome::pass_through(tints, SkipReason::MissingTargetSubstrate);
    };
    let Some(source) = tints
        .iter()
        .find(|t| t.is_substrate())
        .and_then(Tint::usable_spectral)
    else {
        warn!("tint adaptation skipped: {}", SkipReason::MissingSourceSubstrate);
        return AdaptationOutcome::pass_through(tints, SkipReason::MissingSourceSubstrate);
    };

    let table = reference.table_or_empty(&settings.weighting_key());
    let mut adapted = Vec::with_capacity(tints.len());
    let mut skipped = Vec::new();

    for tint in tints {
        let curve = if tint.is_substrate() {
            target.clone()
        } else {
            match tint.usable_spectral() {
                Some(curve) => adapt_curve(curve, source, target, settings.method),
                None => {
                    warn!(
                        "tint {}% passed through: {}",
                        tint.percentage,
                        SkipReason::MissingTintSpectral
                    );
                    skipped.push(SkippedTint {
                        percentage: tint.percentage,
                        reason: SkipReason::MissingTintSpectral,
                    });
                    adapted.push(tint.clone());
                    continue;
                }
            }
        };

        let lab = spectral_to_lab(&curve, table);
        debug!("tint {}% adapted → {lab}", tint.percentage);
        adapted.push(Tint {
            percentage: tint.percentage,
            background: settings.target_background.clone(),
            mode: Some(settings.mode),
            spectral: Some(curve),
            lab: Some(lab),
        });
    }

    AdaptationOutcome {
        tints: adapted,
        skipped,
    }
}
