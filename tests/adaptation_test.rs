use inkscope::adapt::{adapt_tints, AdaptationMethod, AdaptationSettings, SkipReason};
use inkscope::colorimetry::astm::ReferenceData;
use inkscope::colorimetry::convert::spectral_to_lab;
use inkscope::data::model::{SpectralCurve, Tint};

fn curve(level: f64) -> SpectralCurve {
    (400..=700).step_by(10).map(|wl| (wl, level)).collect()
}

fn ramp() -> Vec<Tint> {
    vec![
        Tint::new(0.0, curve(0.90)),
        Tint::new(40.0, curve(0.60)),
        Tint::new(100.0, curve(0.30)),
    ]
}

#[test]
fn test_missing_target_passes_everything_through() {
    let tints = ramp();
    let outcome = adapt_tints(&tints, None, &AdaptationSettings::default(), &ReferenceData::synthetic());

    assert_eq!(outcome.tints, tints);
    assert_eq!(outcome.skipped.len(), tints.len());
    assert!(outcome
        .skipped
        .iter()
        .all(|s| s.reason == SkipReason::MissingTargetSubstrate));
}

#[test]
fn test_missing_source_substrate_passes_through() {
    let tints: Vec<Tint> = ramp().into_iter().filter(|t| !t.is_substrate()).collect();
    let target = curve(0.80);
    let outcome = adapt_tints(&tints, Some(&target), &AdaptationSettings::default(), &ReferenceData::synthetic());

    assert_eq!(outcome.tints, tints);
    assert!(outcome
        .skipped
        .iter()
        .all(|s| s.reason == SkipReason::MissingSourceSubstrate));
}

#[test]
fn test_ramp_moves_to_darker_paper() {
    let reference = ReferenceData::synthetic();
    let settings = AdaptationSettings {
        target_background: "Kraft".to_string(),
        ..AdaptationSettings::default()
    };
    let target = curve(0.45);
    let outcome = adapt_tints(&ramp(), Some(&target), &settings, &reference);

    assert!(outcome.skipped.is_empty());
    assert_eq!(outcome.tints.len(), 3);
    let table = reference.table(&settings.weighting_key()).unwrap();

    let substrate = &outcome.tints[0];
    assert_eq!(substrate.spectral.as_ref(), Some(&target));
    assert_eq!(substrate.background, "Kraft");

    // Ratio: 0.6 * 0.45 / 0.9 = 0.3 at every wavelength.
    let mid = &outcome.tints[1];
    let spectral = mid.spectral.as_ref().unwrap();
    assert!(spectral.iter().all(|(_, r)| (r - 0.3).abs() < 1e-12));
    let expected = spectral_to_lab(spectral, table);
    assert_eq!(mid.lab, Some(expected));

    let lightness: Vec<f64> = outcome.tints.iter().map(|t| t.lab.unwrap().l).collect();
    assert!(lightness.windows(2).all(|w| w[0] > w[1]), "{lightness:?}");
}

#[test]
fn test_delta_method_clamps_at_zero() {
    let settings = AdaptationSettings {
        method: AdaptationMethod::Delta,
        ..AdaptationSettings::default()
    };
    let target = curve(0.45);
    let outcome = adapt_tints(&ramp(), Some(&target), &settings, &ReferenceData::synthetic());

    // 0.3 + (0.45 - 0.9) < 0
    let solid = outcome.tints[2].spectral.as_ref().unwrap();
    assert!(solid.iter().all(|(_, r)| r == 0.0));
    // 0.6 + (0.45 - 0.9) = 0.15
    let mid = outcome.tints[1].spectral.as_ref().unwrap();
    assert!(mid.iter().all(|(_, r)| (r - 0.15).abs() < 1e-12));
}
