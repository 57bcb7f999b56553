mod common;

use inkscope::colorimetry::astm::{Illuminant, ReferenceData, WeightingTable};
use inkscope::colorimetry::convert::spectral_to_lab;
use inkscope::data::model::LabColor;

use common::{flat_curve, key, scenario_curve, table, Lcg};

fn max_channel_difference(a: LabColor, b: LabColor) -> f64 {
    (a.l - b.l).abs().max((a.a - b.a).abs()).max((a.b - b.b).abs())
}

#[test]
fn test_perfect_diffuser_is_white_under_every_illuminant() {
    for illuminant in Illuminant::ALL {
        let table = table(illuminant);
        let lab = spectral_to_lab(&flat_curve(&table, 1.0), &table);
        assert!((lab.l - 100.0).abs() < 0.1, "{illuminant}: {lab:?}");
        assert!(lab.a.abs() < 0.1, "{illuminant}: {lab:?}");
        assert!(lab.b.abs() < 0.1, "{illuminant}: {lab:?}");
    }
}

#[test]
fn test_grey_is_neutral() {
    let table = table(Illuminant::D50);
    let lab = spectral_to_lab(&flat_curve(&table, 0.18), &table);
    assert!((lab.l - 49.5).abs() < 0.1, "{lab:?}");
    assert!(lab.a.abs() < 1e-6 && lab.b.abs() < 1e-6, "{lab:?}");
}

#[test]
fn test_illuminant_changes_result() {
    let curve = scenario_curve();
    let d50 = spectral_to_lab(&curve, &table(Illuminant::D50));
    let d65 = spectral_to_lab(&curve, &table(Illuminant::D65));
    assert!(max_channel_difference(d50, d65) > 0.01, "{d50:?} vs {d65:?}");

    let a = spectral_to_lab(&curve, &table(Illuminant::A));
    assert!(max_channel_difference(d50, a) > 0.01);
}

#[test]
fn test_scenario_through_reference_data() {
    let reference = ReferenceData::synthetic();
    let curve = scenario_curve();
    let d50 = reference.lab_for(&curve, &key(Illuminant::D50));
    let d65 = reference.lab_for(&curve, &key(Illuminant::D65));

    assert!(d50.is_finite() && d65.is_finite());
    assert!(d50.l > 0.0 && d50.l < 100.0, "{d50:?}");
    assert!(max_channel_difference(d50, d65) > 0.01, "{d50:?} vs {d65:?}");
}

#[test]
fn test_degenerate_table_is_exact_zero() {
    let lab = spectral_to_lab(&scenario_curve(), &WeightingTable::empty());
    assert_eq!(lab, LabColor::new(0.0, 0.0, 0.0));

    let reference = ReferenceData::default();
    assert_eq!(reference.lab_for(&scenario_curve(), &key(Illuminant::D50)), LabColor::ZERO);
}

#[test]
fn test_chroma_hue_roundtrip_random() {
    let mut rng = Lcg::new(7);
    for _ in 0..1000 {
        let lab = LabColor::new(rng.range(0.0, 100.0), rng.range(-128.0, 127.0), rng.range(-128.0, 127.0));
        let lch = lab.to_lch();
        assert!(lch.c >= 0.0);
        assert!((0.0..360.0).contains(&lch.h), "{lch:?}");

        let back = lch.to_lab();
        assert!((back.a - lab.a).abs() < 1e-9, "{lab:?} → {back:?}");
        assert!((back.b - lab.b).abs() < 1e-9, "{lab:?} → {back:?}");
    }
}

#[test]
fn test_darker_curve_has_lower_lightness() {
    let table = table(Illuminant::D65);
    let light = spectral_to_lab(&flat_curve(&table, 0.8), &table);
    let dark = spectral_to_lab(&flat_curve(&table, 0.2), &table);
    assert!(dark.l < light.l);
}
