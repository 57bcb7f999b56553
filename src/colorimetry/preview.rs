use palette::chromatic_adaptation::AdaptInto;
use palette::white_point::{D50, D65};
use palette::{FromColor, IntoColor, Lab, Srgb, Xyz};

use crate::data::model::LabColor;

use super::astm::Illuminant;

// ---------------------------------------------------------------------------
// Swatch preview: Lab → sRGB hex
// ---------------------------------------------------------------------------

impl LabColor {
    /// Approximate display colour for a swatch.
    ///
    /// Lab relative to D65 is encoded directly; every other white point is
    /// treated as D50 and Bradford-adapted to D65 first.  Out-of-gamut
    /// colours are clamped.  Returns `None` for non-finite input.
    pub fn to_srgb_hex(&self, white: Illuminant) -> Option<String> {
        if !self.is_finite() {
            return None;
        }
        let (l, a, b) = (self.l as f32, self.a as f32, self.b as f32);

        let rgb: Srgb<f32> = match white {
            Illuminant::D65 => Srgb::from_color(Lab::<D65, f32>::new(l, a, b)),
            _ => {
                let xyz50: Xyz<D50, f32> = Lab::<D50, f32>::new(l, a, b).into_color();
                let xyz65: Xyz<D65, f32> = xyz50.adapt_into();
                Srgb::from_color(xyz65)
            }
        };

        let rgb: Srgb<u8> = rgb.into_format();
        Some(format!("#{:02X}{:02X}{:02X}", rgb.red, rgb.green, rgb.blue))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channels(hex: &str) -> (u8, u8, u8) {
        let v = u32::from_str_radix(hex.trim_start_matches('#'), 16).unwrap();
        ((v >> 16) as u8, (v >> 8) as u8, v as u8)
    }

    #[test]
    fn test_black_and_white() {
        for ill in [Illuminant::D50, Illuminant::D65] {
            assert_eq!(
                LabColor::new(0.0, 0.0, 0.0).to_srgb_hex(ill).as_deref(),
                Some("#000000")
            );
            let (r, g, b) = channels(&LabColor::new(100.0, 0.0, 0.0).to_srgb_hex(ill).unwrap());
            assert!(r >= 254 && g >= 254 && b >= 254, "{ill}: {r} {g} {b}");
        }
    }

    #[test]
    fn test_red_and_blue_hues() {
        let (r, g, b) = channels(&LabColor::new(50.0, 70.0, 50.0).to_srgb_hex(Illuminant::D50).unwrap());
        assert!(r > g && r > b);
        let (r, g, b) = channels(&LabColor::new(40.0, 20.0, -70.0).to_srgb_hex(Illuminant::D50).unwrap());
        assert!(b > r && b > g);
    }

    #[test]
    fn test_non_finite_has_no_preview() {
        assert_eq!(LabColor::new(f64::NAN, 0.0, 0.0).to_srgb_hex(Illuminant::D50), None);
    }
}
