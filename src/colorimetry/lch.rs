use crate::data::model::{LabColor, Lch};

impl LabColor {
    /// Chroma and hue angle.  Hue is in degrees, normalised to [0, 360);
    /// a neutral colour (a = b = 0) has hue 0.
    pub fn to_lch(&self) -> Lch {
        Lch {
            l: self.l,
            c: self.chroma(),
            h: self.hue(),
        }
    }

    pub fn chroma(&self) -> f64 {
        self.a.hypot(self.b)
    }

    pub fn hue(&self) -> f64 {
        if self.a == 0.0 && self.b == 0.0 {
            return 0.0;
        }
        let h = self.b.atan2(self.a).to_degrees();
        let h = if h < 0.0 { h + 360.0 } else { h };
        // A tiny negative angle rounds up to exactly 360.
        if h >= 360.0 {
            0.0
        } else {
            h
        }
    }
}

impl Lch {
    pub fn to_lab(&self) -> LabColor {
        let h = self.h.to_radians();
        LabColor {
            l: self.l,
            a: self.c * h.cos(),
            b: self.c * h.sin(),
        }
    }
}
