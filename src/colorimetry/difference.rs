//! Colour difference metrics for comparing measurements against targets.
//!
//! ΔE00 follows CIE Technical Report 142-2001 with kL = kC = kH = 1 (graphic
//! arts conditions).

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::data::model::LabColor;

/// 25^7, the chroma normalisation constant of CIEDE2000.
const POW25_7: f64 = 6_103_515_625.0;

/// CIE 1976 colour difference: Euclidean distance in Lab.
pub fn delta_e_76(lab1: LabColor, lab2: LabColor) -> f64 {
    let dl = lab1.l - lab2.l;
    let da = lab1.a - lab2.a;
    let db = lab1.b - lab2.b;
    (dl * dl + da * da + db * db).sqrt()
}

/// CIEDE2000 colour difference.
pub fn delta_e_2000(lab1: LabColor, lab2: LabColor) -> f64 {
    let c1_ab = lab1.a.hypot(lab1.b);
    let c2_ab = lab2.a.hypot(lab2.b);
    let c_ab_mean_pow7 = ((c1_ab + c2_ab) / 2.0).powi(7);
    let g = 0.5 * (1.0 - (c_ab_mean_pow7 / (c_ab_mean_pow7 + POW25_7)).sqrt());

    let a1p = lab1.a * (1.0 + g);
    let a2p = lab2.a * (1.0 + g);
    let c1p = a1p.hypot(lab1.b);
    let c2p = a2p.hypot(lab2.b);
    let h1p = LabColor::new(lab1.l, a1p, lab1.b).hue();
    let h2p = LabColor::new(lab2.l, a2p, lab2.b).hue();

    let delta_lp = lab2.l - lab1.l;
    let delta_cp = c2p - c1p;

    let chroma_product = c1p * c2p;
    let delta_hp = if chroma_product == 0.0 {
        0.0
    } else {
        let d = h2p - h1p;
        if d.abs() <= 180.0 {
            d
        } else if d > 180.0 {
            d - 360.0
        } else {
            d + 360.0
        }
    };
    let delta_big_hp = 2.0 * chroma_product.sqrt() * (delta_hp.to_radians() / 2.0).sin();

    let lp_mean = (lab1.l + lab2.l) / 2.0;
    let cp_mean = (c1p + c2p) / 2.0;
    let hp_mean = if chroma_product == 0.0 {
        h1p + h2p
    } else if (h1p - h2p).abs() <= 180.0 {
        (h1p + h2p) / 2.0
    } else if h1p + h2p < 360.0 {
        (h1p + h2p + 360.0) / 2.0
    } else {
        (h1p + h2p - 360.0) / 2.0
    };

    let hr = hp_mean.to_radians();
    let t = 1.0 - 0.17 * (hr - PI / 6.0).cos()
        + 0.24 * (2.0 * hr).cos()
        + 0.32 * (3.0 * hr + PI / 30.0).cos()
        - 0.20 * (4.0 * hr - 63.0_f64.to_radians()).cos();

    let lp50 = (lp_mean - 50.0).powi(2);
    let sl = 1.0 + 0.015 * lp50 / (20.0 + lp50).sqrt();
    let sc = 1.0 + 0.045 * cp_mean;
    let sh = 1.0 + 0.015 * cp_mean * t;

    let delta_theta = 30.0 * (-((hp_mean - 275.0) / 25.0).powi(2)).exp();
    let cp_mean_pow7 = cp_mean.powi(7);
    let rc = 2.0 * (cp_mean_pow7 / (cp_mean_pow7 + POW25_7)).sqrt();
    let rt = -(2.0 * delta_theta).to_radians().sin() * rc;

    let tl = delta_lp / sl;
    let tc = delta_cp / sc;
    let th = delta_big_hp / sh;

    (tl * tl + tc * tc + th * th + rt * tc * th).sqrt()
}

/// Verdict of a ΔE00 check against a tolerance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchVerdict {
    Pass,
    Warn,
    Fail,
}

/// ΔE00 tolerance: pass up to `threshold`, warn up to twice that.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tolerance {
    pub threshold: f64,
}

impl Default for Tolerance {
    fn default() -> Self {
        Tolerance { threshold: 2.0 }
    }
}

impl Tolerance {
    pub fn new(threshold: f64) -> Self {
        Tolerance { threshold }
    }

    pub fn judge(&self, measured: LabColor, target: LabColor) -> MatchVerdict {
        let de = delta_e_2000(measured, target);
        if de <= self.threshold {
            MatchVerdict::Pass
        } else if de <= 2.0 * self.threshold {
            MatchVerdict::Warn
        } else {
            MatchVerdict::Fail
        }
    }
}
