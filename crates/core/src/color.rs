//! Straight-alpha RGBA color and the HSL conversion used for hue-driven
//! tinting.
//!
//! Channels are 8-bit like a 2D canvas `fillStyle`, alpha is a float in
//! [0, 1]. [`Rgba::to_css`] produces the exact string the browser surface
//! hands to the canvas; [`Rgba::blend_over`] is the source-over rule the CPU
//! surface uses.

use serde::{Deserialize, Serialize};

/// 8-bit RGB with floating-point straight alpha.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f64,
}

impl Rgba {
    /// Creates a color; alpha is clamped to [0, 1].
    pub fn new(r: u8, g: u8, b: u8, a: f64) -> Self {
        Self {
            r,
            g,
            b,
            a: a.clamp(0.0, 1.0),
        }
    }

    /// Fully opaque color.
    pub fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 1.0)
    }

    /// Same RGB with a different alpha.
    pub fn with_alpha(self, a: f64) -> Self {
        Self::new(self.r, self.g, self.b, a)
    }

    /// Builds a color from hue in degrees (any real, wrapped to [0, 360)),
    /// saturation and lightness in [0, 1], and alpha.
    pub fn from_hsla(hue: f64, saturation: f64, lightness: f64, alpha: f64) -> Self {
        let h = hue.rem_euclid(360.0) / 360.0;
        let s = saturation.clamp(0.0, 1.0);
        let l = lightness.clamp(0.0, 1.0);

        if s == 0.0 {
            let v = to_channel(l);
            return Self::new(v, v, v, alpha);
        }

        let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
        let p = 2.0 * l - q;
        Self::new(
            to_channel(hue_to_rgb(p, q, h + 1.0 / 3.0)),
            to_channel(hue_to_rgb(p, q, h)),
            to_channel(hue_to_rgb(p, q, h - 1.0 / 3.0)),
            alpha,
        )
    }

    /// CSS `rgba(r, g, b, a)` string for a canvas fill or stroke style.
    pub fn to_css(self) -> String {
        format!("rgba({}, {}, {}, {:.3})", self.r, self.g, self.b, self.a)
    }

    /// Source-over composite of `self` onto an opaque destination pixel.
    pub fn blend_over(self, dst: [u8; 3]) -> [u8; 3] {
        let a = self.a;
        let mix = |src: u8, dst: u8| -> u8 {
            (src as f64 * a + dst as f64 * (1.0 - a)).round().clamp(0.0, 255.0) as u8
        };
        [mix(self.r, dst[0]), mix(self.g, dst[1]), mix(self.b, dst[2])]
    }
}

fn to_channel(v: f64) -> u8 {
    (v * 255.0).round().clamp(0.0, 255.0) as u8
}

fn hue_to_rgb(p: f64, q: f64, t: f64) -> f64 {
    let t = t.rem_euclid(1.0);
    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 0.5 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * (2.0 / 3.0 - t) * 6.0
    } else {
        p
    }
}
