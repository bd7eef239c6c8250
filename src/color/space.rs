//! Color conversions and perceptual comparisons.
//!
//! Everything here is a pure function over RGB triples with channels in
//! `[0, 255]`. Channels are kept as `f64` because image profiles are
//! weighted averages and rarely land on whole numbers.

use serde::{Deserialize, Serialize};

// D65 reference white.
const XN: f64 = 95.047;
const YN: f64 = 100.0;
const ZN: f64 = 108.883;

const LAB_EPSILON: f64 = 0.008856;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "[f64; 3]", into = "[f64; 3]")]
pub struct Rgb {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Rgb {
    pub const fn new(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }

    pub fn from_u8(r: u8, g: u8, b: u8) -> Self {
        Self::new(r as f64, g as f64, b as f64)
    }

    /// Nearest 8-bit triple, clamped into range.
    pub fn to_u8(self) -> (u8, u8, u8) {
        let q = |v: f64| v.round().clamp(0.0, 255.0) as u8;
        (q(self.r), q(self.g), q(self.b))
    }

    pub fn to_hex(self) -> String {
        let (r, g, b) = self.to_u8();
        format!("#{r:02x}{g:02x}{b:02x}")
    }

    /// Parses `#rrggbb`, `rrggbb` or the shorthand `#rgb`.
    pub fn from_hex(s: &str) -> Option<Self> {
        let s = s.trim().trim_start_matches('#');
        let expanded: String = match s.len() {
            3 => s.chars().flat_map(|c| [c, c]).collect(),
            6 => s.to_string(),
            _ => return None,
        };
        if !expanded.is_ascii() {
            return None;
        }
        let r = u8::from_str_radix(&expanded[0..2], 16).ok()?;
        let g = u8::from_str_radix(&expanded[2..4], 16).ok()?;
        let b = u8::from_str_radix(&expanded[4..6], 16).ok()?;
        Some(Self::from_u8(r, g, b))
    }
}

impl From<(u8, u8, u8)> for Rgb {
    fn from(t: (u8, u8, u8)) -> Self {
        Self::from_u8(t.0, t.1, t.2)
    }
}

impl From<[f64; 3]> for Rgb {
    fn from(v: [f64; 3]) -> Self {
        Self::new(v[0], v[1], v[2])
    }
}

impl From<Rgb> for [f64; 3] {
    fn from(c: Rgb) -> Self {
        [c.r, c.g, c.b]
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lab {
    pub l: f64,
    pub a: f64,
    pub b: f64,
}

/// Hue in degrees `[0, 360)`, saturation and lightness as percentages.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hsl {
    pub h: f64,
    pub s: f64,
    pub l: f64,
}

/// Per-component multipliers applied to squared Lab differences.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabWeights {
    pub l: f64,
    pub a: f64,
    pub b: f64,
}

impl Default for LabWeights {
    fn default() -> Self {
        Self { l: 1.2, a: 1.0, b: 1.0 }
    }
}

fn srgb_to_linear(c: f64) -> f64 {
    if c > 0.04045 {
        ((c + 0.055) / 1.055).powf(2.4)
    } else {
        c / 12.92
    }
}

fn lab_f(t: f64) -> f64 {
    if t > LAB_EPSILON {
        t.cbrt()
    } else {
        7.787 * t + 16.0 / 116.0
    }
}

pub fn rgb_to_lab(rgb: Rgb) -> Lab {
    let r = srgb_to_linear(rgb.r / 255.0) * 100.0;
    let g = srgb_to_linear(rgb.g / 255.0) * 100.0;
    let b = srgb_to_linear(rgb.b / 255.0) * 100.0;

    let x = r * 0.4124 + g * 0.3576 + b * 0.1805;
    let y = r * 0.2126 + g * 0.7152 + b * 0.0722;
    let z = r * 0.0193 + g * 0.1192 + b * 0.9505;

    let fx = lab_f(x / XN);
    let fy = lab_f(y / YN);
    let fz = lab_f(z / ZN);

    Lab {
        l: 116.0 * fy - 16.0,
        a: 500.0 * (fx - fy),
        b: 200.0 * (fy - fz),
    }
}

pub fn rgb_to_hsl(rgb: Rgb) -> Hsl {
    let r = rgb.r / 255.0;
    let g = rgb.g / 255.0;
    let b = rgb.b / 255.0;

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let l = (max + min) / 2.0;

    if max == min {
        return Hsl { h: 0.0, s: 0.0, l: l * 100.0 };
    }

    let d = max - min;
    let s = if l > 0.5 { d / (2.0 - max - min) } else { d / (max + min) };
    let h = if max == r {
        (g - b) / d + if g < b { 6.0 } else { 0.0 }
    } else if max == g {
        (b - r) / d + 2.0
    } else {
        (r - g) / d + 4.0
    };

    // Hues a hair under 360 can round up to exactly 360.
    let h = (h * 60.0) % 360.0;
    Hsl { h, s: s * 100.0, l: l * 100.0 }
}

pub fn hsl_to_rgb(hsl: Hsl) -> Rgb {
    let s = hsl.s / 100.0;
    let l = hsl.l / 100.0;
    if s == 0.0 {
        let v = l * 255.0;
        return Rgb::new(v, v, v);
    }

    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;
    let h = hsl.h / 360.0;

    let channel = |t: f64| {
        let t = t.rem_euclid(1.0);
        let v = if t < 1.0 / 6.0 {
            p + (q - p) * 6.0 * t
        } else if t < 0.5 {
            q
        } else if t < 2.0 / 3.0 {
            p + (q - p) * (2.0 / 3.0 - t) * 6.0
        } else {
            p
        };
        v * 255.0
    };

    Rgb::new(channel(h + 1.0 / 3.0), channel(h), channel(h - 1.0 / 3.0))
}

/// Weighted Euclidean distance in Lab space using the default weights.
pub fn color_distance(c1: Rgb, c2: Rgb) -> f64 {
    weighted_distance(c1, c2, &LabWeights::default())
}

pub fn weighted_distance(c1: Rgb, c2: Rgb, w: &LabWeights) -> f64 {
    let a = rgb_to_lab(c1);
    let b = rgb_to_lab(c2);
    let dl = a.l - b.l;
    let da = a.a - b.a;
    let db = a.b - b.b;
    (dl * dl * w.l + da * da * w.a + db * db * w.b).sqrt()
}

/// 1.0 for identical hues, 0.0 for opposite hues. Saturation and lightness
/// are ignored, so achromatic colors compare as hue 0 (red).
pub fn hue_similarity(c1: Rgb, c2: Rgb) -> f64 {
    let h1 = rgb_to_hsl(c1).h;
    let h2 = rgb_to_hsl(c2).h;
    let mut diff = (h1 - h2).abs();
    if diff > 180.0 {
        diff = 360.0 - diff;
    }
    (1.0 - diff / 180.0).clamp(0.0, 1.0)
}
