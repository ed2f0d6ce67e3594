use crate::series::{clamp01, lerp};

pub const STROKE_ALPHA: f32 = 0.85;

const HUE_MIN: f64 = 0.08;
const HUE_MAX: f64 = 0.85;
const SAT_MIN: f64 = 0.55;
const SAT_MAX: f64 = 0.95;
const WIDTH_MIN: f64 = 2.0;
const WIDTH_MAX: f64 = 6.0;

/// 8-bit RGB with a straight (non-premultiplied) alpha.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl Rgba {
    /// `rgba(r,g,b,a)` in CSS notation.
    pub fn to_css(&self) -> String {
        format!("rgba({},{},{},{})", self.r, self.g, self.b, self.a)
    }
}

/// Sector-based HSV to RGB. `h`, `s` and `v` are all in [0, 1].
pub fn hsv_to_rgb(h: f64, s: f64, v: f64) -> (f64, f64, f64) {
    let c = v * s;
    let hp = clamp01(h) * 6.0;
    let x = c * (1.0 - ((hp % 2.0) - 1.0).abs());
    let (r, g, b) = if hp < 1.0 {
        (c, x, 0.0)
    } else if hp < 2.0 {
        (x, c, 0.0)
    } else if hp < 3.0 {
        (0.0, c, x)
    } else if hp < 4.0 {
        (0.0, x, c)
    } else if hp < 5.0 {
        (x, 0.0, c)
    } else {
        (c, 0.0, x)
    };
    let m = v - c;
    (r + m, g + m, b + m)
}

fn to_u8(channel: f64) -> u8 {
    (clamp01(channel) * 255.0).round() as u8
}

/// Color and width of one path segment.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StrokeStyle {
    pub color: Rgba,
    pub width: f64,
}

/// Style for a segment with local brightness `bright` in a clip of overall loudness `loudness`.
pub fn stroke_style(bright: f64, loudness: f64) -> StrokeStyle {
    let bright = clamp01(bright);
    let loud = clamp01(0.6 * bright + 0.4 * clamp01(loudness));
    let hue = lerp(HUE_MIN, HUE_MAX, bright);
    let sat = lerp(SAT_MIN, SAT_MAX, loud);
    let (r, g, b) = hsv_to_rgb(hue, sat, 1.0);
    StrokeStyle {
        color: Rgba {
            r: to_u8(r),
            g: to_u8(g),
            b: to_u8(b),
            a: STROKE_ALPHA,
        },
        width: lerp(WIDTH_MIN, WIDTH_MAX, loud),
    }
}
