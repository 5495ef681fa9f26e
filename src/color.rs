//! Color parsing and lightness inversion utilities.
//!
//! This module provides functions for:
//! - Parsing the `rgb()`/`rgba()` strings produced by computed-style queries
//! - Converting between RGB and HSL representations
//! - Inverting perceived lightness while keeping hue and saturation

use std::sync::LazyLock;

use regex::Regex;

/// Matches `rgb(r, g, b)` and `rgba(r, g, b, a)` as serialized by a style engine.
static COLOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"rgba?\((\d+),\s*(\d+),\s*(\d+)(?:,\s*([\d.]+))?\)")
        .expect("color regex is valid")
});

/// RGB color representation with red, green, and blue components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    /// Red component (0-255)
    pub r: u8,
    /// Green component (0-255)
    pub g: u8,
    /// Blue component (0-255)
    pub b: u8,
}

impl Rgb {
    /// Create a new RGB color from individual components.
    #[must_use]
    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// A parsed color with an alpha channel in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    /// Opaque color components.
    pub rgb: Rgb,
    /// Opacity, clamped to `[0, 1]`.
    pub alpha: f64,
}

impl Rgba {
    /// Create a color, clamping `alpha` into `[0, 1]`.
    #[must_use]
    pub fn new(rgb: Rgb, alpha: f64) -> Self {
        Self {
            rgb,
            alpha: alpha.clamp(0.0, 1.0),
        }
    }

    /// Same alpha, lightness inverted.
    #[must_use]
    pub fn invert_lightness(self) -> Self {
        Self {
            rgb: invert_lightness(self.rgb),
            alpha: self.alpha,
        }
    }

    /// Serialize as `rgba(r,g,b,a)`, the form written into inline styles.
    ///
    /// # Examples
    ///
    /// ```
    /// # use eyeshade::color::{Rgb, Rgba};
    /// assert_eq!(Rgba::new(Rgb::new(0, 0, 0), 1.0).to_css(), "rgba(0,0,0,1)");
    /// assert_eq!(Rgba::new(Rgb::new(10, 20, 30), 0.5).to_css(), "rgba(10,20,30,0.5)");
    /// ```
    #[must_use]
    pub fn to_css(&self) -> String {
        format!(
            "rgba({},{},{},{})",
            self.rgb.r, self.rgb.g, self.rgb.b, self.alpha
        )
    }
}

/// HSL triple, every component normalized to `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hsl {
    /// Hue as a fraction of a full turn, in `[0, 1)`.
    pub h: f64,
    /// Saturation (0-1)
    pub s: f64,
    /// Lightness (0-1)
    pub l: f64,
}

/// Parse a computed-style color string.
///
/// Only the `rgb(R, G, B)` and `rgba(R, G, B, A)` forms are recognized. Anything
/// else (`transparent`, named colors, garbage, channels above 255) yields
/// `None`, which callers treat as "leave this channel alone".
///
/// # Examples
///
/// ```
/// # use eyeshade::color::{Rgb, parse_color};
/// let c = parse_color("rgba(255, 128, 0, 0.5)").unwrap();
/// assert_eq!(c.rgb, Rgb::new(255, 128, 0));
/// assert!((c.alpha - 0.5).abs() < f64::EPSILON);
/// assert!(parse_color("transparent").is_none());
/// ```
#[must_use]
pub fn parse_color(s: &str) -> Option<Rgba> {
    let caps = COLOR_RE.captures(s)?;
    let r = caps[1].parse::<u8>().ok()?;
    let g = caps[2].parse::<u8>().ok()?;
    let b = caps[3].parse::<u8>().ok()?;
    let alpha = match caps.get(4) {
        Some(a) => a.as_str().parse::<f64>().ok()?,
        None => 1.0,
    };
    Some(Rgba::new(Rgb::new(r, g, b), alpha))
}

/// Convert an 8-bit RGB color to HSL.
///
/// Achromatic inputs (`r == g == b`) return hue and saturation of zero without
/// dividing by the zero chroma.
#[must_use]
pub fn rgb_to_hsl(rgb: Rgb) -> Hsl {
    let r = f64::from(rgb.r) / 255.0;
    let g = f64::from(rgb.g) / 255.0;
    let b = f64::from(rgb.b) / 255.0;

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let l = (max + min) / 2.0;

    if rgb.r == rgb.g && rgb.g == rgb.b {
        return Hsl { h: 0.0, s: 0.0, l };
    }

    let d = max - min;
    let s = if l > 0.5 {
        d / (2.0 - max - min)
    } else {
        d / (max + min)
    };

    #[allow(clippy::float_cmp)]
    let h = if max == r {
        ((g - b) / d + if g < b { 6.0 } else { 0.0 }) / 6.0
    } else if max == g {
        ((b - r) / d + 2.0) / 6.0
    } else {
        ((r - g) / d + 4.0) / 6.0
    };

    Hsl { h, s, l }
}

/// Convert HSL back to 8-bit RGB, rounding each channel to the nearest integer.
///
/// Zero saturation takes a shortcut so gray stays exactly gray.
#[must_use]
#[allow(clippy::float_cmp)]
pub fn hsl_to_rgb(hsl: Hsl) -> Rgb {
    let Hsl { h, s, l } = hsl;

    if s == 0.0 {
        let v = to_channel(l);
        return Rgb::new(v, v, v);
    }

    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;

    Rgb::new(
        to_channel(hue_to_rgb(p, q, h + 1.0 / 3.0)),
        to_channel(hue_to_rgb(p, q, h)),
        to_channel(hue_to_rgb(p, q, h - 1.0 / 3.0)),
    )
}

/// Flip lightness (`l -> 1 - l`) keeping hue and saturation.
///
/// # Examples
///
/// ```
/// # use eyeshade::color::{Rgb, invert_lightness};
/// assert_eq!(invert_lightness(Rgb::new(255, 255, 255)), Rgb::new(0, 0, 0));
/// assert_eq!(invert_lightness(Rgb::new(255, 0, 0)), Rgb::new(255, 0, 0));
/// ```
#[must_use]
pub fn invert_lightness(rgb: Rgb) -> Rgb {
    let hsl = rgb_to_hsl(rgb);
    hsl_to_rgb(Hsl {
        l: 1.0 - hsl.l,
        ..hsl
    })
}

fn hue_to_rgb(p: f64, q: f64, t: f64) -> f64 {
    let t = if t < 0.0 {
        t + 1.0
    } else if t > 1.0 {
        t - 1.0
    } else {
        t
    };

    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 1.0 / 2.0 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * (2.0 / 3.0 - t) * 6.0
    } else {
        p
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn to_channel(v: f64) -> u8 {
    (v * 255.0).round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: u8, b: u8) -> bool {
        a.abs_diff(b) <= 1
    }

    #[test]
    fn test_parse_color_rgb_and_rgba() {
        let c = parse_color("rgb(255, 255, 255)").unwrap();
        assert_eq!(c.rgb, Rgb::new(255, 255, 255));
        assert!((c.alpha - 1.0).abs() < f64::EPSILON);

        let c = parse_color("rgba(12,34,56,0.05)").unwrap();
        assert_eq!(c.rgb, Rgb::new(12, 34, 56));
        assert!((c.alpha - 0.05).abs() < f64::EPSILON);

        let c = parse_color("rgba(0, 0, 0, 0)").unwrap();
        assert!(c.alpha.abs() < f64::EPSILON);
    }

    #[test]
    fn test_parse_color_rejects_other_forms() {
        assert!(parse_color("transparent").is_none());
        assert!(parse_color("white").is_none());
        assert!(parse_color("#ffffff").is_none());
        assert!(parse_color("").is_none());
        assert!(parse_color("rgb(0,0)").is_none());
        assert!(parse_color("rgb(0,0,256)").is_none());
        assert!(parse_color("rgba(0,0,0,1.2.3)").is_none());
    }

    #[test]
    fn test_parse_color_clamps_alpha() {
        let c = parse_color("rgba(1,2,3,7)").unwrap();
        assert!((c.alpha - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_rgb_to_hsl_achromatic() {
        let hsl = rgb_to_hsl(Rgb::new(128, 128, 128));
        assert!(hsl.h.abs() < f64::EPSILON);
        assert!(hsl.s.abs() < f64::EPSILON);
        assert!((hsl.l - 128.0 / 255.0).abs() < 1e-9);

        let black = rgb_to_hsl(Rgb::new(0, 0, 0));
        assert!(black.s.abs() < f64::EPSILON);
        assert!(black.l.abs() < f64::EPSILON);
    }

    #[test]
    fn test_rgb_to_hsl_primaries() {
        let red = rgb_to_hsl(Rgb::new(255, 0, 0));
        assert!(red.h.abs() < 1e-9);
        assert!((red.s - 1.0).abs() < 1e-9);
        assert!((red.l - 0.5).abs() < 1e-9);

        let green = rgb_to_hsl(Rgb::new(0, 255, 0));
        assert!((green.h - 1.0 / 3.0).abs() < 1e-9);

        let blue = rgb_to_hsl(Rgb::new(0, 0, 255));
        assert!((blue.h - 2.0 / 3.0).abs() < 1e-9);

        // Hue wraps into [0, 1) when blue dominates green under a red max.
        let magenta_ish = rgb_to_hsl(Rgb::new(255, 0, 128));
        assert!(magenta_ish.h > 0.8 && magenta_ish.h < 1.0);
    }

    #[test]
    fn test_hsl_to_rgb_gray_has_no_drift() {
        for v in 0..=255u8 {
            let l = f64::from(v) / 255.0;
            assert_eq!(hsl_to_rgb(Hsl { h: 0.3, s: 0.0, l }), Rgb::new(v, v, v));
        }
    }

    #[test]
    fn test_hsl_round_trip() {
        for rgb in [
            Rgb::new(171, 193, 35),
            Rgb::new(0, 17, 34),
            Rgb::new(255, 128, 0),
            Rgb::new(74, 108, 247),
        ] {
            let back = hsl_to_rgb(rgb_to_hsl(rgb));
            assert!(close(back.r, rgb.r) && close(back.g, rgb.g) && close(back.b, rgb.b));
        }
    }

    #[test]
    fn test_invert_lightness_known_values() {
        assert_eq!(invert_lightness(Rgb::new(255, 255, 255)), Rgb::new(0, 0, 0));
        assert_eq!(invert_lightness(Rgb::new(0, 0, 0)), Rgb::new(255, 255, 255));
        assert_eq!(invert_lightness(Rgb::new(255, 0, 0)), Rgb::new(255, 0, 0));
        // Dark navy becomes a pale blue of the same hue.
        let pale = invert_lightness(Rgb::new(0, 0, 128));
        assert_eq!(pale.b, 255);
        assert!(close(pale.r, 127) && close(pale.g, 127));
    }

    #[test]
    fn test_invert_lightness_twice_is_identity() {
        for r in (0..=255u8).step_by(5) {
            for g in (0..=255u8).step_by(5) {
                for b in (0..=255u8).step_by(5) {
                    let rgb = Rgb::new(r, g, b);
                    let back = invert_lightness(invert_lightness(rgb));
                    assert!(
                        close(back.r, r) && close(back.g, g) && close(back.b, b),
                        "{rgb:?} came back as {back:?}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_rgba_css() {
        let c = Rgba::new(Rgb::new(255, 255, 255), 1.0).invert_lightness();
        assert_eq!(c.to_css(), "rgba(0,0,0,1)");
        let c = Rgba::new(Rgb::new(0, 0, 0), 0.5).invert_lightness();
        assert_eq!(c.to_css(), "rgba(255,255,255,0.5)");
    }
}
