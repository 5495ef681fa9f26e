//! Document-level brightness filter layered under per-element recoloring.
//!
//! The root is dimmed by `brightness / 100` and media elements get the inverse
//! factor so pictures keep their apparent brightness.

use anyhow::{Context, Result};

use crate::classify::EXEMPT_TAGS;
use crate::dom::{Document, NodeId};

/// `id` of the injected `<style>` element.
pub const STYLE_ID: &str = "eye-protect-dark-mode-style";

/// Lowest accepted brightness percentage.
pub const MIN_BRIGHTNESS: i64 = 1;

/// Highest accepted brightness percentage.
pub const MAX_BRIGHTNESS: i64 = 200;

/// Filter factors derived from a brightness percentage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BrightnessFilter {
    /// Factor applied to the document root.
    pub root: f64,
    /// Compensating factor applied to media elements.
    pub media: f64,
}

impl BrightnessFilter {
    /// Build the factors for `brightness` percent, clamped to
    /// [`MIN_BRIGHTNESS`]..=[`MAX_BRIGHTNESS`] so the inverse never divides by zero.
    ///
    /// # Examples
    ///
    /// ```
    /// # use eyeshade::filter::BrightnessFilter;
    /// let f = BrightnessFilter::new(50);
    /// assert!((f.root - 0.5).abs() < f64::EPSILON);
    /// assert!((f.media - 2.0).abs() < f64::EPSILON);
    /// ```
    #[must_use]
    pub fn new(brightness: i64) -> Self {
        let clamped = clamp_brightness(brightness);
        #[allow(clippy::cast_precision_loss)]
        let b = clamped as f64;
        Self {
            root: b / 100.0,
            media: 100.0 / b,
        }
    }

    /// Stylesheet text for the filter.
    #[must_use]
    pub fn css(&self) -> String {
        format!(
            "html {{ filter: brightness({}) !important; }}\n{} {{ filter: brightness({}) !important; }}",
            self.root,
            EXEMPT_TAGS.join(", "),
            self.media
        )
    }
}

/// Clamp a brightness percentage into the accepted range.
#[must_use]
pub fn clamp_brightness(brightness: i64) -> i64 {
    if !(MIN_BRIGHTNESS..=MAX_BRIGHTNESS).contains(&brightness) {
        tracing::warn!(brightness, "brightness out of range, clamping");
    }
    brightness.clamp(MIN_BRIGHTNESS, MAX_BRIGHTNESS)
}

/// Append the filter `<style>` to the document head.
///
/// # Errors
///
/// Returns an error if the style element cannot be attached.
pub fn inject(doc: &mut Document, filter: &BrightnessFilter) -> Result<NodeId> {
    let style = doc.create_element("style");
    doc.set_attribute(style, "id", STYLE_ID);
    doc.set_text(style, &filter.css());
    doc.append_child(doc.head(), style)
        .context("Failed to attach brightness filter style")?;
    Ok(style)
}

/// Remove every injected filter `<style>`. Returns how many were removed.
pub fn remove(doc: &mut Document) -> usize {
    let mut removed = 0;
    while let Some(style) = doc.get_element_by_id(STYLE_ID) {
        if doc.remove(style).is_err() {
            break;
        }
        removed += 1;
    }
    removed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factors_for_half_brightness() {
        let f = BrightnessFilter::new(50);
        assert!((f.root - 0.5).abs() < f64::EPSILON);
        assert!((f.media - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_zero_and_negative_brightness_are_clamped() {
        for b in [0, -40] {
            let f = BrightnessFilter::new(b);
            assert!((f.root - 0.01).abs() < 1e-12);
            assert!((f.media - 100.0).abs() < 1e-9);
            assert!(f.media.is_finite());
        }
        let f = BrightnessFilter::new(1000);
        assert!((f.root - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_css_text() {
        let css = BrightnessFilter::new(50).css();
        assert_eq!(
            css,
            "html { filter: brightness(0.5) !important; }\n\
             img, video, canvas, svg, picture, source, iframe { filter: brightness(2) !important; }"
        );
    }

    #[test]
    fn test_inject_and_remove() -> Result<()> {
        let mut doc = Document::new();
        let before = doc.to_string();

        let style = inject(&mut doc, &BrightnessFilter::new(80))?;
        assert_eq!(doc.get_element_by_id(STYLE_ID), Some(style));
        assert_eq!(doc.parent(style), Some(doc.head()));
        assert!(doc.text(style).is_some_and(|t| t.contains("brightness(0.8)")));

        assert_eq!(remove(&mut doc), 1);
        assert_eq!(remove(&mut doc), 0);
        assert_eq!(doc.to_string(), before);
        Ok(())
    }
}
