//! Full-viewport overlays: the warm tint and the break-reminder dialog.
//!
//! Both are appended to the document root rather than the body, which keeps
//! them out of the dark-mode observer's scope.

use anyhow::{Context, Result};

use crate::dom::{Document, NodeId, Priority};

/// `id` of the warm-tint layer.
pub const COLOR_TEMP_ID: &str = "eye-protect-color-temp-overlay";

/// `id` of the break-reminder dialog.
pub const BREAK_REMINDER_ID: &str = "eye-protect-break-reminder";

/// Length of a break, in seconds.
pub const BREAK_SECONDS: u32 = 20;

/// Highest tint opacity, reached at intensity 100.
const MAX_TINT_OPACITY: f64 = 0.4;

const TOP_LAYER: &str = "2147483647";

/// Opacity of the warm tint for `intensity` percent.
#[must_use]
pub fn tint_opacity(intensity: i64) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    let pct = intensity.clamp(0, 100) as f64;
    pct / 100.0 * MAX_TINT_OPACITY
}

/// Show, replace or remove the warm-tint layer.
///
/// The previous layer is always removed first; a new one is added only when
/// both `enabled` and `master_enabled` hold.
///
/// # Errors
///
/// Returns an error if the layer cannot be attached to the document.
pub fn apply_color_temp(
    doc: &mut Document,
    enabled: bool,
    intensity: i64,
    master_enabled: bool,
) -> Result<()> {
    remove_color_temp(doc);
    if !enabled || !master_enabled {
        return Ok(());
    }

    let tint = format!("rgba(255, 170, 50, {})", tint_opacity(intensity));
    let layer = doc.create_element("div");
    doc.set_attribute(layer, "id", COLOR_TEMP_ID);
    set_styles(
        doc,
        layer,
        &[
            ("position", "fixed"),
            ("top", "0"),
            ("left", "0"),
            ("width", "100vw"),
            ("height", "100vh"),
            ("background-color", tint.as_str()),
            ("mix-blend-mode", "multiply"),
            ("pointer-events", "none"),
            ("z-index", TOP_LAYER),
            ("transition", "background-color 0.3s ease"),
        ],
    );
    doc.append_child(doc.root(), layer)
        .context("Failed to attach color temperature overlay")
}

/// Remove the warm-tint layer if present.
pub fn remove_color_temp(doc: &mut Document) {
    if let Some(layer) = doc.get_element_by_id(COLOR_TEMP_ID) {
        if let Err(err) = doc.remove(layer) {
            tracing::warn!(error = %err, "color temperature overlay not removed");
        }
    }
}

/// Break-reminder dialog with a one-second countdown.
#[derive(Debug, Default)]
pub struct BreakReminder {
    countdown: Option<(NodeId, u32)>,
}

impl BreakReminder {
    /// Create a reminder with no dialog open.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seconds left on the open dialog.
    #[must_use]
    pub fn remaining(&self) -> Option<u32> {
        self.countdown.map(|(_, secs)| secs)
    }

    /// Open a fresh dialog, replacing any open one.
    ///
    /// # Errors
    ///
    /// Returns an error if the dialog cannot be attached to the document.
    pub fn show(&mut self, doc: &mut Document) -> Result<()> {
        self.dismiss(doc);

        let overlay = doc.create_element("div");
        doc.set_attribute(overlay, "id", BREAK_REMINDER_ID);
        set_styles(
            doc,
            overlay,
            &[
                ("position", "fixed"),
                ("top", "0"),
                ("left", "0"),
                ("width", "100vw"),
                ("height", "100vh"),
                ("background-color", "rgba(0, 0, 0, 0.85)"),
                ("display", "flex"),
                ("flex-direction", "column"),
                ("align-items", "center"),
                ("justify-content", "center"),
                ("z-index", TOP_LAYER),
                ("color", "#fff"),
            ],
        );

        let title = text_child(doc, overlay, "Time for a break")?;
        set_styles(doc, title, &[("font-size", "28px"), ("font-weight", "600")]);
        let hint = text_child(
            doc,
            overlay,
            "Look at something 6 meters away and let your eyes rest for 20 seconds",
        )?;
        set_styles(doc, hint, &[("font-size", "16px"), ("color", "#aaa")]);
        let countdown = text_child(doc, overlay, &format!("{BREAK_SECONDS}s"))?;
        set_styles(doc, countdown, &[("font-size", "48px"), ("color", "#4a6cf7")]);
        let skip = doc.create_element("button");
        doc.set_text(skip, "Skip");
        doc.set_attribute(skip, "data-action", "dismiss");
        doc.append_child(overlay, skip)?;

        doc.append_child(doc.root(), overlay)
            .context("Failed to attach break reminder")?;
        self.countdown = Some((countdown, BREAK_SECONDS));
        tracing::debug!("break reminder shown");
        Ok(())
    }

    /// Advance the countdown by one second, closing the dialog at zero.
    pub fn tick(&mut self, doc: &mut Document) {
        let Some((label, secs)) = self.countdown else {
            return;
        };
        let left = secs.saturating_sub(1);
        if left == 0 {
            self.dismiss(doc);
            return;
        }
        doc.set_text(label, &format!("{left}s"));
        self.countdown = Some((label, left));
    }

    /// Close the dialog. Safe when nothing is open.
    pub fn dismiss(&mut self, doc: &mut Document) {
        self.countdown = None;
        if let Some(overlay) = doc.get_element_by_id(BREAK_REMINDER_ID) {
            if let Err(err) = doc.remove(overlay) {
                tracing::warn!(error = %err, "break reminder not removed");
            }
        }
    }
}

fn text_child(doc: &mut Document, parent: NodeId, text: &str) -> Result<NodeId> {
    let el = doc.create_element("div");
    doc.set_text(el, text);
    doc.append_child(parent, el)?;
    Ok(el)
}

fn set_styles(doc: &mut Document, id: NodeId, styles: &[(&str, &str)]) {
    for (property, value) in styles {
        doc.set_style_property(id, property, value, Priority::Normal);
    }
}
