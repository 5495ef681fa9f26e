//! Dark-mode recoloring engine.
//!
//! An engine instance owns at most one activation: the elements it has
//! already recolored, the inline declarations those recolors replaced, and the
//! mutation observer that feeds it new subtrees. Activation always starts by
//! tearing down whatever was there before, and deactivation undoes every
//! per-element effect, so the document after `activate*; deactivate` is the
//! document before.

use std::collections::HashMap;

use crate::classify::is_exempt;
use crate::color::{Rgba, parse_color};
use crate::dom::{Declaration, Document, NodeId, ObserverId, Priority};
use crate::filter::{self, BrightnessFilter};

/// Attribute set on every element the engine has processed.
pub const MARKER_ATTRIBUTE: &str = "data-ep-dark";

/// Colors at or below this opacity are left alone.
pub const ALPHA_THRESHOLD: f64 = 0.1;

const RECOLORED_PROPERTIES: [&str; 2] = ["background-color", "color"];

/// What a recolor replaced on one property of one element.
#[derive(Debug, Clone, Default)]
enum Shadowed {
    /// Not recolored; the inline style is the page's own.
    #[default]
    Untouched,
    /// Recolored where the page had no inline declaration.
    Absent,
    /// Recolored over the page's own inline declaration.
    Inline(Declaration),
}

#[derive(Debug)]
struct Activation {
    observer: ObserverId,
    processed: HashMap<NodeId, [Shadowed; 2]>,
    marked: usize,
    brightness: i64,
}

impl Activation {
    /// Recolor one element at most once per activation.
    fn process(&mut self, doc: &mut Document, id: NodeId) {
        if self.processed.contains_key(&id) || !doc.contains(id) || is_exempt(doc, id) {
            return;
        }
        doc.set_attribute(id, MARKER_ATTRIBUTE, "");
        self.marked += 1;

        let mut shadowed = <[Shadowed; 2]>::default();
        for (slot, property) in shadowed.iter_mut().zip(RECOLORED_PROPERTIES) {
            let Some(color) = visible_color(&doc.computed_style(id, property)) else {
                continue;
            };
            *slot = match doc.style_property(id, property) {
                Some(d) => Shadowed::Inline(d.clone()),
                None => Shadowed::Absent,
            };
            doc.set_style_property(
                id,
                property,
                &color.invert_lightness().to_css(),
                Priority::Important,
            );
        }
        self.processed.insert(id, shadowed);
    }
}

/// Dark-mode engine; either inactive or holding one activation.
#[derive(Debug, Default)]
pub struct DarkMode {
    activation: Option<Activation>,
}

impl DarkMode {
    /// Create an inactive engine.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether an activation is in place.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.activation.is_some()
    }

    /// Brightness percentage of the current activation, after clamping.
    #[must_use]
    pub fn brightness(&self) -> Option<i64> {
        self.activation.as_ref().map(|a| a.brightness)
    }

    /// How many times the current activation has marked an element.
    ///
    /// Every mark is counted, so an element processed twice would show up
    /// twice here while [`DarkMode::tracked_count`] stays put.
    #[must_use]
    pub fn process_count(&self) -> usize {
        self.activation.as_ref().map_or(0, |a| a.marked)
    }

    /// Number of live elements the current activation is tracking.
    #[must_use]
    pub fn tracked_count(&self) -> usize {
        self.activation.as_ref().map_or(0, |a| a.processed.len())
    }

    /// Activate dark mode at `brightness` percent.
    ///
    /// Any previous activation is removed first. Then the brightness filter is
    /// injected, every element under `body` is processed, and an observer is
    /// installed on `body` for [`DarkMode::handle_mutations`].
    pub fn activate(&mut self, doc: &mut Document, brightness: i64) {
        self.deactivate(doc);

        let brightness = filter::clamp_brightness(brightness);
        if let Err(err) = filter::inject(doc, &BrightnessFilter::new(brightness)) {
            tracing::warn!(error = %err, "brightness filter not injected");
        }

        let body = doc.body();
        let mut activation = Activation {
            observer: doc.observe(body),
            processed: HashMap::new(),
            marked: 0,
            brightness,
        };
        for el in doc.descendants(body) {
            activation.process(doc, el);
        }

        tracing::debug!(
            brightness = activation.brightness,
            processed = activation.marked,
            "dark mode activated"
        );
        self.activation = Some(activation);
    }

    /// Remove every trace of dark mode from `doc`. Safe to call at any time.
    ///
    /// Inline colors the page had set before they were recolored are put back.
    pub fn deactivate(&mut self, doc: &mut Document) {
        let mut shadowed = match self.activation.take() {
            Some(activation) => {
                doc.disconnect(activation.observer);
                activation.processed
            }
            None => HashMap::new(),
        };

        filter::remove(doc);

        let marked = doc.query_attribute(MARKER_ATTRIBUTE);
        for &el in &marked {
            doc.remove_attribute(el, MARKER_ATTRIBUTE);
            // Markers left by another engine carry no record; strip their colors.
            let previous = shadowed
                .remove(&el)
                .unwrap_or([Shadowed::Absent, Shadowed::Absent]);
            for (property, previous) in RECOLORED_PROPERTIES.into_iter().zip(previous) {
                match previous {
                    Shadowed::Untouched => {}
                    Shadowed::Absent => doc.remove_style_property(el, property),
                    Shadowed::Inline(d) => {
                        doc.set_style_property(el, property, &d.value, d.priority);
                    }
                }
            }
        }
        if !marked.is_empty() {
            tracing::debug!(restored = marked.len(), "dark mode deactivated");
        }
    }

    /// Observer callback: process everything added under `body` since the last
    /// call. Returns how many elements were newly marked.
    ///
    /// Does nothing while inactive.
    pub fn handle_mutations(&mut self, doc: &mut Document) -> usize {
        let Some(activation) = self.activation.as_mut() else {
            return 0;
        };

        let before = activation.marked;
        for record in doc.take_records(activation.observer) {
            for id in record.removed {
                if !doc.contains(id) {
                    activation.processed.remove(&id);
                }
            }
            for id in record.added {
                activation.process(doc, id);
                for child in doc.descendants(id) {
                    activation.process(doc, child);
                }
            }
        }
        activation.marked - before
    }
}

fn visible_color(value: &str) -> Option<Rgba> {
    parse_color(value).filter(|c| c.alpha > ALPHA_THRESHOLD)
}
