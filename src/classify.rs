//! Element classification for the recoloring engine.

use crate::dom::{Document, NodeId};

/// Tags whose content is raster, vector or embedded media.
///
/// Inverting these produces negative photos, so they are only compensated by
/// the global brightness filter.
pub const EXEMPT_TAGS: [&str; 7] = [
    "img", "video", "canvas", "svg", "picture", "source", "iframe",
];

/// Whether the engine must leave `id` alone.
///
/// True for media tags and for anything painted with a background image. The
/// background image is read fresh every call since pages swap it at runtime.
#[must_use]
pub fn is_exempt(doc: &Document, id: NodeId) -> bool {
    if doc
        .tag_name(id)
        .is_some_and(|tag| EXEMPT_TAGS.contains(&tag))
    {
        return true;
    }
    let image = doc.computed_style(id, "background-image");
    !image.is_empty() && image != "none"
}
