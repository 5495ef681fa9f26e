//! Eye-strain reduction engine.
//!
//! The centerpiece is the dark-mode recoloring [`engine`]: it walks a
//! [`dom::Document`], skips media and image-backed elements, flips the
//! lightness of every visible background and text color, and keeps new
//! subtrees in step through a mutation observer. Around it sit a warm-tint
//! overlay, a break-reminder dialog, and a night schedule that toggles the
//! tint.

pub mod background;
pub mod classify;
pub mod color;
pub mod dom;
pub mod engine;
pub mod filter;
pub mod lifecycle;
pub mod logs;
pub mod message;
pub mod overlay;
pub mod schedule;
pub mod settings;

pub use engine::DarkMode;
pub use lifecycle::ContentScript;
pub use settings::{Settings, SettingsStore};
