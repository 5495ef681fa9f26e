//! Messages pushed from the background context to a page.

use serde::{Deserialize, Serialize};

use crate::settings::Settings;

/// Cross-context message, tagged by `type` on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Message {
    /// Apply a full settings snapshot.
    ApplySettings {
        /// The snapshot to apply.
        settings: Settings,
    },
    /// Show the break-reminder dialog.
    ShowBreakReminder,
    /// Close the break-reminder dialog if open.
    DismissBreakReminder,
}
