//! Page-side wiring from settings snapshots and messages to the features.

use crate::dom::Document;
use crate::engine::DarkMode;
use crate::message::Message;
use crate::overlay::{self, BreakReminder};
use crate::settings::Settings;

/// Everything one page owns: the dark-mode engine, the tint and the reminder.
#[derive(Debug, Default)]
pub struct ContentScript {
    dark_mode: DarkMode,
    break_reminder: BreakReminder,
}

impl ContentScript {
    /// Page with every feature off.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The dark-mode engine.
    #[must_use]
    pub fn dark_mode(&self) -> &DarkMode {
        &self.dark_mode
    }

    /// The break-reminder dialog state.
    #[must_use]
    pub fn break_reminder(&self) -> &BreakReminder {
        &self.break_reminder
    }

    /// Apply a snapshot. Called for every snapshot without diffing; both the
    /// tint and the engine make repeated calls harmless.
    pub fn apply_settings(&mut self, doc: &mut Document, settings: &Settings) {
        let settings = settings.sanitized();

        if let Err(err) = overlay::apply_color_temp(
            doc,
            settings.color_temp.enabled,
            settings.color_temp.intensity,
            settings.master_enabled,
        ) {
            tracing::warn!(error = %err, "color temperature not applied");
        }

        if settings.dark_mode_effective() {
            self.dark_mode.activate(doc, settings.dark_mode.brightness);
        } else {
            self.dark_mode.deactivate(doc);
        }
    }

    /// Handle a message pushed from the background context.
    pub fn handle_message(&mut self, doc: &mut Document, message: &Message) {
        match message {
            Message::ApplySettings { settings } => self.apply_settings(doc, settings),
            Message::ShowBreakReminder => {
                if let Err(err) = self.break_reminder.show(doc) {
                    tracing::warn!(error = %err, "break reminder not shown");
                }
            }
            Message::DismissBreakReminder => self.break_reminder.dismiss(doc),
        }
    }

    /// Deliver pending document mutations to the engine.
    pub fn on_mutations(&mut self, doc: &mut Document) -> usize {
        self.dark_mode.handle_mutations(doc)
    }

    /// One-second timer tick for the break-reminder countdown.
    pub fn on_tick(&mut self, doc: &mut Document) {
        self.break_reminder.tick(doc);
    }
}
