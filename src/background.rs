//! Background controller: periodic alarms for break reminders and the schedule.
//!
//! The controller never touches storage or pages itself. It reconfigures the
//! alarm primitive and returns [`Action`]s for the host to carry out.

use std::collections::BTreeMap;

use crate::message::Message;
use crate::schedule::{TimeOfDay, check_schedule};
use crate::settings::Settings;

/// Alarm that fires the break reminder.
pub const BREAK_ALARM: &str = "eye-protect-break-reminder";

/// Alarm that re-evaluates the schedule.
pub const SCHEDULE_ALARM: &str = "eye-protect-schedule-check";

/// Minutes between schedule checks.
pub const SCHEDULE_PERIOD_MIN: u32 = 1;

/// Periodic alarm primitive provided by the host.
pub trait Alarms {
    /// Cancel the alarm named `name`, if any.
    fn clear(&mut self, name: &str);
    /// (Re)create a repeating alarm.
    fn create(&mut self, name: &str, period_minutes: u32);
}

/// In-memory alarm table keyed by name.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct AlarmTable {
    alarms: BTreeMap<String, u32>,
}

impl AlarmTable {
    /// Empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Period of a registered alarm.
    #[must_use]
    pub fn period(&self, name: &str) -> Option<u32> {
        self.alarms.get(name).copied()
    }

    /// Number of registered alarms.
    #[must_use]
    pub fn len(&self) -> usize {
        self.alarms.len()
    }

    /// Whether no alarm is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.alarms.is_empty()
    }
}

impl Alarms for AlarmTable {
    fn clear(&mut self, name: &str) {
        self.alarms.remove(name);
    }

    fn create(&mut self, name: &str, period_minutes: u32) {
        self.alarms.insert(name.to_string(), period_minutes);
    }
}

/// Side effect requested by the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Deliver a message to the active page.
    SendToActiveTab(Message),
    /// Persist a new settings snapshot.
    StoreSettings(Settings),
}

/// Reset both alarms for `settings` and run an immediate schedule check.
pub fn configure(alarms: &mut dyn Alarms, settings: &Settings, now: TimeOfDay) -> Vec<Action> {
    let settings = settings.sanitized();

    alarms.clear(BREAK_ALARM);
    if settings.break_reminder_effective() {
        let period = u32::try_from(settings.break_reminder.interval_min).unwrap_or(u32::MAX);
        alarms.create(BREAK_ALARM, period);
    }

    alarms.clear(SCHEDULE_ALARM);
    if !settings.schedule.enabled {
        return Vec::new();
    }
    alarms.create(SCHEDULE_ALARM, SCHEDULE_PERIOD_MIN);
    schedule_actions(&settings, now)
}

/// React to a fired alarm given the current snapshot.
pub fn on_alarm(name: &str, settings: &Settings, now: TimeOfDay) -> Vec<Action> {
    match name {
        BREAK_ALARM if settings.break_reminder_effective() => {
            vec![Action::SendToActiveTab(Message::ShowBreakReminder)]
        }
        SCHEDULE_ALARM => schedule_actions(settings, now),
        _ => Vec::new(),
    }
}

fn schedule_actions(settings: &Settings, now: TimeOfDay) -> Vec<Action> {
    match check_schedule(settings, now) {
        Ok(Some(updated)) => vec![Action::StoreSettings(updated)],
        Ok(None) => Vec::new(),
        Err(err) => {
            tracing::warn!(error = %err, "schedule check skipped");
            Vec::new()
        }
    }
}
