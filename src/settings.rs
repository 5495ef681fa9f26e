//! Persisted settings snapshot and the stores that hold it.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::filter::{MAX_BRIGHTNESS, MIN_BRIGHTNESS};
use crate::schedule::TimeOfDay;

/// Warm-tint overlay settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ColorTempSettings {
    /// Whether the overlay is shown.
    pub enabled: bool,
    /// Tint strength, 0-100.
    pub intensity: i64,
}

impl Default for ColorTempSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            intensity: 50,
        }
    }
}

/// Dark-mode settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DarkModeSettings {
    /// Whether pages are recolored.
    pub enabled: bool,
    /// Brightness percentage, 1-200.
    pub brightness: i64,
}

impl Default for DarkModeSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            brightness: 100,
        }
    }
}

/// Break-reminder settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BreakReminderSettings {
    /// Whether reminders fire.
    pub enabled: bool,
    /// Minutes between reminders.
    pub interval_min: i64,
}

impl Default for BreakReminderSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_min: 20,
        }
    }
}

/// Time window during which the warm tint is switched on automatically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScheduleSettings {
    /// Whether the schedule drives the tint.
    pub enabled: bool,
    /// Window start, `HH:MM`.
    pub start_time: String,
    /// Window end, `HH:MM`. May be earlier than the start to wrap past midnight.
    pub end_time: String,
}

impl Default for ScheduleSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            start_time: "22:00".into(),
            end_time: "07:00".into(),
        }
    }
}

/// Full settings snapshot as stored under one key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Global on/off switch for every feature.
    pub master_enabled: bool,
    /// Warm-tint overlay.
    pub color_temp: ColorTempSettings,
    /// Dark mode.
    pub dark_mode: DarkModeSettings,
    /// Break reminders.
    pub break_reminder: BreakReminderSettings,
    /// Night schedule.
    pub schedule: ScheduleSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            master_enabled: true,
            color_temp: ColorTempSettings::default(),
            dark_mode: DarkModeSettings::default(),
            break_reminder: BreakReminderSettings::default(),
            schedule: ScheduleSettings::default(),
        }
    }
}

impl Settings {
    /// Parse a stored JSON document. Missing fields take their defaults; a
    /// document that does not parse at all yields the default snapshot.
    #[must_use]
    pub fn from_json_or_default(json: &str) -> Self {
        serde_json::from_str(json).unwrap_or_else(|err| {
            tracing::warn!(error = %err, "malformed settings, using defaults");
            Self::default()
        })
    }

    /// Copy with every numeric field clamped and unparsable times reset.
    #[must_use]
    pub fn sanitized(&self) -> Self {
        let mut s = self.clone();
        s.color_temp.intensity = s.color_temp.intensity.clamp(0, 100);
        s.dark_mode.brightness = s.dark_mode.brightness.clamp(MIN_BRIGHTNESS, MAX_BRIGHTNESS);
        s.break_reminder.interval_min = s.break_reminder.interval_min.max(1);

        let defaults = ScheduleSettings::default();
        if TimeOfDay::parse(&s.schedule.start_time).is_err() {
            s.schedule.start_time = defaults.start_time;
        }
        if TimeOfDay::parse(&s.schedule.end_time).is_err() {
            s.schedule.end_time = defaults.end_time;
        }
        s
    }

    /// Whether dark mode should be active for this snapshot.
    #[must_use]
    pub fn dark_mode_effective(&self) -> bool {
        self.master_enabled && self.dark_mode.enabled
    }

    /// Whether the warm tint should be shown for this snapshot.
    #[must_use]
    pub fn color_temp_effective(&self) -> bool {
        self.master_enabled && self.color_temp.enabled
    }

    /// Whether break reminders should fire for this snapshot.
    #[must_use]
    pub fn break_reminder_effective(&self) -> bool {
        self.master_enabled && self.break_reminder.enabled
    }
}

/// Handle returned by [`SettingsStore::watch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WatchId(u64);

/// Callback invoked with every newly stored snapshot.
pub type Watcher = Box<dyn FnMut(&Settings)>;

/// Key-value item holding the settings snapshot.
pub trait SettingsStore {
    /// Current snapshot, defaults when nothing is stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be read.
    fn get(&self) -> Result<Settings>;

    /// Replace the snapshot and notify watchers.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be written.
    fn set(&mut self, settings: Settings) -> Result<()>;

    /// Register a change callback.
    fn watch(&mut self, watcher: Watcher) -> WatchId;

    /// Drop a change callback. Unknown ids are ignored.
    fn unwatch(&mut self, id: WatchId);
}

#[derive(Default)]
struct Watchers {
    next: u64,
    entries: Vec<(WatchId, Watcher)>,
}

impl Watchers {
    fn add(&mut self, watcher: Watcher) -> WatchId {
        let id = WatchId(self.next);
        self.next += 1;
        self.entries.push((id, watcher));
        id
    }

    fn remove(&mut self, id: WatchId) {
        self.entries.retain(|(w, _)| *w != id);
    }

    fn notify(&mut self, settings: &Settings) {
        for (_, watcher) in &mut self.entries {
            watcher(settings);
        }
    }
}

/// Store kept entirely in memory.
#[derive(Default)]
pub struct MemoryStore {
    value: Option<Settings>,
    watchers: Watchers,
}

impl MemoryStore {
    /// Empty store; `get` returns the defaults until something is set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsStore for MemoryStore {
    fn get(&self) -> Result<Settings> {
        Ok(self.value.clone().unwrap_or_default())
    }

    fn set(&mut self, settings: Settings) -> Result<()> {
        self.watchers.notify(&settings);
        self.value = Some(settings);
        Ok(())
    }

    fn watch(&mut self, watcher: Watcher) -> WatchId {
        self.watchers.add(watcher)
    }

    fn unwatch(&mut self, id: WatchId) {
        self.watchers.remove(id);
    }
}

/// Store backed by a pretty-printed JSON file.
pub struct FileStore {
    path: PathBuf,
    watchers: Watchers,
}

impl FileStore {
    /// Store reading and writing `path`. The file need not exist yet.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            watchers: Watchers::default(),
        }
    }

    /// Backing file location.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsStore for FileStore {
    fn get(&self) -> Result<Settings> {
        if !self.path.exists() {
            return Ok(Settings::default());
        }
        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read settings from {}", self.path.display()))?;
        Ok(Settings::from_json_or_default(&contents))
    }

    fn set(&mut self, settings: Settings) -> Result<()> {
        let serialized = serde_json::to_string_pretty(&settings)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))?;
        self.watchers.notify(&settings);
        Ok(())
    }

    fn watch(&mut self, watcher: Watcher) -> WatchId {
        self.watchers.add(watcher)
    }

    fn unwatch(&mut self, id: WatchId) {
        self.watchers.remove(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_defaults() {
        let s = Settings::default();
        assert!(s.master_enabled);
        assert!(!s.color_temp.enabled);
        assert_eq!(s.color_temp.intensity, 50);
        assert!(!s.dark_mode.enabled);
        assert_eq!(s.dark_mode.brightness, 100);
        assert!(!s.break_reminder.enabled);
        assert_eq!(s.break_reminder.interval_min, 20);
        assert!(!s.schedule.enabled);
        assert_eq!(s.schedule.start_time, "22:00");
        assert_eq!(s.schedule.end_time, "07:00");
    }

    #[test]
    fn test_json_uses_camel_case_keys() -> Result<()> {
        let json = serde_json::to_value(Settings::default())?;
        assert_eq!(json["masterEnabled"], true);
        assert_eq!(json["darkMode"]["brightness"], 100);
        assert_eq!(json["breakReminder"]["intervalMin"], 20);
        assert_eq!(json["schedule"]["startTime"], "22:00");
        Ok(())
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let s = Settings::from_json_or_default(r#"{"darkMode": {"enabled": true}}"#);
        assert!(s.dark_mode.enabled);
        assert_eq!(s.dark_mode.brightness, 100);
        assert!(s.master_enabled);
        assert_eq!(s.schedule, ScheduleSettings::default());
    }

    #[test]
    fn test_malformed_json_falls_back_to_defaults() {
        assert_eq!(Settings::from_json_or_default("not json"), Settings::default());
        assert_eq!(
            Settings::from_json_or_default(r#"{"darkMode": {"brightness": "bright"}}"#),
            Settings::default()
        );
    }

    #[test]
    fn test_sanitized_clamps() {
        let mut s = Settings::default();
        s.color_temp.intensity = 250;
        s.dark_mode.brightness = 0;
        s.break_reminder.interval_min = -5;
        s.schedule.start_time = "25:99".into();
        s.schedule.end_time = "06:30".into();

        let clean = s.sanitized();
        assert_eq!(clean.color_temp.intensity, 100);
        assert_eq!(clean.dark_mode.brightness, 1);
        assert_eq!(clean.break_reminder.interval_min, 1);
        assert_eq!(clean.schedule.start_time, "22:00");
        assert_eq!(clean.schedule.end_time, "06:30");
    }

    #[test]
    fn test_effective_flags_respect_master() {
        let mut s = Settings::default();
        s.dark_mode.enabled = true;
        s.color_temp.enabled = true;
        s.break_reminder.enabled = true;
        assert!(s.dark_mode_effective() && s.color_temp_effective() && s.break_reminder_effective());

        s.master_enabled = false;
        assert!(!s.dark_mode_effective());
        assert!(!s.color_temp_effective());
        assert!(!s.break_reminder_effective());
    }

    #[test]
    fn test_memory_store_notifies_watchers() -> Result<()> {
        let mut store = MemoryStore::new();
        assert_eq!(store.get()?, Settings::default());

        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let id = store.watch(Box::new(move |s: &Settings| {
            sink.borrow_mut().push(s.dark_mode.enabled);
        }));

        let mut s = Settings::default();
        s.dark_mode.enabled = true;
        store.set(s.clone())?;
        assert_eq!(store.get()?, s);

        store.unwatch(id);
        store.set(Settings::default())?;
        assert_eq!(*seen.borrow(), vec![true]);
        Ok(())
    }

    #[test]
    fn test_file_store_round_trip() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("settings.json");
        let mut store = FileStore::new(&path);
        assert_eq!(store.get()?, Settings::default());

        let mut s = Settings::default();
        s.color_temp.enabled = true;
        s.color_temp.intensity = 70;
        store.set(s.clone())?;

        assert_eq!(FileStore::new(&path).get()?, s);
        assert!(fs::read_to_string(&path)?.contains("\"colorTemp\""));
        Ok(())
    }

    #[test]
    fn test_file_store_write_error_has_context() {
        let mut store = FileStore::new("/nonexistent-dir/for/settings.json");
        let err = store.set(Settings::default()).unwrap_err();
        assert!(err.to_string().contains("Failed to write settings"));
    }
}
