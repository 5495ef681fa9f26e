//! Night schedule: decides when the warm tint should be on.

use std::fmt;

use anyhow::{Context, Result};
use chrono::{NaiveTime, Timelike};

use crate::settings::Settings;

/// Minute-resolution wall-clock time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TimeOfDay(NaiveTime);

impl TimeOfDay {
    /// Parse `HH:MM` (24-hour).
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not a valid `HH:MM` time.
    ///
    /// # Examples
    ///
    /// ```
    /// # use eyeshade::schedule::TimeOfDay;
    /// assert_eq!(TimeOfDay::parse("22:05").unwrap().minutes(), 22 * 60 + 5);
    /// assert!(TimeOfDay::parse("7pm").is_err());
    /// ```
    pub fn parse(s: &str) -> Result<Self> {
        NaiveTime::parse_from_str(s.trim(), "%H:%M")
            .map(Self)
            .with_context(|| format!("Invalid time of day: {s:?}, expected HH:MM"))
    }

    /// Build from a clock reading, dropping seconds.
    #[must_use]
    pub fn from_time(time: NaiveTime) -> Self {
        Self(NaiveTime::from_hms_opt(time.hour(), time.minute(), 0).unwrap_or(time))
    }

    /// Minutes since midnight.
    #[must_use]
    pub fn minutes(self) -> u32 {
        self.0.hour() * 60 + self.0.minute()
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%H:%M"))
    }
}

/// Whether `now` falls in `[start, end)`, wrapping past midnight when `start > end`.
///
/// An empty window (`start == end`) never matches.
#[must_use]
pub fn in_range(start: TimeOfDay, end: TimeOfDay, now: TimeOfDay) -> bool {
    let (start, end, now) = (start.minutes(), end.minutes(), now.minutes());
    if start <= end {
        now >= start && now < end
    } else {
        now >= start || now < end
    }
}

/// Snapshot to store if the schedule wants the tint flipped at `now`.
///
/// Returns `None` when the schedule is off or already agrees with the tint.
///
/// # Errors
///
/// Returns an error if either schedule bound is not a valid `HH:MM` time.
pub fn check_schedule(settings: &Settings, now: TimeOfDay) -> Result<Option<Settings>> {
    if !settings.schedule.enabled {
        return Ok(None);
    }
    let start = TimeOfDay::parse(&settings.schedule.start_time).context("Bad schedule start")?;
    let end = TimeOfDay::parse(&settings.schedule.end_time).context("Bad schedule end")?;

    let wanted = in_range(start, end, now);
    if wanted == settings.color_temp.enabled {
        return Ok(None);
    }
    tracing::debug!(%now, wanted, "schedule flips the warm tint");
    let mut updated = settings.clone();
    updated.color_temp.enabled = wanted;
    Ok(Some(updated))
}
