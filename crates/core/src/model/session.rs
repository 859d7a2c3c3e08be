use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use std::fmt;

/// Which of the two daily test windows a moment belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionType {
    Morning,
    Evening,
}

impl SessionType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SessionType::Morning => "morning",
            SessionType::Evening => "evening",
        }
    }
}

impl fmt::Display for SessionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scopes one test attempt: the local calendar date plus the window.
///
/// Renders as `YYYY-MM-DD_morning` / `YYYY-MM-DD_evening`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionKey {
    date: NaiveDate,
    session_type: SessionType,
}

impl SessionKey {
    #[must_use]
    pub fn new(date: NaiveDate, session_type: SessionType) -> Self {
        Self { date, session_type }
    }

    #[must_use]
    pub fn date(&self) -> NaiveDate {
        self.date
    }

    #[must_use]
    pub fn session_type(&self) -> SessionType {
        self.session_type
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.date.format("%Y-%m-%d"), self.session_type)
    }
}

/// Time-of-day boundaries for the morning and evening tests.
///
/// Classification is literal: morning is `[morning_start, evening_start)`, evening is
/// anything at or after `evening_start`, and the rest is outside both windows. When
/// `evening_start` is earlier than `morning_start` (the default 02:13 vs 08:00) the
/// morning interval is empty and every time from 02:13 until midnight is evening.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionWindow {
    morning_start: NaiveTime,
    evening_start: NaiveTime,
}

impl SessionWindow {
    #[must_use]
    pub fn new(morning_start: NaiveTime, evening_start: NaiveTime) -> Self {
        Self {
            morning_start,
            evening_start,
        }
    }

    #[must_use]
    pub fn morning_start(&self) -> NaiveTime {
        self.morning_start
    }

    #[must_use]
    pub fn evening_start(&self) -> NaiveTime {
        self.evening_start
    }

    /// Classify a local time of day.
    #[must_use]
    pub fn classify(&self, time: NaiveTime) -> Option<SessionType> {
        if self.morning_start <= time && time < self.evening_start {
            Some(SessionType::Morning)
        } else if time >= self.evening_start {
            Some(SessionType::Evening)
        } else {
            None
        }
    }

    /// Resolve the session key for a local date-time, or `None` outside both windows.
    #[must_use]
    pub fn resolve(&self, local: NaiveDateTime) -> Option<SessionKey> {
        self.classify(local.time())
            .map(|session_type| SessionKey::new(local.date(), session_type))
    }
}

const fn time_of_day(hour: u32, min: u32) -> NaiveTime {
    match NaiveTime::from_hms_opt(hour, min, 0) {
        Some(time) => time,
        None => panic!("invalid time of day"),
    }
}

pub const DEFAULT_MORNING_START: NaiveTime = time_of_day(8, 0);
pub const DEFAULT_EVENING_START: NaiveTime = time_of_day(2, 13);

impl Default for SessionWindow {
    fn default() -> Self {
        Self::new(DEFAULT_MORNING_START, DEFAULT_EVENING_START)
    }
}
