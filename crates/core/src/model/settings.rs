use chrono::{FixedOffset, NaiveTime};
use thiserror::Error;

use crate::model::session::SessionWindow;

/// Questions drawn per session unless configured otherwise.
pub const DEFAULT_BATCH_SIZE: u32 = 5;
/// Minimum correct answers that earn the celebration screen.
pub const DEFAULT_CELEBRATION_THRESHOLD: u32 = 4;
/// Europe/Istanbul has stayed on UTC+3 all year since 2016.
pub const DEFAULT_UTC_OFFSET_MINUTES: i32 = 180;

const DEFAULT_UTC_OFFSET: FixedOffset = match FixedOffset::east_opt(DEFAULT_UTC_OFFSET_MINUTES * 60) {
    Some(offset) => offset,
    None => panic!("default UTC offset out of range"),
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QuizSettings {
    batch_size: u32,
    celebration_threshold: u32,
    window: SessionWindow,
    utc_offset: FixedOffset,
}

#[derive(Clone, Debug, Default)]
pub struct QuizSettingsDraft {
    pub batch_size: Option<u32>,
    pub celebration_threshold: Option<u32>,
    pub morning_start: Option<NaiveTime>,
    pub evening_start: Option<NaiveTime>,
    pub utc_offset_minutes: Option<i32>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SettingsError {
    #[error("batch size must be at least 1")]
    InvalidBatchSize,
    #[error("celebration threshold must be at least 1")]
    InvalidCelebrationThreshold,
    #[error("invalid UTC offset: {raw}")]
    InvalidUtcOffset { raw: String },
    #[error("invalid time of day (expected HH:MM): {raw}")]
    InvalidTime { raw: String },
}

impl QuizSettingsDraft {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the draft, filling unset fields with defaults.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError` for a zero batch size or threshold, or an offset
    /// outside ±23:59.
    pub fn validate(self) -> Result<QuizSettings, SettingsError> {
        let batch_size = self.batch_size.unwrap_or(DEFAULT_BATCH_SIZE);
        if batch_size == 0 {
            return Err(SettingsError::InvalidBatchSize);
        }

        let celebration_threshold = self
            .celebration_threshold
            .unwrap_or(DEFAULT_CELEBRATION_THRESHOLD);
        if celebration_threshold == 0 {
            return Err(SettingsError::InvalidCelebrationThreshold);
        }

        let minutes = self
            .utc_offset_minutes
            .unwrap_or(DEFAULT_UTC_OFFSET_MINUTES);
        let utc_offset = minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| SettingsError::InvalidUtcOffset {
                raw: format!("{minutes} minutes"),
            })?;

        let defaults = SessionWindow::default();
        let window = SessionWindow::new(
            self.morning_start.unwrap_or(defaults.morning_start()),
            self.evening_start.unwrap_or(defaults.evening_start()),
        );

        Ok(QuizSettings {
            batch_size,
            celebration_threshold,
            window,
            utc_offset,
        })
    }
}

impl QuizSettings {
    #[must_use]
    pub fn batch_size(&self) -> u32 {
        self.batch_size
    }

    #[must_use]
    pub fn celebration_threshold(&self) -> u32 {
        self.celebration_threshold
    }

    #[must_use]
    pub fn window(&self) -> SessionWindow {
        self.window
    }

    #[must_use]
    pub fn utc_offset(&self) -> FixedOffset {
        self.utc_offset
    }

    #[must_use]
    pub fn celebrates(&self, correct: u32) -> bool {
        correct >= self.celebration_threshold
    }
}

impl Default for QuizSettings {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            celebration_threshold: DEFAULT_CELEBRATION_THRESHOLD,
            window: SessionWindow::default(),
            utc_offset: DEFAULT_UTC_OFFSET,
        }
    }
}

/// Parse `HH:MM` (or `HH:MM:SS`).
///
/// # Errors
///
/// Returns `SettingsError::InvalidTime` if the value is not a valid time of day.
pub fn parse_time_of_day(raw: &str) -> Result<NaiveTime, SettingsError> {
    let trimmed = raw.trim();
    NaiveTime::parse_from_str(trimmed, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M:%S"))
        .map_err(|_| SettingsError::InvalidTime {
            raw: raw.to_string(),
        })
}

/// Parse a UTC offset such as `+03:00`, `-0530` or `180` (minutes).
///
/// # Errors
///
/// Returns `SettingsError::InvalidUtcOffset` for anything else.
pub fn parse_utc_offset_minutes(raw: &str) -> Result<i32, SettingsError> {
    let invalid = || SettingsError::InvalidUtcOffset {
        raw: raw.to_string(),
    };
    let trimmed = raw.trim();
    let (sign, rest) = match trimmed.as_bytes().first() {
        Some(b'+') => (1, &trimmed[1..]),
        Some(b'-') => (-1, &trimmed[1..]),
        Some(_) => return trimmed.parse::<i32>().map_err(|_| invalid()),
        None => return Err(invalid()),
    };

    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if digits.len() != 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }
    let hours: i32 = digits[..2].parse().map_err(|_| invalid())?;
    let minutes: i32 = digits[2..].parse().map_err(|_| invalid())?;
    if hours > 23 || minutes > 59 {
        return Err(invalid());
    }
    Ok(sign * (hours * 60 + minutes))
}
