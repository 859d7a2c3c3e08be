use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};

use crate::model::ids::QuestionId;

//
// ─── ASKED LOG ─────────────────────────────────────────────────────────────────
//

/// Ids of questions that have been answered correctly at least once.
///
/// Only grows; an id is stored once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AskedLog {
    ids: Vec<QuestionId>,
}

impl AskedLog {
    /// Rehydrate from persisted ids, dropping repeated entries.
    #[must_use]
    pub fn from_persisted(ids: impl IntoIterator<Item = QuestionId>) -> Self {
        let mut log = Self::default();
        for id in ids {
            log.record(id);
        }
        log
    }

    #[must_use]
    pub fn contains(&self, id: &QuestionId) -> bool {
        self.ids.contains(id)
    }

    /// Returns `true` if the id was not already present.
    pub fn record(&mut self, id: QuestionId) -> bool {
        if self.contains(&id) {
            return false;
        }
        self.ids.push(id);
        true
    }

    #[must_use]
    pub fn ids(&self) -> &[QuestionId] {
        &self.ids
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

//
// ─── WEEKLY SCORES ─────────────────────────────────────────────────────────────
//

/// Correct answers for one calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyScore {
    pub date: NaiveDate,
    pub correct: u32,
}

/// Correct-answer counts per calendar day.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WeeklyScores {
    days: BTreeMap<NaiveDate, u32>,
}

impl WeeklyScores {
    #[must_use]
    pub fn from_persisted(days: impl IntoIterator<Item = (NaiveDate, u32)>) -> Self {
        Self {
            days: days.into_iter().collect(),
        }
    }

    #[must_use]
    pub fn get(&self, date: NaiveDate) -> u32 {
        self.days.get(&date).copied().unwrap_or(0)
    }

    /// Adds to the day's count, never overwriting it.
    pub fn add(&mut self, date: NaiveDate, correct: u32) {
        let entry = self.days.entry(date).or_insert(0);
        *entry = entry.saturating_add(correct);
    }

    /// Scores for the `days` days ending at `end` (inclusive), oldest first.
    #[must_use]
    pub fn trailing(&self, end: NaiveDate, days: u32) -> Vec<DailyScore> {
        (0..i64::from(days))
            .rev()
            .map(|back| {
                let date = end - Duration::days(back);
                DailyScore {
                    date,
                    correct: self.get(date),
                }
            })
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, u32)> + '_ {
        self.days.iter().map(|(date, count)| (*date, *count))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }
}

//
// ─── WRONG LOG ─────────────────────────────────────────────────────────────────
//

/// First miss of a question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrongEntry {
    pub id: QuestionId,
    pub date: NaiveDate,
}

/// Questions missed at least once; each id appears a single time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WrongLog {
    entries: Vec<WrongEntry>,
}

impl WrongLog {
    /// Rehydrate from persisted entries, keeping the first entry per id.
    #[must_use]
    pub fn from_persisted(entries: impl IntoIterator<Item = WrongEntry>) -> Self {
        let mut log = Self::default();
        for entry in entries {
            log.record(entry.id, entry.date);
        }
        log
    }

    #[must_use]
    pub fn contains(&self, id: &QuestionId) -> bool {
        self.entries.iter().any(|e| e.id == *id)
    }

    /// Returns `true` if a new entry was added.
    pub fn record(&mut self, id: QuestionId, date: NaiveDate) -> bool {
        if self.contains(&id) {
            return false;
        }
        self.entries.push(WrongEntry { id, date });
        true
    }

    #[must_use]
    pub fn entries(&self) -> &[WrongEntry] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
