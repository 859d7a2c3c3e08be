use std::sync::Arc;

use chrono::{FixedOffset, NaiveDate};

use quiz_core::model::{DailyScore, Question, QuestionId};
use storage::Storage;
use storage::repository::{QuestionRepository, WeeklyScoreRepository, WrongLogRepository};

use crate::Clock;
use crate::error::SessionError;

const OVERVIEW_DAYS: u32 = 7;

/// Score panel: the last seven days, their total and the size of the mistake pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeeklyOverview {
    /// Oldest first, ending today.
    pub days: Vec<DailyScore>,
    pub total: u32,
    pub wrong_pool: usize,
}

/// A logged miss, joined with its question when the bank still has it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrongQuestionItem {
    pub id: QuestionId,
    pub recorded_on: NaiveDate,
    pub question: Option<Question>,
}

/// Read-only queries over scores and mistakes.
#[derive(Clone)]
pub struct OverviewService {
    clock: Clock,
    utc_offset: FixedOffset,
    questions: Arc<dyn QuestionRepository>,
    scores: Arc<dyn WeeklyScoreRepository>,
    wrong: Arc<dyn WrongLogRepository>,
}

impl OverviewService {
    #[must_use]
    pub fn new(
        clock: Clock,
        utc_offset: FixedOffset,
        questions: Arc<dyn QuestionRepository>,
        scores: Arc<dyn WeeklyScoreRepository>,
        wrong: Arc<dyn WrongLogRepository>,
    ) -> Self {
        Self {
            clock,
            utc_offset,
            questions,
            scores,
            wrong,
        }
    }

    #[must_use]
    pub fn from_storage(clock: Clock, utc_offset: FixedOffset, storage: &Storage) -> Self {
        Self::new(
            clock,
            utc_offset,
            Arc::clone(&storage.questions),
            Arc::clone(&storage.scores),
            Arc::clone(&storage.wrong),
        )
    }

    /// # Errors
    ///
    /// Returns `SessionError::Storage` if scores or the wrong log cannot be loaded.
    pub async fn weekly_overview(&self) -> Result<WeeklyOverview, SessionError> {
        let today = self.clock.today(self.utc_offset);
        let scores = self.scores.load_scores().await?;
        let wrong = self.wrong.load_wrong().await?;

        let days = scores.trailing(today, OVERVIEW_DAYS);
        let total = days
            .iter()
            .fold(0_u32, |acc, d| acc.saturating_add(d.correct));

        Ok(WeeklyOverview {
            days,
            total,
            wrong_pool: wrong.len(),
        })
    }

    /// Logged misses in the order they were first recorded.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` if the bank or the wrong log cannot be loaded.
    pub async fn wrong_questions(&self) -> Result<Vec<WrongQuestionItem>, SessionError> {
        let bank = self.questions.load_questions().await?;
        let wrong = self.wrong.load_wrong().await?;

        Ok(wrong
            .entries()
            .iter()
            .map(|entry| WrongQuestionItem {
                id: entry.id.clone(),
                recorded_on: entry.date,
                question: bank.get(&entry.id).cloned(),
            })
            .collect())
    }
}
