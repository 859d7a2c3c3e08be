use chrono::NaiveDate;
use std::fmt;

use quiz_core::model::{Question, QuestionId, SessionKey};

use super::progress::SessionProgress;
use crate::error::SessionError;

//
// ─── STATE, EFFECTS, TRANSITIONS ───────────────────────────────────────────────
//

/// Where a session stands.
///
/// Wrong answers never move `index`: the same question is asked until it is answered
/// correctly, so `correct` always equals `index` while in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    InProgress { index: usize, correct: u32 },
    Finalized { correct: u32 },
}

/// Persistence work the caller must perform before committing a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEffect {
    /// Add the id to the asked log (no-op if already present).
    RecordAsked { id: QuestionId },
    /// Add a first-miss entry to the wrong log (no-op if the id is already logged).
    RecordWrong { id: QuestionId, date: NaiveDate },
    /// Add the session's correct count to the day's weekly score.
    AddToWeeklyScore { date: NaiveDate, amount: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerOutcome {
    Correct { question_id: QuestionId },
    TryAgain { question_id: QuestionId },
}

impl AnswerOutcome {
    #[must_use]
    pub fn is_correct(&self) -> bool {
        matches!(self, AnswerOutcome::Correct { .. })
    }
}

/// Result of evaluating an answer against a session without mutating it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub from: SessionState,
    pub next: SessionState,
    pub outcome: AnswerOutcome,
    pub effects: Vec<SessionEffect>,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// One morning or evening test: the drawn questions plus progress through them.
#[derive(Clone, PartialEq, Eq)]
pub struct QuizSession {
    key: SessionKey,
    questions: Vec<Question>,
    state: SessionState,
}

impl QuizSession {
    /// Start a session at the first question.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Empty` if no questions are provided.
    pub fn new(key: SessionKey, questions: Vec<Question>) -> Result<Self, SessionError> {
        if questions.is_empty() {
            return Err(SessionError::Empty);
        }
        Ok(Self {
            key,
            questions,
            state: SessionState::InProgress {
                index: 0,
                correct: 0,
            },
        })
    }

    #[must_use]
    pub fn key(&self) -> SessionKey {
        self.key
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.questions.len()
    }

    /// Index of the question being asked; equals `total()` once finalized.
    #[must_use]
    pub fn current_index(&self) -> usize {
        match self.state {
            SessionState::InProgress { index, .. } => index,
            SessionState::Finalized { .. } => self.questions.len(),
        }
    }

    #[must_use]
    pub fn correct_count(&self) -> u32 {
        match self.state {
            SessionState::InProgress { correct, .. } | SessionState::Finalized { correct } => {
                correct
            }
        }
    }

    #[must_use]
    pub fn is_finalized(&self) -> bool {
        matches!(self.state, SessionState::Finalized { .. })
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        match self.state {
            SessionState::InProgress { index, .. } => self.questions.get(index),
            SessionState::Finalized { .. } => None,
        }
    }

    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        let answered = self.current_index();
        SessionProgress {
            total: self.total(),
            answered,
            remaining: self.total().saturating_sub(answered),
            correct: self.correct_count(),
            is_complete: self.is_finalized(),
        }
    }

    /// Evaluate `choice` against the current question.
    ///
    /// A correct answer on the last question finalizes the session and carries the
    /// weekly score contribution as its last effect. `today` dates both log entries.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Completed` if the session is already finalized.
    pub fn answer(&self, choice: &str, today: NaiveDate) -> Result<Transition, SessionError> {
        let SessionState::InProgress { index, correct } = self.state else {
            return Err(SessionError::Completed);
        };
        let question = self.questions.get(index).ok_or(SessionError::Completed)?;
        let question_id = question.id().clone();

        if !question.is_correct(choice) {
            return Ok(Transition {
                from: self.state,
                next: self.state,
                outcome: AnswerOutcome::TryAgain {
                    question_id: question_id.clone(),
                },
                effects: vec![SessionEffect::RecordWrong {
                    id: question_id,
                    date: today,
                }],
            });
        }

        let correct = correct.saturating_add(1);
        let index = index + 1;
        let mut effects = vec![SessionEffect::RecordAsked {
            id: question_id.clone(),
        }];

        let next = if index >= self.questions.len() {
            effects.push(SessionEffect::AddToWeeklyScore {
                date: today,
                amount: correct,
            });
            SessionState::Finalized { correct }
        } else {
            SessionState::InProgress { index, correct }
        };

        Ok(Transition {
            from: self.state,
            next,
            outcome: AnswerOutcome::Correct { question_id },
            effects,
        })
    }

    /// Commit a transition produced by [`QuizSession::answer`].
    ///
    /// # Errors
    ///
    /// Returns `SessionError::StaleTransition` if the session moved on since the
    /// transition was computed.
    pub fn apply(&mut self, transition: &Transition) -> Result<(), SessionError> {
        if transition.from != self.state {
            return Err(SessionError::StaleTransition);
        }
        self.state = transition.next;
        Ok(())
    }
}

impl fmt::Debug for QuizSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizSession")
            .field("key", &self.key.to_string())
            .field("questions_len", &self.questions.len())
            .field("state", &self.state)
            .finish()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
