use std::sync::Arc;

use log::{debug, info, warn};
use rand::SeedableRng;
use rand::rngs::StdRng;

use quiz_core::model::{QuizSettings, SessionKey};
use storage::Storage;
use storage::repository::{
    AskedLogRepository, QuestionRepository, WeeklyScoreRepository, WrongLogRepository,
};

use super::plan::{BatchSelection, BatchSelector};
use super::progress::SessionProgress;
use super::service::{AnswerOutcome, QuizSession, SessionEffect};
use crate::Clock;
use crate::error::SessionError;

/// What the front end should show when a page is (re)loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOpening {
    /// Outside both test windows; no test is presented.
    Closed,
    /// Not enough unseen questions for a batch; the bank is complete.
    Exhausted { remaining: usize },
    /// A session for the current key, either reused or freshly drawn.
    Ready(QuizSession),
}

/// Final tally of a finalized session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Completion {
    pub correct: u32,
    pub total: usize,
    pub celebrate: bool,
}

/// Result of answering the current question in a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerResult {
    pub outcome: AnswerOutcome,
    pub progress: SessionProgress,
    pub completion: Option<Completion>,
}

/// Orchestrates session start and persisted answering.
#[derive(Clone)]
pub struct QuizLoopService {
    clock: Clock,
    settings: QuizSettings,
    questions: Arc<dyn QuestionRepository>,
    asked: Arc<dyn AskedLogRepository>,
    scores: Arc<dyn WeeklyScoreRepository>,
    wrong: Arc<dyn WrongLogRepository>,
    seed: Option<u64>,
}

impl QuizLoopService {
    #[must_use]
    pub fn new(
        clock: Clock,
        settings: QuizSettings,
        questions: Arc<dyn QuestionRepository>,
        asked: Arc<dyn AskedLogRepository>,
        scores: Arc<dyn WeeklyScoreRepository>,
        wrong: Arc<dyn WrongLogRepository>,
    ) -> Self {
        Self {
            clock,
            settings,
            questions,
            asked,
            scores,
            wrong,
            seed: None,
        }
    }

    #[must_use]
    pub fn from_storage(clock: Clock, settings: QuizSettings, storage: &Storage) -> Self {
        Self::new(
            clock,
            settings,
            Arc::clone(&storage.questions),
            Arc::clone(&storage.asked),
            Arc::clone(&storage.scores),
            Arc::clone(&storage.wrong),
        )
    }

    /// Draw batches from a seeded RNG instead of the thread RNG.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn settings(&self) -> &QuizSettings {
        &self.settings
    }

    /// Session key for the current local time, or `None` outside both windows.
    #[must_use]
    pub fn resolve_key(&self) -> Option<SessionKey> {
        let local = self.clock.local_now(self.settings.utc_offset()).naive_local();
        self.settings.window().resolve(local)
    }

    /// Resolve the current session, reusing `previous` when its key still matches.
    ///
    /// A new batch is drawn only when the key changed (or there was no previous session).
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` if the bank or asked log cannot be loaded.
    pub async fn open_session(
        &self,
        previous: Option<QuizSession>,
    ) -> Result<SessionOpening, SessionError> {
        let Some(key) = self.resolve_key() else {
            debug!("outside test windows");
            return Ok(SessionOpening::Closed);
        };

        if let Some(session) = previous.filter(|s| s.key() == key) {
            debug!("reusing session {key}");
            return Ok(SessionOpening::Ready(session));
        }

        let bank = self.questions.load_questions().await?;
        let asked = self.asked.load_asked().await?;
        let selector = BatchSelector::new(self.settings.batch_size());
        let selection = match self.seed {
            Some(seed) => selector.select(&bank, &asked, &mut StdRng::seed_from_u64(seed)),
            None => selector.select(&bank, &asked, &mut rand::rng()),
        };

        match selection {
            BatchSelection::Exhausted { remaining } => {
                info!("question bank exhausted ({remaining} unseen left)");
                Ok(SessionOpening::Exhausted { remaining })
            }
            BatchSelection::Drawn(questions) => {
                info!("opened session {key} with {} questions", questions.len());
                Ok(SessionOpening::Ready(QuizSession::new(key, questions)?))
            }
        }
    }

    /// Answer the current question, persist its effects, then commit the new state.
    ///
    /// If any write fails the session is left exactly as it was, so the same answer
    /// can be submitted again. Log writes are idempotent, which makes the retry safe.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Completed` for a finalized session and
    /// `SessionError::Storage` if persistence fails.
    pub async fn answer_current(
        &self,
        session: &mut QuizSession,
        choice: &str,
    ) -> Result<AnswerResult, SessionError> {
        let today = self.clock.today(self.settings.utc_offset());
        let transition = session.answer(choice, today)?;

        for effect in &transition.effects {
            if let Err(err) = self.execute(effect).await {
                warn!("session {}: {effect:?} failed: {err}", session.key());
                return Err(err);
            }
        }

        session.apply(&transition)?;
        if session.is_finalized() {
            info!(
                "session {} finalized with {}/{} correct",
                session.key(),
                session.correct_count(),
                session.total()
            );
        }

        Ok(AnswerResult {
            outcome: transition.outcome,
            progress: session.progress(),
            completion: self.completion(session),
        })
    }

    /// Tally for a finalized session; `None` while still in progress.
    #[must_use]
    pub fn completion(&self, session: &QuizSession) -> Option<Completion> {
        session.is_finalized().then(|| {
            let correct = session.correct_count();
            Completion {
                correct,
                total: session.total(),
                celebrate: self.settings.celebrates(correct),
            }
        })
    }

    async fn execute(&self, effect: &SessionEffect) -> Result<(), SessionError> {
        match effect {
            SessionEffect::RecordAsked { id } => {
                let mut log = self.asked.load_asked().await?;
                if log.record(id.clone()) {
                    self.asked.save_asked(&log).await?;
                }
            }
            SessionEffect::RecordWrong { id, date } => {
                let mut log = self.wrong.load_wrong().await?;
                if log.record(id.clone(), *date) {
                    self.wrong.save_wrong(&log).await?;
                }
            }
            SessionEffect::AddToWeeklyScore { date, amount } => {
                let mut scores = self.scores.load_scores().await?;
                scores.add(*date, *amount);
                self.scores.save_scores(&scores).await?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};
    use quiz_core::model::{Question, QuestionBank, QuestionId, QuizSettingsDraft};
    use quiz_core::time::fixed_clock;
    use storage::repository::InMemoryRepository;

    fn build_bank(count: i64) -> QuestionBank {
        QuestionBank::new(
            (1..=count)
                .map(|id| {
                    Question::new(
                        QuestionId::new(id),
                        format!("Q{id}"),
                        vec!["right".to_string(), "wrong".to_string()],
                        "right",
                    )
                    .unwrap()
                })
                .collect(),
        )
        .unwrap()
    }

    fn build_service(repo: &InMemoryRepository, clock: Clock) -> QuizLoopService {
        QuizLoopService::from_storage(
            clock,
            QuizSettings::default(),
            &Storage::from_repository(repo.clone()),
        )
        .with_seed(42)
    }

    async fn ready(service: &QuizLoopService, previous: Option<QuizSession>) -> QuizSession {
        match service.open_session(previous).await.unwrap() {
            SessionOpening::Ready(session) => session,
            other => panic!("expected ready session, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn closed_outside_windows() {
        let repo = InMemoryRepository::with_questions(build_bank(10));
        // 09:00Z + 14h = 23:00Z = 02:00 local, before the 02:13 boundary
        let mut clock = fixed_clock();
        clock.advance(Duration::hours(14));
        let service = build_service(&repo, clock);

        assert_eq!(service.open_session(None).await.unwrap(), SessionOpening::Closed);
    }

    #[tokio::test]
    async fn same_key_reuses_the_drawn_batch() {
        let repo = InMemoryRepository::with_questions(build_bank(10));
        let service = build_service(&repo, fixed_clock()).with_seed(1);
        let first = ready(&service, None).await;
        assert_eq!(first.key().to_string(), "2024-03-01_evening");

        let other_seed = service.clone().with_seed(99);
        let again = ready(&other_seed, Some(first.clone())).await;
        assert_eq!(again, first);
    }

    #[tokio::test]
    async fn new_key_draws_a_new_session() {
        let repo = InMemoryRepository::with_questions(build_bank(10));
        let service = build_service(&repo, fixed_clock());
        let first = ready(&service, None).await;

        let mut tomorrow = fixed_clock();
        tomorrow.advance(Duration::days(1));
        let next = ready(&service.clone().with_clock(tomorrow), Some(first)).await;
        assert_eq!(next.key().date(), NaiveDate::from_ymd_opt(2024, 3, 2).unwrap());
        assert_eq!(next.progress().answered, 0);
    }

    #[tokio::test]
    async fn effects_are_persisted_before_commit() {
        let repo = InMemoryRepository::with_questions(build_bank(5));
        let service = build_service(&repo, fixed_clock());
        let mut session = ready(&service, None).await;
        let first_id = session.current_question().unwrap().id().clone();

        let wrong = service.answer_current(&mut session, "wrong").await.unwrap();
        assert!(!wrong.outcome.is_correct());
        assert_eq!(wrong.progress.answered, 0);
        assert!(repo.load_wrong().await.unwrap().contains(&first_id));

        let right = service.answer_current(&mut session, "right").await.unwrap();
        assert!(right.outcome.is_correct());
        assert_eq!(right.progress.answered, 1);
        assert!(repo.load_asked().await.unwrap().contains(&first_id));
        assert!(right.completion.is_none());
    }

    #[tokio::test]
    async fn completion_reports_celebration_threshold() {
        let settings = QuizSettingsDraft {
            batch_size: Some(3),
            ..QuizSettingsDraft::default()
        }
        .validate()
        .unwrap();
        let repo = InMemoryRepository::with_questions(build_bank(3));
        let service = QuizLoopService::from_storage(
            fixed_clock(),
            settings,
            &Storage::from_repository(repo.clone()),
        );
        let mut session = ready(&service, None).await;

        let mut last = None;
        while !session.is_finalized() {
            last = Some(service.answer_current(&mut session, "right").await.unwrap());
        }

        let completion = last.unwrap().completion.unwrap();
        assert_eq!(completion.correct, 3);
        assert!(!completion.celebrate);
        let today = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert_eq!(repo.load_scores().await.unwrap().get(today), 3);
    }
}
