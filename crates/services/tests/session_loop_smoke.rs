use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use quiz_core::model::{
    AskedLog, Question, QuestionBank, QuestionId, QuizSettings, QuizSettingsDraft, WeeklyScores,
};
use quiz_core::time::fixed_clock;
use services::{QuizLoopService, QuizSession, SessionError, SessionOpening};
use storage::Storage;
use storage::repository::{
    AskedLogRepository, InMemoryRepository, QuestionRepository, StorageError,
    WeeklyScoreRepository, WrongLogRepository,
};

fn build_bank(count: i64) -> QuestionBank {
    QuestionBank::new(
        (1..=count)
            .map(|id| {
                Question::new(
                    QuestionId::new(id),
                    format!("Soru {id}"),
                    vec!["doğru".to_string(), "yanlış".to_string()],
                    "doğru",
                )
                .unwrap()
            })
            .collect(),
    )
    .unwrap()
}

fn settings_with_batch(batch_size: u32) -> QuizSettings {
    QuizSettingsDraft {
        batch_size: Some(batch_size),
        ..QuizSettingsDraft::default()
    }
    .validate()
    .unwrap()
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
}

async fn open(service: &QuizLoopService, previous: Option<QuizSession>) -> SessionOpening {
    service.open_session(previous).await.unwrap()
}

async fn ready(service: &QuizLoopService, previous: Option<QuizSession>) -> QuizSession {
    match open(service, previous).await {
        SessionOpening::Ready(session) => session,
        other => panic!("expected ready session, got {other:?}"),
    }
}

async fn answer_all_correctly(service: &QuizLoopService, session: &mut QuizSession) {
    while !session.is_finalized() {
        service.answer_current(session, "doğru").await.unwrap();
    }
}

#[tokio::test]
async fn five_question_bank_is_served_once_then_exhausted() {
    let repo = InMemoryRepository::with_questions(build_bank(5));
    let service = QuizLoopService::from_storage(
        fixed_clock(),
        QuizSettings::default(),
        &Storage::from_repository(repo.clone()),
    )
    .with_seed(5);

    let mut session = ready(&service, None).await;
    let drawn: HashSet<_> = session.questions().iter().map(|q| q.id().clone()).collect();
    let bank: HashSet<_> = build_bank(5).iter().map(|q| q.id().clone()).collect();
    assert_eq!(drawn, bank);

    answer_all_correctly(&service, &mut session).await;
    assert_eq!(repo.load_asked().await.unwrap().len(), 5);

    // next session key: tomorrow's evening
    let mut tomorrow = fixed_clock();
    tomorrow.advance(Duration::days(1));
    let next = service.clone().with_clock(tomorrow);
    assert_eq!(
        open(&next, Some(session)).await,
        SessionOpening::Exhausted { remaining: 0 }
    );
}

#[tokio::test]
async fn wrong_then_right_on_first_question() {
    let repo = InMemoryRepository::with_questions(build_bank(8));
    let service = QuizLoopService::from_storage(
        fixed_clock(),
        QuizSettings::default(),
        &Storage::from_repository(repo.clone()),
    );
    let mut session = ready(&service, None).await;
    let first = session.current_question().unwrap().id().clone();

    let result = service.answer_current(&mut session, "yanlış").await.unwrap();
    assert_eq!(result.progress.answered, 0);
    assert_eq!(repo.load_wrong().await.unwrap().len(), 1);
    assert!(repo.load_asked().await.unwrap().is_empty());

    // missing again does not add a second entry
    service.answer_current(&mut session, "yanlış").await.unwrap();
    assert_eq!(repo.load_wrong().await.unwrap().len(), 1);

    let result = service.answer_current(&mut session, "doğru").await.unwrap();
    assert_eq!(result.progress.answered, 1);
    assert_eq!(result.progress.correct, 1);
    assert_eq!(session.correct_count(), 1);
    assert_eq!(repo.load_asked().await.unwrap().ids(), &[first]);
}

#[tokio::test]
async fn four_correct_celebrates_and_adds_four() {
    let repo = InMemoryRepository::with_questions(build_bank(10));
    let mut scores = WeeklyScores::default();
    scores.add(today(), 2);
    repo.save_scores(&scores).await.unwrap();

    let service = QuizLoopService::from_storage(
        fixed_clock(),
        settings_with_batch(4),
        &Storage::from_repository(repo.clone()),
    );
    let mut session = ready(&service, None).await;
    answer_all_correctly(&service, &mut session).await;

    let completion = service.completion(&session).unwrap();
    assert_eq!(completion.correct, 4);
    assert!(completion.celebrate);
    assert_eq!(repo.load_scores().await.unwrap().get(today()), 6);
}

#[tokio::test]
async fn three_correct_adds_three_without_celebration() {
    let repo = InMemoryRepository::with_questions(build_bank(10));
    let service = QuizLoopService::from_storage(
        fixed_clock(),
        settings_with_batch(3),
        &Storage::from_repository(repo.clone()),
    );
    let mut session = ready(&service, None).await;
    answer_all_correctly(&service, &mut session).await;

    let completion = service.completion(&session).unwrap();
    assert_eq!(completion.correct, 3);
    assert!(!completion.celebrate);
    assert_eq!(repo.load_scores().await.unwrap().get(today()), 3);
}

#[tokio::test]
async fn reopening_a_finalized_session_adds_nothing() {
    let repo = InMemoryRepository::with_questions(build_bank(10));
    let service = QuizLoopService::from_storage(
        fixed_clock(),
        QuizSettings::default(),
        &Storage::from_repository(repo.clone()),
    );
    let mut session = ready(&service, None).await;
    answer_all_correctly(&service, &mut session).await;
    assert_eq!(repo.load_scores().await.unwrap().get(today()), 5);

    let mut later = fixed_clock();
    later.advance(Duration::hours(2));
    let reopened = ready(&service.clone().with_clock(later), Some(session.clone())).await;
    assert!(reopened.is_finalized());
    assert_eq!(reopened, session);

    let mut reopened = reopened;
    let err = service.answer_current(&mut reopened, "doğru").await.unwrap_err();
    assert!(matches!(err, SessionError::Completed));
    assert_eq!(repo.load_scores().await.unwrap().get(today()), 5);
}

#[tokio::test]
async fn solved_questions_are_never_redrawn() {
    let repo = InMemoryRepository::with_questions(build_bank(15));
    let service = QuizLoopService::from_storage(
        fixed_clock(),
        QuizSettings::default(),
        &Storage::from_repository(repo.clone()),
    );

    let mut clock = fixed_clock();
    let mut previous = None;
    let mut seen = HashSet::new();
    for _ in 0..3 {
        let day = service.clone().with_clock(clock);
        let mut session = ready(&day, previous.take()).await;
        for q in session.questions() {
            assert!(seen.insert(q.id().clone()), "{:?} drawn twice", q.id());
        }
        answer_all_correctly(&day, &mut session).await;
        previous = Some(session);
        clock.advance(Duration::days(1));
    }

    let day = service.clone().with_clock(clock);
    assert_eq!(
        open(&day, previous).await,
        SessionOpening::Exhausted { remaining: 0 }
    );
}

/// Wraps the in-memory repository and fails weekly-score writes on demand.
#[derive(Clone)]
struct FlakyScores {
    inner: InMemoryRepository,
    fail: Arc<AtomicBool>,
}

#[async_trait]
impl WeeklyScoreRepository for FlakyScores {
    async fn load_scores(&self) -> Result<WeeklyScores, StorageError> {
        self.inner.load_scores().await
    }

    async fn save_scores(&self, scores: &WeeklyScores) -> Result<(), StorageError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(StorageError::Io("disk full".into()));
        }
        self.inner.save_scores(scores).await
    }
}

#[tokio::test]
async fn failed_write_leaves_session_unchanged_and_retry_counts_once() {
    let repo = InMemoryRepository::with_questions(build_bank(5));
    let fail = Arc::new(AtomicBool::new(false));
    let flaky = FlakyScores {
        inner: repo.clone(),
        fail: Arc::clone(&fail),
    };
    let service = QuizLoopService::new(
        fixed_clock(),
        QuizSettings::default(),
        Arc::new(repo.clone()) as Arc<dyn QuestionRepository>,
        Arc::new(repo.clone()) as Arc<dyn AskedLogRepository>,
        Arc::new(flaky) as Arc<dyn WeeklyScoreRepository>,
        Arc::new(repo.clone()) as Arc<dyn WrongLogRepository>,
    );

    let mut session = ready(&service, None).await;
    for _ in 0..4 {
        service.answer_current(&mut session, "doğru").await.unwrap();
    }

    fail.store(true, Ordering::SeqCst);
    let before = session.clone();
    let err = service.answer_current(&mut session, "doğru").await.unwrap_err();
    assert!(matches!(err, SessionError::Storage(_)));
    assert_eq!(session, before);
    assert_eq!(repo.load_scores().await.unwrap().get(today()), 0);
    // the asked write that preceded the failure is kept
    assert_eq!(repo.load_asked().await.unwrap().len(), 5);

    fail.store(false, Ordering::SeqCst);
    let result = service.answer_current(&mut session, "doğru").await.unwrap();
    assert_eq!(result.completion.unwrap().correct, 5);
    assert_eq!(repo.load_scores().await.unwrap().get(today()), 5);
    assert_eq!(repo.load_asked().await.unwrap(), AskedLog::from_persisted(
        session.questions().iter().map(|q| q.id().clone()),
    ));
}
