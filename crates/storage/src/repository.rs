use async_trait::async_trait;
use quiz_core::model::{AskedLog, QuestionBank, WeeklyScores, WrongLog};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("io error: {0}")]
    Io(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("invalid record: {0}")]
    InvalidRecord(String),

    #[error("connection error: {0}")]
    Connection(String),
}

/// Read access to the question bank (plus a writer used for seeding).
#[async_trait]
pub trait QuestionRepository: Send + Sync {
    /// Load the whole bank.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the document cannot be read, parsed or validated.
    async fn load_questions(&self) -> Result<QuestionBank, StorageError>;

    /// Replace the whole bank.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the document cannot be written.
    async fn save_questions(&self, bank: &QuestionBank) -> Result<(), StorageError>;
}

/// Ids answered correctly at least once.
#[async_trait]
pub trait AskedLogRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` if the document cannot be read or parsed.
    async fn load_asked(&self) -> Result<AskedLog, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the document cannot be written.
    async fn save_asked(&self, log: &AskedLog) -> Result<(), StorageError>;
}

/// Correct answers per calendar day.
#[async_trait]
pub trait WeeklyScoreRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` if the document cannot be read or parsed.
    async fn load_scores(&self) -> Result<WeeklyScores, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the document cannot be written.
    async fn save_scores(&self, scores: &WeeklyScores) -> Result<(), StorageError>;
}

/// First-miss records for questions answered incorrectly.
#[async_trait]
pub trait WrongLogRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` if the document cannot be read or parsed.
    async fn load_wrong(&self) -> Result<WrongLog, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the document cannot be written.
    async fn save_wrong(&self, log: &WrongLog) -> Result<(), StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    questions: Arc<Mutex<QuestionBank>>,
    asked: Arc<Mutex<AskedLog>>,
    scores: Arc<Mutex<WeeklyScores>>,
    wrong: Arc<Mutex<WrongLog>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from the given bank instead of an empty one.
    #[must_use]
    pub fn with_questions(bank: QuestionBank) -> Self {
        Self {
            questions: Arc::new(Mutex::new(bank)),
            ..Self::default()
        }
    }
}

fn read<T: Clone>(slot: &Mutex<T>) -> Result<T, StorageError> {
    slot.lock()
        .map(|guard| guard.clone())
        .map_err(|e| StorageError::Connection(e.to_string()))
}

fn write<T: Clone>(slot: &Mutex<T>, value: &T) -> Result<(), StorageError> {
    let mut guard = slot
        .lock()
        .map_err(|e| StorageError::Connection(e.to_string()))?;
    *guard = value.clone();
    Ok(())
}

#[async_trait]
impl QuestionRepository for InMemoryRepository {
    async fn load_questions(&self) -> Result<QuestionBank, StorageError> {
        read(&self.questions)
    }

    async fn save_questions(&self, bank: &QuestionBank) -> Result<(), StorageError> {
        write(&self.questions, bank)
    }
}

#[async_trait]
impl AskedLogRepository for InMemoryRepository {
    async fn load_asked(&self) -> Result<AskedLog, StorageError> {
        read(&self.asked)
    }

    async fn save_asked(&self, log: &AskedLog) -> Result<(), StorageError> {
        write(&self.asked, log)
    }
}

#[async_trait]
impl WeeklyScoreRepository for InMemoryRepository {
    async fn load_scores(&self) -> Result<WeeklyScores, StorageError> {
        read(&self.scores)
    }

    async fn save_scores(&self, scores: &WeeklyScores) -> Result<(), StorageError> {
        write(&self.scores, scores)
    }
}

#[async_trait]
impl WrongLogRepository for InMemoryRepository {
    async fn load_wrong(&self) -> Result<WrongLog, StorageError> {
        read(&self.wrong)
    }

    async fn save_wrong(&self, log: &WrongLog) -> Result<(), StorageError> {
        write(&self.wrong, log)
    }
}

/// Aggregates the four document repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub questions: Arc<dyn QuestionRepository>,
    pub asked: Arc<dyn AskedLogRepository>,
    pub scores: Arc<dyn WeeklyScoreRepository>,
    pub wrong: Arc<dyn WrongLogRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        Self::from_repository(InMemoryRepository::new())
    }

    /// Use one repository value for all four documents.
    #[must_use]
    pub fn from_repository<R>(repo: R) -> Self
    where
        R: QuestionRepository
            + AskedLogRepository
            + WeeklyScoreRepository
            + WrongLogRepository
            + Clone
            + 'static,
    {
        let questions: Arc<dyn QuestionRepository> = Arc::new(repo.clone());
        let asked: Arc<dyn AskedLogRepository> = Arc::new(repo.clone());
        let scores: Arc<dyn WeeklyScoreRepository> = Arc::new(repo.clone());
        let wrong: Arc<dyn WrongLogRepository> = Arc::new(repo);
        Self {
            questions,
            asked,
            scores,
            wrong,
        }
    }
}
