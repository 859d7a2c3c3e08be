use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use log::debug;
use quiz_core::model::{AskedLog, QuestionBank, WeeklyScores, WrongLog};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::repository::{
    AskedLogRepository, QuestionRepository, Storage, StorageError, WeeklyScoreRepository,
    WrongLogRepository,
};

mod mapping;

use mapping::{QuestionRecord, ScoreRecords, WrongRecord};

pub const QUESTIONS_FILE: &str = "questions.json";
pub const ASKED_FILE: &str = "asked_questions.json";
pub const WEEKLY_FILE: &str = "weekly_scores.json";
pub const WRONG_FILE: &str = "wrong_questions.json";

/// Locations of the four documents inside a data directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentPaths {
    pub questions: PathBuf,
    pub asked: PathBuf,
    pub weekly: PathBuf,
    pub wrong: PathBuf,
}

impl DocumentPaths {
    #[must_use]
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            questions: dir.join(QUESTIONS_FILE),
            asked: dir.join(ASKED_FILE),
            weekly: dir.join(WEEKLY_FILE),
            wrong: dir.join(WRONG_FILE),
        }
    }
}

fn io_error(path: &Path, e: &std::io::Error) -> StorageError {
    StorageError::Io(format!("{}: {e}", path.display()))
}

fn ser_error(path: &Path, e: &serde_json::Error) -> StorageError {
    StorageError::Serialization(format!("{}: {e}", path.display()))
}

/// Overwrite `path` with pretty-printed JSON.
async fn write_document<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), StorageError> {
    let json = serde_json::to_string_pretty(value).map_err(|e| ser_error(path, &e))?;
    tokio::fs::write(path, json)
        .await
        .map_err(|e| io_error(path, &e))?;
    debug!("wrote {}", path.display());
    Ok(())
}

/// Read a whole document; a missing file is created with `default` and that value returned.
async fn load_document<T, F>(path: &Path, default: F) -> Result<T, StorageError>
where
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> T,
{
    match tokio::fs::read_to_string(path).await {
        Ok(raw) => {
            debug!("loaded {}", path.display());
            serde_json::from_str(&raw).map_err(|e| ser_error(path, &e))
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {
            let value = default();
            write_document(path, &value).await?;
            debug!("created {} with default content", path.display());
            Ok(value)
        }
        Err(e) => Err(io_error(path, &e)),
    }
}

/// Flat-file backend: one pretty-printed JSON document per collection.
///
/// Every load reads the whole file and every save rewrites it. There is no locking, so two
/// processes sharing a data directory can lose each other's updates.
#[derive(Debug, Clone)]
pub struct JsonFileRepository {
    paths: Arc<DocumentPaths>,
}

impl JsonFileRepository {
    #[must_use]
    pub fn new(paths: DocumentPaths) -> Self {
        Self {
            paths: Arc::new(paths),
        }
    }

    /// Create the data directory if needed.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Io` if the directory cannot be created.
    pub async fn open(dir: impl AsRef<Path>) -> Result<Self, StorageError> {
        let dir = dir.as_ref();
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| io_error(dir, &e))?;
        Ok(Self::new(DocumentPaths::in_dir(dir)))
    }

    #[must_use]
    pub fn paths(&self) -> &DocumentPaths {
        &self.paths
    }

    /// Touch every document so missing files are created with their defaults.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if any document is unreadable or malformed.
    pub async fn initialize(&self) -> Result<(), StorageError> {
        self.load_questions().await?;
        self.load_asked().await?;
        self.load_scores().await?;
        self.load_wrong().await?;
        Ok(())
    }
}

#[async_trait]
impl QuestionRepository for JsonFileRepository {
    async fn load_questions(&self) -> Result<QuestionBank, StorageError> {
        let records: Vec<QuestionRecord> = load_document(&self.paths.questions, Vec::new).await?;
        mapping::bank_from_records(records)
    }

    async fn save_questions(&self, bank: &QuestionBank) -> Result<(), StorageError> {
        write_document(&self.paths.questions, &mapping::bank_to_records(bank)).await
    }
}

#[async_trait]
impl AskedLogRepository for JsonFileRepository {
    async fn load_asked(&self) -> Result<AskedLog, StorageError> {
        let ids = load_document(&self.paths.asked, Vec::new).await?;
        Ok(mapping::asked_from_records(ids))
    }

    async fn save_asked(&self, log: &AskedLog) -> Result<(), StorageError> {
        write_document(&self.paths.asked, &mapping::asked_to_records(log)).await
    }
}

#[async_trait]
impl WeeklyScoreRepository for JsonFileRepository {
    async fn load_scores(&self) -> Result<WeeklyScores, StorageError> {
        let records: ScoreRecords = load_document(&self.paths.weekly, ScoreRecords::new).await?;
        mapping::scores_from_records(records)
    }

    async fn save_scores(&self, scores: &WeeklyScores) -> Result<(), StorageError> {
        write_document(&self.paths.weekly, &mapping::scores_to_records(scores)).await
    }
}

#[async_trait]
impl WrongLogRepository for JsonFileRepository {
    async fn load_wrong(&self) -> Result<WrongLog, StorageError> {
        let records: Vec<WrongRecord> = load_document(&self.paths.wrong, Vec::new).await?;
        mapping::wrong_from_records(records)
    }

    async fn save_wrong(&self, log: &WrongLog) -> Result<(), StorageError> {
        write_document(&self.paths.wrong, &mapping::wrong_to_records(log)).await
    }
}

impl Storage {
    /// Build a `Storage` backed by JSON documents in `dir`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the directory cannot be created or an existing
    /// document is malformed.
    pub async fn json_files(dir: impl AsRef<Path>) -> Result<Self, StorageError> {
        let repo = JsonFileRepository::open(dir).await?;
        repo.initialize().await?;
        Ok(Self::from_repository(repo))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use quiz_core::model::QuestionId;

    #[test]
    fn repository_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<JsonFileRepository>();
    }

    #[tokio::test]
    async fn missing_documents_are_created_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonFileRepository::open(dir.path()).await.unwrap();
        repo.initialize().await.unwrap();

        let paths = repo.paths();
        assert_eq!(std::fs::read_to_string(&paths.questions).unwrap(), "[]");
        assert_eq!(std::fs::read_to_string(&paths.asked).unwrap(), "[]");
        assert_eq!(std::fs::read_to_string(&paths.weekly).unwrap(), "{}");
        assert_eq!(std::fs::read_to_string(&paths.wrong).unwrap(), "[]");
    }

    #[tokio::test]
    async fn malformed_document_is_a_serialization_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(ASKED_FILE), "{ not json").unwrap();
        let repo = JsonFileRepository::open(dir.path()).await.unwrap();

        let err = repo.load_asked().await.unwrap_err();
        assert!(matches!(err, StorageError::Serialization(_)));
    }

    #[tokio::test]
    async fn scores_are_pretty_printed_with_iso_dates() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonFileRepository::open(dir.path()).await.unwrap();

        let mut scores = repo.load_scores().await.unwrap();
        scores.add(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(), 4);
        repo.save_scores(&scores).await.unwrap();

        let raw = std::fs::read_to_string(&repo.paths().weekly).unwrap();
        assert_eq!(raw, "{\n  \"2024-03-01\": 4\n}");
    }

    #[tokio::test]
    async fn wrong_log_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonFileRepository::open(dir.path()).await.unwrap();

        let mut log = repo.load_wrong().await.unwrap();
        log.record(QuestionId::text("q-1"), NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        repo.save_wrong(&log).await.unwrap();

        let reloaded = JsonFileRepository::open(dir.path()).await.unwrap();
        assert_eq!(reloaded.load_wrong().await.unwrap(), log);
    }
}
