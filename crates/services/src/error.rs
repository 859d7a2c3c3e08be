//! Shared error types for the services crate.

use thiserror::Error;

use quiz_core::model::QuestionError;
use storage::repository::StorageError;

/// Errors emitted by session services.
///
/// Bank exhaustion and wrong answers are ordinary outcomes, not errors.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("no questions available for session")]
    Empty,
    #[error("session already completed")]
    Completed,
    #[error("transition was computed for a different session state")]
    StaleTransition,
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Question(#[from] QuestionError),
}
