#![forbid(unsafe_code)]

pub mod app_services;
pub mod error;
pub mod sessions;

pub use quiz_core::Clock;
pub use sessions as session;

pub use app_services::AppServices;
pub use error::{AppServicesError, SessionError};

pub use sessions::{
    AnswerOutcome, AnswerResult, BatchSelection, BatchSelector, Completion, OverviewService,
    QuizLoopService, QuizSession, SessionEffect, SessionOpening, SessionProgress, SessionState,
    Transition, WeeklyOverview, WrongQuestionItem,
};
