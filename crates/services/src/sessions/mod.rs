mod plan;
mod progress;
mod service;
mod view;
mod workflow;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use plan::{BatchSelection, BatchSelector};
pub use progress::SessionProgress;
pub use service::{AnswerOutcome, QuizSession, SessionEffect, SessionState, Transition};
pub use view::{OverviewService, WeeklyOverview, WrongQuestionItem};
pub use workflow::{AnswerResult, Completion, QuizLoopService, SessionOpening};
