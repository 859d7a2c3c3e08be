mod ids;
mod progress;
mod question;
mod session;
mod settings;

pub use ids::QuestionId;
pub use progress::{AskedLog, DailyScore, WeeklyScores, WrongEntry, WrongLog};
pub use question::{Question, QuestionBank, QuestionError};
pub use session::{
    DEFAULT_EVENING_START, DEFAULT_MORNING_START, SessionKey, SessionType, SessionWindow,
};
pub use settings::{
    DEFAULT_BATCH_SIZE, DEFAULT_CELEBRATION_THRESHOLD, DEFAULT_UTC_OFFSET_MINUTES, QuizSettings,
    QuizSettingsDraft, SettingsError, parse_time_of_day, parse_utc_offset_minutes,
};
