use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a Question.
///
/// Question banks are hand-written JSON, so both integer (including negative) and string ids
/// are accepted. The original representation is kept so ids are written back unchanged.
/// Fractional ids are rejected when the bank is loaded.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QuestionId {
    Number(i64),
    Text(String),
}

impl QuestionId {
    /// Creates a numeric `QuestionId`
    #[must_use]
    pub fn new(id: i64) -> Self {
        Self::Number(id)
    }

    /// Creates a textual `QuestionId`
    #[must_use]
    pub fn text(id: impl Into<String>) -> Self {
        Self::Text(id.into())
    }
}

impl fmt::Debug for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "QuestionId({n})"),
            Self::Text(s) => write!(f, "QuestionId({s:?})"),
        }
    }
}

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => write!(f, "{s}"),
        }
    }
}
