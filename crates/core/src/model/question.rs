use std::collections::HashSet;

use thiserror::Error;

use crate::model::ids::QuestionId;

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// A multiple-choice question from the bank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    id: QuestionId,
    prompt: String,
    choices: Vec<String>,
    answer: String,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question {id} has no choices")]
    NoChoices { id: QuestionId },

    #[error("question {id}: correct answer is not one of the choices")]
    AnswerNotInChoices { id: QuestionId },

    #[error("duplicate question id {id}")]
    DuplicateId { id: QuestionId },
}

impl Question {
    /// Build a question, checking that the correct answer is one of the choices.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::NoChoices` when `choices` is empty and
    /// `QuestionError::AnswerNotInChoices` when `answer` does not match any choice.
    pub fn new(
        id: QuestionId,
        prompt: impl Into<String>,
        choices: Vec<String>,
        answer: impl Into<String>,
    ) -> Result<Self, QuestionError> {
        let answer = answer.into();
        if choices.is_empty() {
            return Err(QuestionError::NoChoices { id });
        }
        if !choices.iter().any(|c| *c == answer) {
            return Err(QuestionError::AnswerNotInChoices { id });
        }
        Ok(Self {
            id,
            prompt: prompt.into(),
            choices,
            answer,
        })
    }

    #[must_use]
    pub fn id(&self) -> &QuestionId {
        &self.id
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn choices(&self) -> &[String] {
        &self.choices
    }

    #[must_use]
    pub fn answer(&self) -> &str {
        &self.answer
    }

    /// Exact string comparison against the correct choice.
    #[must_use]
    pub fn is_correct(&self, choice: &str) -> bool {
        self.answer == choice
    }
}

//
// ─── QUESTION BANK ─────────────────────────────────────────────────────────────
//

/// The full question bank, in file order, with unique ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuestionBank {
    questions: Vec<Question>,
}

impl QuestionBank {
    /// # Errors
    ///
    /// Returns `QuestionError::DuplicateId` if two questions share an id.
    pub fn new(questions: Vec<Question>) -> Result<Self, QuestionError> {
        let mut seen = HashSet::with_capacity(questions.len());
        for question in &questions {
            if !seen.insert(question.id()) {
                return Err(QuestionError::DuplicateId {
                    id: question.id().clone(),
                });
            }
        }
        Ok(Self { questions })
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn get(&self, id: &QuestionId) -> Option<&Question> {
        self.questions.iter().find(|q| q.id() == id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Question> {
        self.questions.iter()
    }
}
