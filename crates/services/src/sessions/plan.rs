use rand::Rng;
use rand::seq::SliceRandom;

use quiz_core::model::{AskedLog, Question, QuestionBank};

/// Outcome of drawing a session's questions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchSelection {
    /// Exactly `batch_size` unseen questions in session order.
    Drawn(Vec<Question>),
    /// Fewer unseen questions remain than a batch needs.
    Exhausted { remaining: usize },
}

/// Draws a fixed-size random batch from questions not yet answered correctly.
#[derive(Debug, Clone, Copy)]
pub struct BatchSelector {
    batch_size: usize,
}

impl BatchSelector {
    #[must_use]
    pub fn new(batch_size: u32) -> Self {
        Self {
            batch_size: usize::try_from(batch_size).unwrap_or(usize::MAX),
        }
    }

    #[must_use]
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Bank questions whose ids are not in the asked log, in bank order.
    #[must_use]
    pub fn remaining<'b>(bank: &'b QuestionBank, asked: &AskedLog) -> Vec<&'b Question> {
        bank.iter().filter(|q| !asked.contains(q.id())).collect()
    }

    /// Shuffle the remaining pool and take a batch, or report exhaustion.
    pub fn select<R: Rng + ?Sized>(
        &self,
        bank: &QuestionBank,
        asked: &AskedLog,
        rng: &mut R,
    ) -> BatchSelection {
        let mut remaining: Vec<Question> = Self::remaining(bank, asked)
            .into_iter()
            .cloned()
            .collect();

        if remaining.len() < self.batch_size {
            return BatchSelection::Exhausted {
                remaining: remaining.len(),
            };
        }

        remaining.shuffle(rng);
        remaining.truncate(self.batch_size);
        BatchSelection::Drawn(remaining)
    }
}
