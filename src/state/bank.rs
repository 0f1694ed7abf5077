//! Per-game question deck
//!
//! Built from the room's pool when a game starts. The cursor only moves
//! forward, so a question can't be served twice in the same game.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::types::Question;

#[derive(Debug, Clone, Default)]
pub struct QuestionBank {
    questions: Vec<Question>,
    cursor: usize,
}

impl QuestionBank {
    /// Deck in the given order
    pub fn new(questions: Vec<Question>) -> Self {
        Self {
            questions,
            cursor: 0,
        }
    }

    /// Deck in a random order
    pub fn shuffled<R: Rng + ?Sized>(pool: &[Question], rng: &mut R) -> Self {
        let mut questions = pool.to_vec();
        questions.shuffle(rng);
        Self::new(questions)
    }

    /// Serve the question under the cursor and advance. `None` once exhausted;
    /// the deck never wraps.
    pub fn next_question(&mut self) -> Option<&Question> {
        let question = self.questions.get(self.cursor)?;
        self.cursor += 1;
        Some(question)
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn remaining(&self) -> usize {
        self.questions.len() - self.cursor
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Rewind to the first question
    pub fn reset(&mut self) {
        self.cursor = 0;
    }
}
