use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::error::GameError;

/// Opaque, string-backed identifier types.
///
/// Server-generated ids are ULIDs; room ids come from clients as-is.
macro_rules! opaque_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Allocate a fresh, globally unique id
            pub fn generate() -> Self {
                Self(ulid::Ulid::new().to_string())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

opaque_id!(
    /// Identifies an isolated game session
    RoomId
);
opaque_id!(
    /// Identifies a participant across all rooms
    ParticipantId
);
opaque_id!(QuestionId);
opaque_id!(
    /// Fresh per round; used to reject late or duplicated signals
    RoundId
);

/// A multiple-choice question. Immutable once loaded into a room.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Question {
    pub id: QuestionId,
    pub text: String,
    pub choices: Vec<String>,
    pub correct_index: usize,
}

/// Question payload as accepted from the admin surface or the seed file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuestionInput {
    pub text: String,
    pub choices: Vec<String>,
    pub correct_index: usize,
}

impl Question {
    /// Validate an input and assign it a fresh id
    pub fn from_input(input: QuestionInput) -> Result<Self, GameError> {
        let text = input.text.trim().to_string();
        if text.is_empty() {
            return Err(GameError::InvalidQuestion(
                "question text cannot be empty".to_string(),
            ));
        }
        if input.choices.len() < 2 {
            return Err(GameError::InvalidQuestion(format!(
                "at least 2 choices required (got {})",
                input.choices.len()
            )));
        }
        if input.correct_index >= input.choices.len() {
            return Err(GameError::InvalidQuestion(format!(
                "correct_index {} out of range for {} choices",
                input.correct_index,
                input.choices.len()
            )));
        }

        Ok(Self {
            id: QuestionId::generate(),
            text,
            choices: input.choices,
            correct_index: input.correct_index,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Participant {
    pub id: ParticipantId,
    pub name: String,
    pub score: u32,
    pub is_moderator: bool,
    /// Join order within the room, used to break leaderboard ties
    #[serde(skip)]
    pub seq: u64,
}

/// Outcome of a single accepted answer. Written once per participant per round.
#[derive(Debug, Clone, PartialEq)]
pub struct AnswerRecord {
    pub selected_index: usize,
    pub elapsed: Duration,
    pub is_correct: bool,
    pub points: u32,
}

/// Which path closed a round
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ResolveTrigger {
    Timeout,
    AllAnswered,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LeaderboardEntry {
    pub id: ParticipantId,
    pub name: String,
    pub score: u32,
}

/// End-of-game result
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GameOutcome {
    Winners {
        participant_ids: Vec<ParticipantId>,
        names: Vec<String>,
        score: u32,
    },
    NoParticipants,
}

impl fmt::Display for GameOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameOutcome::Winners { names, score, .. } if names.len() == 1 => {
                write!(f, "winner: {} ({} points)", names[0], score)
            }
            GameOutcome::Winners { names, score, .. } => {
                write!(f, "winners (tie): {} ({} points)", names.join(", "), score)
            }
            GameOutcome::NoParticipants => f.write_str("winner: (no participants)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(text: &str, choices: &[&str], correct_index: usize) -> QuestionInput {
        QuestionInput {
            text: text.to_string(),
            choices: choices.iter().map(|c| c.to_string()).collect(),
            correct_index,
        }
    }

    #[test]
    fn test_question_from_input_trims_and_assigns_id() {
        let q = Question::from_input(input("  What is 2+2? ", &["3", "4"], 1)).unwrap();
        assert_eq!(q.text, "What is 2+2?");
        assert_eq!(q.correct_index, 1);
        assert!(!q.id.as_str().is_empty());
    }

    #[test]
    fn test_question_from_input_rejects_bad_payloads() {
        assert!(Question::from_input(input("   ", &["a", "b"], 0)).is_err());
        assert!(Question::from_input(input("Q", &["only"], 0)).is_err());

        let err = Question::from_input(input("Q", &["a", "b"], 2)).unwrap_err();
        assert_eq!(err.code(), "INVALID_QUESTION");
    }

    #[test]
    fn test_ids_serialize_as_plain_strings() {
        let id = RoundId::from("01ROUND");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"01ROUND\"");
    }

    #[test]
    fn test_outcome_messages() {
        let single = GameOutcome::Winners {
            participant_ids: vec![ParticipantId::from("a")],
            names: vec!["Alice".to_string()],
            score: 5,
        };
        assert_eq!(single.to_string(), "winner: Alice (5 points)");

        let tie = GameOutcome::Winners {
            participant_ids: vec![ParticipantId::from("a"), ParticipantId::from("b")],
            names: vec!["Alice".to_string(), "Bob".to_string()],
            score: 5,
        };
        assert_eq!(tie.to_string(), "winners (tie): Alice, Bob (5 points)");

        assert_eq!(
            GameOutcome::NoParticipants.to_string(),
            "winner: (no participants)"
        );
    }
}
