//! Rejected actions and configuration failures.
//!
//! None of these are fatal: a rejected action leaves room state untouched and is
//! reported to the acting participant as an `error_msg`.

use thiserror::Error;

use crate::types::RoundId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("Only a moderator can start a round")]
    NotModerator,

    #[error("This room has no questions")]
    NoQuestions,

    #[error("A game is already running in this room")]
    GameInProgress,

    #[error("Participant is not in this room")]
    NotInRoom,

    #[error("Join a room first")]
    NotJoined,

    #[error("This connection already joined a room")]
    AlreadyJoined,

    #[error("No round is active")]
    NoActiveRound,

    #[error("Round {0} is not the active round")]
    StaleRound(RoundId),

    #[error("Round already resolved")]
    AlreadyResolved,

    #[error("Already answered this round")]
    DuplicateAnswer,

    #[error("Joined after this round opened; wait for the next one")]
    NotEligible,

    #[error("Invalid question: {0}")]
    InvalidQuestion(String),
}

impl GameError {
    /// Stable machine-readable code for `error_msg`
    pub fn code(&self) -> &'static str {
        match self {
            GameError::NotModerator => "NOT_MODERATOR",
            GameError::NoQuestions => "NO_QUESTIONS",
            GameError::GameInProgress => "GAME_IN_PROGRESS",
            GameError::NotInRoom => "NOT_IN_ROOM",
            GameError::NotJoined => "NOT_JOINED",
            GameError::AlreadyJoined => "ALREADY_JOINED",
            GameError::NoActiveRound => "NO_ACTIVE_ROUND",
            GameError::StaleRound(_) => "STALE_ROUND",
            GameError::AlreadyResolved => "ALREADY_RESOLVED",
            GameError::DuplicateAnswer => "DUPLICATE_ANSWER",
            GameError::NotEligible => "NOT_ELIGIBLE",
            GameError::InvalidQuestion(_) => "INVALID_QUESTION",
        }
    }
}

/// Errors loading startup configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse question file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Question #{index} in file is invalid: {source}")]
    InvalidQuestion {
        index: usize,
        #[source]
        source: GameError,
    },
}
