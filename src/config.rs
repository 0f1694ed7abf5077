//! Runtime configuration read from the environment.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;
use crate::types::{Question, QuestionInput};

/// Timing and sequencing knobs for every room
#[derive(Debug, Clone)]
pub struct GameConfig {
    /// How long a round accepts answers before the timeout watcher resolves it
    pub round_duration: Duration,
    /// Pause between a resolved round and the next one
    pub settle_delay: Duration,
    /// Participants required before a game starts on its own
    pub auto_start_threshold: usize,
    /// Upper bound on questions per game (also bounded by pool size)
    pub max_questions_per_game: u32,
    pub shuffle_questions: bool,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            round_duration: Duration::from_secs(10),
            settle_delay: Duration::from_millis(1500),
            auto_start_threshold: 3,
            max_questions_per_game: 10,
            shuffle_questions: true,
        }
    }
}

impl GameConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let config = Self {
            round_duration: Duration::from_secs(env_or(
                "QUIZ_ROUND_SECONDS",
                defaults.round_duration.as_secs(),
            )),
            settle_delay: Duration::from_millis(env_or(
                "QUIZ_SETTLE_MS",
                defaults.settle_delay.as_millis() as u64,
            )),
            auto_start_threshold: env_or("QUIZ_AUTO_START_THRESHOLD", defaults.auto_start_threshold),
            max_questions_per_game: env_or("QUIZ_MAX_QUESTIONS", defaults.max_questions_per_game),
            shuffle_questions: env_or("QUIZ_SHUFFLE", defaults.shuffle_questions),
        };

        tracing::info!(
            "Game config: round={:?}, settle={:?}, auto_start_at={}, max_questions={}, shuffle={}",
            config.round_duration,
            config.settle_delay,
            config.auto_start_threshold,
            config.max_questions_per_game,
            config.shuffle_questions
        );
        config
    }
}

/// Process-level settings
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub static_dir: PathBuf,
    /// JSON file of questions seeded into every new room
    pub question_file: Option<PathBuf>,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let question_file = std::env::var("QUIZ_QUESTIONS_FILE")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .map(PathBuf::from);

        Self {
            port: env_or("PORT", 8000),
            static_dir: std::env::var("QUIZ_STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("static")),
            question_file,
        }
    }
}

/// Read a seed question file (a JSON array of `{text, choices, correct_index}`).
///
/// Every entry is validated up front so a bad file fails at startup rather
/// than when a room is created.
pub fn load_question_file(path: &Path) -> Result<Vec<QuestionInput>, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let inputs: Vec<QuestionInput> = serde_json::from_str(&raw)?;

    for (index, input) in inputs.iter().enumerate() {
        Question::from_input(input.clone())
            .map_err(|source| ConfigError::InvalidQuestion { index, source })?;
    }

    tracing::info!("Loaded {} seed questions from {}", inputs.len(), path.display());
    Ok(inputs)
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                tracing::warn!("Ignoring unparseable {}={:?}, using default", key, raw);
                default
            }
        },
        Err(_) => default,
    }
}
