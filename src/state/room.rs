//! Room aggregate: participants, question pool, game progress and the current round.
//!
//! All mutation goes through these methods while the orchestrator holds the
//! room's lock. Nothing here awaits or broadcasts.

use tokio::time::Instant;

use super::bank::QuestionBank;
use super::participant::ParticipantRegistry;
use super::round::{Round, RoundSummary};
use crate::config::GameConfig;
use crate::error::GameError;
use crate::scoring;
use crate::types::*;

#[derive(Debug)]
pub struct Room {
    pub id: RoomId,
    pub participants: ParticipantRegistry,
    /// Every question known to the room; the deck for each game is drawn from here
    pub pool: Vec<Question>,
    /// Pool size at creation (seed questions); anything beyond was added later
    seeded: usize,
    pub bank: QuestionBank,
    pub asked_count: u32,
    /// Questions this game will ask
    pub question_budget: u32,
    pub game_started: bool,
    /// Bumped on every game start so stale scheduled work can recognise itself
    pub game_epoch: u64,
    /// Most recent round; stays after resolution until the next one replaces it
    pub current_round: Option<Round>,
}

/// Result of an accepted answer
#[derive(Debug, Clone)]
pub struct SubmittedAnswer {
    pub record: AnswerRecord,
    pub all_answered: bool,
}

/// What the orchestrator does after a round resolved
#[derive(Debug, Clone, PartialEq)]
pub enum NextStep {
    /// Open another round after the settle delay (tagged with the game epoch)
    NextRound { epoch: u64 },
    GameOver(GameOutcome),
}

#[derive(Debug, Clone)]
pub struct RoundResolution {
    pub summary: RoundSummary,
    pub next: NextStep,
}

impl Room {
    pub fn new(id: RoomId, pool: Vec<Question>) -> Self {
        Self {
            id,
            participants: ParticipantRegistry::default(),
            seeded: pool.len(),
            pool,
            bank: QuestionBank::default(),
            asked_count: 0,
            question_budget: 0,
            game_started: false,
            game_epoch: 0,
            current_round: None,
        }
    }

    /// Append to the pool. During a game this only affects the next game's deck.
    pub fn add_question(&mut self, question: Question) {
        self.pool.push(question);
    }

    /// Nobody present, no game running and nothing added beyond the seed
    /// questions: dropping the room loses nothing.
    pub fn is_idle(&self) -> bool {
        self.participants.is_empty() && !self.game_started && self.pool.len() == self.seeded
    }

    /// The round that currently accepts answers, if any
    pub fn active_round(&self) -> Option<&Round> {
        self.current_round.as_ref().filter(|r| !r.is_resolved())
    }

    pub fn should_auto_start(&self, config: &GameConfig) -> bool {
        !self.game_started
            && !self.pool.is_empty()
            && config.max_questions_per_game > 0
            && self.participants.len() >= config.auto_start_threshold
    }

    /// Check the manual-start preconditions for `requester`
    pub fn authorize_start(&self, requester: &ParticipantId) -> Result<(), GameError> {
        if !self.participants.contains(requester) {
            return Err(GameError::NotInRoom);
        }
        if !self.participants.is_moderator(requester) {
            return Err(GameError::NotModerator);
        }
        if self.game_started {
            return Err(GameError::GameInProgress);
        }
        if self.pool.is_empty() {
            return Err(GameError::NoQuestions);
        }
        Ok(())
    }

    /// Deal a fresh deck and reset per-game progress. Scores from the previous
    /// game are cleared here rather than at game over.
    ///
    /// Fails without touching the room when the game would have no rounds.
    pub fn start_game(&mut self, config: &GameConfig) -> Result<(), GameError> {
        if self.game_started {
            return Err(GameError::GameInProgress);
        }
        let deck_size = u32::try_from(self.pool.len()).unwrap_or(u32::MAX);
        let budget = config.max_questions_per_game.min(deck_size);
        if budget == 0 {
            return Err(GameError::NoQuestions);
        }

        self.bank = if config.shuffle_questions {
            QuestionBank::shuffled(&self.pool, &mut rand::rng())
        } else {
            QuestionBank::new(self.pool.clone())
        };
        self.question_budget = budget;
        self.asked_count = 0;
        self.game_started = true;
        self.game_epoch += 1;
        self.current_round = None;
        self.participants.reset_scores();
        Ok(())
    }

    /// Open the next round with the next deck entry. Refuses while another
    /// round is still open, when no game runs, or when the deck is spent.
    pub fn open_next_round(&mut self, now: Instant) -> Option<&Round> {
        if !self.game_started || self.active_round().is_some() {
            return None;
        }
        if self.asked_count >= self.question_budget {
            return None;
        }

        let question = self.bank.next_question()?.clone();
        let round = Round::open(
            self.asked_count + 1,
            question,
            self.participants.ids(),
            now,
        );
        self.current_round = Some(round);
        self.current_round.as_ref()
    }

    /// Route an answer to the current round and credit any points right away
    pub fn submit_answer(
        &mut self,
        participant_id: &ParticipantId,
        round_id: &RoundId,
        selected_index: usize,
        now: Instant,
    ) -> Result<SubmittedAnswer, GameError> {
        if !self.participants.contains(participant_id) {
            return Err(GameError::NotInRoom);
        }
        let round = self
            .current_round
            .as_mut()
            .ok_or(GameError::NoActiveRound)?;

        let record = round.submit_answer(round_id, participant_id, selected_index, now)?;
        let all_answered = round.all_answered();

        if record.points > 0 {
            self.participants.credit(participant_id, record.points);
        }

        Ok(SubmittedAnswer {
            record,
            all_answered,
        })
    }

    /// Resolve `round_id` if it is the current round and still open.
    ///
    /// Returns `None` for every caller but the first, which gets the summary
    /// plus the decision of what comes next.
    pub fn resolve_round(
        &mut self,
        round_id: &RoundId,
        trigger: ResolveTrigger,
    ) -> Option<RoundResolution> {
        let round = self.current_round.as_mut().filter(|r| r.id == *round_id)?;
        let summary = round.try_resolve(trigger)?;

        self.asked_count += 1;
        let next = if self.asked_count >= self.question_budget || self.bank.remaining() == 0 {
            NextStep::GameOver(self.end_game())
        } else {
            NextStep::NextRound {
                epoch: self.game_epoch,
            }
        };

        Some(RoundResolution { summary, next })
    }

    /// Compute the outcome and make the room ready for another game.
    /// Participant scores survive until the next game starts.
    pub fn end_game(&mut self) -> GameOutcome {
        let outcome = scoring::winners(&self.participants.leaderboard());
        self.game_started = false;
        self.asked_count = 0;
        self.question_budget = 0;
        self.bank.reset();
        outcome
    }
}
