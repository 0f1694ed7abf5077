//! Room orchestration: joins and leaves, game start, round chaining and game over.
//!
//! Every operation takes the room's lock, mutates the `Room` aggregate, and
//! emits the resulting events while still holding it, so events for one room
//! go out in the order the state changed. Two kinds of scheduled work exist:
//! the round timeout watcher and the settle delay between rounds. Both
//! re-check the room when they wake and do nothing if they are stale.

use tokio::time::Instant;

use super::room::{NextStep, Room, RoundResolution};
use super::AppState;
use crate::error::GameError;
use crate::protocol::{AnswerInfo, QuestionInfo, ServerMessage};
use crate::types::*;

impl AppState {
    /// Add a participant to a room (creating the room if needed) and start a
    /// game once enough people are present.
    pub async fn join(&self, room_id: &RoomId, name: String, is_moderator: bool) -> Participant {
        let room_lock = self.get_or_create_room(room_id).await;
        let mut room = room_lock.lock().await;

        let participant = room.participants.join(name, is_moderator);
        tracing::info!(
            "{} joined room {} as {} (moderator: {}, {} present)",
            participant.name,
            room_id,
            participant.id,
            is_moderator,
            room.participants.len()
        );
        self.broadcast_roster(&room).await;

        if room.should_auto_start(&self.config) {
            tracing::info!("Auto-starting game in room {}", room_id);
            if let Err(e) = self.begin_game(&mut room).await {
                tracing::warn!("Auto-start in room {} failed: {}", room_id, e);
            }
        }

        participant
    }

    /// Remove a participant. Returns `None` if they were already gone.
    ///
    /// An open round keeps counting them toward its quorum; it will time out
    /// instead of waiting for their answer. The last one out of an idle room
    /// drops it.
    pub async fn leave(
        &self,
        room_id: &RoomId,
        participant_id: &ParticipantId,
    ) -> Option<Participant> {
        let removed = {
            let room_lock = self.get_room(room_id).await?;
            let mut room = room_lock.lock().await;

            let removed = room.participants.leave(participant_id)?;
            tracing::info!(
                "{} ({}) left room {} ({} remaining)",
                removed.name,
                removed.id,
                room_id,
                room.participants.len()
            );
            self.broadcast_roster(&room).await;
            removed
        };

        self.prune_room_if_idle(room_id).await;
        Some(removed)
    }

    /// Moderator-only: start a game even below the auto-start threshold
    pub async fn start_game(
        &self,
        room_id: &RoomId,
        requester: &ParticipantId,
    ) -> Result<RoundId, GameError> {
        let room_lock = self.get_room(room_id).await.ok_or(GameError::NotInRoom)?;
        let mut room = room_lock.lock().await;

        if let Err(e) = room.authorize_start(requester) {
            tracing::warn!("Start rejected in room {} for {}: {}", room_id, requester, e);
            return Err(e);
        }

        tracing::info!("Moderator {} started a game in room {}", requester, room_id);
        self.begin_game(&mut room).await
    }

    /// Accept an answer for the room's current round. Resolves the round when
    /// this was the last eligible participant to answer.
    pub async fn submit_answer(
        &self,
        room_id: &RoomId,
        participant_id: &ParticipantId,
        round_id: &RoundId,
        selected_index: usize,
    ) -> Result<AnswerRecord, GameError> {
        let room_lock = self.get_room(room_id).await.ok_or(GameError::NotInRoom)?;
        let mut room = room_lock.lock().await;

        let submitted =
            match room.submit_answer(participant_id, round_id, selected_index, Instant::now()) {
                Ok(s) => s,
                Err(e) => {
                    tracing::warn!(
                        "Answer from {} in room {} rejected: {}",
                        participant_id,
                        room_id,
                        e
                    );
                    return Err(e);
                }
            };

        let record = submitted.record;
        tracing::debug!(
            "{} answered {} in {:?}: correct={}, points={}",
            participant_id,
            selected_index,
            record.elapsed,
            record.is_correct,
            record.points
        );
        self.gateway
            .emit_to_room(
                room_id,
                ServerMessage::PlayerAnswered {
                    round_id: round_id.clone(),
                    participant_id: participant_id.clone(),
                    correct: record.is_correct,
                    points: record.points,
                    elapsed_ms: record.elapsed.as_millis() as u64,
                },
            )
            .await;

        if submitted.all_answered {
            if let Some(resolution) = room.resolve_round(round_id, ResolveTrigger::AllAnswered) {
                self.finish_round(&mut room, resolution).await;
            }
        }

        Ok(record)
    }

    /// Try to close a round. Both the timeout watcher and the all-answered path
    /// end up here; only the first call for a round returns `true` and emits
    /// the results.
    pub async fn resolve_round(
        &self,
        room_id: &RoomId,
        round_id: &RoundId,
        trigger: ResolveTrigger,
    ) -> bool {
        let resolved = {
            let Some(room_lock) = self.get_room(room_id).await else {
                return false;
            };
            let mut room = room_lock.lock().await;

            let resolution = room.resolve_round(round_id, trigger);
            match resolution {
                Some(resolution) => {
                    self.finish_round(&mut room, resolution).await;
                    true
                }
                None => {
                    tracing::debug!(
                        "Ignoring {:?} for round {} in room {}: already resolved or superseded",
                        trigger,
                        round_id,
                        room_id
                    );
                    false
                }
            }
        };

        // A game that ran out after everyone left leaves an empty room behind
        if resolved {
            self.prune_room_if_idle(room_id).await;
        }
        resolved
    }

    /// Add a question to a room's pool. Mid-game additions wait for the next game.
    pub async fn add_question(
        &self,
        room_id: &RoomId,
        input: QuestionInput,
    ) -> Result<Question, GameError> {
        let question = Question::from_input(input)?;

        let room_lock = self.get_or_create_room(room_id).await;
        let mut room = room_lock.lock().await;

        room.add_question(question.clone());
        if room.game_started {
            tracing::info!(
                "Question {} queued in room {} for the next game",
                question.id,
                room_id
            );
        } else {
            tracing::info!("Question {} added to room {}", question.id, room_id);
        }

        // Participants may have been waiting for the first question
        if room.should_auto_start(&self.config) {
            tracing::info!("Auto-starting game in room {}", room_id);
            if let Err(e) = self.begin_game(&mut room).await {
                tracing::warn!("Auto-start in room {} failed: {}", room_id, e);
            }
        }

        Ok(question)
    }

    async fn broadcast_roster(&self, room: &Room) {
        self.gateway
            .emit_to_room(
                &room.id,
                ServerMessage::ParticipantsUpdate {
                    participants: room.participants.roster(),
                },
            )
            .await;
        self.broadcast_leaderboard(room).await;
    }

    async fn broadcast_leaderboard(&self, room: &Room) {
        self.gateway
            .emit_to_room(
                &room.id,
                ServerMessage::Leaderboard {
                    entries: room.participants.leaderboard(),
                },
            )
            .await;
    }

    async fn begin_game(&self, room: &mut Room) -> Result<RoundId, GameError> {
        room.start_game(&self.config)?;
        tracing::info!(
            "Game {} started in room {}: {} questions, {} participants",
            room.game_epoch,
            room.id,
            room.question_budget,
            room.participants.len()
        );
        match self.open_round(room).await {
            Some(round_id) => Ok(round_id),
            None => {
                tracing::warn!("Room {} could not open a first round; game cancelled", room.id);
                room.end_game();
                Err(GameError::NoQuestions)
            }
        }
    }

    /// Open the next round, announce it and arm its timeout watcher
    async fn open_round(&self, room: &mut Room) -> Option<RoundId> {
        let total_rounds = room.question_budget;
        let round = room.open_next_round(Instant::now())?;

        let round_id = round.id.clone();
        let number = round.number;
        let eligible = round.eligible.len();
        let msg = ServerMessage::StartRound {
            round_id: round_id.clone(),
            round_no: number,
            total_rounds,
            question: QuestionInfo::from(&round.question),
            time_limit_secs: self.config.round_duration.as_secs(),
            server_now: chrono::Utc::now().to_rfc3339(),
        };
        tracing::info!(
            "Round {}/{} ({}) opened in room {} with {} eligible",
            number,
            total_rounds,
            round_id,
            room.id,
            eligible
        );

        self.gateway.emit_to_room(&room.id, msg).await;
        self.schedule_round_timeout(room.id.clone(), round_id.clone());
        Some(round_id)
    }

    async fn finish_round(&self, room: &mut Room, resolution: RoundResolution) {
        let summary = resolution.summary;
        tracing::info!(
            "Round {} (question {}) in room {} resolved by {:?} with {} answers",
            summary.round_id,
            summary.question_id,
            room.id,
            summary.resolved_by,
            summary.answers.len()
        );

        self.gateway
            .emit_to_room(
                &room.id,
                ServerMessage::RoundResult {
                    round_id: summary.round_id,
                    correct_index: summary.correct_index,
                    resolved_by: summary.resolved_by,
                    answers: summary.answers.into_iter().map(AnswerInfo::from).collect(),
                },
            )
            .await;
        self.broadcast_leaderboard(room).await;

        match resolution.next {
            NextStep::NextRound { epoch } => self.schedule_next_round(room.id.clone(), epoch),
            NextStep::GameOver(outcome) => self.announce_game_over(room, outcome).await,
        }
    }

    async fn announce_game_over(&self, room: &Room, outcome: GameOutcome) {
        let message = outcome.to_string();
        tracing::info!("Game over in room {}: {}", room.id, message);

        self.gateway
            .emit_to_room(
                &room.id,
                ServerMessage::GameOver {
                    outcome,
                    message,
                    leaderboard: room.participants.leaderboard(),
                },
            )
            .await;
    }

    /// Chained by the settle delay after a round resolved
    async fn open_next_round(&self, room_id: &RoomId, epoch: u64) {
        let Some(room_lock) = self.get_room(room_id).await else {
            return;
        };
        let mut room = room_lock.lock().await;

        if !room.game_started || room.game_epoch != epoch || room.active_round().is_some() {
            tracing::debug!("Discarding stale round chain for room {}", room_id);
            return;
        }

        if self.open_round(&mut room).await.is_none() {
            tracing::warn!("Room {} ran out of questions mid-game", room_id);
            let outcome = room.end_game();
            self.announce_game_over(&room, outcome).await;
        }
    }

    fn schedule_round_timeout(&self, room_id: RoomId, round_id: RoundId) {
        let state = self.clone();
        let delay = self.config.round_duration;

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if state
                .resolve_round(&room_id, &round_id, ResolveTrigger::Timeout)
                .await
            {
                tracing::debug!("Round {} in room {} timed out", round_id, room_id);
            }
        });
    }

    fn schedule_next_round(&self, room_id: RoomId, epoch: u64) {
        let state = self.clone();
        let delay = self.config.settle_delay;

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            state.open_next_round(&room_id, epoch).await;
        });
    }
}
