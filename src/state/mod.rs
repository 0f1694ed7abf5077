pub mod bank;
mod game;
pub mod participant;
pub mod room;
pub mod round;

use crate::broadcast::Gateway;
use crate::config::GameConfig;
use crate::types::*;
use room::Room;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// Shared application state
///
/// Each room sits behind its own mutex, so operations on one room are
/// serialized while other rooms proceed independently.
#[derive(Clone)]
pub struct AppState {
    pub rooms: Arc<RwLock<HashMap<RoomId, Arc<Mutex<Room>>>>>,
    pub gateway: Arc<Gateway>,
    pub config: Arc<GameConfig>,
    /// Questions copied into every newly created room
    pub seed_questions: Arc<Vec<QuestionInput>>,
}

/// Read-only view of a room for the admin API
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RoomSummary {
    pub room_id: RoomId,
    pub game_started: bool,
    pub asked_count: u32,
    pub question_budget: u32,
    pub participant_count: usize,
    pub pool_size: usize,
    pub current_round_id: Option<RoundId>,
    pub round_open: bool,
    /// How the most recent round closed, if it has
    pub last_resolved_by: Option<ResolveTrigger>,
}

impl AppState {
    pub fn new() -> Self {
        Self::with_config(GameConfig::default())
    }

    pub fn with_config(config: GameConfig) -> Self {
        Self {
            rooms: Arc::new(RwLock::new(HashMap::new())),
            gateway: Arc::new(Gateway::new()),
            config: Arc::new(config),
            seed_questions: Arc::new(Vec::new()),
        }
    }

    pub fn with_seed_questions(mut self, seeds: Vec<QuestionInput>) -> Self {
        self.seed_questions = Arc::new(seeds);
        self
    }

    pub async fn get_room(&self, room_id: &RoomId) -> Option<Arc<Mutex<Room>>> {
        self.rooms.read().await.get(room_id).cloned()
    }

    /// Look up a room, creating it (with the seed questions) if unknown
    pub async fn get_or_create_room(&self, room_id: &RoomId) -> Arc<Mutex<Room>> {
        if let Some(room) = self.get_room(room_id).await {
            return room;
        }

        let mut rooms = self.rooms.write().await;
        rooms
            .entry(room_id.clone())
            .or_insert_with(|| {
                let pool = self
                    .seed_questions
                    .iter()
                    .filter_map(|input| Question::from_input(input.clone()).ok())
                    .collect::<Vec<_>>();
                tracing::info!("Created room {} with {} questions", room_id, pool.len());
                Arc::new(Mutex::new(Room::new(room_id.clone(), pool)))
            })
            .clone()
    }

    pub async fn room_summary(&self, room_id: &RoomId) -> Option<RoomSummary> {
        let room = self.get_room(room_id).await?;
        let room = room.lock().await;

        Some(RoomSummary {
            room_id: room.id.clone(),
            game_started: room.game_started,
            asked_count: room.asked_count,
            question_budget: room.question_budget,
            participant_count: room.participants.len(),
            pool_size: room.pool.len(),
            current_round_id: room.current_round.as_ref().map(|r| r.id.clone()),
            round_open: room.active_round().is_some(),
            last_resolved_by: room.current_round.as_ref().and_then(|r| r.resolved_by()),
        })
    }

    /// Forget a room nobody uses any more, along with its broadcast channel.
    ///
    /// Skipped while any task still holds the room, so an in-flight join never
    /// lands in a room that was already dropped.
    pub async fn prune_room_if_idle(&self, room_id: &RoomId) -> bool {
        let mut rooms = self.rooms.write().await;
        let idle = match rooms.get(room_id) {
            Some(room) if Arc::strong_count(room) == 1 => {
                room.try_lock().map(|r| r.is_idle()).unwrap_or(false)
            }
            _ => false,
        };
        if idle {
            rooms.remove(room_id);
        }
        drop(rooms);

        if idle {
            self.gateway.close_room_channel_if_unused(room_id).await;
            tracing::info!("Dropped idle room {}", room_id);
        }
        idle
    }

    pub async fn leaderboard(&self, room_id: &RoomId) -> Option<Vec<LeaderboardEntry>> {
        let room = self.get_room(room_id).await?;
        let room = room.lock().await;
        Some(room.participants.leaderboard())
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
