//! Participant message handlers
//!
//! Joining a room and answering questions.

use crate::error::GameError;
use crate::protocol::ServerMessage;
use crate::state::AppState;
use crate::types::{ParticipantId, RoomId, RoundId};
use std::sync::Arc;

use super::Session;

pub const DEFAULT_ROOM: &str = "demo-room";

/// Room to join for a client-supplied id; blank means the demo room
pub fn room_or_default(room_id: &str) -> RoomId {
    match room_id.trim() {
        "" => RoomId::from(DEFAULT_ROOM),
        trimmed => RoomId::from(trimmed),
    }
}

fn name_or_generated(name: &str) -> String {
    match name.trim() {
        "" => petname::petname(2, "-").unwrap_or_else(|| "anonymous".to_string()),
        trimmed => trimmed.to_string(),
    }
}

pub async fn handle_join(
    state: &Arc<AppState>,
    session: &mut Session,
    room_id: String,
    name: String,
    is_moderator: bool,
) -> Option<ServerMessage> {
    if let Some((room, participant)) = session.joined() {
        tracing::warn!("{} tried to join again (already in room {})", participant, room);
        return Some(GameError::AlreadyJoined.into());
    }

    let room_id = room_or_default(&room_id);
    let name = name_or_generated(&name);
    tracing::info!("Join request for room {} as {}", room_id, name);

    let participant = state.join(&room_id, name, is_moderator).await;
    session.room_id = Some(room_id.clone());
    session.participant_id = Some(participant.id.clone());

    Some(ServerMessage::Joined {
        participant_id: participant.id,
        room_id,
        name: participant.name,
        is_moderator: participant.is_moderator,
    })
}

/// Accepted answers are acknowledged by the room-wide `player_answered` event
pub async fn handle_answer(
    state: &Arc<AppState>,
    room_id: &RoomId,
    participant_id: &ParticipantId,
    round_id: RoundId,
    selected_index: usize,
) -> Option<ServerMessage> {
    match state
        .submit_answer(room_id, participant_id, &round_id, selected_index)
        .await
    {
        Ok(_) => None,
        Err(e) => Some(e.into()),
    }
}
