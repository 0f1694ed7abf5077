//! Moderator command handlers
//!
//! The moderator flag is checked against the room registry by the orchestrator,
//! not here: a connection only proves which participant it is.

use crate::protocol::ServerMessage;
use crate::state::AppState;
use crate::types::{ParticipantId, RoomId};
use std::sync::Arc;

pub async fn handle_start_round(
    state: &Arc<AppState>,
    room_id: &RoomId,
    requester: &ParticipantId,
) -> Option<ServerMessage> {
    tracing::info!("{} requested a manual start in room {}", requester, room_id);
    match state.start_game(room_id, requester).await {
        // start_round goes out room-wide
        Ok(_) => None,
        Err(e) => Some(e.into()),
    }
}
