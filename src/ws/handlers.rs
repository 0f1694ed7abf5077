//! WebSocket message dispatch
//!
//! Entry point for client messages. Everything except `join` needs a joined
//! session; that is checked here before handing off to the handler modules.

use crate::error::GameError;
use crate::protocol::{ClientMessage, ServerMessage};
use crate::state::AppState;
use std::sync::Arc;

use super::{moderator, participant, Session};

/// Pull the joined room and participant out of the session or reply NOT_JOINED
macro_rules! require_joined {
    ($session:expr, $action:expr) => {
        match $session.joined() {
            Some((room_id, participant_id)) => (room_id.clone(), participant_id.clone()),
            None => {
                return Some(ServerMessage::ErrorMsg {
                    code: GameError::NotJoined.code().to_string(),
                    msg: format!("Join a room before you {}", $action),
                });
            }
        }
    };
}

/// Handle a client message and return the reply for this connection, if any
pub async fn handle_message(
    msg: ClientMessage,
    session: &mut Session,
    state: &Arc<AppState>,
) -> Option<ServerMessage> {
    match msg {
        ClientMessage::Join {
            room_id,
            name,
            is_moderator,
        } => participant::handle_join(state, session, room_id, name, is_moderator).await,

        ClientMessage::StartRound => {
            let (room_id, participant_id) = require_joined!(session, "start a round");
            moderator::handle_start_round(state, &room_id, &participant_id).await
        }

        ClientMessage::Answer {
            round_id,
            selected_index,
        } => {
            let (room_id, participant_id) = require_joined!(session, "answer");
            participant::handle_answer(state, &room_id, &participant_id, round_id, selected_index)
                .await
        }
    }
}
