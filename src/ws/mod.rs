pub mod handlers;
mod moderator;
mod participant;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures::{sink::SinkExt, stream::SplitSink, stream::StreamExt};
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError};

use crate::protocol::{ClientMessage, ServerMessage, PROTOCOL_VERSION};
use crate::state::AppState;
use crate::types::{ParticipantId, RoomId};

pub use participant::room_or_default;

/// Per-connection binding to a room participant, set by a successful join
#[derive(Debug, Default)]
pub struct Session {
    pub room_id: Option<RoomId>,
    pub participant_id: Option<ParticipantId>,
}

impl Session {
    pub fn joined(&self) -> Option<(&RoomId, &ParticipantId)> {
        self.room_id.as_ref().zip(self.participant_id.as_ref())
    }
}

/// WebSocket upgrade handler
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    tracing::info!("WebSocket connection request");
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn send_json(
    sender: &mut SplitSink<WebSocket, Message>,
    msg: &ServerMessage,
) -> Result<(), axum::Error> {
    match serde_json::to_string(msg) {
        Ok(json) => sender.send(Message::Text(json.into())).await,
        Err(e) => {
            tracing::error!("Failed to serialize server message: {}", e);
            Ok(())
        }
    }
}

/// Handle individual WebSocket connection
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();

    let welcome = ServerMessage::Welcome {
        protocol: PROTOCOL_VERSION.to_string(),
        server_now: chrono::Utc::now().to_rfc3339(),
    };
    if send_json(&mut sender, &welcome).await.is_err() {
        tracing::error!("Failed to send welcome message");
        return;
    }

    let mut session = Session::default();
    // Subscribed on join
    let mut room_rx: Option<broadcast::Receiver<ServerMessage>> = None;

    loop {
        tokio::select! {
            room_msg = async {
                match &mut room_rx {
                    Some(rx) => rx.recv().await,
                    // Not in a room yet: wait forever
                    None => std::future::pending::<Result<ServerMessage, RecvError>>().await,
                }
            } => {
                match room_msg {
                    Ok(msg) => {
                        if send_json(&mut sender, &msg).await.is_err() {
                            break;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!("Connection lagged, skipped {} room messages", skipped);
                    }
                    Err(RecvError::Closed) => {
                        room_rx = None;
                    }
                }
            }

            ws_msg = receiver.next() => {
                match ws_msg {
                    Some(Ok(Message::Text(text))) => {
                        tracing::debug!("Received message: {}", text);

                        let response = match serde_json::from_str::<ClientMessage>(&text) {
                            Ok(client_msg) => {
                                // Subscribe first so the joiner sees its own roster update
                                if let ClientMessage::Join { room_id, .. } = &client_msg {
                                    if session.joined().is_none() {
                                        let room = room_or_default(room_id);
                                        room_rx = Some(state.gateway.join_room_channel(&room).await);
                                    }
                                }
                                handlers::handle_message(client_msg, &mut session, &state).await
                            }
                            Err(e) => {
                                tracing::warn!("Failed to parse client message: {}", e);
                                Some(ServerMessage::ErrorMsg {
                                    code: "PARSE_ERROR".to_string(),
                                    msg: format!("Invalid message format: {}", e),
                                })
                            }
                        };

                        if let Some(response) = response {
                            if send_json(&mut sender, &response).await.is_err() {
                                tracing::error!("Failed to send response");
                                break;
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) => {
                        tracing::info!("WebSocket closed");
                        break;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::error!("WebSocket error: {}", e);
                        break;
                    }
                    None => break,
                }
            }
        }
    }

    // Unsubscribe first so an emptied room can drop its channel
    drop(room_rx);
    if let Some((room_id, participant_id)) = session.joined() {
        state.leave(room_id, participant_id).await;
    }
    tracing::info!("WebSocket connection closed");
}
