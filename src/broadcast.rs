//! Room-scoped delivery over tokio broadcast channels.
//!
//! One channel per room, created on first use. Participant-scoped replies don't
//! go through here: the dispatcher returns them and the socket task writes them
//! directly.

use std::collections::HashMap;
use tokio::sync::{broadcast, RwLock};

use crate::protocol::ServerMessage;
use crate::types::RoomId;

const ROOM_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Default)]
pub struct Gateway {
    rooms: RwLock<HashMap<RoomId, broadcast::Sender<ServerMessage>>>,
}

impl Gateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe a connection to everything emitted to `room_id`
    pub async fn join_room_channel(&self, room_id: &RoomId) -> broadcast::Receiver<ServerMessage> {
        if let Some(tx) = self.rooms.read().await.get(room_id) {
            return tx.subscribe();
        }

        self.rooms
            .write()
            .await
            .entry(room_id.clone())
            .or_insert_with(|| broadcast::channel(ROOM_CHANNEL_CAPACITY).0)
            .subscribe()
    }

    /// Deliver to every connection subscribed to the room
    pub async fn emit_to_room(&self, room_id: &RoomId, msg: ServerMessage) {
        if let Some(tx) = self.rooms.read().await.get(room_id) {
            // No receivers connected is fine
            let _ = tx.send(msg);
        }
    }

    /// Drop the room's channel once no connection listens to it.
    /// A later subscribe creates a fresh one.
    pub async fn close_room_channel_if_unused(&self, room_id: &RoomId) -> bool {
        let mut rooms = self.rooms.write().await;
        match rooms.get(room_id) {
            Some(tx) if tx.receiver_count() == 0 => {
                rooms.remove(room_id);
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn error(msg: &str) -> ServerMessage {
        ServerMessage::ErrorMsg {
            code: "TEST".to_string(),
            msg: msg.to_string(),
        }
    }

    #[tokio::test]
    async fn test_emit_reaches_room_subscribers_only() {
        let gateway = Gateway::new();
        let room_a = RoomId::from("a");
        let room_b = RoomId::from("b");

        let mut rx_a = gateway.join_room_channel(&room_a).await;
        let mut rx_b = gateway.join_room_channel(&room_b).await;

        gateway.emit_to_room(&room_a, error("hello a")).await;

        match rx_a.try_recv() {
            Ok(ServerMessage::ErrorMsg { msg, .. }) => assert_eq!(msg, "hello a"),
            other => panic!("Expected message for room a, got {:?}", other),
        }
        assert!(rx_b.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_emit_without_channel_is_dropped() {
        let gateway = Gateway::new();
        gateway
            .emit_to_room(&RoomId::from("nobody"), error("lost"))
            .await;
        assert!(
            !gateway
                .close_room_channel_if_unused(&RoomId::from("nobody"))
                .await
        );
    }

    #[tokio::test]
    async fn test_channel_closes_only_without_subscribers() {
        let gateway = Gateway::new();
        let room = RoomId::from("r");
        let rx1 = gateway.join_room_channel(&room).await;
        let rx2 = gateway.join_room_channel(&room).await;

        drop(rx1);
        assert!(!gateway.close_room_channel_if_unused(&room).await);
        drop(rx2);
        assert!(gateway.close_room_channel_if_unused(&room).await);
        assert!(!gateway.close_room_channel_if_unused(&room).await);

        // resubscribing starts a new channel
        let mut rx = gateway.join_room_channel(&room).await;
        gateway.emit_to_room(&room, error("again")).await;
        assert!(rx.try_recv().is_ok());
    }
}
