//! WebSocket endpoint for the room event stream
//!
//! Clients subscribe with `GET /api/ws/{room_id}?token=...`. The optional
//! token tags the connection with the participant it belongs to; targeted
//! envelopes are filtered against it server-side before anything leaves
//! the process. Connecting and disconnecting never touch room state.
//!
//! Delivery is best-effort: a connection that falls behind the broadcast
//! channel or fails a send is dropped on its own, without blocking the
//! rest of the room. There is no replay; clients reconnect and re-fetch
//! room status.

use std::sync::Arc;

use axum::{
    extract::{
        Path, Query, State, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    response::{IntoResponse, Response},
};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::broadcast::error::RecvError;

use super::api::PollingState;
use super::protocol::RoomEvent;
use super::room::Room;

/// Query parameters accepted on subscribe
#[derive(Debug, Deserialize)]
pub struct SubscribeQuery {
    /// Participant token for targeted-event delivery
    pub token: Option<String>,
}

/// WebSocket upgrade handler
///
/// The room must exist; a missing room fails the upgrade with NotFound.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Path(room_id): Path<String>,
    Query(query): Query<SubscribeQuery>,
    State(state): State<PollingState>,
) -> Response {
    let room = match state.registry.get_room(&room_id) {
        Ok(room) => room,
        Err(e) => return e.into_response(),
    };

    ws.on_upgrade(move |socket| handle_socket(socket, room, query.token))
}

/// Pump room events to one connection until it closes
async fn handle_socket(socket: WebSocket, room: Arc<Room>, token: Option<String>) {
    let mut events = room.subscribe();
    let (mut sender, mut receiver) = socket.split();

    tracing::info!(
        room_id = %room.room_id,
        connections = room.connection_count(),
        "subscriber connected"
    );

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(envelope) => {
                    let terminal = matches!(envelope.event, RoomEvent::RoomWiped);

                    if envelope.is_visible_to(token.as_deref()) {
                        match serde_json::to_string(&envelope.event) {
                            Ok(json) => {
                                if sender.send(Message::Text(json.into())).await.is_err() {
                                    // Dead connection; isolated to this task
                                    break;
                                }
                            }
                            Err(e) => {
                                tracing::error!("failed to serialize event: {}", e);
                            }
                        }
                    }

                    if terminal {
                        let _ = sender.send(Message::Close(None)).await;
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    // Too slow to keep up; drop the connection rather than
                    // deliver a gapped stream. The client re-fetches status.
                    tracing::warn!(
                        room_id = %room.room_id,
                        skipped,
                        "subscriber lagged, closing"
                    );
                    let _ = sender.send(Message::Close(None)).await;
                    break;
                }
                Err(RecvError::Closed) => break,
            },
            msg = receiver.next() => match msg {
                // Inbound frames only keep the connection alive; state is
                // never writable through the broadcaster.
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::debug!(room_id = %room.room_id, "websocket error: {}", e);
                    break;
                }
            },
        }
    }

    tracing::info!(room_id = %room.room_id, "subscriber disconnected");
}
