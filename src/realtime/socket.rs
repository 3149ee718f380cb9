/**
 * WebSocket Connection Lifecycle
 *
 * The socket endpoint (`GET /ws?token=<jwt>`) authenticates the handshake
 * credential before the upgrade completes, so a bad token never creates any
 * connection state. Per accepted connection:
 *
 * 1. a fresh connection id and outbound event queue are registered with the
 *    room router, and a writer task drains the queue into the socket;
 * 2. the presence table records the connection (last writer wins);
 * 3. the user's persisted status flips to online (best-effort) and an
 *    `user_status_changed` announcement goes to every connection;
 * 4. the connection auto-joins every conversation the user participates in;
 * 5. inbound frames are dispatched one at a time, each handler running to
 *    completion before the next frame is read: handlers for the same
 *    connection never interleave, while different connections interleave
 *    freely at every await point;
 * 6. on close, room memberships are dropped and a guarded presence
 *    deregister decides whether this connection still represented the user.
 *    A connection that was superseded by a newer login cleans up silently
 *    instead of flipping the still-connected user offline.
 */

use axum::extract::ws::{Message as WsMessage, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::Response;
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::auth;
use crate::error::SocketError;
use crate::model::UserStatus;
use crate::realtime::events::{ClientEvent, ServerEvent, UserStatusBroadcast};
use crate::realtime::handlers;
use crate::realtime::rooms::ConnectionHandle;
use crate::server::state::AppState;
use crate::store::users;

/// Handshake query parameters; `token` is the transport's auth payload field
#[derive(Debug, Deserialize)]
pub struct WsAuthParams {
    pub token: Option<String>,
}

/// Handle a WebSocket connection attempt (GET /ws)
///
/// Authentication happens here, before the upgrade: a missing or invalid
/// token rejects the handshake with 401 and the reason string, and no
/// presence or room state is created.
pub async fn ws_handler(
    State(state): State<AppState>,
    Query(params): Query<WsAuthParams>,
    ws: WebSocketUpgrade,
) -> Result<Response, SocketError> {
    let user_id = auth::authenticate(params.token.as_deref())?;
    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, user_id)))
}

/// Drive one accepted connection from registration to teardown
async fn handle_socket(socket: WebSocket, state: AppState, user_id: Uuid) {
    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerEvent>();
    let connection = ConnectionHandle::new(user_id, tx);
    let connection_id = connection.id;

    // Writer task: the only place that touches the socket sink. Everything
    // else just queues events on the connection handle.
    let mut writer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let frame = match serde_json::to_string(&event) {
                Ok(frame) => frame,
                Err(e) => {
                    tracing::error!(error = ?e, "Failed to serialize server event");
                    continue;
                }
            };
            if sink.send(WsMessage::Text(frame.into())).await.is_err() {
                break;
            }
        }
    });

    tracing::info!(user_id = %user_id, connection_id = %connection_id, "User connected");

    state.rooms.insert_connection(connection.clone());
    if let Some(replaced) = state.presence.register(user_id, connection_id) {
        // The older socket stays open and keeps its rooms; it just no longer
        // represents the user in the presence table.
        tracing::debug!(
            user_id = %user_id,
            replaced_connection = %replaced,
            "New connection replaced an existing presence entry"
        );
    }
    publish_status(&state, user_id, UserStatus::Online).await;
    handlers::join_all_conversations(&state, &connection).await;

    while let Some(Ok(frame)) = stream.next().await {
        match frame {
            WsMessage::Text(text) => dispatch(&state, &connection, text.as_str()).await,
            WsMessage::Close(_) => break,
            // Ping/pong are answered by the transport; binary frames are
            // not part of the protocol.
            _ => {}
        }
    }

    tracing::info!(user_id = %user_id, connection_id = %connection_id, "User disconnected");
    writer.abort();
    let _ = (&mut writer).await;

    state.rooms.remove_connection(connection_id);
    if state.presence.deregister(user_id, connection_id) {
        publish_status(&state, user_id, UserStatus::Offline).await;
    } else {
        tracing::debug!(
            user_id = %user_id,
            connection_id = %connection_id,
            "Superseded connection closed; user remains online"
        );
    }
}

/// Persist and announce a presence change.
///
/// The status write is best-effort: a storage failure is logged and the
/// announcement still goes out, because the presence table, not the user
/// row, is what routing trusts.
async fn publish_status(state: &AppState, user_id: Uuid, status: UserStatus) {
    if let Err(e) = users::set_status(&state.db_pool, user_id, status).await {
        tracing::error!(user_id = %user_id, error = ?e, "Error updating user status");
    }
    state
        .rooms
        .broadcast_to_all(ServerEvent::UserStatusChanged(UserStatusBroadcast {
            user_id,
            status,
        }));
}

/// Parse one inbound frame and run its handler to completion
pub async fn dispatch(state: &AppState, connection: &ConnectionHandle, frame: &str) {
    let event = match serde_json::from_str::<ClientEvent>(frame) {
        Ok(event) => event,
        Err(e) => {
            tracing::debug!(
                connection_id = %connection.id,
                error = %e,
                "Discarding malformed client frame"
            );
            let err = SocketError::validation("Unrecognized event payload");
            connection.send(ServerEvent::error(&err));
            return;
        }
    };

    match event {
        ClientEvent::SendMessage(payload) => {
            handlers::handle_send_message(state, connection, payload).await
        }
        ClientEvent::Typing(payload) => handlers::handle_typing(state, connection, payload),
        ClientEvent::MarkRead(payload) => {
            handlers::handle_mark_read(state, connection, payload).await
        }
        ClientEvent::JoinConversation(payload) => {
            handlers::handle_join_conversation(state, connection, payload).await
        }
        ClientEvent::LeaveConversation(payload) => {
            handlers::handle_leave_conversation(state, connection, payload)
        }
    }
}
