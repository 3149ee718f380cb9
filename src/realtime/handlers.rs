/**
 * Socket Event Handlers
 *
 * One handler per client event kind. Every failure path here is non-fatal:
 * it is logged and surfaced to the offending connection as exactly one
 * `error` event, and the connection stays open. Nothing in this module is
 * allowed to panic the dispatch loop.
 *
 * Authorization deliberately conflates "conversation does not exist" with
 * "you are not a participant": both produce the identical error message so
 * that the existence of a conversation is never leaked to outsiders.
 */

use sqlx::PgPool;
use uuid::Uuid;

use crate::error::SocketError;
use crate::model::Conversation;
use crate::realtime::events::{
    ConversationRef, MessagesReadBroadcast, SendMessagePayload, ServerEvent, TypingBroadcast,
    TypingPayload,
};
use crate::realtime::rooms::ConnectionHandle;
use crate::server::state::AppState;
use crate::store::{conversations, messages};

const DENY_SEND: &str = "Not authorized to send message to this conversation";
const DENY_ACCESS: &str = "Not authorized to access this conversation";
const DENY_JOIN: &str = "Not authorized to join this conversation";
const FAIL_SEND: &str = "Error sending message";
const FAIL_MARK_READ: &str = "Error marking messages as read";
const FAIL_JOIN: &str = "Error joining conversation";

/// Report a handler failure back to the connection that caused it
fn emit_error(connection: &ConnectionHandle, err: &SocketError) {
    tracing::warn!(
        user_id = %connection.user_id,
        connection_id = %connection.id,
        error = %err,
        "Socket event failed"
    );
    connection.send(ServerEvent::error(err));
}

/// The conflated existence/membership check.
///
/// An absent conversation and a non-participant caller yield the same
/// denial, on purpose.
pub fn authorize_participant(
    conversation: Option<Conversation>,
    user_id: Uuid,
    denial: &str,
) -> Result<Conversation, SocketError> {
    match conversation {
        Some(conversation) if conversation.has_participant(user_id) => Ok(conversation),
        _ => Err(SocketError::unauthorized(denial)),
    }
}

/// Payload invariant for `send_message`: non-text content must carry a file
/// URL.
pub fn validate_send(payload: &SendMessagePayload) -> Result<(), SocketError> {
    if payload.content_type.requires_file_url() && payload.file_url.is_none() {
        return Err(SocketError::validation(
            "fileUrl is required for image and file messages",
        ));
    }
    Ok(())
}

async fn load_authorized(
    pool: &PgPool,
    conversation_id: Uuid,
    user_id: Uuid,
    denial: &'static str,
    failure: &'static str,
) -> Result<Conversation, SocketError> {
    let conversation = conversations::find_by_id(pool, conversation_id)
        .await
        .map_err(|e| SocketError::persistence(failure, e))?;
    authorize_participant(conversation, user_id, denial)
}

/// Handle a `send_message` event.
///
/// received -> authorized -> persisted -> broadcast. The sender is a room
/// member, so the `new_message` broadcast doubles as the acknowledgement;
/// there is no separate ack event.
pub async fn handle_send_message(
    state: &AppState,
    connection: &ConnectionHandle,
    payload: SendMessagePayload,
) {
    if let Err(err) = send_message_inner(state, connection, payload).await {
        emit_error(connection, &err);
    }
}

async fn send_message_inner(
    state: &AppState,
    connection: &ConnectionHandle,
    payload: SendMessagePayload,
) -> Result<(), SocketError> {
    validate_send(&payload)?;

    let user_id = connection.user_id;
    let conversation = load_authorized(
        &state.db_pool,
        payload.conversation_id,
        user_id,
        DENY_SEND,
        FAIL_SEND,
    )
    .await?;

    // Persist the message; the sender's read row is created with it.
    let message = messages::create(
        &state.db_pool,
        conversation.id,
        user_id,
        &payload.content,
        payload.content_type,
        payload.file_url.as_deref(),
    )
    .await
    .map_err(|e| SocketError::persistence(FAIL_SEND, e))?;

    // Recency touch drives conversation-list ordering in the HTTP views.
    conversations::touch_updated_at(&state.db_pool, conversation.id)
        .await
        .map_err(|e| SocketError::persistence(FAIL_SEND, e))?;

    // Enrich sender/readBy with display fields before fan-out.
    let view = messages::populate(&state.db_pool, &message)
        .await
        .map_err(|e| SocketError::persistence(FAIL_SEND, e))?;

    tracing::debug!(
        message_id = %message.id,
        conversation_id = %conversation.id,
        sender = %user_id,
        "Broadcasting new message"
    );
    state
        .rooms
        .broadcast_to_room(conversation.id, ServerEvent::NewMessage(view));

    // Best-effort offline fan-out marker; push notifications would hook in
    // here. Must never fail the relay.
    for &participant in &conversation.participants {
        if participant != user_id && !state.presence.is_online(participant) {
            tracing::info!(user_id = %participant, "Would notify offline user");
        }
    }

    Ok(())
}

/// Handle a `mark_read` event.
///
/// Flips every message in the conversation not sent by the caller to read,
/// then broadcasts the caller's full read set for the conversation (not just
/// the delta of this call).
pub async fn handle_mark_read(
    state: &AppState,
    connection: &ConnectionHandle,
    payload: ConversationRef,
) {
    if let Err(err) = mark_read_inner(state, connection, payload).await {
        emit_error(connection, &err);
    }
}

async fn mark_read_inner(
    state: &AppState,
    connection: &ConnectionHandle,
    payload: ConversationRef,
) -> Result<(), SocketError> {
    let user_id = connection.user_id;
    let conversation = load_authorized(
        &state.db_pool,
        payload.conversation_id,
        user_id,
        DENY_ACCESS,
        FAIL_MARK_READ,
    )
    .await?;

    let flipped = messages::mark_unread_as_read(&state.db_pool, conversation.id, user_id)
        .await
        .map_err(|e| SocketError::persistence(FAIL_MARK_READ, e))?;

    let message_ids = messages::read_message_ids(&state.db_pool, conversation.id, user_id)
        .await
        .map_err(|e| SocketError::persistence(FAIL_MARK_READ, e))?;

    tracing::debug!(
        conversation_id = %conversation.id,
        user_id = %user_id,
        newly_read = flipped,
        total_read = message_ids.len(),
        "Broadcasting read receipts"
    );
    state.rooms.broadcast_to_room(
        conversation.id,
        ServerEvent::MessagesRead(MessagesReadBroadcast {
            conversation_id: conversation.id,
            user_id,
            message_ids,
        }),
    );

    Ok(())
}

/// Handle a client `typing` event.
///
/// Ephemeral: no persistence, no authorization re-check, and the typist
/// never receives their own event. Redundant repeats are the client's
/// problem to render idempotently; the server does not debounce.
pub fn handle_typing(state: &AppState, connection: &ConnectionHandle, payload: TypingPayload) {
    state.rooms.broadcast_to_room_except(
        payload.conversation_id,
        connection.id,
        ServerEvent::Typing(TypingBroadcast {
            user_id: connection.user_id,
            conversation_id: payload.conversation_id,
            is_typing: payload.is_typing,
        }),
    );
}

/// Handle an explicit `join_conversation` event.
///
/// Membership is re-checked against the store at join time, never trusted
/// from an earlier join.
pub async fn handle_join_conversation(
    state: &AppState,
    connection: &ConnectionHandle,
    payload: ConversationRef,
) {
    if let Err(err) = join_inner(state, connection, payload).await {
        emit_error(connection, &err);
    }
}

async fn join_inner(
    state: &AppState,
    connection: &ConnectionHandle,
    payload: ConversationRef,
) -> Result<(), SocketError> {
    let conversation = load_authorized(
        &state.db_pool,
        payload.conversation_id,
        connection.user_id,
        DENY_JOIN,
        FAIL_JOIN,
    )
    .await?;

    state.rooms.join(connection.id, conversation.id);
    Ok(())
}

/// Handle a `leave_conversation` event. Unconditional; leaving is always
/// safe.
pub fn handle_leave_conversation(
    state: &AppState,
    connection: &ConnectionHandle,
    payload: ConversationRef,
) {
    state.rooms.leave(connection.id, payload.conversation_id);
}

/// Auto-join every conversation the user participates in, at connect time.
///
/// A store failure here is logged and leaves the connection with zero room
/// memberships; the client can still join explicitly later.
pub async fn join_all_conversations(state: &AppState, connection: &ConnectionHandle) {
    match conversations::ids_for_participant(&state.db_pool, connection.user_id).await {
        Ok(conversation_ids) => {
            let joined = conversation_ids.len();
            for conversation_id in conversation_ids {
                state.rooms.join(connection.id, conversation_id);
            }
            tracing::debug!(
                user_id = %connection.user_id,
                rooms = joined,
                "Joined conversation rooms"
            );
        }
        Err(e) => {
            tracing::error!(
                user_id = %connection.user_id,
                error = ?e,
                "Error joining conversation rooms"
            );
        }
    }
}
