/**
 * Room Router
 *
 * One room per conversation, keyed by conversation id. A room is an
 * addressable broadcast group of connections; membership mirrors which
 * conversations a connected user participates in. The router also owns the
 * registry of every live connection, which is what makes the
 * broadcast-to-all primitive (global presence announcements) possible.
 *
 * Delivery goes through each connection's outbound mpsc sender, so a
 * broadcast is a synchronous fan-out of queue pushes: it never suspends and
 * never blocks on a slow client. Member sets are snapshotted before
 * iteration, so a join or leave racing a broadcast can never corrupt
 * delivery.
 *
 * Authorization is not this layer's job: handlers re-check conversation
 * membership against the store before calling `join`. `leave` is always
 * unconditional.
 */

use std::collections::HashSet;

use dashmap::DashMap;
use tokio::sync::mpsc;
use uuid::Uuid;

use super::events::ServerEvent;

/// Identifier of one live socket connection
pub type ConnectionId = Uuid;

/// Handle to a live connection: its identity plus the sending half of its
/// outbound event queue. Cloning is cheap; the socket's writer task owns the
/// receiving half.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    pub id: ConnectionId,
    pub user_id: Uuid,
    tx: mpsc::UnboundedSender<ServerEvent>,
}

impl ConnectionHandle {
    pub fn new(user_id: Uuid, tx: mpsc::UnboundedSender<ServerEvent>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            tx,
        }
    }

    /// Queue an event for delivery to this connection.
    ///
    /// Returns false if the connection's writer task has already stopped;
    /// delivery to a dying socket is best-effort.
    pub fn send(&self, event: ServerEvent) -> bool {
        self.tx.send(event).is_ok()
    }
}

/// Connection registry and per-conversation broadcast groups
#[derive(Debug, Default)]
pub struct RoomRouter {
    connections: DashMap<ConnectionId, ConnectionHandle>,
    rooms: DashMap<Uuid, HashSet<ConnectionId>>,
}

impl RoomRouter {
    pub fn new() -> Self {
        Self {
            connections: DashMap::new(),
            rooms: DashMap::new(),
        }
    }

    /// Register a live connection with the router
    pub fn insert_connection(&self, handle: ConnectionHandle) {
        self.connections.insert(handle.id, handle);
    }

    /// Remove a connection from the registry and from every room it joined
    pub fn remove_connection(&self, connection_id: ConnectionId) {
        self.connections.remove(&connection_id);
        self.rooms.retain(|_, members| {
            members.remove(&connection_id);
            !members.is_empty()
        });
    }

    /// Join a connection to a conversation's room. Idempotent.
    pub fn join(&self, connection_id: ConnectionId, conversation_id: Uuid) {
        self.rooms
            .entry(conversation_id)
            .or_default()
            .insert(connection_id);
    }

    /// Leave a conversation's room. Always succeeds; leaving a room the
    /// connection never joined is a no-op.
    pub fn leave(&self, connection_id: ConnectionId, conversation_id: Uuid) {
        if let Some(mut members) = self.rooms.get_mut(&conversation_id) {
            members.remove(&connection_id);
        }
    }

    /// Deliver an event to every connection joined to the room
    pub fn broadcast_to_room(&self, conversation_id: Uuid, event: ServerEvent) {
        self.broadcast_members(conversation_id, None, event);
    }

    /// Deliver an event to every room member except the sending connection
    /// (typing notifications)
    pub fn broadcast_to_room_except(
        &self,
        conversation_id: Uuid,
        sender: ConnectionId,
        event: ServerEvent,
    ) {
        self.broadcast_members(conversation_id, Some(sender), event);
    }

    /// Deliver an event to every currently connected client, regardless of
    /// room membership (global presence announcements)
    pub fn broadcast_to_all(&self, event: ServerEvent) {
        let handles: Vec<ConnectionHandle> = self
            .connections
            .iter()
            .map(|entry| entry.value().clone())
            .collect();

        for handle in handles {
            if !handle.send(event.clone()) {
                tracing::debug!(connection_id = %handle.id, "Dropping event for closed connection");
            }
        }
    }

    fn broadcast_members(
        &self,
        conversation_id: Uuid,
        except: Option<ConnectionId>,
        event: ServerEvent,
    ) {
        // Snapshot the member set before sending so concurrent join/leave
        // cannot invalidate the iteration.
        let members: Vec<ConnectionId> = match self.rooms.get(&conversation_id) {
            Some(members) => members.iter().copied().collect(),
            None => return,
        };

        for member in members {
            if Some(member) == except {
                continue;
            }
            if let Some(handle) = self.connections.get(&member) {
                if !handle.send(event.clone()) {
                    tracing::debug!(connection_id = %member, "Dropping event for closed connection");
                }
            }
        }
    }

    /// Current member connections of a room
    pub fn room_members(&self, conversation_id: Uuid) -> Vec<ConnectionId> {
        self.rooms
            .get(&conversation_id)
            .map(|members| members.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Number of live connections
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SocketError;

    fn connect(router: &RoomRouter) -> (ConnectionHandle, mpsc::UnboundedReceiver<ServerEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = ConnectionHandle::new(Uuid::new_v4(), tx);
        router.insert_connection(handle.clone());
        (handle, rx)
    }

    fn error_event() -> ServerEvent {
        ServerEvent::error(&SocketError::validation("test"))
    }

    #[test]
    fn test_broadcast_reaches_all_room_members() {
        let router = RoomRouter::new();
        let room = Uuid::new_v4();
        let (a, mut rx_a) = connect(&router);
        let (b, mut rx_b) = connect(&router);

        router.join(a.id, room);
        router.join(b.id, room);
        router.broadcast_to_room(room, error_event());

        assert!(rx_a.try_recv().is_ok());
        assert!(rx_b.try_recv().is_ok());
    }

    #[test]
    fn test_broadcast_skips_non_members() {
        let router = RoomRouter::new();
        let room = Uuid::new_v4();
        let (a, mut rx_a) = connect(&router);
        let (_b, mut rx_b) = connect(&router);

        router.join(a.id, room);
        router.broadcast_to_room(room, error_event());

        assert!(rx_a.try_recv().is_ok());
        assert!(rx_b.try_recv().is_err());
    }

    #[test]
    fn test_broadcast_except_sender_excludes_only_sender() {
        let router = RoomRouter::new();
        let room = Uuid::new_v4();
        let (a, mut rx_a) = connect(&router);
        let (b, mut rx_b) = connect(&router);
        let (c, mut rx_c) = connect(&router);

        router.join(a.id, room);
        router.join(b.id, room);
        router.join(c.id, room);
        router.broadcast_to_room_except(room, a.id, error_event());

        assert!(rx_a.try_recv().is_err());
        assert!(rx_b.try_recv().is_ok());
        assert!(rx_c.try_recv().is_ok());
    }

    #[test]
    fn test_broadcast_to_all_ignores_rooms() {
        let router = RoomRouter::new();
        let (_a, mut rx_a) = connect(&router);
        let (_b, mut rx_b) = connect(&router);

        router.broadcast_to_all(error_event());

        assert!(rx_a.try_recv().is_ok());
        assert!(rx_b.try_recv().is_ok());
    }

    #[test]
    fn test_remove_connection_leaves_every_room() {
        let router = RoomRouter::new();
        let room_one = Uuid::new_v4();
        let room_two = Uuid::new_v4();
        let (a, mut rx_a) = connect(&router);
        let (b, mut rx_b) = connect(&router);

        router.join(a.id, room_one);
        router.join(a.id, room_two);
        router.join(b.id, room_one);

        router.remove_connection(a.id);

        assert_eq!(router.room_members(room_one), vec![b.id]);
        assert!(router.room_members(room_two).is_empty());
        assert_eq!(router.connection_count(), 1);

        // Broadcasts after removal only reach the survivor.
        router.broadcast_to_room(room_one, error_event());
        assert!(rx_a.try_recv().is_err());
        assert!(rx_b.try_recv().is_ok());
    }

    #[test]
    fn test_leave_unknown_room_is_noop() {
        let router = RoomRouter::new();
        let (a, _rx) = connect(&router);
        router.leave(a.id, Uuid::new_v4());
    }

    #[test]
    fn test_join_is_idempotent() {
        let router = RoomRouter::new();
        let room = Uuid::new_v4();
        let (a, mut rx) = connect(&router);

        router.join(a.id, room);
        router.join(a.id, room);
        router.broadcast_to_room(room, error_event());

        assert!(rx.try_recv().is_ok());
        // Joined twice, delivered once.
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_send_to_closed_connection_does_not_panic() {
        let router = RoomRouter::new();
        let room = Uuid::new_v4();
        let (a, rx) = connect(&router);
        router.join(a.id, room);
        drop(rx);

        router.broadcast_to_room(room, error_event());
        router.broadcast_to_all(error_event());
    }
}
