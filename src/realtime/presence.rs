/**
 * Presence Table
 *
 * Process-wide registry mapping a user id to their active connection id.
 * This table is the source of truth for "is this user reachable right now";
 * the persisted `status` column on the user record is only a durable
 * projection maintained by the connection lifecycle.
 *
 * At most one connection per user is tracked: a second connection silently
 * replaces the first (last writer wins). The replaced socket is not closed;
 * it keeps its room memberships until it disconnects on its own.
 *
 * All operations are synchronous, atomic per key (`DashMap`), and never
 * suspend, so they are safe to call from any point in a connection's event
 * handling without interleaving hazards.
 */

use dashmap::DashMap;
use uuid::Uuid;

use super::rooms::ConnectionId;

/// In-memory user-to-connection registry
#[derive(Debug, Default)]
pub struct PresenceTable {
    entries: DashMap<Uuid, ConnectionId>,
}

impl PresenceTable {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Register a user's active connection, unconditionally replacing any
    /// existing entry. Returns the replaced connection id, if any.
    pub fn register(&self, user_id: Uuid, connection_id: ConnectionId) -> Option<ConnectionId> {
        self.entries.insert(user_id, connection_id)
    }

    /// Remove a user's entry, but only if `connection_id` is still the
    /// registered one.
    ///
    /// Returns true if the entry was removed. A disconnect of a connection
    /// that was already replaced by a newer one returns false, so the caller
    /// knows not to flip the user offline while the newer connection is
    /// alive. Calling this for a user with no entry at all is a no-op
    /// (rapid-reconnect races make that a normal occurrence).
    pub fn deregister(&self, user_id: Uuid, connection_id: ConnectionId) -> bool {
        self.entries
            .remove_if(&user_id, |_, current| *current == connection_id)
            .is_some()
    }

    /// Connection id of a user, if they are currently connected.
    /// Absence is not an error; it means "offline".
    pub fn lookup(&self, user_id: Uuid) -> Option<ConnectionId> {
        self.entries.get(&user_id).map(|entry| *entry.value())
    }

    /// Whether the user currently has an active connection
    pub fn is_online(&self, user_id: Uuid) -> bool {
        self.entries.contains_key(&user_id)
    }

    /// All currently connected user ids (diagnostics)
    pub fn online_users(&self) -> Vec<Uuid> {
        self.entries.iter().map(|entry| *entry.key()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_lookup() {
        let table = PresenceTable::new();
        let user = Uuid::new_v4();
        let conn = Uuid::new_v4();

        assert_eq!(table.register(user, conn), None);
        assert_eq!(table.lookup(user), Some(conn));
        assert!(table.is_online(user));
    }

    #[test]
    fn test_lookup_absent_user() {
        let table = PresenceTable::new();
        assert_eq!(table.lookup(Uuid::new_v4()), None);
    }

    #[test]
    fn test_second_connection_replaces_first() {
        let table = PresenceTable::new();
        let user = Uuid::new_v4();
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();

        table.register(user, first);
        assert_eq!(table.register(user, second), Some(first));
        assert_eq!(table.lookup(user), Some(second));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_deregister_removes_exactly_that_user() {
        let table = PresenceTable::new();
        let user_a = Uuid::new_v4();
        let user_b = Uuid::new_v4();
        let conn_a = Uuid::new_v4();
        let conn_b = Uuid::new_v4();

        table.register(user_a, conn_a);
        table.register(user_b, conn_b);

        assert!(table.deregister(user_a, conn_a));
        assert!(!table.is_online(user_a));
        assert!(table.is_online(user_b));
    }

    #[test]
    fn test_deregister_is_idempotent() {
        let table = PresenceTable::new();
        let user = Uuid::new_v4();
        let conn = Uuid::new_v4();

        table.register(user, conn);
        assert!(table.deregister(user, conn));
        // Second call on an absent entry is a harmless no-op.
        assert!(!table.deregister(user, conn));
    }

    #[test]
    fn test_stale_connection_cannot_deregister_newer_one() {
        let table = PresenceTable::new();
        let user = Uuid::new_v4();
        let old = Uuid::new_v4();
        let new = Uuid::new_v4();

        table.register(user, old);
        table.register(user, new);

        // The replaced connection disconnects; the user stays online.
        assert!(!table.deregister(user, old));
        assert_eq!(table.lookup(user), Some(new));
    }

    #[test]
    fn test_online_users_lists_all_entries() {
        let table = PresenceTable::new();
        let user_a = Uuid::new_v4();
        let user_b = Uuid::new_v4();

        table.register(user_a, Uuid::new_v4());
        table.register(user_b, Uuid::new_v4());

        let mut online = table.online_users();
        online.sort();
        let mut expected = vec![user_a, user_b];
        expected.sort();
        assert_eq!(online, expected);
    }
}
