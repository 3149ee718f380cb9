/**
 * Application State Management
 *
 * This module defines the application state structure and implements the
 * `FromRef` traits for Axum state extraction.
 *
 * # Thread Safety
 *
 * - `PgPool` is internally reference-counted and safe to clone per handler.
 * - `PresenceTable` and `RoomRouter` are the only shared mutable state in
 *   the process; both are backed by concurrency-safe keyed maps, so they are
 *   shared as plain `Arc`s with no outer lock.
 */

use std::sync::Arc;

use axum::extract::FromRef;
use sqlx::PgPool;

use crate::realtime::presence::PresenceTable;
use crate::realtime::rooms::RoomRouter;

/// Application state shared by every connection
#[derive(Clone)]
pub struct AppState {
    /// PostgreSQL connection pool
    pub db_pool: PgPool,
    /// Live user-to-connection presence registry
    pub presence: Arc<PresenceTable>,
    /// Connection registry and per-conversation broadcast rooms
    pub rooms: Arc<RoomRouter>,
}

impl AppState {
    pub fn new(db_pool: PgPool) -> Self {
        Self {
            db_pool,
            presence: Arc::new(PresenceTable::new()),
            rooms: Arc::new(RoomRouter::new()),
        }
    }
}

/// Allow handlers to extract the pool without the whole state
impl FromRef<AppState> for PgPool {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.db_pool.clone()
    }
}

impl FromRef<AppState> for Arc<PresenceTable> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.presence.clone()
    }
}

impl FromRef<AppState> for Arc<RoomRouter> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.rooms.clone()
    }
}
