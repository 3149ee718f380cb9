/**
 * Server Initialization
 *
 * Builds the application state and the Axum router. The socket endpoint is
 * the whole public surface of this service; REST CRUD for conversations and
 * messages lives in a separate service in front of the same database.
 */

use axum::routing::get;
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::realtime::socket::ws_handler;
use crate::server::config::connect_database;
use crate::server::state::AppState;

/// Create and configure the Axum application
///
/// Connects the database pool, creates the in-memory presence and room
/// registries, and wires the routes:
///
/// - `GET /ws` - the WebSocket messaging endpoint
/// - `GET /health` - liveness probe
pub async fn create_app() -> Result<Router, sqlx::Error> {
    tracing::info!("Initializing ripplechat server");

    let db_pool = connect_database().await?;
    let app_state = AppState::new(db_pool);

    let app = Router::new()
        .route("/ws", get(ws_handler))
        .route("/health", get(health))
        .with_state(app_state)
        // The browser clients are served from a different origin.
        .layer(CorsLayer::permissive());

    tracing::info!("Router configured");
    Ok(app)
}

async fn health() -> &'static str {
    "ok"
}
