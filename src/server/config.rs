/**
 * Server Configuration
 *
 * Loads configuration from environment variables (`DATABASE_URL`,
 * `SERVER_PORT`; `JWT_SECRET` is read by the auth module) and initializes
 * the PostgreSQL connection pool.
 *
 * Unlike ancillary services, the database is not optional here: every
 * socket operation ends in the store, so a server without a pool would
 * accept connections it can never serve. Startup fails fast instead.
 */

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

/// Connect the database pool and run migrations
///
/// Reads `DATABASE_URL` from the environment. Migration failures are logged
/// but do not abort startup; the schema may already be in place.
pub async fn connect_database() -> Result<PgPool, sqlx::Error> {
    let database_url = std::env::var("DATABASE_URL").map_err(|_| {
        tracing::error!("DATABASE_URL is not set");
        sqlx::Error::Configuration("DATABASE_URL is not set".into())
    })?;

    tracing::info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(16)
        .connect(&database_url)
        .await?;
    tracing::info!("Database connection pool created");

    tracing::info!("Running database migrations...");
    match sqlx::migrate!().run(&pool).await {
        Ok(_) => tracing::info!("Database migrations completed"),
        Err(e) => {
            tracing::error!("Failed to run database migrations: {:?}", e);
            tracing::warn!("Continuing; schema may already be up to date");
        }
    }

    Ok(pool)
}

/// Port the server listens on (`SERVER_PORT`, default 3000)
pub fn server_port() -> u16 {
    std::env::var("SERVER_PORT")
        .ok()
        .and_then(|port| port.parse().ok())
        .unwrap_or(3000)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_port() {
        std::env::remove_var("SERVER_PORT");
        assert_eq!(server_port(), 3000);
    }
}
