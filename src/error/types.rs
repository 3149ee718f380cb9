/**
 * Messaging Core Error Types
 *
 * This module defines the error taxonomy for the socket layer:
 *
 * - Authentication errors are fatal to the connection attempt and are the
 *   only errors that reject the handshake.
 * - Authorization, validation and persistence errors are non-fatal; they are
 *   caught at the boundary of each event handler and surfaced as exactly one
 *   `error` event while the connection stays open.
 *
 * Persistence errors carry the underlying `sqlx::Error` for logging, but the
 * client only ever sees the fixed user-facing message. Raw storage errors are
 * never forwarded over the wire.
 */

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Machine-readable error category, carried in the `error` event payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Authentication,
    Authorization,
    Validation,
    Persistence,
}

/// Errors raised while handling a socket connection or one of its events.
#[derive(Debug, Error)]
pub enum SocketError {
    /// No credential was presented at handshake time.
    #[error("Authentication error: No token provided")]
    MissingToken,

    /// The presented credential did not verify (expired, malformed, wrong
    /// signature).
    #[error("Authentication error: Invalid token")]
    InvalidToken,

    /// The operation was not permitted for this user. A missing conversation
    /// and a non-participant produce the same message so that existence is
    /// not leaked to the client.
    #[error("{message}")]
    Unauthorized { message: String },

    /// The event payload was malformed or missing required fields.
    #[error("{message}")]
    Validation { message: String },

    /// A storage operation failed. `message` is the fixed user-facing text;
    /// the source error is only logged server-side.
    #[error("{message}")]
    Persistence {
        message: String,
        #[source]
        source: sqlx::Error,
    },
}

impl SocketError {
    /// Create an authorization error with a user-facing message
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    /// Create a validation error with a user-facing message
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Wrap a storage failure with a fixed user-facing message
    pub fn persistence(message: impl Into<String>, source: sqlx::Error) -> Self {
        Self::Persistence {
            message: message.into(),
            source,
        }
    }

    /// Error category for the `error` event payload
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingToken | Self::InvalidToken => ErrorKind::Authentication,
            Self::Unauthorized { .. } => ErrorKind::Authorization,
            Self::Validation { .. } => ErrorKind::Validation,
            Self::Persistence { .. } => ErrorKind::Persistence,
        }
    }

    /// The short human-readable message delivered to the client
    pub fn client_message(&self) -> String {
        self.to_string()
    }

    /// Whether this error terminates the connection attempt itself.
    ///
    /// Only authentication errors are fatal; everything else leaves the
    /// connection open.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::MissingToken | Self::InvalidToken)
    }

    /// HTTP status code used when the error is raised before the WebSocket
    /// upgrade completes (handshake rejection).
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingToken | Self::InvalidToken => StatusCode::UNAUTHORIZED,
            Self::Unauthorized { .. } => StatusCode::FORBIDDEN,
            Self::Validation { .. } => StatusCode::BAD_REQUEST,
            Self::Persistence { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl axum::response::IntoResponse for SocketError {
    fn into_response(self) -> axum::response::Response {
        (self.status_code(), self.client_message()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_token_message() {
        let error = SocketError::MissingToken;
        assert_eq!(
            error.client_message(),
            "Authentication error: No token provided"
        );
        assert_eq!(error.kind(), ErrorKind::Authentication);
        assert!(error.is_fatal());
    }

    #[test]
    fn test_invalid_token_message() {
        let error = SocketError::InvalidToken;
        assert_eq!(error.client_message(), "Authentication error: Invalid token");
        assert_eq!(error.status_code(), StatusCode::UNAUTHORIZED);
        assert!(error.is_fatal());
    }

    #[test]
    fn test_unauthorized_error() {
        let error = SocketError::unauthorized("Not authorized to join this conversation");
        assert_eq!(
            error.client_message(),
            "Not authorized to join this conversation"
        );
        assert_eq!(error.kind(), ErrorKind::Authorization);
        assert!(!error.is_fatal());
    }

    #[test]
    fn test_persistence_error_hides_source() {
        let error = SocketError::persistence("Error sending message", sqlx::Error::RowNotFound);
        // The client sees only the fixed message, never the sqlx detail.
        assert_eq!(error.client_message(), "Error sending message");
        assert_eq!(error.kind(), ErrorKind::Persistence);
        assert!(!error.is_fatal());
    }

    #[test]
    fn test_kind_serializes_snake_case() {
        let json = serde_json::to_string(&ErrorKind::Authorization).unwrap();
        assert_eq!(json, "\"authorization\"");
    }
}
