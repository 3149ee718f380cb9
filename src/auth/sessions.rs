/**
 * Session Management and JWT Tokens
 *
 * This module handles JWT token generation and validation for socket
 * sessions. A client presents a token at connection handshake time; it is
 * verified here and resolved to a user id before the connection is
 * established. There are no retries at this layer: a client with a bad
 * token reconnects with a fresh one.
 */

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

use crate::error::SocketError;

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: String,
    /// Username (optional for backwards compatibility)
    #[serde(default)]
    pub username: Option<String>,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
    /// Issued at time (Unix timestamp)
    pub iat: u64,
}

/// Get JWT secret from environment
fn get_jwt_secret() -> String {
    std::env::var("JWT_SECRET").unwrap_or_else(|err| {
        tracing::warn!("Missing JWT_SECRET, using development default: {}", err);
        "your-secret-key-change-in-production".to_string()
    })
}

/// Create a JWT token for a user
///
/// # Arguments
/// * `user_id` - User ID (UUID)
/// * `username` - Username embedded in the claims
///
/// # Returns
/// JWT token string
pub fn create_token(
    user_id: Uuid,
    username: String,
) -> Result<String, jsonwebtoken::errors::Error> {
    // Infallible unless the system clock predates 1970, which is a broken
    // host rather than a recoverable condition.
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs();

    // Token expires in 30 days
    let exp = now + (30 * 24 * 60 * 60);

    let claims = Claims {
        sub: user_id.to_string(),
        username: Some(username),
        exp,
        iat: now,
    };

    let secret = get_jwt_secret();
    let key = EncodingKey::from_secret(secret.as_ref());

    encode(&Header::default(), &claims, &key)
}

/// Verify and decode a JWT token
pub fn verify_token(token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let secret = get_jwt_secret();
    let key = DecodingKey::from_secret(secret.as_ref());
    let validation = Validation::default();

    let token_data = decode::<Claims>(token, &key, &validation)?;
    Ok(token_data.claims)
}

/// Resolve a handshake credential to a user id
///
/// This is the Connection Authenticator contract: an absent token and an
/// invalid token are distinct failures, both fatal to the connection
/// attempt. A token that verifies but carries a malformed user id is
/// treated as invalid.
pub fn authenticate(token: Option<&str>) -> Result<Uuid, SocketError> {
    let token = token.ok_or(SocketError::MissingToken)?;

    let claims = verify_token(token).map_err(|e| {
        tracing::warn!("Socket authentication failed: {:?}", e);
        SocketError::InvalidToken
    })?;

    Uuid::parse_str(&claims.sub).map_err(|e| {
        tracing::warn!("Invalid user id in token claims: {:?}", e);
        SocketError::InvalidToken
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_create_token() {
        let user_id = Uuid::new_v4();
        let result = create_token(user_id, "alice".to_string());
        assert!(result.is_ok());
        let token = result.unwrap();
        assert!(!token.is_empty());
    }

    #[test]
    fn test_verify_token() {
        let user_id = Uuid::new_v4();
        let token = create_token(user_id, "alice".to_string()).unwrap();

        let claims = verify_token(&token).unwrap();
        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.username.as_deref(), Some("alice"));
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_verify_invalid_token() {
        let result = verify_token("invalid.token.here");
        assert!(result.is_err());
    }

    #[test]
    fn test_authenticate_resolves_user_id() {
        let user_id = Uuid::new_v4();
        let token = create_token(user_id, "bob".to_string()).unwrap();

        let resolved = authenticate(Some(&token)).unwrap();
        assert_eq!(resolved, user_id);
    }

    #[test]
    fn test_authenticate_missing_token() {
        let result = authenticate(None);
        assert_matches!(result, Err(SocketError::MissingToken));
    }

    #[test]
    fn test_authenticate_invalid_token() {
        let result = authenticate(Some("not-a-jwt"));
        assert_matches!(result, Err(SocketError::InvalidToken));
    }
}
