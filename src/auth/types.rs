//! Auth configuration types
//!
//! These types represent the runtime auth configuration derived from the
//! connection settings.

use crate::config::ConnectionConfig;
use crate::types::AuthType;
use chrono::{DateTime, Utc};
use std::fmt;

/// Authentication configuration
#[derive(Clone, Default)]
pub enum AuthConfig {
    /// No authentication required
    #[default]
    None,

    /// HTTP Basic authentication
    Basic {
        /// Username
        username: String,
        /// Password
        password: String,
    },

    /// Username/password exchanged for a bearer token
    Token {
        /// Token endpoint URL
        token_url: String,
        /// Username
        username: String,
        /// Password
        password: String,
    },
}

impl AuthConfig {
    /// Build the auth config for a connection
    pub fn from_connection(conn: &ConnectionConfig) -> Self {
        match conn.auth_type {
            AuthType::Basic => Self::Basic {
                username: conn.username.clone(),
                password: conn.password.clone(),
            },
            AuthType::Token => Self::Token {
                token_url: format!(
                    "{}/{}",
                    conn.server_url.trim_end_matches('/'),
                    conn.token_endpoint.trim_start_matches('/')
                ),
                username: conn.username.clone(),
                password: conn.password.clone(),
            },
        }
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "None"),
            Self::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .finish_non_exhaustive(),
            Self::Token {
                token_url,
                username,
                ..
            } => f
                .debug_struct("Token")
                .field("token_url", token_url)
                .field("username", username)
                .finish_non_exhaustive(),
        }
    }
}

/// Cached token with expiration
#[derive(Debug, Clone)]
pub struct CachedToken {
    /// The access token
    pub token: String,
    /// When the token expires
    pub expires_at: Option<DateTime<Utc>>,
}

impl CachedToken {
    /// Create a new cached token
    pub fn new(token: String, expires_at: Option<DateTime<Utc>>) -> Self {
        Self { token, expires_at }
    }

    /// Create a token that expires in N seconds from now
    pub fn expires_in(token: String, seconds: i64) -> Self {
        let expires_at = Utc::now() + chrono::Duration::seconds(seconds);
        Self {
            token,
            expires_at: Some(expires_at),
        }
    }

    /// Check if the token is expired (with 30 second buffer)
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires_at) => {
                let buffer = chrono::Duration::seconds(30);
                Utc::now() + buffer >= expires_at
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod type_tests {
    use super::*;

    #[test]
    fn test_cached_token_not_expired() {
        let token = CachedToken::expires_in("test".to_string(), 3600);
        assert!(!token.is_expired());
    }

    #[test]
    fn test_cached_token_expired() {
        let token = CachedToken::expires_in("test".to_string(), -100);
        assert!(token.is_expired());
    }

    #[test]
    fn test_cached_token_no_expiration() {
        let token = CachedToken::new("test".to_string(), None);
        assert!(!token.is_expired());
    }

    #[test]
    fn test_from_connection() {
        let mut conn = ConnectionConfig::new("https://sap.local/api/", "u", "p");
        assert!(matches!(
            AuthConfig::from_connection(&conn),
            AuthConfig::Basic { .. }
        ));

        conn.auth_type = AuthType::Token;
        conn.token_endpoint = "/oauth/token".to_string();
        match AuthConfig::from_connection(&conn) {
            AuthConfig::Token { token_url, .. } => {
                assert_eq!(token_url, "https://sap.local/api/oauth/token");
            }
            other => panic!("unexpected auth config: {other:?}"),
        }
    }

    #[test]
    fn test_debug_hides_password() {
        let auth = AuthConfig::Basic {
            username: "u".to_string(),
            password: "hunter2".to_string(),
        };
        assert!(!format!("{auth:?}").contains("hunter2"));
    }
}
