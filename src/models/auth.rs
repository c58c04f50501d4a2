//! Request and response bodies of the `/auth` endpoints.

use serde::{Deserialize, Serialize};

use super::{Role, User};
use crate::error::{Result, StorefrontError};
use crate::messages;

/// Login form payload.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// Login email.
    pub email: String,
    /// Plain-text password, sent once over TLS.
    pub password: String,
}

impl core::fmt::Debug for Credentials {
    #[inline]
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Registration form payload.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    /// Display name.
    pub name: String,
    /// Login email.
    pub email: String,
    /// Plain-text password.
    pub password: String,
    /// Requested role.
    pub role: Role,
}

impl core::fmt::Debug for Registration {
    #[inline]
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Registration")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .field("role", &self.role)
            .finish()
    }
}

/// Body returned by login and register.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthResponse {
    /// Whether the backend accepted the request.
    #[serde(default)]
    pub success: bool,
    /// The authenticated user.
    #[serde(default)]
    pub user: Option<User>,
    /// Bearer token for subsequent requests.
    #[serde(default)]
    pub token: Option<String>,
    /// Optional backend message.
    #[serde(default)]
    pub message: Option<String>,
}

impl AuthResponse {
    /// Splits a successful response into the user and token a session
    /// store needs.
    ///
    /// # Errors
    ///
    /// Returns [`StorefrontError::Api`] if the response is not a success
    /// or lacks the user or token.
    #[inline]
    pub fn into_session(self) -> Result<(User, String)> {
        match (self.success, self.user, self.token) {
            (true, Some(user), Some(token)) if !token.is_empty() => Ok((user, token)),
            _ => Err(StorefrontError::Api {
                status: 200,
                message: self
                    .message
                    .unwrap_or_else(|| messages::error::UNKNOWN_ERROR.to_owned()),
            }),
        }
    }
}

/// Body returned by `GET /auth/profile`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileResponse {
    /// Whether the backend accepted the request.
    #[serde(default)]
    pub success: bool,
    /// The current user.
    pub user: User,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserId;

    #[test]
    fn credentials_debug_hides_password() {
        let creds = Credentials {
            email: "a@b.co".to_owned(),
            password: "hunter22".to_owned(),
        };
        let debug = format!("{creds:?}");
        assert!(!debug.contains("hunter22"));
        assert!(debug.contains("a@b.co"));
    }

    #[test]
    fn registration_serializes_role_lowercase() {
        let reg = Registration {
            name: "Ann".to_owned(),
            email: "ann@example.com".to_owned(),
            password: "secret1".to_owned(),
            role: Role::Merchant,
        };
        let json = serde_json::to_string(&reg).unwrap();
        assert!(json.contains(r#""role":"merchant""#));
        assert!(!format!("{reg:?}").contains("secret1"));
    }

    #[test]
    fn successful_response_yields_session() {
        let json = r#"{
            "success": true,
            "token": "aaa.bbb.ccc",
            "user": {"_id": "u1", "name": "Ann", "email": "ann@example.com", "role": "customer"}
        }"#;
        let response: AuthResponse = serde_json::from_str(json).unwrap();
        let (user, token) = response.into_session().unwrap();
        assert_eq!(user.id, UserId::new("u1"));
        assert_eq!(token, "aaa.bbb.ccc");
    }

    #[test]
    fn unsuccessful_response_carries_backend_message() {
        let json = r#"{"success": false, "message": "Invalid email or password"}"#;
        let response: AuthResponse = serde_json::from_str(json).unwrap();
        let err = response.into_session().unwrap_err();
        assert_eq!(err.user_message(), "Invalid email or password");
    }

    #[test]
    fn success_without_token_is_rejected() {
        let json = r#"{"success": true, "user": {"id": "u1", "name": "A", "email": "a@b.co"}}"#;
        let response: AuthResponse = serde_json::from_str(json).unwrap();
        let err = response.into_session().unwrap_err();
        assert_eq!(err.user_message(), "An unexpected error occurred");
    }
}
