//! User record and partial profile updates.

use serde::{Deserialize, Serialize};

use super::{Role, UserId};

/// An authenticated storefront user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Backend identifier (`_id` on the wire is accepted too).
    #[serde(alias = "_id")]
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Login email.
    pub email: String,
    /// Account role.
    #[serde(default)]
    pub role: Role,
}

impl User {
    /// Returns `true` for merchant accounts.
    #[inline]
    #[must_use]
    pub fn is_merchant(&self) -> bool {
        self.role == Role::Merchant
    }
}

/// A partial user record; set fields overwrite the current values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserUpdate {
    /// New display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New email.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// New role.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

impl UserUpdate {
    /// Creates an empty update.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the new name.
    #[inline]
    #[must_use]
    pub fn name<T: Into<String>>(mut self, name: T) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the new email.
    #[inline]
    #[must_use]
    pub fn email<T: Into<String>>(mut self, email: T) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Sets the new role.
    #[inline]
    #[must_use]
    pub const fn role(mut self, role: Role) -> Self {
        self.role = Some(role);
        self
    }

    /// Shallow-merges this update into `user`.
    #[inline]
    pub fn apply_to(self, user: &mut User) {
        if let Some(name) = self.name {
            user.name = name;
        }
        if let Some(email) = self.email {
            user.email = email;
        }
        if let Some(role) = self.role {
            user.role = role;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> User {
        User {
            id: UserId::new("u1"),
            name: "Alice".to_owned(),
            email: "alice@example.com".to_owned(),
            role: Role::Customer,
        }
    }

    #[test]
    fn deserialize_backend_user_with_underscore_id() {
        let json = r#"{
            "_id": "64f1c2aa",
            "name": "Bob",
            "email": "bob@example.com",
            "role": "merchant",
            "createdAt": "2024-01-01T00:00:00Z"
        }"#;
        let user: User = serde_json::from_str(json).unwrap();
        assert_eq!(user.id, UserId::new("64f1c2aa"));
        assert!(user.is_merchant());
    }

    #[test]
    fn missing_role_defaults_to_customer() {
        let json = r#"{"id": "u1", "name": "A", "email": "a@b.co"}"#;
        let user: User = serde_json::from_str(json).unwrap();
        assert_eq!(user.role, Role::Customer);
    }

    #[test]
    fn update_only_touches_set_fields() {
        let mut user = alice();
        UserUpdate::new().name("Alicia").apply_to(&mut user);
        assert_eq!(user.name, "Alicia");
        assert_eq!(user.email, "alice@example.com");
        assert_eq!(user.role, Role::Customer);
    }

    #[test]
    fn empty_update_is_identity() {
        let mut user = alice();
        UserUpdate::default().apply_to(&mut user);
        assert_eq!(user, alice());
    }

    #[test]
    fn update_serializes_only_present_fields() {
        let json = serde_json::to_string(&UserUpdate::new().role(Role::Merchant)).unwrap();
        assert_eq!(json, r#"{"role":"merchant"}"#);
    }
}
