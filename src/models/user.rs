//! User domain models

use serde::Serialize;
use std::fmt;

/// User account
///
/// `password_hash` is an Argon2 PHC string. It never leaves the server: the
/// type is not `Serialize` and its `Debug` output redacts the hash.
#[derive(Clone, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub login: String,
    pub password_hash: String,
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("login", &self.login)
            .field("password_hash", &"[REDACTED]")
            .finish()
    }
}

/// User response (client-facing)
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub login: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            login: user.login,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_password_hash() {
        let user = User {
            id: 7,
            login: "alice".to_string(),
            password_hash: "$argon2id$v=19$secret".to_string(),
        };

        let debug = format!("{:?}", user);
        assert!(debug.contains("alice"));
        assert!(!debug.contains("argon2id"));
    }

    #[test]
    fn test_user_response_drops_hash() {
        let user = User {
            id: 7,
            login: "alice".to_string(),
            password_hash: "$argon2id$v=19$secret".to_string(),
        };

        let json = serde_json::to_value(UserResponse::from(user)).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["login"], "alice");
        assert!(json.get("password_hash").is_none());
    }
}
