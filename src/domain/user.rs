//! User profile slice consumed by the engine
//!
//! Only the fields the scheduler actually reads: the owner's timezone (for
//! composing due instants) and the notification preference (gating reminder
//! delivery). Account data, credentials and the rest of the profile live
//! with the out-of-scope CRUD collaborators.

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// A task owner as seen by the scheduling engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Opaque identity, referenced by `Task::user`
    pub id: String,

    pub username: String,

    pub email: String,

    /// IANA timezone the owner's due dates and times are interpreted in
    #[serde(default = "default_timezone")]
    pub timezone: Tz,

    /// Whether reminder notifications are delivered at all
    #[serde(default = "default_notifications")]
    pub notifications_enabled: bool,
}

fn default_timezone() -> Tz {
    chrono_tz::Africa::Lagos
}

fn default_notifications() -> bool {
    true
}

impl User {
    /// Create a user with default preferences
    pub fn new(id: impl Into<String>, username: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            username: username.into(),
            email: email.into(),
            timezone: default_timezone(),
            notifications_enabled: true,
        }
    }

    /// Set the timezone
    pub fn with_timezone(mut self, tz: Tz) -> Self {
        self.timezone = tz;
        self
    }

    /// Set the notification preference
    pub fn with_notifications(mut self, enabled: bool) -> Self {
        self.notifications_enabled = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_defaults() {
        let user = User::new("u1", "amara", "amara@example.com");
        assert_eq!(user.timezone, chrono_tz::Africa::Lagos);
        assert!(user.notifications_enabled);
    }

    #[test]
    fn test_timezone_deserializes_from_iana_name() {
        let json = r#"{"id":"u1","username":"ola","email":"o@example.com","timezone":"Europe/Berlin"}"#;
        let user: User = serde_json::from_str(json).unwrap();
        assert_eq!(user.timezone, chrono_tz::Europe::Berlin);
        // Unspecified preference falls back to enabled
        assert!(user.notifications_enabled);
    }

    #[test]
    fn test_invalid_timezone_rejected() {
        let json = r#"{"id":"u1","username":"ola","email":"o@example.com","timezone":"Mars/Olympus"}"#;
        assert!(serde_json::from_str::<User>(json).is_err());
    }
}
