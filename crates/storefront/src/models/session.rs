//! Session-related types.
//!
//! Types stored in the session for authentication state and one-shot notices.

use serde::{Deserialize, Serialize};

use bazaar_core::{Email, UserId};

use super::user::User;

/// Session-stored user identity.
///
/// Minimal data stored in the session to identify the logged-in user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    /// User's database ID.
    pub id: UserId,
    /// User's email address.
    pub email: Email,
}

impl From<&User> for CurrentUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
        }
    }
}

/// Tone of a flash notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlashKind {
    Success,
    Error,
}

/// A notice shown once on the next rendered page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub kind: FlashKind,
    pub message: String,
}

impl Flash {
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Success,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Error,
            message: message.into(),
        }
    }

    /// CSS modifier for the notice banner.
    #[must_use]
    pub const fn css_class(&self) -> &'static str {
        match self.kind {
            FlashKind::Success => "notice--success",
            FlashKind::Error => "notice--error",
        }
    }
}

/// Session keys.
pub mod keys {
    /// Key for storing the current logged-in user.
    pub const CURRENT_USER: &str = "current_user";

    /// Key for the pending flash notice.
    pub const FLASH: &str = "flash";
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_flash_roundtrips_through_json() {
        let flash = Flash::error("Failed to place order. Please try again.");
        let json = serde_json::to_string(&flash).unwrap();
        assert!(json.contains("\"kind\":\"error\""));
        assert_eq!(serde_json::from_str::<Flash>(&json).unwrap(), flash);
    }

    #[test]
    fn test_flash_css_class() {
        assert_eq!(Flash::success("ok").css_class(), "notice--success");
        assert_eq!(Flash::error("no").css_class(), "notice--error");
    }
}
