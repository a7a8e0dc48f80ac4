//! User-related data models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Canonical user.
///
/// `email` may be empty: not every provider exposes it without an extra
/// privileged call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Provider identifier
    pub id: i64,
    /// Login name
    pub login: String,
    /// Display name
    pub name: String,
    /// Email address
    pub email: String,
    /// Avatar URL
    pub avatar: String,
    /// Profile link
    pub link: String,
    /// Whether the user is a site administrator
    pub is_admin: bool,
    /// When the account was created
    pub created: Option<DateTime<Utc>>,
}

/// Personal access token.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserToken {
    /// Token identifier
    pub id: i64,
    /// Token value
    pub token: String,
}

/// Repository invitation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invitation {
    /// Invitation identifier
    pub id: i64,
    /// Invited-to repository full name
    pub repo: String,
    /// Inviting user
    pub inviter: User,
    /// Offered permission
    pub permissions: String,
}
