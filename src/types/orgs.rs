//! Organization data models.

use serde::{Deserialize, Serialize};

use super::repos::Perm;

/// Canonical organization (a group on group-based providers).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    /// Provider identifier
    pub id: i64,
    /// Login / path
    pub name: String,
    /// Avatar URL
    pub avatar: String,
    /// Web link
    pub link: String,
    /// Caller permissions, when reported
    pub permissions: Option<Perm>,
}
