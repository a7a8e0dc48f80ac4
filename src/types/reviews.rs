//! Code review data models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::users::User;

/// Canonical code review comment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    /// Review identifier
    pub id: i64,
    /// Body text
    pub body: String,
    /// File the comment is anchored to
    pub path: String,
    /// Commit sha
    pub sha: String,
    /// Line number
    pub line: i64,
    /// Web link
    pub link: String,
    /// Author
    pub author: User,
    /// When the review was created
    pub created: Option<DateTime<Utc>>,
    /// When the review was last updated
    pub updated: Option<DateTime<Utc>>,
}

/// Input for creating a review comment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewInput {
    /// Body text
    pub body: String,
    /// Commit sha
    pub sha: String,
    /// File path
    pub path: String,
    /// Line number
    pub line: i64,
}
