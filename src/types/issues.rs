//! Issue, comment and label data models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::users::User;

/// Canonical issue.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    /// Per-repository number
    pub number: i64,
    /// Title
    pub title: String,
    /// Body text
    pub body: String,
    /// Web link
    pub link: String,
    /// Canonical state: "open" or "closed"
    pub state: String,
    /// Label names
    pub labels: Vec<String>,
    /// Whether the issue is closed
    pub closed: bool,
    /// Whether discussion is locked
    pub locked: bool,
    /// Author
    pub author: User,
    /// Assignees
    pub assignees: Vec<User>,
    /// Whether the issue is really a pull request
    pub pull_request: bool,
    /// When the issue was created
    pub created: Option<DateTime<Utc>>,
    /// When the issue was last updated
    pub updated: Option<DateTime<Utc>>,
}

/// Input for creating an issue.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueInput {
    /// Title
    pub title: String,
    /// Body text
    pub body: String,
}

/// Canonical comment (issue note or pull request note).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    /// Comment identifier
    pub id: i64,
    /// Body text
    pub body: String,
    /// Author
    pub author: User,
    /// Web link
    pub link: String,
    /// When the comment was created
    pub created: Option<DateTime<Utc>>,
    /// When the comment was last updated
    pub updated: Option<DateTime<Utc>>,
}

/// Input for creating or editing a comment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentInput {
    /// Body text
    pub body: String,
}

/// Canonical label.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    /// Label identifier, 0 when only the name is known
    pub id: i64,
    /// Label name
    pub name: String,
    /// Description
    pub description: String,
    /// Color
    pub color: String,
}

impl Label {
    /// A label known only by name.
    #[must_use]
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }
}

/// A label being added to or removed from an issue or pull request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListedIssueEvent {
    /// Event identifier
    pub id: i64,
    /// Who acted
    pub actor: User,
    /// "labeled" or "unlabeled"
    pub event: String,
    /// The label concerned
    pub label: Label,
    /// When the event happened
    pub created: Option<DateTime<Utc>>,
}
