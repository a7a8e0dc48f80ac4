//! Repository-related data models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Canonical repository.
///
/// `full_name` is always `namespace/name`; build it with
/// [`Repository::full_name_of`] rather than by hand.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    /// Provider identifier
    pub id: String,
    /// Owning namespace (user or group path)
    pub namespace: String,
    /// Repository name
    pub name: String,
    /// `namespace/name`
    pub full_name: String,
    /// Caller permissions, when the provider reported them
    pub perm: Option<Perm>,
    /// Default branch
    pub branch: String,
    /// Whether the repository is not publicly visible
    pub private: bool,
    /// Whether the repository is archived
    pub archived: bool,
    /// HTTP clone URL
    pub clone: String,
    /// SSH clone URL
    pub clone_ssh: String,
    /// Web link
    pub link: String,
    /// When the repository was created
    pub created: Option<DateTime<Utc>>,
    /// When the repository was last updated
    pub updated: Option<DateTime<Utc>>,
}

impl Repository {
    /// Join a namespace and name into a full name.
    #[must_use]
    pub fn full_name_of(namespace: &str, name: &str) -> String {
        format!("{namespace}/{name}")
    }
}

/// Split `namespace/name` at its last slash.
///
/// Nested groups keep their full path in the namespace part.
#[must_use]
pub fn split_full_name(full_name: &str) -> (&str, &str) {
    match full_name.rsplit_once('/') {
        Some((namespace, name)) => (namespace, name),
        None => ("", full_name),
    }
}

/// Repository permission summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Perm {
    /// Can read
    pub pull: bool,
    /// Can write
    pub push: bool,
    /// Can administer
    pub admin: bool,
}

/// Collaborator permission level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    /// No access
    #[default]
    None,
    /// Read access
    Read,
    /// Write access
    Write,
    /// Admin access
    Admin,
}

impl Permission {
    /// Canonical name of the permission.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Read => "read",
            Self::Write => "write",
            Self::Admin => "admin",
        }
    }
}

/// Input for creating a repository.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryInput {
    /// Target namespace; empty means the authenticated user
    pub namespace: String,
    /// Repository name
    pub name: String,
    /// Description
    pub description: String,
    /// Create as private
    pub private: bool,
}

/// Input for forking a repository.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryForkInput {
    /// Namespace receiving the fork; empty means the authenticated user
    pub namespace: String,
}

/// Repository webhook.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hook {
    /// Hook identifier
    pub id: String,
    /// Hook name, when the provider has one
    pub name: String,
    /// Delivery target
    pub target: String,
    /// Subscribed provider event names
    pub events: Vec<String>,
    /// Whether the hook is active
    pub active: bool,
    /// Whether TLS verification is skipped
    pub skip_verify: bool,
}

/// Canonical hook event subscriptions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HookEvents {
    /// Branch pushes
    pub push: bool,
    /// Tag pushes
    pub tag: bool,
    /// Issue lifecycle
    pub issue: bool,
    /// Issue comments
    pub issue_comment: bool,
    /// Pull request lifecycle
    pub pull_request: bool,
    /// Pull request comments
    pub pull_request_comment: bool,
    /// Review comments
    pub review_comment: bool,
}

/// Input for creating or updating a repository webhook.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HookInput {
    /// Hook name
    pub name: String,
    /// Delivery target
    pub target: String,
    /// Shared secret token
    pub secret: String,
    /// Canonical subscriptions
    pub events: HookEvents,
    /// Skip TLS verification
    pub skip_verify: bool,
}

/// Commit status state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum State {
    /// Unrecognized state
    #[default]
    Unknown,
    /// Queued
    Pending,
    /// In progress
    Running,
    /// Succeeded
    Success,
    /// Failed
    Failure,
    /// Cancelled
    Canceled,
    /// Errored
    Error,
}

/// Commit status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    /// Status state
    pub state: State,
    /// Status name
    pub label: String,
    /// Description
    pub desc: String,
    /// Details link
    pub target: String,
}

/// Input for creating a commit status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusInput {
    /// Status state
    pub state: State,
    /// Status name
    pub label: String,
    /// Description
    pub desc: String,
    /// Details link
    pub target: String,
}

/// Aggregated status of a commit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombinedStatus {
    /// Worst state among `statuses`
    pub state: State,
    /// Commit sha
    pub sha: String,
    /// Individual statuses
    pub statuses: Vec<Status>,
}

impl CombinedStatus {
    /// Combine statuses, picking the most severe state.
    ///
    /// Severity order: failure/error, canceled, running, pending, success.
    #[must_use]
    pub fn combine(sha: &str, statuses: Vec<Status>) -> Self {
        fn rank(state: State) -> u8 {
            match state {
                State::Failure | State::Error => 5,
                State::Canceled => 4,
                State::Running => 3,
                State::Pending => 2,
                State::Success => 1,
                State::Unknown => 0,
            }
        }
        let state = statuses
            .iter()
            .map(|s| s.state)
            .max_by_key(|s| rank(*s))
            .unwrap_or_default();
        Self {
            state,
            sha: sha.to_string(),
            statuses,
        }
    }
}
