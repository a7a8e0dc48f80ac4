//! Pull request data models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::issues::Label;
use super::repos::Repository;
use super::users::User;

/// Canonical state for open items.
pub const STATE_OPEN: &str = "open";
/// Canonical state for everything that is not open.
pub const STATE_CLOSED: &str = "closed";

/// Whether a pull request can be merged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeableState {
    /// Not computed yet or unrecognized
    #[default]
    Unknown,
    /// Can be merged cleanly
    Mergeable,
    /// Conflicts with the target branch
    Conflict,
}

impl MergeableState {
    /// Map a provider merge-status token.
    #[must_use]
    pub fn from_native(text: &str) -> Self {
        match text.to_ascii_lowercase().as_str() {
            "clean" | "mergeable" | "can_be_merged" => Self::Mergeable,
            "dirty" | "conflict" | "conflicting" | "cannot_be_merged" => Self::Conflict,
            _ => Self::Unknown,
        }
    }
}

/// One side (head or base) of a pull request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestBranch {
    /// Branch name
    #[serde(rename = "ref")]
    pub reference: String,
    /// Commit sha
    pub sha: String,
    /// Owning repository
    pub repo: Repository,
}

/// Canonical pull request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequest {
    /// Per-repository number
    pub number: i64,
    /// Title
    pub title: String,
    /// Body text
    pub body: String,
    /// Canonical state: "open" or "closed"
    pub state: String,
    /// Merge commit sha
    pub sha: String,
    /// Synthetic head reference, e.g. `refs/merge-requests/1/head`
    #[serde(rename = "ref")]
    pub reference: String,
    /// Source branch name
    pub source: String,
    /// Target branch name
    pub target: String,
    /// Head branch, sha and repository
    pub head: PullRequestBranch,
    /// Base branch, sha and repository
    pub base: PullRequestBranch,
    /// `namespace/name` of the source repository
    pub fork: String,
    /// Web link
    pub link: String,
    /// Work in progress
    pub draft: bool,
    /// Closed or merged
    pub closed: bool,
    /// Merged
    pub merged: bool,
    /// Mergeable without conflicts
    pub mergeable: bool,
    /// Detailed mergeability
    pub mergeable_state: MergeableState,
    /// Author
    pub author: User,
    /// Assignees; at most one on single-assignee providers
    pub assignees: Vec<User>,
    /// Labels
    pub labels: Vec<Label>,
    /// When the pull request was created
    pub created: Option<DateTime<Utc>>,
    /// When the pull request was last updated
    pub updated: Option<DateTime<Utc>>,
}

impl PullRequest {
    /// Names of the attached labels.
    #[must_use]
    pub fn label_names(&self) -> Vec<String> {
        self.labels.iter().map(|l| l.name.clone()).collect()
    }
}

/// Input for creating or updating a pull request.
///
/// Empty fields are left untouched on update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestInput {
    /// Title
    pub title: String,
    /// Body text
    pub body: String,
    /// Source branch
    pub head: String,
    /// Target branch
    pub base: String,
}

/// Options for merging a pull request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestMergeOptions {
    /// Commit title for the merge commit
    pub commit_title: String,
    /// Merge method: "merge", "squash" or "rebase"
    pub merge_method: String,
    /// Delete the source branch after merging
    pub delete_source_branch: bool,
}
