//! Canonical webhook events.
//!
//! Provider payloads are decoded into exactly one [`WebhookEvent`] variant.
//! Every variant carries the repository it concerns and the user that
//! triggered it, so secret resolution can work uniformly through
//! [`WebhookEvent::repository`].

use serde::{Deserialize, Serialize};

use super::git::{Commit, Reference};
use super::issues::{Comment, Issue};
use super::pulls::PullRequest;
use super::repos::Repository;
use super::users::User;

/// What happened to the subject of a webhook.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// No specific action
    #[default]
    None,
    /// Created
    Create,
    /// Updated
    Update,
    /// Deleted
    Delete,
    /// Opened
    Open,
    /// Reopened
    Reopen,
    /// Closed
    Close,
    /// Merged
    Merge,
    /// Labeled
    Label,
    /// Unlabeled
    Unlabel,
    /// Synchronized with new commits
    Sync,
}

/// Commits pushed to a branch or tag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushHook {
    /// Fully-qualified reference, e.g. `refs/heads/master`
    #[serde(rename = "ref")]
    pub reference: String,
    /// Sha before the push
    pub before: String,
    /// Sha after the push
    pub after: String,
    /// Repository
    pub repo: Repository,
    /// Most recent pushed commit
    pub commit: Commit,
    /// Pusher
    pub sender: User,
}

/// A branch was created or deleted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchHook {
    /// Branch (short name) and its sha
    #[serde(rename = "ref")]
    pub reference: Reference,
    /// Repository
    pub repo: Repository,
    /// Create or delete
    pub action: Action,
    /// Pusher
    pub sender: User,
}

/// A tag was created or deleted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagHook {
    /// Tag (short name) and its sha
    #[serde(rename = "ref")]
    pub reference: Reference,
    /// Repository
    pub repo: Repository,
    /// Create or delete
    pub action: Action,
    /// Pusher
    pub sender: User,
}

/// Pull request lifecycle event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestHook {
    /// Open, close, reopen, merge or update
    pub action: Action,
    /// Target repository
    pub repo: Repository,
    /// Pull request
    pub pull_request: PullRequest,
    /// Acting user
    pub sender: User,
}

/// Comment added to an issue.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueCommentHook {
    /// Comment action
    pub action: Action,
    /// Repository
    pub repo: Repository,
    /// Commented issue
    pub issue: Issue,
    /// The comment
    pub comment: Comment,
    /// Comment author
    pub sender: User,
}

/// Comment added to a pull request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestCommentHook {
    /// Comment action
    pub action: Action,
    /// Repository
    pub repo: Repository,
    /// Commented pull request
    pub pull_request: PullRequest,
    /// The comment
    pub comment: Comment,
    /// Comment author
    pub sender: User,
}

/// A parsed inbound webhook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "hook", rename_all = "snake_case")]
pub enum WebhookEvent {
    /// Commits pushed
    Push(PushHook),
    /// Branch created or deleted
    Branch(BranchHook),
    /// Tag created or deleted
    Tag(TagHook),
    /// Pull request event
    PullRequest(PullRequestHook),
    /// Issue comment
    IssueComment(IssueCommentHook),
    /// Pull request comment
    PullRequestComment(PullRequestCommentHook),
}

impl WebhookEvent {
    /// Repository the event concerns.
    #[must_use]
    pub fn repository(&self) -> &Repository {
        match self {
            Self::Push(hook) => &hook.repo,
            Self::Branch(hook) => &hook.repo,
            Self::Tag(hook) => &hook.repo,
            Self::PullRequest(hook) => &hook.repo,
            Self::IssueComment(hook) => &hook.repo,
            Self::PullRequestComment(hook) => &hook.repo,
        }
    }

    /// User that triggered the event.
    #[must_use]
    pub fn sender(&self) -> &User {
        match self {
            Self::Push(hook) => &hook.sender,
            Self::Branch(hook) => &hook.sender,
            Self::Tag(hook) => &hook.sender,
            Self::PullRequest(hook) => &hook.sender,
            Self::IssueComment(hook) => &hook.sender,
            Self::PullRequestComment(hook) => &hook.sender,
        }
    }

    /// Short name of the event kind, for logging.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Push(_) => "push",
            Self::Branch(_) => "branch",
            Self::Tag(_) => "tag",
            Self::PullRequest(_) => "pull_request",
            Self::IssueComment(_) => "issue_comment",
            Self::PullRequestComment(_) => "pull_request_comment",
        }
    }
}
