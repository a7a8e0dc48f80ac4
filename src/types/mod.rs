//! Canonical data model shared by every provider driver.

pub mod git;
pub mod issues;
pub mod milestones;
pub mod options;
pub mod orgs;
pub mod pulls;
pub mod releases;
pub mod repos;
pub mod reviews;
pub mod users;
pub mod webhooks;

// Re-exports
pub use git::{expand_ref, is_tag, trim_ref, Change, Commit, Reference, Signature};
pub use issues::{Comment, CommentInput, Issue, IssueInput, Label, ListedIssueEvent};
pub use milestones::{Milestone, MilestoneInput};
pub use options::{
    CommitListOptions, IssueListOptions, ListOptions, MilestoneListOptions,
    PullRequestListOptions, ReleaseListOptions,
};
pub use orgs::Organization;
pub use pulls::{
    MergeableState, PullRequest, PullRequestBranch, PullRequestInput, PullRequestMergeOptions,
    STATE_CLOSED, STATE_OPEN,
};
pub use releases::{Release, ReleaseInput};
pub use repos::{
    split_full_name, CombinedStatus, Hook, HookEvents, HookInput, Perm, Permission, Repository,
    RepositoryForkInput, RepositoryInput, State, Status, StatusInput,
};
pub use reviews::{Review, ReviewInput};
pub use users::{Invitation, User, UserToken};
pub use webhooks::{
    Action, BranchHook, IssueCommentHook, PullRequestCommentHook, PullRequestHook, PushHook,
    TagHook, WebhookEvent,
};
