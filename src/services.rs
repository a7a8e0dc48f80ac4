//! Capability service contracts.
//!
//! One trait per domain. Every provider driver implements all of them;
//! operations a provider cannot perform return [`Error::NotSupported`]
//! without touching the network.
//!
//! [`Error::NotSupported`]: crate::Error::NotSupported

use async_trait::async_trait;
use http::HeaderMap;
use tokio::io::AsyncRead;

use crate::context::Context;
use crate::envelope::ResponseEnvelope;
use crate::error::Result;
use crate::types::{
    Change, CombinedStatus, Comment, CommentInput, Commit, CommitListOptions, Hook, HookInput,
    Invitation, Issue, IssueInput, IssueListOptions, Label, ListOptions, ListedIssueEvent,
    Milestone, MilestoneInput, MilestoneListOptions, Organization, Perm, Permission, PullRequest,
    PullRequestInput, PullRequestListOptions, PullRequestMergeOptions, Reference, Release,
    ReleaseInput, ReleaseListOptions, Repository, RepositoryForkInput, RepositoryInput, Review,
    ReviewInput, Status, StatusInput, User, UserToken, WebhookEvent,
};

/// Result of an operation returning a body.
pub type Response<T> = Result<(T, ResponseEnvelope)>;

/// Resolves the shared secret for a parsed webhook. An empty secret skips
/// verification.
pub type SecretFn = dyn Fn(&WebhookEvent) -> Result<String> + Send + Sync;

/// Repositories, hooks, commit statuses and collaborators.
#[async_trait]
pub trait RepositoryService: Send + Sync {
    /// Find a repository by `namespace/name` or numeric id.
    async fn find(&self, ctx: &Context, repo: &str) -> Response<Repository>;

    /// Caller permissions on a repository.
    async fn find_perms(&self, ctx: &Context, repo: &str) -> Response<Perm>;

    /// Repositories the caller is a member of.
    async fn list(&self, ctx: &Context, opts: ListOptions) -> Response<Vec<Repository>>;

    /// Create a repository.
    async fn create(&self, ctx: &Context, input: &RepositoryInput) -> Response<Repository>;

    /// Fork `repo`.
    async fn fork(
        &self,
        ctx: &Context,
        input: &RepositoryForkInput,
        repo: &str,
    ) -> Response<Repository>;

    /// Find a repository webhook.
    async fn find_hook(&self, ctx: &Context, repo: &str, id: &str) -> Response<Hook>;

    /// List repository webhooks.
    async fn list_hooks(&self, ctx: &Context, repo: &str, opts: ListOptions)
        -> Response<Vec<Hook>>;

    /// Create a repository webhook.
    async fn create_hook(&self, ctx: &Context, repo: &str, input: &HookInput) -> Response<Hook>;

    /// Update a repository webhook.
    async fn update_hook(
        &self,
        ctx: &Context,
        repo: &str,
        id: &str,
        input: &HookInput,
    ) -> Response<Hook>;

    /// Delete a repository webhook.
    async fn delete_hook(&self, ctx: &Context, repo: &str, id: &str) -> Result<ResponseEnvelope>;

    /// Statuses reported for a commit.
    async fn list_status(
        &self,
        ctx: &Context,
        repo: &str,
        sha: &str,
        opts: ListOptions,
    ) -> Response<Vec<Status>>;

    /// Combined status of a commit.
    async fn find_combined_status(
        &self,
        ctx: &Context,
        repo: &str,
        sha: &str,
    ) -> Response<CombinedStatus>;

    /// Report a status for a commit.
    async fn create_status(
        &self,
        ctx: &Context,
        repo: &str,
        sha: &str,
        input: &StatusInput,
    ) -> Response<Status>;

    /// Add a collaborator. The boolean is true when an invitation was sent
    /// instead of direct membership.
    async fn add_collaborator(
        &self,
        ctx: &Context,
        repo: &str,
        login: &str,
        permission: Permission,
    ) -> Response<bool>;

    /// List collaborators.
    async fn list_collaborators(
        &self,
        ctx: &Context,
        repo: &str,
        opts: ListOptions,
    ) -> Response<Vec<User>>;

    /// Permission a user holds on a repository.
    async fn find_user_permission(
        &self,
        ctx: &Context,
        repo: &str,
        login: &str,
    ) -> Response<Permission>;
}

/// Pull (merge) requests.
#[async_trait]
pub trait PullRequestService: Send + Sync {
    /// Find a pull request by number.
    async fn find(&self, ctx: &Context, repo: &str, number: i64) -> Response<PullRequest>;

    /// List pull requests.
    async fn list(
        &self,
        ctx: &Context,
        repo: &str,
        opts: &PullRequestListOptions,
    ) -> Response<Vec<PullRequest>>;

    /// Files changed by a pull request.
    async fn list_changes(
        &self,
        ctx: &Context,
        repo: &str,
        number: i64,
        opts: ListOptions,
    ) -> Response<Vec<Change>>;

    /// Create a pull request.
    async fn create(
        &self,
        ctx: &Context,
        repo: &str,
        input: &PullRequestInput,
    ) -> Response<PullRequest>;

    /// Update title, body or target branch; empty fields are left as is.
    async fn update(
        &self,
        ctx: &Context,
        repo: &str,
        number: i64,
        input: &PullRequestInput,
    ) -> Response<PullRequest>;

    /// Merge a pull request.
    async fn merge(
        &self,
        ctx: &Context,
        repo: &str,
        number: i64,
        opts: &PullRequestMergeOptions,
    ) -> Result<ResponseEnvelope>;

    /// Close a pull request.
    async fn close(&self, ctx: &Context, repo: &str, number: i64) -> Result<ResponseEnvelope>;

    /// Reopen a pull request.
    async fn reopen(&self, ctx: &Context, repo: &str, number: i64) -> Result<ResponseEnvelope>;

    /// Find a comment.
    async fn find_comment(
        &self,
        ctx: &Context,
        repo: &str,
        number: i64,
        id: i64,
    ) -> Response<Comment>;

    /// List comments.
    async fn list_comments(
        &self,
        ctx: &Context,
        repo: &str,
        number: i64,
        opts: ListOptions,
    ) -> Response<Vec<Comment>>;

    /// Create a comment.
    async fn create_comment(
        &self,
        ctx: &Context,
        repo: &str,
        number: i64,
        input: &CommentInput,
    ) -> Response<Comment>;

    /// Edit a comment.
    async fn edit_comment(
        &self,
        ctx: &Context,
        repo: &str,
        number: i64,
        id: i64,
        input: &CommentInput,
    ) -> Response<Comment>;

    /// Delete a comment.
    async fn delete_comment(
        &self,
        ctx: &Context,
        repo: &str,
        number: i64,
        id: i64,
    ) -> Result<ResponseEnvelope>;

    /// Labels attached to a pull request.
    async fn list_labels(
        &self,
        ctx: &Context,
        repo: &str,
        number: i64,
        opts: ListOptions,
    ) -> Response<Vec<Label>>;

    /// Label add/remove history.
    async fn list_events(
        &self,
        ctx: &Context,
        repo: &str,
        number: i64,
        opts: ListOptions,
    ) -> Response<Vec<ListedIssueEvent>>;

    /// Attach a label; no write when already attached.
    async fn add_label(
        &self,
        ctx: &Context,
        repo: &str,
        number: i64,
        label: &str,
    ) -> Result<ResponseEnvelope>;

    /// Detach a label; no write when not attached.
    async fn delete_label(
        &self,
        ctx: &Context,
        repo: &str,
        number: i64,
        label: &str,
    ) -> Result<ResponseEnvelope>;

    /// Assign users.
    async fn assign(
        &self,
        ctx: &Context,
        repo: &str,
        number: i64,
        logins: &[String],
    ) -> Result<ResponseEnvelope>;

    /// Unassign users.
    async fn unassign(
        &self,
        ctx: &Context,
        repo: &str,
        number: i64,
        logins: &[String],
    ) -> Result<ResponseEnvelope>;

    /// Request reviews.
    async fn request_review(
        &self,
        ctx: &Context,
        repo: &str,
        number: i64,
        logins: &[String],
    ) -> Result<ResponseEnvelope>;

    /// Withdraw review requests.
    async fn unrequest_review(
        &self,
        ctx: &Context,
        repo: &str,
        number: i64,
        logins: &[String],
    ) -> Result<ResponseEnvelope>;

    /// Attach a milestone.
    async fn set_milestone(
        &self,
        ctx: &Context,
        repo: &str,
        number: i64,
        milestone: i64,
    ) -> Result<ResponseEnvelope>;

    /// Detach the milestone.
    async fn clear_milestone(
        &self,
        ctx: &Context,
        repo: &str,
        number: i64,
    ) -> Result<ResponseEnvelope>;
}

/// Issues.
#[async_trait]
pub trait IssueService: Send + Sync {
    /// Find an issue by number.
    async fn find(&self, ctx: &Context, repo: &str, number: i64) -> Response<Issue>;

    /// List issues.
    async fn list(
        &self,
        ctx: &Context,
        repo: &str,
        opts: IssueListOptions,
    ) -> Response<Vec<Issue>>;

    /// Create an issue.
    async fn create(&self, ctx: &Context, repo: &str, input: &IssueInput) -> Response<Issue>;

    /// Close an issue.
    async fn close(&self, ctx: &Context, repo: &str, number: i64) -> Result<ResponseEnvelope>;

    /// Reopen an issue.
    async fn reopen(&self, ctx: &Context, repo: &str, number: i64) -> Result<ResponseEnvelope>;

    /// Lock discussion.
    async fn lock(&self, ctx: &Context, repo: &str, number: i64) -> Result<ResponseEnvelope>;

    /// Unlock discussion.
    async fn unlock(&self, ctx: &Context, repo: &str, number: i64) -> Result<ResponseEnvelope>;

    /// Find a comment.
    async fn find_comment(
        &self,
        ctx: &Context,
        repo: &str,
        number: i64,
        id: i64,
    ) -> Response<Comment>;

    /// List comments.
    async fn list_comments(
        &self,
        ctx: &Context,
        repo: &str,
        number: i64,
        opts: ListOptions,
    ) -> Response<Vec<Comment>>;

    /// Create a comment.
    async fn create_comment(
        &self,
        ctx: &Context,
        repo: &str,
        number: i64,
        input: &CommentInput,
    ) -> Response<Comment>;

    /// Edit a comment.
    async fn edit_comment(
        &self,
        ctx: &Context,
        repo: &str,
        number: i64,
        id: i64,
        input: &CommentInput,
    ) -> Response<Comment>;

    /// Delete a comment.
    async fn delete_comment(
        &self,
        ctx: &Context,
        repo: &str,
        number: i64,
        id: i64,
    ) -> Result<ResponseEnvelope>;

    /// Labels attached to an issue.
    async fn list_labels(
        &self,
        ctx: &Context,
        repo: &str,
        number: i64,
        opts: ListOptions,
    ) -> Response<Vec<Label>>;

    /// Label add/remove history.
    async fn list_events(
        &self,
        ctx: &Context,
        repo: &str,
        number: i64,
        opts: ListOptions,
    ) -> Response<Vec<ListedIssueEvent>>;

    /// Attach a label; no write when already attached.
    async fn add_label(
        &self,
        ctx: &Context,
        repo: &str,
        number: i64,
        label: &str,
    ) -> Result<ResponseEnvelope>;

    /// Detach a label; no write when not attached.
    async fn delete_label(
        &self,
        ctx: &Context,
        repo: &str,
        number: i64,
        label: &str,
    ) -> Result<ResponseEnvelope>;

    /// Add assignees; no write when membership is unchanged.
    async fn assign(
        &self,
        ctx: &Context,
        repo: &str,
        number: i64,
        logins: &[String],
    ) -> Result<ResponseEnvelope>;

    /// Remove assignees; no write when membership is unchanged.
    async fn unassign(
        &self,
        ctx: &Context,
        repo: &str,
        number: i64,
        logins: &[String],
    ) -> Result<ResponseEnvelope>;

    /// Attach a milestone.
    async fn set_milestone(
        &self,
        ctx: &Context,
        repo: &str,
        number: i64,
        milestone: i64,
    ) -> Result<ResponseEnvelope>;

    /// Detach the milestone.
    async fn clear_milestone(
        &self,
        ctx: &Context,
        repo: &str,
        number: i64,
    ) -> Result<ResponseEnvelope>;
}

/// Milestones.
#[async_trait]
pub trait MilestoneService: Send + Sync {
    /// Find a milestone.
    async fn find(&self, ctx: &Context, repo: &str, id: i64) -> Response<Milestone>;

    /// List milestones.
    async fn list(
        &self,
        ctx: &Context,
        repo: &str,
        opts: MilestoneListOptions,
    ) -> Response<Vec<Milestone>>;

    /// Create a milestone.
    async fn create(
        &self,
        ctx: &Context,
        repo: &str,
        input: &MilestoneInput,
    ) -> Response<Milestone>;

    /// Update a milestone.
    async fn update(
        &self,
        ctx: &Context,
        repo: &str,
        id: i64,
        input: &MilestoneInput,
    ) -> Response<Milestone>;

    /// Delete a milestone.
    async fn delete(&self, ctx: &Context, repo: &str, id: i64) -> Result<ResponseEnvelope>;
}

/// Releases.
#[async_trait]
pub trait ReleaseService: Send + Sync {
    /// Find a release by id.
    async fn find(&self, ctx: &Context, repo: &str, id: i64) -> Response<Release>;

    /// Find a release by tag.
    async fn find_by_tag(&self, ctx: &Context, repo: &str, tag: &str) -> Response<Release>;

    /// List releases.
    async fn list(
        &self,
        ctx: &Context,
        repo: &str,
        opts: ReleaseListOptions,
    ) -> Response<Vec<Release>>;

    /// Create a release.
    async fn create(&self, ctx: &Context, repo: &str, input: &ReleaseInput) -> Response<Release>;

    /// Update a release by id.
    async fn update(
        &self,
        ctx: &Context,
        repo: &str,
        id: i64,
        input: &ReleaseInput,
    ) -> Response<Release>;

    /// Update a release by tag.
    async fn update_by_tag(
        &self,
        ctx: &Context,
        repo: &str,
        tag: &str,
        input: &ReleaseInput,
    ) -> Response<Release>;

    /// Delete a release by id.
    async fn delete(&self, ctx: &Context, repo: &str, id: i64) -> Result<ResponseEnvelope>;

    /// Delete a release by tag.
    async fn delete_by_tag(&self, ctx: &Context, repo: &str, tag: &str)
        -> Result<ResponseEnvelope>;
}

/// Organizations (groups).
#[async_trait]
pub trait OrganizationService: Send + Sync {
    /// Find an organization by name.
    async fn find(&self, ctx: &Context, name: &str) -> Response<Organization>;

    /// Organizations visible to the caller.
    async fn list(&self, ctx: &Context, opts: ListOptions) -> Response<Vec<Organization>>;

    /// Members of an organization.
    async fn list_members(
        &self,
        ctx: &Context,
        name: &str,
        opts: ListOptions,
    ) -> Response<Vec<User>>;
}

/// Users.
#[async_trait]
pub trait UserService: Send + Sync {
    /// The authenticated user.
    async fn find(&self, ctx: &Context) -> Response<User>;

    /// Find a user by login.
    async fn find_login(&self, ctx: &Context, login: &str) -> Response<User>;

    /// Find a user by numeric id.
    async fn find_login_by_id(&self, ctx: &Context, id: i64) -> Response<User>;

    /// Email of the authenticated user.
    async fn find_email(&self, ctx: &Context) -> Response<String>;

    /// Create a personal access token.
    async fn create_token(&self, ctx: &Context, user: &str, name: &str) -> Response<UserToken>;

    /// Delete a personal access token.
    async fn delete_token(&self, ctx: &Context, id: i64) -> Result<ResponseEnvelope>;

    /// Pending repository invitations.
    async fn list_invitations(&self, ctx: &Context) -> Response<Vec<Invitation>>;

    /// Accept a repository invitation.
    async fn accept_invitation(&self, ctx: &Context, id: i64) -> Result<ResponseEnvelope>;
}

/// Code review comments.
#[async_trait]
pub trait ReviewService: Send + Sync {
    /// Find a review.
    async fn find(&self, ctx: &Context, repo: &str, number: i64, id: i64) -> Response<Review>;

    /// List reviews.
    async fn list(
        &self,
        ctx: &Context,
        repo: &str,
        number: i64,
        opts: ListOptions,
    ) -> Response<Vec<Review>>;

    /// Create a review.
    async fn create(
        &self,
        ctx: &Context,
        repo: &str,
        number: i64,
        input: &ReviewInput,
    ) -> Response<Review>;

    /// Delete a review.
    async fn delete(
        &self,
        ctx: &Context,
        repo: &str,
        number: i64,
        id: i64,
    ) -> Result<ResponseEnvelope>;
}

/// Branches, tags and commits.
#[async_trait]
pub trait GitService: Send + Sync {
    /// Find a branch.
    async fn find_branch(&self, ctx: &Context, repo: &str, name: &str) -> Response<Reference>;

    /// Find a commit.
    async fn find_commit(&self, ctx: &Context, repo: &str, sha: &str) -> Response<Commit>;

    /// Find a tag.
    async fn find_tag(&self, ctx: &Context, repo: &str, name: &str) -> Response<Reference>;

    /// List branches.
    async fn list_branches(
        &self,
        ctx: &Context,
        repo: &str,
        opts: ListOptions,
    ) -> Response<Vec<Reference>>;

    /// List commits.
    async fn list_commits(
        &self,
        ctx: &Context,
        repo: &str,
        opts: &CommitListOptions,
    ) -> Response<Vec<Commit>>;

    /// List tags.
    async fn list_tags(
        &self,
        ctx: &Context,
        repo: &str,
        opts: ListOptions,
    ) -> Response<Vec<Reference>>;

    /// Files changed by a commit.
    async fn list_changes(
        &self,
        ctx: &Context,
        repo: &str,
        sha: &str,
        opts: ListOptions,
    ) -> Response<Vec<Change>>;

    /// Files changed between two commits.
    async fn compare_commits(
        &self,
        ctx: &Context,
        repo: &str,
        source: &str,
        target: &str,
        opts: ListOptions,
    ) -> Response<Vec<Change>>;

    /// Create a branch pointing at `sha`.
    async fn create_ref(
        &self,
        ctx: &Context,
        repo: &str,
        name: &str,
        sha: &str,
    ) -> Response<Reference>;

    /// Delete a branch.
    async fn delete_ref(&self, ctx: &Context, repo: &str, name: &str) -> Result<ResponseEnvelope>;
}

/// Inbound webhook parsing and verification.
#[async_trait]
pub trait WebhookService: Send + Sync {
    /// Read, classify, decode and verify a delivery.
    ///
    /// # Errors
    ///
    /// [`crate::Error::UnknownWebhook`] for unhandled events,
    /// [`crate::Error::SignatureInvalid`] (carrying the parsed event) when
    /// the token does not match, and read/decode/lookup failures otherwise.
    async fn parse(
        &self,
        ctx: &Context,
        headers: &HeaderMap,
        body: &mut (dyn AsyncRead + Unpin + Send),
        secret: &SecretFn,
    ) -> Result<WebhookEvent>;
}
