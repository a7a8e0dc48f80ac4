//! Provider-agnostic client for source-control hosting platforms.
//!
//! One canonical vocabulary (repositories, pull requests, issues, releases,
//! milestones, organizations, users, git refs and webhooks) and one set of
//! capability traits, regardless of the hosting platform. Every call returns
//! its payload together with a [`ResponseEnvelope`] carrying the status,
//! request id, rate limit and pagination cursors.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use scm::{Client, ClientConfig, Context, PullRequestListOptions};
//!
//! let client = Client::new(ClientConfig::from_env()?)?;
//! let ctx = Context::background();
//!
//! let opts = PullRequestListOptions { open: true, ..Default::default() };
//! let (pulls, res) = client.pull_requests().list(&ctx, "xinnjie/testme", &opts).await?;
//! println!("{} open, next page {}", pulls.len(), res.page.next);
//! ```

pub mod client;
pub mod config;
pub mod context;
pub mod driver;
pub mod envelope;
pub mod error;
pub mod services;
pub mod testing;
pub mod transport;
pub mod types;
pub mod webhook;

// Re-exports
pub use client::Client;
pub use config::{ClientConfig, ProviderKind};
pub use context::{CancelHandle, Context};
pub use envelope::{EnvelopeBuilder, HeaderRules, Page, PaginationStyle, Rate, ResponseEnvelope};
pub use error::{Error, Result};
pub use services::{
    GitService, IssueService, MilestoneService, OrganizationService, PullRequestService,
    ReleaseService, RepositoryService, Response, ReviewService, SecretFn, UserService,
    WebhookService,
};
pub use transport::{HttpTransport, RawResponse, Request, RequestExecutor};
pub use types::{
    Action, BranchHook, Change, CombinedStatus, Comment, CommentInput, Commit, CommitListOptions,
    Hook, HookEvents, HookInput, Invitation, Issue, IssueCommentHook, IssueInput,
    IssueListOptions, Label, ListOptions, ListedIssueEvent, MergeableState, Milestone,
    MilestoneInput, MilestoneListOptions, Organization, Perm, Permission, PullRequest,
    PullRequestBranch, PullRequestCommentHook, PullRequestHook, PullRequestInput,
    PullRequestListOptions, PullRequestMergeOptions, PushHook, Reference, Release, ReleaseInput,
    ReleaseListOptions, Repository, RepositoryForkInput, RepositoryInput, Review, ReviewInput,
    Signature, State, Status, StatusInput, TagHook, User, UserToken, WebhookEvent,
};
