//! TencentGit webhook decoding.
//!
//! Deliveries are classified by the `X-Event` header and authenticated by
//! comparing `X-Token` against the caller's secret. Comment payloads only
//! carry user ids, so decoding them needs a [`UserService`] to resolve the
//! comment and issue/merge request authors.

use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use http::HeaderMap;
use regex::Regex;
use serde::Deserialize;
use tokio::io::AsyncRead;
use tracing::{info, warn};

use super::util::{nullable, parse_opt_time, to_canonical_state, NATIVE_MERGED, NATIVE_OPENED};
use crate::context::Context;
use crate::error::{Error, Result};
use crate::services::{SecretFn, UserService, WebhookService};
use crate::types::{
    expand_ref, trim_ref, Action, BranchHook, Comment, Commit, Issue, IssueCommentHook,
    PullRequest, PullRequestBranch, PullRequestCommentHook, PullRequestHook, PushHook, Reference,
    Repository, Signature, TagHook, User, WebhookEvent,
};
use crate::webhook::{header_value, read_body, verify_token};

/// Header naming the delivered event.
pub const EVENT_HEADER: &str = "X-Event";

/// Header carrying the shared token.
pub const TOKEN_HEADER: &str = "X-Token";

/// Sha used for the missing side of a ref creation or deletion.
const EMPTY_COMMIT: &str = "0000000000000000000000000000000000000000";

/// Webhook parser backed by a user lookup service.
#[derive(Clone)]
pub struct WebhooksClient {
    users: Arc<dyn UserService>,
}

impl WebhooksClient {
    /// Create a webhook parser resolving authors through `users`.
    pub fn new(users: Arc<dyn UserService>) -> Self {
        Self { users }
    }

    async fn find_user(&self, ctx: &Context, id: i64, context: &str) -> Result<User> {
        self.users
            .find_login_by_id(ctx, id)
            .await
            .map(|(user, _)| user)
            .map_err(|e| e.context(context))
    }

    async fn decode(&self, ctx: &Context, event: &str, data: &[u8]) -> Result<WebhookEvent> {
        match event {
            "Push Hook" | "Tag Push Hook" => parse_push_hook(data),
            "Merge Request Hook" => parse_pull_request_hook(data),
            "Note Hook" => self.parse_comment_hook(ctx, data).await,
            _ => Err(Error::UnknownWebhook {
                event: event.to_string(),
            }),
        }
    }

    async fn parse_comment_hook(&self, ctx: &Context, data: &[u8]) -> Result<WebhookEvent> {
        let src: WireCommentHook = serde_json::from_slice(data)?;
        match src.object_attributes.noteable_type.as_str() {
            "MergeRequest" => self.convert_merge_request_comment(ctx, &src).await,
            "Issue" => self.convert_issue_comment(ctx, &src).await,
            kind => Err(Error::UnknownWebhook {
                event: kind.to_string(),
            }),
        }
    }

    async fn convert_issue_comment(
        &self,
        ctx: &Context,
        src: &WireCommentHook,
    ) -> Result<WebhookEvent> {
        let comment_author = self
            .find_user(ctx, src.object_attributes.author_id, "unable to find comment author")
            .await?;
        let issue_author = self
            .find_user(ctx, src.issue.author_id, "unable to find issue author")
            .await?;

        let created = parse_opt_time(src.object_attributes.created_at.as_deref());
        let updated = parse_opt_time(src.object_attributes.updated_at.as_deref());
        let issue = Issue {
            number: src.issue.iid,
            title: src.issue.title.clone(),
            body: src.issue.description.clone(),
            state: to_canonical_state(&src.issue.state).to_string(),
            closed: src.issue.state != NATIVE_OPENED,
            author: issue_author,
            created,
            updated,
            ..Default::default()
        };

        Ok(WebhookEvent::IssueComment(IssueCommentHook {
            action: Action::Create,
            repo: src.repository.to_repository(src.project_id),
            issue,
            comment: convert_comment(&src.object_attributes, comment_author.clone()),
            sender: comment_author,
        }))
    }

    async fn convert_merge_request_comment(
        &self,
        ctx: &Context,
        src: &WireCommentHook,
    ) -> Result<WebhookEvent> {
        let comment_author = self
            .find_user(ctx, src.object_attributes.author_id, "unable to find comment author")
            .await?;
        let mr_author = self
            .find_user(ctx, src.merge_request.author_id, "unable to find mr author")
            .await?;

        let mr = &src.merge_request;
        let source = mr.source.clone().unwrap_or_default();
        let target = mr.target.clone().unwrap_or_default();
        let sha = mr.last_commit.id.clone();
        let pull_request = PullRequest {
            number: mr.iid,
            title: mr.title.clone(),
            body: mr.description.clone(),
            state: to_canonical_state(&mr.state).to_string(),
            sha: sha.clone(),
            reference: merge_request_ref(mr.iid),
            source: mr.source_branch.clone(),
            target: mr.target_branch.clone(),
            head: PullRequestBranch {
                reference: mr.source_branch.clone(),
                sha,
                repo: source.to_repository(mr.source_project_id),
            },
            base: PullRequestBranch {
                reference: mr.target_branch.clone(),
                sha: String::new(),
                repo: target.to_repository(mr.target_project_id),
            },
            fork: Repository::full_name_of(&source.namespace, &source.name),
            link: mr.url.clone(),
            closed: mr.state != NATIVE_OPENED,
            merged: mr.state == NATIVE_MERGED,
            author: mr_author,
            created: parse_opt_time(mr.created_at.as_deref()),
            updated: parse_opt_time(mr.updated_at.as_deref()),
            ..Default::default()
        };

        Ok(WebhookEvent::PullRequestComment(PullRequestCommentHook {
            action: Action::Create,
            repo: src.repository.to_repository(src.project_id),
            pull_request,
            comment: convert_comment(&src.object_attributes, comment_author.clone()),
            sender: comment_author,
        }))
    }
}

#[async_trait]
impl WebhookService for WebhooksClient {
    async fn parse(
        &self,
        ctx: &Context,
        headers: &HeaderMap,
        body: &mut (dyn AsyncRead + Unpin + Send),
        secret: &SecretFn,
    ) -> Result<WebhookEvent> {
        let data = read_body(body).await?;
        let event = header_value(headers, EVENT_HEADER);
        info!(event, length = data.len(), "received webhook");

        let hook = match self.decode(ctx, event, &data).await {
            Ok(hook) => hook,
            Err(Error::UnknownWebhook { event }) => {
                warn!(event = %event, "unhandled webhook event");
                return Err(Error::UnknownWebhook { event });
            }
            Err(e) => return Err(e),
        };
        verify_token(hook, header_value(headers, TOKEN_HEADER), secret)
    }
}

/// Repository block shared by every payload.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct WireRepo {
    #[serde(deserialize_with = "nullable")]
    name: String,
    #[serde(deserialize_with = "nullable")]
    namespace: String,
    #[serde(deserialize_with = "nullable")]
    web_url: String,
    #[serde(deserialize_with = "nullable")]
    ssh_url: String,
    #[serde(deserialize_with = "nullable")]
    http_url: String,
    #[serde(deserialize_with = "nullable")]
    homepage: String,
    #[serde(deserialize_with = "nullable")]
    git_http_url: String,
    #[serde(deserialize_with = "nullable")]
    git_ssh_url: String,
    #[serde(deserialize_with = "nullable")]
    url: String,
}

impl WireRepo {
    fn to_repository(&self, project_id: i64) -> Repository {
        let first = |candidates: &[&String]| {
            candidates
                .iter()
                .find(|s| !s.is_empty())
                .map(|s| s.to_string())
                .unwrap_or_default()
        };
        let clone = first(&[&self.git_http_url, &self.http_url, &self.url]);
        let clone_ssh = first(&[&self.ssh_url, &self.git_ssh_url]);
        let link = first(&[&self.homepage, &self.web_url]);
        let namespace = if self.namespace.is_empty() {
            namespace_from_link(&link).unwrap_or_default().to_string()
        } else {
            self.namespace.clone()
        };

        Repository {
            id: project_id.to_string(),
            full_name: Repository::full_name_of(&namespace, &self.name),
            namespace,
            name: self.name.clone(),
            clone,
            clone_ssh,
            link,
            ..Default::default()
        }
    }
}

/// Namespace of a `.../namespace/name` web link: the part before the slash
/// of the trailing `namespace/name` match.
fn namespace_from_link(link: &str) -> Option<&str> {
    static NAMESPACE: OnceLock<Option<Regex>> = OnceLock::new();
    let re = NAMESPACE
        .get_or_init(|| Regex::new(r"[A-Za-z0-9_|-]+/[A-Za-z0-9_|-]+$").ok())
        .as_ref()?;
    let found = re.find(link)?.as_str();
    found.split_once('/').map(|(namespace, _)| namespace)
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WireAuthor {
    #[serde(deserialize_with = "nullable")]
    name: String,
    #[serde(deserialize_with = "nullable")]
    email: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WirePushCommit {
    #[serde(deserialize_with = "nullable")]
    id: String,
    #[serde(deserialize_with = "nullable")]
    message: String,
    #[serde(deserialize_with = "nullable")]
    url: String,
    #[serde(deserialize_with = "nullable")]
    author: WireAuthor,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WirePushHook {
    #[serde(deserialize_with = "nullable")]
    object_kind: String,
    #[serde(deserialize_with = "nullable")]
    before: String,
    #[serde(deserialize_with = "nullable")]
    after: String,
    #[serde(rename = "ref", deserialize_with = "nullable")]
    reference: String,
    #[serde(deserialize_with = "nullable")]
    user_name: String,
    #[serde(deserialize_with = "nullable")]
    user_email: String,
    project_id: i64,
    #[serde(deserialize_with = "nullable")]
    commits: Vec<WirePushCommit>,
    #[serde(deserialize_with = "nullable")]
    repository: WireRepo,
}

impl WirePushHook {
    fn sender(&self) -> User {
        User {
            login: self.user_name.clone(),
            name: self.user_name.clone(),
            email: self.user_email.clone(),
            ..Default::default()
        }
    }

    fn signature(&self) -> Signature {
        Signature {
            login: self.user_name.clone(),
            name: self.user_name.clone(),
            email: self.user_email.clone(),
            date: None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WireHookUser {
    #[serde(deserialize_with = "nullable")]
    name: String,
    #[serde(deserialize_with = "nullable")]
    username: String,
    #[serde(deserialize_with = "nullable")]
    avatar_url: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WireLastCommit {
    #[serde(deserialize_with = "nullable")]
    id: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WireMergeAttributes {
    iid: i64,
    #[serde(deserialize_with = "nullable")]
    title: String,
    #[serde(deserialize_with = "nullable")]
    description: String,
    #[serde(deserialize_with = "nullable")]
    state: String,
    #[serde(deserialize_with = "nullable")]
    source_branch: String,
    #[serde(deserialize_with = "nullable")]
    target_branch: String,
    source_project_id: i64,
    target_project_id: i64,
    created_at: Option<String>,
    updated_at: Option<String>,
    #[serde(deserialize_with = "nullable")]
    url: String,
    source: Option<WireRepo>,
    target: Option<WireRepo>,
    #[serde(deserialize_with = "nullable")]
    last_commit: WireLastCommit,
    #[serde(deserialize_with = "nullable")]
    action: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WirePullRequestHook {
    #[serde(deserialize_with = "nullable")]
    user: WireHookUser,
    #[serde(deserialize_with = "nullable")]
    object_attributes: WireMergeAttributes,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WireNoteAttributes {
    id: i64,
    #[serde(deserialize_with = "nullable")]
    note: String,
    #[serde(deserialize_with = "nullable")]
    noteable_type: String,
    author_id: i64,
    created_at: Option<String>,
    updated_at: Option<String>,
    #[serde(deserialize_with = "nullable")]
    url: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WireNoteMergeRequest {
    author_id: i64,
    iid: i64,
    #[serde(deserialize_with = "nullable")]
    title: String,
    #[serde(deserialize_with = "nullable")]
    description: String,
    #[serde(deserialize_with = "nullable")]
    state: String,
    #[serde(deserialize_with = "nullable")]
    source_branch: String,
    #[serde(deserialize_with = "nullable")]
    target_branch: String,
    source_project_id: i64,
    target_project_id: i64,
    created_at: Option<String>,
    updated_at: Option<String>,
    #[serde(deserialize_with = "nullable")]
    url: String,
    source: Option<WireRepo>,
    target: Option<WireRepo>,
    #[serde(deserialize_with = "nullable")]
    last_commit: WireLastCommit,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WireNoteIssue {
    iid: i64,
    #[serde(deserialize_with = "nullable")]
    title: String,
    #[serde(deserialize_with = "nullable")]
    description: String,
    author_id: i64,
    #[serde(deserialize_with = "nullable")]
    state: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WireCommentHook {
    project_id: i64,
    #[serde(deserialize_with = "nullable")]
    object_attributes: WireNoteAttributes,
    #[serde(deserialize_with = "nullable")]
    repository: WireRepo,
    #[serde(deserialize_with = "nullable")]
    merge_request: WireNoteMergeRequest,
    #[serde(deserialize_with = "nullable")]
    issue: WireNoteIssue,
}

fn merge_request_ref(iid: i64) -> String {
    format!("refs/merge-requests/{iid}/head")
}

fn convert_comment(from: &WireNoteAttributes, author: User) -> Comment {
    Comment {
        id: from.id,
        body: from.note.clone(),
        author,
        link: from.url.clone(),
        created: parse_opt_time(from.created_at.as_deref()),
        updated: parse_opt_time(from.updated_at.as_deref()),
    }
}

fn parse_push_hook(data: &[u8]) -> Result<WebhookEvent> {
    let src: WirePushHook = serde_json::from_slice(data)?;
    if src.before != EMPTY_COMMIT && src.after == EMPTY_COMMIT {
        match src.object_kind.as_str() {
            "push" => return Ok(WebhookEvent::Branch(convert_branch_hook(&src))),
            "tag_push" => return Ok(WebhookEvent::Tag(convert_tag_hook(&src))),
            _ => {}
        }
    }
    Ok(WebhookEvent::Push(convert_push_hook(&src)))
}

fn convert_push_hook(src: &WirePushHook) -> PushHook {
    let mut commit = Commit {
        author: src.signature(),
        committer: src.signature(),
        ..Default::default()
    };
    if let Some(last) = src.commits.last() {
        commit.sha = last.id.clone();
        commit.message = last.message.clone();
        commit.link = last.url.clone();
        commit.author = Signature {
            login: last.author.name.clone(),
            name: last.author.name.clone(),
            email: last.author.email.clone(),
            date: None,
        };
    }

    PushHook {
        reference: expand_ref(&src.reference, "refs/heads/"),
        before: src.before.clone(),
        after: src.after.clone(),
        repo: src.repository.to_repository(src.project_id),
        commit,
        sender: src.sender(),
    }
}

/// Action and sha of a ref event.
fn ref_change(src: &WirePushHook) -> (Action, String) {
    if src.after == EMPTY_COMMIT {
        (Action::Delete, src.before.clone())
    } else {
        (Action::Create, src.after.clone())
    }
}

fn convert_branch_hook(src: &WirePushHook) -> BranchHook {
    let (action, sha) = ref_change(src);
    BranchHook {
        reference: Reference {
            name: trim_ref(&src.reference),
            sha,
        },
        repo: src.repository.to_repository(src.project_id),
        action,
        sender: src.sender(),
    }
}

fn convert_tag_hook(src: &WirePushHook) -> TagHook {
    let (action, sha) = ref_change(src);
    TagHook {
        reference: Reference {
            name: trim_ref(&src.reference),
            sha,
        },
        repo: src.repository.to_repository(src.project_id),
        action,
        sender: src.sender(),
    }
}

fn parse_pull_request_hook(data: &[u8]) -> Result<WebhookEvent> {
    let src: WirePullRequestHook = serde_json::from_slice(data)?;
    let action = match src.object_attributes.action.as_str() {
        "" | "open" => Action::Open,
        "close" => Action::Close,
        "reopen" => Action::Reopen,
        "merge" => Action::Merge,
        "update" => Action::Update,
        other => {
            return Err(Error::UnknownWebhook {
                event: other.to_string(),
            })
        }
    };
    Ok(WebhookEvent::PullRequest(convert_pull_request_hook(
        &src, action,
    )))
}

fn convert_pull_request_hook(src: &WirePullRequestHook, action: Action) -> PullRequestHook {
    let attrs = &src.object_attributes;
    let source = attrs.source.clone().unwrap_or_default();
    let target = attrs.target.clone().unwrap_or_default();
    let target_repo = target.to_repository(attrs.target_project_id);
    let sha = attrs.last_commit.id.clone();
    let user = User {
        login: src.user.username.clone(),
        name: src.user.name.clone(),
        avatar: src.user.avatar_url.clone(),
        ..Default::default()
    };

    let pull_request = PullRequest {
        number: attrs.iid,
        title: attrs.title.clone(),
        body: attrs.description.clone(),
        state: to_canonical_state(&attrs.state).to_string(),
        sha: sha.clone(),
        reference: merge_request_ref(attrs.iid),
        source: attrs.source_branch.clone(),
        target: attrs.target_branch.clone(),
        head: PullRequestBranch {
            reference: attrs.source_branch.clone(),
            sha,
            repo: source.to_repository(attrs.source_project_id),
        },
        base: PullRequestBranch {
            reference: attrs.target_branch.clone(),
            sha: String::new(),
            repo: target_repo.clone(),
        },
        fork: Repository::full_name_of(&source.namespace, &source.name),
        link: attrs.url.clone(),
        closed: attrs.state != NATIVE_OPENED,
        merged: attrs.state == NATIVE_MERGED,
        author: user.clone(),
        created: parse_opt_time(attrs.created_at.as_deref()),
        updated: parse_opt_time(attrs.updated_at.as_deref()),
        ..Default::default()
    };

    PullRequestHook {
        action,
        repo: target_repo,
        pull_request,
        sender: user,
    }
}
