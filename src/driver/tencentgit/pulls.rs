//! Merge requests client.
//!
//! TencentGit merge requests carry a single assignee, so assignment and
//! review requests accept exactly one login. Label and assignee writes
//! read the current state first and are skipped when nothing changes.

use std::sync::Arc;

use async_trait::async_trait;
use http::Method;
use serde::{Deserialize, Serialize};

use super::git::{convert_change, WireChange};
use super::issues::{convert_label_event, convert_note, NoteInput, WireLabelEvent, WireNote};
use super::repos::ReposClient;
use super::users::{convert_user, UsersClient, WireUser};
use super::util::{
    encode, encode_list_options, encode_pull_request_list_options, nullable, parse_opt_time,
    to_canonical_state, with_query, NATIVE_MERGED, NATIVE_OPENED,
};
use super::Api;
use crate::context::Context;
use crate::envelope::ResponseEnvelope;
use crate::error::{Error, Result};
use crate::services::{PullRequestService, RepositoryService, Response, UserService};
use crate::types::{
    Change, Comment, CommentInput, Label, ListOptions, ListedIssueEvent, MergeableState,
    PullRequest, PullRequestBranch, PullRequestInput, PullRequestListOptions,
    PullRequestMergeOptions,
};

/// Client for merge request operations.
#[derive(Clone)]
pub struct PullsClient {
    api: Arc<Api>,
    repos: ReposClient,
    users: UsersClient,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WirePullRequest {
    iid: i64,
    #[serde(deserialize_with = "nullable")]
    merge_commit_sha: String,
    #[serde(deserialize_with = "nullable")]
    title: String,
    #[serde(deserialize_with = "nullable")]
    description: String,
    #[serde(deserialize_with = "nullable")]
    state: String,
    source_project_id: i64,
    target_project_id: i64,
    #[serde(deserialize_with = "nullable")]
    labels: Vec<String>,
    work_in_progress: bool,
    #[serde(deserialize_with = "nullable")]
    author: WireUser,
    #[serde(deserialize_with = "nullable")]
    merge_status: String,
    #[serde(deserialize_with = "nullable")]
    source_branch: String,
    #[serde(deserialize_with = "nullable")]
    target_branch: String,
    created_at: Option<String>,
    updated_at: Option<String>,
    #[serde(deserialize_with = "nullable")]
    base_commit: String,
    #[serde(deserialize_with = "nullable")]
    source_commit: String,
    assignee: Option<WireUser>,
    #[serde(deserialize_with = "nullable")]
    assignees: Vec<WireUser>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WireChanges {
    #[serde(deserialize_with = "nullable")]
    files: Vec<WireChange>,
}

#[derive(Serialize)]
struct CreatePullRequest<'a> {
    title: &'a str,
    description: &'a str,
    source_branch: &'a str,
    target_branch: &'a str,
}

#[derive(Debug, Default, Serialize)]
struct UpdatePullRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    target_branch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    assignee_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    labels: Option<String>,
}

#[derive(Serialize)]
struct MergeRequest<'a> {
    #[serde(skip_serializing_if = "str::is_empty")]
    merge_commit_message: &'a str,
    #[serde(skip_serializing_if = "str::is_empty")]
    merge_type: &'a str,
}

fn single_login(logins: &[String]) -> Result<&str> {
    match logins {
        [login] => Ok(login.as_str()),
        _ => Err(Error::NotSupported),
    }
}

impl PullsClient {
    /// Create a new pulls client.
    pub fn new(api: Arc<Api>) -> Self {
        let repos = ReposClient::new(api.clone());
        let users = UsersClient::new(api.clone());
        Self { api, repos, users }
    }

    fn merge_request_path(repo: &str, number: i64) -> String {
        format!("api/v3/projects/{}/merge_requests/{number}", encode(repo))
    }

    fn link(&self, repo: &str, number: i64) -> String {
        self.api
            .base_url()
            .join(&format!("{repo}/merge_requests/{number}"))
            .map(|url| url.to_string())
            .unwrap_or_default()
    }

    async fn convert(
        &self,
        ctx: &Context,
        repo: &str,
        from: &WirePullRequest,
    ) -> Result<PullRequest> {
        let target_id = from.target_project_id.to_string();
        let source_id = from.source_project_id.to_string();

        let ((base_repo, _), (source_project, _)) = tokio::try_join!(
            self.repos.find(ctx, &target_id),
            self.repos.find_project(ctx, &source_id),
        )?;
        let head_repo = if from.source_project_id == from.target_project_id {
            base_repo.clone()
        } else {
            self.repos.find(ctx, &source_id).await?.0
        };

        let mut assignees: Vec<&WireUser> = Vec::new();
        for user in from.assignee.iter().chain(from.assignees.iter()) {
            if !assignees.iter().any(|u| u.id == user.id) {
                assignees.push(user);
            }
        }
        let mergeable_state = MergeableState::from_native(&from.merge_status);

        Ok(PullRequest {
            number: from.iid,
            title: from.title.clone(),
            body: from.description.clone(),
            state: to_canonical_state(&from.state).to_string(),
            sha: from.merge_commit_sha.clone(),
            reference: format!("refs/merge-requests/{}/head", from.iid),
            source: from.source_branch.clone(),
            target: from.target_branch.clone(),
            head: PullRequestBranch {
                reference: from.source_branch.clone(),
                sha: from.source_commit.clone(),
                repo: head_repo,
            },
            base: PullRequestBranch {
                reference: from.target_branch.clone(),
                sha: from.base_commit.clone(),
                repo: base_repo,
            },
            fork: source_project.path_with_namespace,
            link: self.link(repo, from.iid),
            draft: from.work_in_progress,
            closed: from.state != NATIVE_OPENED,
            merged: from.state == NATIVE_MERGED,
            mergeable: mergeable_state == MergeableState::Mergeable,
            mergeable_state,
            author: convert_user(&from.author),
            assignees: assignees.into_iter().map(convert_user).collect(),
            labels: from.labels.iter().map(|l| Label::named(l)).collect(),
            created: parse_opt_time(from.created_at.as_deref()),
            updated: parse_opt_time(from.updated_at.as_deref()),
        })
    }

    async fn update_field(
        &self,
        ctx: &Context,
        repo: &str,
        number: i64,
        input: &UpdatePullRequest,
    ) -> Result<ResponseEnvelope> {
        self.api
            .json_empty(ctx, Method::PUT, Self::merge_request_path(repo, number), input)
            .await
    }

    async fn set_labels(
        &self,
        ctx: &Context,
        repo: &str,
        number: i64,
        labels: &[String],
    ) -> Result<ResponseEnvelope> {
        let input = UpdatePullRequest {
            labels: Some(labels.join(",")),
            ..Default::default()
        };
        self.update_field(ctx, repo, number, &input).await
    }

    async fn set_assignee(
        &self,
        ctx: &Context,
        repo: &str,
        number: i64,
        id: i64,
    ) -> Result<ResponseEnvelope> {
        let input = UpdatePullRequest {
            assignee_id: Some(id),
            ..Default::default()
        };
        self.update_field(ctx, repo, number, &input).await
    }
}

#[async_trait]
impl PullRequestService for PullsClient {
    async fn find(&self, ctx: &Context, repo: &str, number: i64) -> Response<PullRequest> {
        let path = format!(
            "api/v3/projects/{}/merge_request/iid/{number}",
            encode(repo)
        );
        let (out, res): (WirePullRequest, _) = self.api.get(ctx, path).await?;
        Ok((self.convert(ctx, repo, &out).await?, res))
    }

    async fn list(
        &self,
        ctx: &Context,
        repo: &str,
        opts: &PullRequestListOptions,
    ) -> Response<Vec<PullRequest>> {
        let path = with_query(
            &format!("api/v3/projects/{}/merge_requests", encode(repo)),
            &encode_pull_request_list_options(opts),
        );
        let (out, res): (Vec<WirePullRequest>, _) = self.api.get(ctx, path).await?;
        let mut pulls = Vec::with_capacity(out.len());
        for pr in &out {
            pulls.push(self.convert(ctx, repo, pr).await?);
        }
        if !opts.labels.is_empty() {
            pulls.retain(|pr| pr.labels.iter().any(|l| opts.labels.contains(&l.name)));
        }
        Ok((pulls, res))
    }

    async fn list_changes(
        &self,
        ctx: &Context,
        repo: &str,
        number: i64,
        _opts: ListOptions,
    ) -> Response<Vec<Change>> {
        let path = format!("{}/changes", Self::merge_request_path(repo, number));
        let (out, res): (WireChanges, _) = self.api.get(ctx, path).await?;
        Ok((out.files.iter().map(convert_change).collect(), res))
    }

    async fn create(
        &self,
        ctx: &Context,
        repo: &str,
        input: &PullRequestInput,
    ) -> Response<PullRequest> {
        let path = format!("api/v3/projects/{}/merge_requests", encode(repo));
        let body = CreatePullRequest {
            title: &input.title,
            description: &input.body,
            source_branch: &input.head,
            target_branch: &input.base,
        };
        let (out, res): (WirePullRequest, _) =
            self.api.json(ctx, Method::POST, path, &body).await?;
        Ok((self.convert(ctx, repo, &out).await?, res))
    }

    async fn update(
        &self,
        ctx: &Context,
        repo: &str,
        number: i64,
        input: &PullRequestInput,
    ) -> Response<PullRequest> {
        let non_empty = |s: &str| (!s.is_empty()).then(|| s.to_string());
        let body = UpdatePullRequest {
            title: non_empty(&input.title),
            description: non_empty(&input.body),
            target_branch: non_empty(&input.base),
            ..Default::default()
        };
        let path = Self::merge_request_path(repo, number);
        let (out, res): (WirePullRequest, _) = self.api.json(ctx, Method::PUT, path, &body).await?;
        Ok((self.convert(ctx, repo, &out).await?, res))
    }

    /// `delete_source_branch` is not supported by the provider and ignored.
    async fn merge(
        &self,
        ctx: &Context,
        repo: &str,
        number: i64,
        opts: &PullRequestMergeOptions,
    ) -> Result<ResponseEnvelope> {
        let path = format!("{}/merge", Self::merge_request_path(repo, number));
        let body = MergeRequest {
            merge_commit_message: &opts.commit_title,
            merge_type: &opts.merge_method,
        };
        self.api.json_empty(ctx, Method::PUT, path, &body).await
    }

    async fn close(&self, ctx: &Context, repo: &str, number: i64) -> Result<ResponseEnvelope> {
        let path = format!("{}?state_event=closed", Self::merge_request_path(repo, number));
        self.api.empty(ctx, Method::PUT, path).await
    }

    async fn reopen(&self, ctx: &Context, repo: &str, number: i64) -> Result<ResponseEnvelope> {
        let path = format!("{}?state_event=reopen", Self::merge_request_path(repo, number));
        self.api.empty(ctx, Method::PUT, path).await
    }

    async fn find_comment(
        &self,
        ctx: &Context,
        repo: &str,
        number: i64,
        id: i64,
    ) -> Response<Comment> {
        let path = format!("{}/notes/{id}", Self::merge_request_path(repo, number));
        let (out, res): (WireNote, _) = self.api.get(ctx, path).await?;
        Ok((convert_note(&out), res))
    }

    async fn list_comments(
        &self,
        ctx: &Context,
        repo: &str,
        number: i64,
        opts: ListOptions,
    ) -> Response<Vec<Comment>> {
        let path = with_query(
            &format!("{}/notes", Self::merge_request_path(repo, number)),
            &encode_list_options(opts),
        );
        let (out, res): (Vec<WireNote>, _) = self.api.get(ctx, path).await?;
        Ok((out.iter().map(convert_note).collect(), res))
    }

    async fn create_comment(
        &self,
        ctx: &Context,
        repo: &str,
        number: i64,
        input: &CommentInput,
    ) -> Response<Comment> {
        let path = format!("{}/notes", Self::merge_request_path(repo, number));
        let body = NoteInput { body: &input.body };
        let (out, res): (WireNote, _) = self.api.json(ctx, Method::POST, path, &body).await?;
        Ok((convert_note(&out), res))
    }

    async fn edit_comment(
        &self,
        ctx: &Context,
        repo: &str,
        number: i64,
        id: i64,
        input: &CommentInput,
    ) -> Response<Comment> {
        let path = format!("{}/notes/{id}", Self::merge_request_path(repo, number));
        let body = NoteInput { body: &input.body };
        let (out, res): (WireNote, _) = self.api.json(ctx, Method::PUT, path, &body).await?;
        Ok((convert_note(&out), res))
    }

    async fn delete_comment(
        &self,
        ctx: &Context,
        repo: &str,
        number: i64,
        id: i64,
    ) -> Result<ResponseEnvelope> {
        let path = format!("{}/notes/{id}", Self::merge_request_path(repo, number));
        self.api.empty(ctx, Method::DELETE, path).await
    }

    async fn list_labels(
        &self,
        ctx: &Context,
        repo: &str,
        number: i64,
        _opts: ListOptions,
    ) -> Response<Vec<Label>> {
        let (pr, res) = self.find(ctx, repo, number).await?;
        Ok((pr.labels, res))
    }

    async fn list_events(
        &self,
        ctx: &Context,
        repo: &str,
        number: i64,
        opts: ListOptions,
    ) -> Response<Vec<ListedIssueEvent>> {
        let path = with_query(
            &format!(
                "{}/resource_label_events",
                Self::merge_request_path(repo, number)
            ),
            &encode_list_options(opts),
        );
        let (out, res): (Vec<WireLabelEvent>, _) = self.api.get(ctx, path).await?;
        Ok((out.iter().map(convert_label_event).collect(), res))
    }

    async fn add_label(
        &self,
        ctx: &Context,
        repo: &str,
        number: i64,
        label: &str,
    ) -> Result<ResponseEnvelope> {
        let (current, res) = self.list_labels(ctx, repo, number, ListOptions::default()).await?;
        if current.iter().any(|l| l.name == label) {
            return Ok(res);
        }
        let mut labels: Vec<String> = current.into_iter().map(|l| l.name).collect();
        labels.push(label.to_string());
        self.set_labels(ctx, repo, number, &labels).await
    }

    async fn delete_label(
        &self,
        ctx: &Context,
        repo: &str,
        number: i64,
        label: &str,
    ) -> Result<ResponseEnvelope> {
        let (current, res) = self.list_labels(ctx, repo, number, ListOptions::default()).await?;
        if !current.iter().any(|l| l.name == label) {
            return Ok(res);
        }
        let labels: Vec<String> = current
            .into_iter()
            .map(|l| l.name)
            .filter(|name| name != label)
            .collect();
        self.set_labels(ctx, repo, number, &labels).await
    }

    async fn assign(
        &self,
        ctx: &Context,
        repo: &str,
        number: i64,
        logins: &[String],
    ) -> Result<ResponseEnvelope> {
        let login = single_login(logins)?;
        let (pr, res) = self.find(ctx, repo, number).await?;
        if pr
            .assignees
            .first()
            .is_some_and(|u| u.login.eq_ignore_ascii_case(login))
        {
            return Ok(res);
        }
        let (user, _) = self.users.find_login(ctx, login).await?;
        self.set_assignee(ctx, repo, number, user.id).await
    }

    async fn unassign(
        &self,
        ctx: &Context,
        repo: &str,
        number: i64,
        logins: &[String],
    ) -> Result<ResponseEnvelope> {
        let login = single_login(logins)?;
        let (pr, res) = self.find(ctx, repo, number).await?;
        let assigned = pr
            .assignees
            .first()
            .is_some_and(|u| u.login.eq_ignore_ascii_case(login));
        if !assigned {
            return Ok(res);
        }
        self.set_assignee(ctx, repo, number, 0).await
    }

    async fn request_review(
        &self,
        ctx: &Context,
        repo: &str,
        number: i64,
        logins: &[String],
    ) -> Result<ResponseEnvelope> {
        self.assign(ctx, repo, number, logins).await
    }

    async fn unrequest_review(
        &self,
        ctx: &Context,
        repo: &str,
        number: i64,
        logins: &[String],
    ) -> Result<ResponseEnvelope> {
        self.unassign(ctx, repo, number, logins).await
    }

    async fn set_milestone(
        &self,
        _: &Context,
        _: &str,
        _: i64,
        _: i64,
    ) -> Result<ResponseEnvelope> {
        Err(Error::NotSupported)
    }

    async fn clear_milestone(&self, _: &Context, _: &str, _: i64) -> Result<ResponseEnvelope> {
        Err(Error::NotSupported)
    }
}
