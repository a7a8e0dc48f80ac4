//! Repositories client: projects, hooks, commit statuses and members.

use std::sync::Arc;

use async_trait::async_trait;
use http::Method;
use serde::{Deserialize, Serialize};
use url::form_urlencoded::Serializer;

use super::users::{convert_user, UsersClient, WireUser};
use super::util::{
    encode, encode_list_options, encode_member_list_options, nullable, parse_opt_time, with_query,
};
use super::Api;
use crate::context::Context;
use crate::envelope::ResponseEnvelope;
use crate::error::{Error, Result};
use crate::services::{RepositoryService, Response, UserService};
use crate::types::{
    split_full_name, CombinedStatus, Hook, HookInput, ListOptions, Perm, Permission, Repository,
    RepositoryForkInput, RepositoryInput, State, Status, StatusInput, User,
};

/// Developer access level and above may push.
const ACCESS_DEVELOPER: i64 = 30;
/// Master access level and above may administer.
const ACCESS_MASTER: i64 = 40;
/// Reporter access level and above may read.
const ACCESS_REPORTER: i64 = 20;

/// Client for repository operations.
#[derive(Clone)]
pub struct ReposClient {
    api: Arc<Api>,
    users: UsersClient,
}

impl ReposClient {
    /// Create a new repositories client.
    pub fn new(api: Arc<Api>) -> Self {
        let users = UsersClient::new(api.clone());
        Self { api, users }
    }

    /// Fetch the raw project, used where only ids or paths are needed.
    pub(crate) async fn find_project(
        &self,
        ctx: &Context,
        repo: &str,
    ) -> Result<(WireRepository, ResponseEnvelope)> {
        self.api
            .get(ctx, format!("api/v3/projects/{}", encode(repo)))
            .await
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
pub(crate) struct Access {
    #[serde(deserialize_with = "nullable")]
    pub access_level: i64,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
pub(crate) struct Permissions {
    #[serde(deserialize_with = "nullable")]
    pub project_access: Access,
    #[serde(deserialize_with = "nullable")]
    pub group_access: Access,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct WireNamespace {
    pub id: i64,
    #[serde(deserialize_with = "nullable")]
    pub name: String,
    #[serde(deserialize_with = "nullable")]
    pub path: String,
    #[serde(deserialize_with = "nullable")]
    pub full_path: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct WireRepository {
    pub id: i64,
    #[serde(deserialize_with = "nullable")]
    pub name: String,
    #[serde(deserialize_with = "nullable")]
    pub path: String,
    #[serde(deserialize_with = "nullable")]
    pub path_with_namespace: String,
    #[serde(deserialize_with = "nullable")]
    pub namespace: WireNamespace,
    #[serde(deserialize_with = "nullable")]
    pub default_branch: String,
    #[serde(deserialize_with = "nullable")]
    pub visibility: String,
    pub visibility_level: Option<i64>,
    pub archived: bool,
    #[serde(deserialize_with = "nullable")]
    pub web_url: String,
    #[serde(deserialize_with = "nullable")]
    pub http_url_to_repo: String,
    #[serde(deserialize_with = "nullable")]
    pub ssh_url_to_repo: String,
    pub created_at: Option<String>,
    pub last_activity_at: Option<String>,
    pub permissions: Option<Permissions>,
}

/// Whether a visibility name means "not public".
pub(crate) fn convert_private(visibility: &str) -> bool {
    !matches!(visibility, "public" | "")
}

pub(crate) fn can_push(perms: &Permissions) -> bool {
    perms.project_access.access_level >= ACCESS_DEVELOPER
        || perms.group_access.access_level >= ACCESS_DEVELOPER
}

pub(crate) fn can_admin(perms: &Permissions) -> bool {
    perms.project_access.access_level >= ACCESS_MASTER
        || perms.group_access.access_level >= ACCESS_MASTER
}

fn convert_perms(perms: &Permissions) -> Perm {
    Perm {
        pull: true,
        push: can_push(perms),
        admin: can_admin(perms),
    }
}

pub(crate) fn convert_repository(from: &WireRepository) -> Repository {
    let (namespace, name) = if from.path_with_namespace.is_empty() {
        let namespace = if from.namespace.full_path.is_empty() {
            from.namespace.path.as_str()
        } else {
            from.namespace.full_path.as_str()
        };
        let name = if from.path.is_empty() { &from.name } else { &from.path };
        (namespace, name.as_str())
    } else {
        split_full_name(&from.path_with_namespace)
    };
    let private = match (from.visibility.as_str(), from.visibility_level) {
        ("", Some(level)) => level < 20,
        (visibility, _) => convert_private(visibility),
    };
    Repository {
        id: from.id.to_string(),
        namespace: namespace.to_string(),
        name: name.to_string(),
        full_name: Repository::full_name_of(namespace, name),
        perm: from.permissions.as_ref().map(convert_perms),
        branch: from.default_branch.clone(),
        private,
        archived: from.archived,
        clone: from.http_url_to_repo.clone(),
        clone_ssh: from.ssh_url_to_repo.clone(),
        link: from.web_url.clone(),
        created: parse_opt_time(from.created_at.as_deref()),
        updated: parse_opt_time(from.last_activity_at.as_deref()),
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WireHook {
    id: i64,
    #[serde(deserialize_with = "nullable")]
    url: String,
    push_events: bool,
    tag_push_events: bool,
    issues_events: bool,
    merge_requests_events: bool,
    note_events: bool,
    review_events: bool,
    enable_ssl_verification: bool,
}

fn convert_hook(from: &WireHook) -> Hook {
    let subscriptions = [
        (from.push_events, "push"),
        (from.tag_push_events, "tag_push"),
        (from.issues_events, "issues"),
        (from.merge_requests_events, "merge_requests"),
        (from.note_events, "note"),
        (from.review_events, "review"),
    ];
    Hook {
        id: from.id.to_string(),
        name: String::new(),
        target: from.url.clone(),
        events: subscriptions
            .iter()
            .filter(|(on, _)| *on)
            .map(|(_, name)| (*name).to_string())
            .collect(),
        active: true,
        skip_verify: !from.enable_ssl_verification,
    }
}

fn encode_hook_input(input: &HookInput) -> String {
    let flag = |on: bool| if on { "true" } else { "false" };
    let events = &input.events;
    let mut params = Serializer::new(String::new());
    params.append_pair("url", &input.target);
    if !input.secret.is_empty() {
        params.append_pair("token", &input.secret);
    }
    params
        .append_pair("enable_ssl_verification", flag(!input.skip_verify))
        .append_pair("push_events", flag(events.push))
        .append_pair("tag_push_events", flag(events.tag))
        .append_pair("issues_events", flag(events.issue))
        .append_pair("merge_requests_events", flag(events.pull_request))
        .append_pair(
            "note_events",
            flag(events.issue_comment || events.pull_request_comment),
        )
        .append_pair("review_events", flag(events.review_comment));
    params.finish()
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WireStatus {
    #[serde(alias = "status", deserialize_with = "nullable")]
    state: String,
    #[serde(deserialize_with = "nullable")]
    name: String,
    #[serde(deserialize_with = "nullable")]
    description: String,
    #[serde(deserialize_with = "nullable")]
    target_url: String,
}

/// Map a native commit status to the canonical state.
pub(crate) fn convert_state(from: &str) -> State {
    match from {
        "failed" => State::Failure,
        "canceled" => State::Canceled,
        "pending" => State::Pending,
        "running" => State::Running,
        "success" => State::Success,
        _ => State::Unknown,
    }
}

/// Map a canonical state to the native commit status.
pub(crate) fn convert_from_state(from: State) -> &'static str {
    match from {
        State::Canceled => "canceled",
        State::Pending => "pending",
        State::Running => "running",
        State::Success => "success",
        State::Error | State::Failure | State::Unknown => "failed",
    }
}

fn convert_status(from: &WireStatus) -> Status {
    Status {
        state: convert_state(&from.state),
        label: from.name.clone(),
        desc: from.description.clone(),
        target: from.target_url.clone(),
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WireMember {
    #[serde(flatten)]
    user: WireUser,
    #[serde(deserialize_with = "nullable")]
    access_level: i64,
}

fn convert_access_level(level: i64) -> Permission {
    if level >= ACCESS_MASTER {
        Permission::Admin
    } else if level >= ACCESS_DEVELOPER {
        Permission::Write
    } else if level >= ACCESS_REPORTER {
        Permission::Read
    } else {
        Permission::None
    }
}

fn access_level_of(permission: Permission) -> i64 {
    match permission {
        Permission::Admin => ACCESS_MASTER,
        Permission::Write => ACCESS_DEVELOPER,
        Permission::Read => ACCESS_REPORTER,
        Permission::None => 10,
    }
}

#[derive(Serialize)]
struct CreateProject<'a> {
    name: &'a str,
    path: &'a str,
    description: &'a str,
    visibility_level: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    namespace_id: Option<i64>,
}

#[derive(Serialize)]
struct ForkProject<'a> {
    #[serde(skip_serializing_if = "str::is_empty")]
    namespace: &'a str,
}

#[derive(Serialize)]
struct AddMember {
    user_id: i64,
    access_level: i64,
}

#[async_trait]
impl RepositoryService for ReposClient {
    async fn find(&self, ctx: &Context, repo: &str) -> Response<Repository> {
        let (out, res) = self.find_project(ctx, repo).await?;
        Ok((convert_repository(&out), res))
    }

    async fn find_perms(&self, ctx: &Context, repo: &str) -> Response<Perm> {
        let (out, res) = self.find_project(ctx, repo).await?;
        let perms = out.permissions.unwrap_or_default();
        Ok((convert_perms(&perms), res))
    }

    async fn list(&self, ctx: &Context, opts: ListOptions) -> Response<Vec<Repository>> {
        let path = with_query("api/v3/projects", &encode_member_list_options(opts));
        let (out, res): (Vec<WireRepository>, _) = self.api.get(ctx, path).await?;
        Ok((out.iter().map(convert_repository).collect(), res))
    }

    async fn create(&self, ctx: &Context, input: &RepositoryInput) -> Response<Repository> {
        let namespace_id = if input.namespace.is_empty() {
            None
        } else {
            let query = Serializer::new(String::new())
                .append_pair("search", &input.namespace)
                .finish();
            let (namespaces, _): (Vec<WireNamespace>, _) =
                self.api.get(ctx, format!("api/v3/namespaces?{query}")).await?;
            let found = namespaces
                .iter()
                .find(|n| {
                    n.path.eq_ignore_ascii_case(&input.namespace)
                        || n.full_path.eq_ignore_ascii_case(&input.namespace)
                })
                .ok_or(Error::NotFound)?;
            Some(found.id)
        };
        let body = CreateProject {
            name: &input.name,
            path: &input.name,
            description: &input.description,
            visibility_level: if input.private { 0 } else { 20 },
            namespace_id,
        };
        let (out, res): (WireRepository, _) = self
            .api
            .json(ctx, Method::POST, "api/v3/projects".to_string(), &body)
            .await?;
        Ok((convert_repository(&out), res))
    }

    async fn fork(
        &self,
        ctx: &Context,
        input: &RepositoryForkInput,
        repo: &str,
    ) -> Response<Repository> {
        let path = format!("api/v3/projects/{}/fork", encode(repo));
        let body = ForkProject {
            namespace: &input.namespace,
        };
        let (out, res): (WireRepository, _) = self.api.json(ctx, Method::POST, path, &body).await?;
        Ok((convert_repository(&out), res))
    }

    async fn find_hook(&self, ctx: &Context, repo: &str, id: &str) -> Response<Hook> {
        let path = format!("api/v3/projects/{}/hooks/{id}", encode(repo));
        let (out, res): (WireHook, _) = self.api.get(ctx, path).await?;
        Ok((convert_hook(&out), res))
    }

    async fn list_hooks(
        &self,
        ctx: &Context,
        repo: &str,
        opts: ListOptions,
    ) -> Response<Vec<Hook>> {
        let path = with_query(
            &format!("api/v3/projects/{}/hooks", encode(repo)),
            &encode_list_options(opts),
        );
        let (out, res): (Vec<WireHook>, _) = self.api.get(ctx, path).await?;
        Ok((out.iter().map(convert_hook).collect(), res))
    }

    async fn create_hook(&self, ctx: &Context, repo: &str, input: &HookInput) -> Response<Hook> {
        let path = format!(
            "api/v3/projects/{}/hooks?{}",
            encode(repo),
            encode_hook_input(input)
        );
        let (out, res): (WireHook, _) = self.api.call(ctx, Method::POST, path).await?;
        Ok((convert_hook(&out), res))
    }

    async fn update_hook(
        &self,
        ctx: &Context,
        repo: &str,
        id: &str,
        input: &HookInput,
    ) -> Response<Hook> {
        let path = format!(
            "api/v3/projects/{}/hooks/{id}?{}",
            encode(repo),
            encode_hook_input(input)
        );
        let (out, res): (WireHook, _) = self.api.call(ctx, Method::PUT, path).await?;
        Ok((convert_hook(&out), res))
    }

    async fn delete_hook(&self, ctx: &Context, repo: &str, id: &str) -> Result<ResponseEnvelope> {
        let path = format!("api/v3/projects/{}/hooks/{id}", encode(repo));
        self.api.empty(ctx, Method::DELETE, path).await
    }

    async fn list_status(
        &self,
        ctx: &Context,
        repo: &str,
        sha: &str,
        opts: ListOptions,
    ) -> Response<Vec<Status>> {
        let path = with_query(
            &format!(
                "api/v3/projects/{}/repository/commits/{sha}/statuses",
                encode(repo)
            ),
            &encode_list_options(opts),
        );
        let (out, res): (Vec<WireStatus>, _) = self.api.get(ctx, path).await?;
        Ok((out.iter().map(convert_status).collect(), res))
    }

    async fn find_combined_status(
        &self,
        ctx: &Context,
        repo: &str,
        sha: &str,
    ) -> Response<CombinedStatus> {
        let (statuses, res) = self
            .list_status(ctx, repo, sha, ListOptions::new(1, 0))
            .await?;
        Ok((CombinedStatus::combine(sha, statuses), res))
    }

    async fn create_status(
        &self,
        ctx: &Context,
        repo: &str,
        sha: &str,
        input: &StatusInput,
    ) -> Response<Status> {
        let (project, _) = self.find_project(ctx, repo).await?;
        let query = Serializer::new(String::new())
            .append_pair("state", convert_from_state(input.state))
            .append_pair("name", &input.label)
            .append_pair("target_url", &input.target)
            .append_pair("description", &input.desc)
            .finish();
        let path = format!("api/v3/projects/{}/statuses/{sha}?{query}", project.id);
        let (out, res): (WireStatus, _) = self.api.call(ctx, Method::POST, path).await?;
        Ok((convert_status(&out), res))
    }

    async fn add_collaborator(
        &self,
        ctx: &Context,
        repo: &str,
        login: &str,
        permission: Permission,
    ) -> Response<bool> {
        let (user, _) = self.users.find_login(ctx, login).await?;
        let path = format!("api/v3/projects/{}/members", encode(repo));
        let body = AddMember {
            user_id: user.id,
            access_level: access_level_of(permission),
        };
        let res = self.api.json_empty(ctx, Method::POST, path, &body).await?;
        Ok((false, res))
    }

    async fn list_collaborators(
        &self,
        ctx: &Context,
        repo: &str,
        opts: ListOptions,
    ) -> Response<Vec<User>> {
        let path = with_query(
            &format!("api/v3/projects/{}/members/all", encode(repo)),
            &encode_list_options(opts),
        );
        let (out, res): (Vec<WireMember>, _) = self.api.get(ctx, path).await?;
        Ok((out.iter().map(|m| convert_user(&m.user)).collect(), res))
    }

    async fn find_user_permission(
        &self,
        ctx: &Context,
        repo: &str,
        login: &str,
    ) -> Response<Permission> {
        let path = format!("api/v3/projects/{}/members/all", encode(repo));
        let (out, res): (Vec<WireMember>, _) = self.api.get(ctx, path).await?;
        let permission = out
            .iter()
            .find(|m| m.user.username.eq_ignore_ascii_case(login))
            .map_or(Permission::None, |m| convert_access_level(m.access_level));
        Ok((permission, res))
    }
}
