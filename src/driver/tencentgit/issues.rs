//! Issues client, plus the note and label-event wire shapes shared with
//! merge requests.

use std::sync::Arc;

use async_trait::async_trait;
use http::Method;
use serde::{Deserialize, Serialize};

use super::users::{convert_user, UsersClient, WireUser};
use super::util::{
    encode, encode_issue_list_options, encode_list_options, nullable, parse_opt_time,
    to_canonical_state, with_query, NATIVE_OPENED,
};
use super::Api;
use crate::context::Context;
use crate::envelope::ResponseEnvelope;
use crate::error::Result;
use crate::services::{IssueService, Response, UserService};
use crate::types::{
    Comment, CommentInput, Issue, IssueInput, IssueListOptions, Label, ListOptions,
    ListedIssueEvent,
};

/// Client for issue operations.
#[derive(Clone)]
pub struct IssuesClient {
    api: Arc<Api>,
    users: UsersClient,
}

impl IssuesClient {
    /// Create a new issues client.
    pub fn new(api: Arc<Api>) -> Self {
        let users = UsersClient::new(api.clone());
        Self { api, users }
    }

    fn issue_path(repo: &str, number: i64) -> String {
        format!("api/v3/projects/{}/issues/{number}", encode(repo))
    }

    async fn update(
        &self,
        ctx: &Context,
        repo: &str,
        number: i64,
        input: &UpdateIssue,
    ) -> Result<ResponseEnvelope> {
        self.api
            .json_empty(ctx, Method::PUT, Self::issue_path(repo, number), input)
            .await
    }

    async fn set_labels(
        &self,
        ctx: &Context,
        repo: &str,
        number: i64,
        labels: &[String],
    ) -> Result<ResponseEnvelope> {
        let input = UpdateIssue {
            labels: Some(labels.join(",")),
            ..Default::default()
        };
        self.update(ctx, repo, number, &input).await
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct WireNote {
    pub id: i64,
    #[serde(deserialize_with = "nullable")]
    pub body: String,
    #[serde(deserialize_with = "nullable")]
    pub author: WireUser,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

pub(crate) fn convert_note(from: &WireNote) -> Comment {
    Comment {
        id: from.id,
        body: from.body.clone(),
        author: convert_user(&from.author),
        link: String::new(),
        created: parse_opt_time(from.created_at.as_deref()),
        updated: parse_opt_time(from.updated_at.as_deref()),
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct WireLabel {
    pub id: i64,
    #[serde(deserialize_with = "nullable")]
    pub name: String,
    #[serde(deserialize_with = "nullable")]
    pub description: String,
    #[serde(deserialize_with = "nullable")]
    pub color: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct WireLabelEvent {
    pub id: i64,
    #[serde(deserialize_with = "nullable")]
    pub user: WireUser,
    pub created_at: Option<String>,
    #[serde(deserialize_with = "nullable")]
    pub label: WireLabel,
    #[serde(deserialize_with = "nullable")]
    pub action: String,
}

pub(crate) fn convert_label_event(from: &WireLabelEvent) -> ListedIssueEvent {
    let event = match from.action.as_str() {
        "add" => "labeled",
        "remove" => "unlabeled",
        other => other,
    };
    ListedIssueEvent {
        id: from.id,
        actor: convert_user(&from.user),
        event: event.to_string(),
        label: Label {
            id: from.label.id,
            name: from.label.name.clone(),
            description: from.label.description.clone(),
            color: from.label.color.clone(),
        },
        created: parse_opt_time(from.created_at.as_deref()),
    }
}

#[derive(Serialize)]
pub(crate) struct NoteInput<'a> {
    pub body: &'a str,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WireIssue {
    iid: i64,
    #[serde(deserialize_with = "nullable")]
    title: String,
    #[serde(deserialize_with = "nullable")]
    description: String,
    #[serde(deserialize_with = "nullable")]
    state: String,
    #[serde(deserialize_with = "nullable")]
    labels: Vec<String>,
    #[serde(deserialize_with = "nullable")]
    author: WireUser,
    assignee: Option<WireUser>,
    #[serde(deserialize_with = "nullable")]
    assignees: Vec<WireUser>,
    #[serde(deserialize_with = "nullable")]
    web_url: String,
    discussion_locked: Option<bool>,
    created_at: Option<String>,
    updated_at: Option<String>,
}

fn merge_assignees(single: Option<&WireUser>, many: &[WireUser]) -> Vec<WireUser> {
    let mut merged: Vec<WireUser> = Vec::new();
    for user in single.into_iter().chain(many.iter()) {
        if !merged.iter().any(|u| u.id == user.id) {
            merged.push(user.clone());
        }
    }
    merged
}

fn convert_issue(from: &WireIssue) -> Issue {
    Issue {
        number: from.iid,
        title: from.title.clone(),
        body: from.description.clone(),
        link: from.web_url.clone(),
        state: to_canonical_state(&from.state).to_string(),
        labels: from.labels.clone(),
        closed: from.state != NATIVE_OPENED,
        locked: from.discussion_locked.unwrap_or(false),
        author: convert_user(&from.author),
        assignees: merge_assignees(from.assignee.as_ref(), &from.assignees)
            .iter()
            .map(convert_user)
            .collect(),
        pull_request: false,
        created: parse_opt_time(from.created_at.as_deref()),
        updated: parse_opt_time(from.updated_at.as_deref()),
    }
}

#[derive(Serialize)]
struct CreateIssue<'a> {
    title: &'a str,
    description: &'a str,
}

#[derive(Debug, Default, Serialize)]
struct UpdateIssue {
    #[serde(skip_serializing_if = "Option::is_none")]
    labels: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    assignee_ids: Option<Vec<i64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    milestone_id: Option<i64>,
}

#[async_trait]
impl IssueService for IssuesClient {
    async fn find(&self, ctx: &Context, repo: &str, number: i64) -> Response<Issue> {
        let (out, res): (WireIssue, _) = self.api.get(ctx, Self::issue_path(repo, number)).await?;
        Ok((convert_issue(&out), res))
    }

    async fn list(
        &self,
        ctx: &Context,
        repo: &str,
        opts: IssueListOptions,
    ) -> Response<Vec<Issue>> {
        let path = with_query(
            &format!("api/v3/projects/{}/issues", encode(repo)),
            &encode_issue_list_options(opts),
        );
        let (out, res): (Vec<WireIssue>, _) = self.api.get(ctx, path).await?;
        Ok((out.iter().map(convert_issue).collect(), res))
    }

    async fn create(&self, ctx: &Context, repo: &str, input: &IssueInput) -> Response<Issue> {
        let path = format!("api/v3/projects/{}/issues", encode(repo));
        let body = CreateIssue {
            title: &input.title,
            description: &input.body,
        };
        let (out, res): (WireIssue, _) = self.api.json(ctx, Method::POST, path, &body).await?;
        Ok((convert_issue(&out), res))
    }

    async fn close(&self, ctx: &Context, repo: &str, number: i64) -> Result<ResponseEnvelope> {
        let path = format!("{}?state_event=close", Self::issue_path(repo, number));
        self.api.empty(ctx, Method::PUT, path).await
    }

    async fn reopen(&self, ctx: &Context, repo: &str, number: i64) -> Result<ResponseEnvelope> {
        let path = format!("{}?state_event=reopen", Self::issue_path(repo, number));
        self.api.empty(ctx, Method::PUT, path).await
    }

    async fn lock(&self, ctx: &Context, repo: &str, number: i64) -> Result<ResponseEnvelope> {
        let path = format!("{}?discussion_locked=true", Self::issue_path(repo, number));
        self.api.empty(ctx, Method::PUT, path).await
    }

    async fn unlock(&self, ctx: &Context, repo: &str, number: i64) -> Result<ResponseEnvelope> {
        let path = format!("{}?discussion_locked=false", Self::issue_path(repo, number));
        self.api.empty(ctx, Method::PUT, path).await
    }

    async fn find_comment(
        &self,
        ctx: &Context,
        repo: &str,
        number: i64,
        id: i64,
    ) -> Response<Comment> {
        let path = format!("{}/notes/{id}", Self::issue_path(repo, number));
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
            &format!("{}/notes", Self::issue_path(repo, number)),
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
        let path = format!("{}/notes", Self::issue_path(repo, number));
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
        let path = format!("{}/notes/{id}", Self::issue_path(repo, number));
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
        let path = format!("{}/notes/{id}", Self::issue_path(repo, number));
        self.api.empty(ctx, Method::DELETE, path).await
    }

    async fn list_labels(
        &self,
        ctx: &Context,
        repo: &str,
        number: i64,
        _opts: ListOptions,
    ) -> Response<Vec<Label>> {
        let (issue, res) = self.find(ctx, repo, number).await?;
        Ok((issue.labels.iter().map(|l| Label::named(l)).collect(), res))
    }

    async fn list_events(
        &self,
        ctx: &Context,
        repo: &str,
        number: i64,
        opts: ListOptions,
    ) -> Response<Vec<ListedIssueEvent>> {
        let path = with_query(
            &format!("{}/resource_label_events", Self::issue_path(repo, number)),
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
        let (issue, res) = self.find(ctx, repo, number).await?;
        if issue.labels.iter().any(|l| l == label) {
            return Ok(res);
        }
        let mut labels = issue.labels;
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
        let (issue, res) = self.find(ctx, repo, number).await?;
        if !issue.labels.iter().any(|l| l == label) {
            return Ok(res);
        }
        let labels: Vec<String> = issue.labels.into_iter().filter(|l| l != label).collect();
        self.set_labels(ctx, repo, number, &labels).await
    }

    async fn assign(
        &self,
        ctx: &Context,
        repo: &str,
        number: i64,
        logins: &[String],
    ) -> Result<ResponseEnvelope> {
        let (issue, res) = self.find(ctx, repo, number).await?;
        let mut ids: Vec<i64> = issue.assignees.iter().map(|u| u.id).collect();
        let mut changed = false;
        for login in logins {
            if issue
                .assignees
                .iter()
                .any(|u| u.login.eq_ignore_ascii_case(login))
            {
                continue;
            }
            let (user, _) = self.users.find_login(ctx, login).await?;
            if !ids.contains(&user.id) {
                ids.push(user.id);
                changed = true;
            }
        }
        if !changed {
            return Ok(res);
        }
        let input = UpdateIssue {
            assignee_ids: Some(ids),
            ..Default::default()
        };
        self.update(ctx, repo, number, &input).await
    }

    async fn unassign(
        &self,
        ctx: &Context,
        repo: &str,
        number: i64,
        logins: &[String],
    ) -> Result<ResponseEnvelope> {
        let (issue, res) = self.find(ctx, repo, number).await?;
        let remaining: Vec<i64> = issue
            .assignees
            .iter()
            .filter(|u| !logins.iter().any(|l| l.eq_ignore_ascii_case(&u.login)))
            .map(|u| u.id)
            .collect();
        if remaining.len() == issue.assignees.len() {
            return Ok(res);
        }
        let input = UpdateIssue {
            assignee_ids: Some(remaining),
            ..Default::default()
        };
        self.update(ctx, repo, number, &input).await
    }

    async fn set_milestone(
        &self,
        ctx: &Context,
        repo: &str,
        number: i64,
        milestone: i64,
    ) -> Result<ResponseEnvelope> {
        let input = UpdateIssue {
            milestone_id: Some(milestone),
            ..Default::default()
        };
        self.update(ctx, repo, number, &input).await
    }

    async fn clear_milestone(
        &self,
        ctx: &Context,
        repo: &str,
        number: i64,
    ) -> Result<ResponseEnvelope> {
        let input = UpdateIssue {
            milestone_id: Some(0),
            ..Default::default()
        };
        self.update(ctx, repo, number, &input).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_issue() {
        let wire: WireIssue = serde_json::from_str(
            r#"{
                "id": 76,
                "iid": 1,
                "title": "Add license",
                "description": null,
                "state": "reopened",
                "labels": ["bug"],
                "author": {"id": 11, "username": "xinnjie"},
                "assignee": {"id": 12, "username": "john_smith"},
                "assignees": [{"id": 12, "username": "john_smith"}, {"id": 13, "username": "jack"}],
                "web_url": "https://git.code.tencent.com/xinnjie/testme/issues/1",
                "created_at": "2021-01-04T03:12:29+0000"
            }"#,
        )
        .unwrap();
        let issue = convert_issue(&wire);
        assert_eq!(issue.number, 1);
        assert_eq!(issue.body, "");
        assert_eq!(issue.state, "closed");
        assert!(issue.closed);
        assert!(!issue.locked);
        assert_eq!(issue.author.login, "xinnjie");
        let logins: Vec<&str> = issue.assignees.iter().map(|u| u.login.as_str()).collect();
        assert_eq!(logins, vec!["john_smith", "jack"]);
    }

    #[test]
    fn test_convert_label_event() {
        let wire: WireLabelEvent = serde_json::from_str(
            r##"{
                "id": 142,
                "user": {"id": 1, "username": "root"},
                "created_at": "2018-08-20T13:38:20+0000",
                "label": {"id": 73, "name": "a1", "color": "#34495E", "description": ""},
                "action": "remove"
            }"##,
        )
        .unwrap();
        let event = convert_label_event(&wire);
        assert_eq!(event.event, "unlabeled");
        assert_eq!(event.label.name, "a1");
        assert_eq!(event.actor.login, "root");
    }

    #[test]
    fn test_update_issue_omits_unset_fields() {
        let body = serde_json::to_value(UpdateIssue {
            milestone_id: Some(0),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"milestone_id": 0}));
    }
}
