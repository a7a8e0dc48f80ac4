//! End-to-end tests for the TencentGit driver.
//!
//! Every test drives the public [`Client`] through a scripted
//! [`MockExecutor`], so request routes, query strings, bodies and the number
//! of writes can be asserted without a live server.
//!
//! To see driver logs while running:
//! ```bash
//! RUST_LOG=scm=debug cargo test --test driver_tests -- --nocapture
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use http::{HeaderMap, HeaderValue, Method};
use tracing_subscriber::EnvFilter;

use scm::driver::tencentgit::{WebhooksClient, DEFAULT_SERVER};
use scm::testing::{MockExecutor, MockResponse};
use scm::{
    Action, Client, CommentInput, Context, Error, Invitation, IssueListOptions, ListOptions,
    MilestoneInput, ProviderKind, PullRequestListOptions, ResponseEnvelope, State, StatusInput,
    User, UserService, UserToken, WebhookEvent, WebhookService,
};

const REPO: &str = "xinnjie/testme";
const PROJECT_ROUTE: &str = "api/v3/projects/xinnjie%2Ftestme";
const EMPTY_COMMIT: &str = "0000000000000000000000000000000000000000";

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn setup() -> (Client, Arc<MockExecutor>) {
    init_tracing();
    let mock = Arc::new(MockExecutor::new());
    let base_url = scm::config::parse_server(DEFAULT_SERVER).unwrap();
    let client = Client::with_executor(ProviderKind::TencentGit, base_url, mock.clone());
    (client, mock)
}

fn route(rest: &str) -> String {
    format!("{PROJECT_ROUTE}/{rest}")
}

fn project(id: i64, path_with_namespace: &str) -> String {
    serde_json::json!({
        "id": id,
        "name": path_with_namespace.rsplit('/').next().unwrap(),
        "path_with_namespace": path_with_namespace,
        "default_branch": "master",
        "visibility_level": 0,
        "web_url": format!("https://git.code.tencent.com/{path_with_namespace}"),
        "http_url_to_repo": format!("https://git.code.tencent.com/{path_with_namespace}.git"),
        "ssh_url_to_repo": format!("git@git.code.tencent.com:{path_with_namespace}.git"),
        "created_at": "2020-12-30T02:32:28+0000",
        "permissions": {"project_access": {"access_level": 40}}
    })
    .to_string()
}

fn merge_request(iid: i64, source: i64, target: i64, state: &str, labels: &[&str]) -> serde_json::Value {
    serde_json::json!({
        "id": 1000 + iid,
        "iid": iid,
        "title": "Update README",
        "description": "typo",
        "state": state,
        "source_project_id": source,
        "target_project_id": target,
        "labels": labels,
        "work_in_progress": false,
        "author": {"id": 11, "username": "xinnjie", "name": "Xinnjie"},
        "merge_status": "can_be_merged",
        "source_branch": "feature",
        "target_branch": "master",
        "merge_commit_sha": "b9bdfd50",
        "base_commit": "aa11",
        "source_commit": "bb22",
        "created_at": "2021-01-04T03:12:29+0000",
        "updated_at": "2021-01-05T03:12:29+0000",
        "assignee": {"id": 12, "username": "jack"}
    })
}

fn ok_with_headers(body: &str) -> MockResponse {
    MockResponse::ok(body)
        .with_header("RateLimit-Limit", "600")
        .with_header("RateLimit-Remaining", "599")
        .with_header("RateLimit-Reset", "1512454441")
        .with_header("X-Request-Id", "0d511a76-2ade-4c34-af0d-d17e84adb255")
}

#[tokio::test]
async fn test_pull_request_find_same_project() {
    let (client, mock) = setup();
    let mr = merge_request(1, 32732, 32732, "merged", &["bug"]);
    mock.on(Method::GET, &route("merge_request/iid/1"), ok_with_headers(&mr.to_string()))
        .on(Method::GET, "api/v3/projects/32732", MockResponse::ok(&project(32732, REPO)));

    let (mut pr, res) = client.pull_requests().find(&Context::background(), REPO, 1).await.unwrap();

    assert_eq!(pr.number, 1);
    assert!(pr.merged);
    assert!(pr.closed);
    assert_eq!(pr.state, "closed");
    assert!(pr.mergeable);
    assert_eq!(pr.reference, "refs/merge-requests/1/head");
    assert_eq!(pr.fork, REPO);
    assert_eq!(pr.link, "https://git.code.tencent.com/xinnjie/testme/merge_requests/1");
    assert_eq!(pr.head.repo, pr.base.repo);
    assert_eq!(pr.base.repo.full_name, REPO);
    assert_eq!(pr.head.sha, "bb22");
    assert_eq!(pr.label_names(), vec!["bug".to_string()]);
    assert_eq!(pr.assignees[0].login, "jack");

    pr.head.repo.name = "changed".to_string();
    assert_eq!(pr.base.repo.name, "testme");
    assert_eq!(pr.head.repo.name, "changed");

    assert_eq!(res.rate.limit, 600);
    assert_eq!(res.rate.remaining, 599);
    assert_eq!(res.rate.reset, 1512454441);
    assert_eq!(res.id, "0d511a76-2ade-4c34-af0d-d17e84adb255");
    assert_eq!(mock.call_count(&Method::GET, "api/v3/projects/32732"), 2);
}

#[tokio::test]
async fn test_pull_request_find_from_fork() {
    let (client, mock) = setup();
    let mr = merge_request(2, 4, 32732, "opened", &[]);
    mock.on(Method::GET, &route("merge_request/iid/2"), MockResponse::ok(&mr.to_string()))
        .on(Method::GET, "api/v3/projects/32732", MockResponse::ok(&project(32732, REPO)))
        .on(Method::GET, "api/v3/projects/4", MockResponse::ok(&project(4, "jack/testme")));

    let (pr, _) = client.pull_requests().find(&Context::background(), REPO, 2).await.unwrap();

    assert!(!pr.closed);
    assert!(!pr.merged);
    assert_eq!(pr.state, "open");
    assert_eq!(pr.fork, "jack/testme");
    assert_eq!(pr.head.repo.full_name, "jack/testme");
    assert_eq!(pr.base.repo.full_name, REPO);
}

#[tokio::test]
async fn test_pull_request_lookup_failure_aborts() {
    let (client, mock) = setup();
    let mr = merge_request(2, 4, 32732, "opened", &[]);
    mock.on(Method::GET, &route("merge_request/iid/2"), MockResponse::ok(&mr.to_string()))
        .on(Method::GET, "api/v3/projects/32732", MockResponse::ok(&project(32732, REPO)));

    let err = client
        .pull_requests()
        .find(&Context::background(), REPO, 2)
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_pull_request_list_state_filter() {
    let (client, mock) = setup();
    let list = route("merge_requests");
    mock.on(Method::GET, &list, MockResponse::ok("[]"));
    let ctx = Context::background();

    let cases = [(true, true, "all"), (false, false, "all"), (true, false, "opened"), (false, true, "closed")];
    for (open, closed, expected) in cases {
        let opts = PullRequestListOptions {
            open,
            closed,
            ..Default::default()
        };
        client.pull_requests().list(&ctx, REPO, &opts).await.unwrap();
        assert_eq!(mock.last_call().unwrap().query_param("state"), Some(expected));
    }
}

#[tokio::test]
async fn test_pull_request_list_filters_labels() {
    let (client, mock) = setup();
    let body = serde_json::json!([
        merge_request(1, 32732, 32732, "opened", &["bug"]),
        merge_request(2, 32732, 32732, "opened", &["docs"]),
        merge_request(3, 32732, 32732, "opened", &[]),
    ]);
    mock.on(Method::GET, &route("merge_requests"), MockResponse::ok(&body.to_string()))
        .on(Method::GET, "api/v3/projects/32732", MockResponse::ok(&project(32732, REPO)));

    let opts = PullRequestListOptions {
        open: true,
        labels: vec!["bug".to_string(), "ui".to_string()],
        created_after: Some(Utc.with_ymd_and_hms(2019, 3, 25, 0, 10, 19).unwrap()),
        ..Default::default()
    };
    let (pulls, res) = client
        .pull_requests()
        .list(&Context::background(), REPO, &opts)
        .await
        .unwrap();

    assert_eq!(pulls.len(), 1);
    assert_eq!(pulls[0].number, 1);
    assert!(res.page.is_empty());
    let call = mock.get_calls(Some(&Method::GET))[0].clone();
    assert_eq!(call.query_param("created_after"), Some("2019-03-25T00:10:19+0000"));
}

#[tokio::test]
async fn test_pull_request_add_label_twice_writes_once() {
    let (client, mock) = setup();
    let find = route("merge_request/iid/1");
    mock.on(Method::GET, &find, MockResponse::ok(&merge_request(1, 32732, 32732, "opened", &["bug"]).to_string()))
        .on(Method::GET, &find, MockResponse::ok(&merge_request(1, 32732, 32732, "opened", &["bug", "ui"]).to_string()))
        .on(Method::GET, "api/v3/projects/32732", MockResponse::ok(&project(32732, REPO)))
        .on(Method::PUT, &route("merge_requests/1"), MockResponse::ok("{}"));
    let ctx = Context::background();

    client.pull_requests().add_label(&ctx, REPO, 1, "ui").await.unwrap();
    client.pull_requests().add_label(&ctx, REPO, 1, "ui").await.unwrap();

    assert_eq!(mock.write_count(), 1);
    let put = mock.get_calls(Some(&Method::PUT)).remove(0);
    assert_eq!(put.json(), serde_json::json!({"labels": "bug,ui"}));
}

#[tokio::test]
async fn test_pull_request_unassign_not_assigned_is_noop() {
    let (client, mock) = setup();
    mock.on(Method::GET, &route("merge_request/iid/1"), MockResponse::ok(&merge_request(1, 32732, 32732, "opened", &[]).to_string()))
        .on(Method::GET, "api/v3/projects/32732", MockResponse::ok(&project(32732, REPO)));

    client
        .pull_requests()
        .unassign(&Context::background(), REPO, 1, &["john".to_string()])
        .await
        .unwrap();

    assert_eq!(mock.write_count(), 0);
}

#[tokio::test]
async fn test_pull_request_assign_single_login_only() {
    let (client, mock) = setup();
    let ctx = Context::background();
    let logins = ["a".to_string(), "b".to_string()];

    let err = client.pull_requests().assign(&ctx, REPO, 1, &logins).await.unwrap_err();
    assert!(err.is_not_supported());
    let err = client.pull_requests().request_review(&ctx, REPO, 1, &[]).await.unwrap_err();
    assert!(err.is_not_supported());
    assert!(client.pull_requests().set_milestone(&ctx, REPO, 1, 3).await.unwrap_err().is_not_supported());
    assert!(client.pull_requests().clear_milestone(&ctx, REPO, 1).await.unwrap_err().is_not_supported());
    assert!(mock.get_calls(None).is_empty());
}

#[tokio::test]
async fn test_pull_request_assign_resolves_login() {
    let (client, mock) = setup();
    mock.on(Method::GET, &route("merge_request/iid/1"), MockResponse::ok(&merge_request(1, 32732, 32732, "opened", &[]).to_string()))
        .on(Method::GET, "api/v3/projects/32732", MockResponse::ok(&project(32732, REPO)))
        .on(Method::GET, "api/v3/users", MockResponse::ok(r#"[{"id": 99, "username": "John"}]"#))
        .on(Method::PUT, &route("merge_requests/1"), MockResponse::ok("{}"));

    client
        .pull_requests()
        .assign(&Context::background(), REPO, 1, &["john".to_string()])
        .await
        .unwrap();

    let put = mock.get_calls(Some(&Method::PUT)).remove(0);
    assert_eq!(put.json(), serde_json::json!({"assignee_id": 99}));
}

#[tokio::test]
async fn test_pull_request_close_and_merge() {
    let (client, mock) = setup();
    let mr = route("merge_requests/1");
    mock.on(Method::PUT, &mr, MockResponse::ok("{}"))
        .on(Method::PUT, &route("merge_requests/1/merge"), MockResponse::ok("{}"));
    let ctx = Context::background();

    client.pull_requests().close(&ctx, REPO, 1).await.unwrap();
    assert_eq!(mock.last_call().unwrap().query_param("state_event"), Some("closed"));

    client.pull_requests().reopen(&ctx, REPO, 1).await.unwrap();
    assert_eq!(mock.last_call().unwrap().query_param("state_event"), Some("reopen"));

    let opts = scm::PullRequestMergeOptions {
        commit_title: "Merge feature".to_string(),
        merge_method: "squash".to_string(),
        delete_source_branch: true,
    };
    client.pull_requests().merge(&ctx, REPO, 1, &opts).await.unwrap();
    assert_eq!(
        mock.last_call().unwrap().json(),
        serde_json::json!({"merge_commit_message": "Merge feature", "merge_type": "squash"})
    );
}

fn issue(labels: &[&str], assignees: &[(i64, &str)]) -> String {
    let assignees: Vec<_> = assignees
        .iter()
        .map(|(id, login)| serde_json::json!({"id": id, "username": login}))
        .collect();
    serde_json::json!({
        "iid": 1,
        "title": "Add license",
        "description": "MIT",
        "state": "opened",
        "labels": labels,
        "author": {"id": 11, "username": "xinnjie"},
        "assignees": assignees,
        "web_url": "https://git.code.tencent.com/xinnjie/testme/issues/1"
    })
    .to_string()
}

#[tokio::test]
async fn test_issue_list_state_filter() {
    let (client, mock) = setup();
    mock.on(Method::GET, &route("issues"), MockResponse::ok("[]"));
    let ctx = Context::background();

    client.issues().list(&ctx, REPO, IssueListOptions::default()).await.unwrap();
    assert_eq!(mock.last_call().unwrap().query_param("state"), Some("all"));

    let opts = IssueListOptions {
        closed: true,
        ..Default::default()
    };
    client.issues().list(&ctx, REPO, opts).await.unwrap();
    assert_eq!(mock.last_call().unwrap().query_param("state"), Some("closed"));
}

#[tokio::test]
async fn test_issue_labels_and_assignees() {
    let (client, mock) = setup();
    let find = route("issues/1");
    mock.on(Method::GET, &find, MockResponse::ok(&issue(&["bug"], &[(12, "jack")])))
        .on(Method::PUT, &find, MockResponse::ok("{}"))
        .on(Method::GET, "api/v3/users", MockResponse::ok(r#"[{"id": 13, "username": "john"}]"#));
    let ctx = Context::background();

    client.issues().add_label(&ctx, REPO, 1, "bug").await.unwrap();
    client.issues().delete_label(&ctx, REPO, 1, "ui").await.unwrap();
    client.issues().unassign(&ctx, REPO, 1, &["john".to_string()]).await.unwrap();
    client.issues().assign(&ctx, REPO, 1, &["JACK".to_string()]).await.unwrap();
    assert_eq!(mock.write_count(), 0);

    client.issues().assign(&ctx, REPO, 1, &["john".to_string()]).await.unwrap();
    assert_eq!(mock.write_count(), 1);
    assert_eq!(mock.last_call().unwrap().json(), serde_json::json!({"assignee_ids": [12, 13]}));

    client.issues().delete_label(&ctx, REPO, 1, "bug").await.unwrap();
    assert_eq!(mock.last_call().unwrap().json(), serde_json::json!({"labels": ""}));
}

#[tokio::test]
async fn test_issue_comments_and_lock() {
    let (client, mock) = setup();
    let note = r#"{"id": 7, "body": "LGTM", "author": {"id": 11, "username": "xinnjie"}, "created_at": "2021-01-04T03:12:29+0000"}"#;
    mock.on(Method::POST, &route("issues/1/notes"), MockResponse::json(201, note))
        .on(Method::PUT, &route("issues/1"), MockResponse::ok("{}"));
    let ctx = Context::background();

    let input = CommentInput {
        body: "LGTM".to_string(),
    };
    let (comment, res) = client.issues().create_comment(&ctx, REPO, 1, &input).await.unwrap();
    assert_eq!(res.status, 201);
    assert_eq!(comment.id, 7);
    assert_eq!(comment.author.login, "xinnjie");
    assert_eq!(mock.last_call().unwrap().json(), serde_json::json!({"body": "LGTM"}));

    client.issues().lock(&ctx, REPO, 1).await.unwrap();
    assert_eq!(mock.last_call().unwrap().query_param("discussion_locked"), Some("true"));
    client.issues().close(&ctx, REPO, 1).await.unwrap();
    assert_eq!(mock.last_call().unwrap().query_param("state_event"), Some("close"));
}

#[tokio::test]
async fn test_milestone_create_round_trip() {
    let (client, mock) = setup();
    let created = r#"{
        "id": 12,
        "iid": 1,
        "title": "v1.0",
        "description": "First release",
        "state": "closed",
        "due_date": "2012-10-09",
        "web_url": "https://git.code.tencent.com/xinnjie/testme/milestones/1"
    }"#;
    mock.on(Method::POST, &route("milestones"), MockResponse::json(201, created));

    let due = Utc.with_ymd_and_hms(2012, 10, 9, 0, 0, 0).unwrap();
    let input = MilestoneInput {
        title: "v1.0".to_string(),
        description: "First release".to_string(),
        state: "close".to_string(),
        due_date: Some(due),
    };
    let (milestone, _) = client
        .milestones()
        .create(&Context::background(), REPO, &input)
        .await
        .unwrap();

    assert_eq!(
        mock.last_call().unwrap().json(),
        serde_json::json!({
            "title": "v1.0",
            "description": "First release",
            "due_date": "2012-10-09",
            "state_event": "close"
        })
    );
    assert_eq!(milestone.title, input.title);
    assert_eq!(milestone.description, input.description);
    assert_eq!(milestone.state, "closed");
    assert_eq!(milestone.due_date, Some(due));
    assert_eq!(milestone.number, 1);
}

#[tokio::test]
async fn test_milestone_update_uses_patch() {
    let (client, mock) = setup();
    mock.on(Method::PATCH, &route("milestones/12"), MockResponse::ok(r#"{"id": 12, "iid": 1, "state": "active"}"#));

    let (milestone, _) = client
        .milestones()
        .update(&Context::background(), REPO, 12, &MilestoneInput::default())
        .await
        .unwrap();
    assert_eq!(milestone.state, "open");
    assert_eq!(mock.write_count(), 1);
}

#[tokio::test]
async fn test_list_without_pagination_headers() {
    let (client, mock) = setup();
    mock.on(
        Method::GET,
        &route("repository/branches"),
        MockResponse::ok(r#"[{"name": "master", "commit": {"id": "a1"}}, {"name": "dev", "commit": {"id": "b2"}}]"#),
    );

    let (branches, res) = client
        .git()
        .list_branches(&Context::background(), REPO, ListOptions::default())
        .await
        .unwrap();

    assert_eq!(branches.len(), 2);
    assert_eq!(branches[1].name, "dev");
    assert_eq!(res.page, scm::Page::default());
    assert_eq!(res.rate, scm::Rate::default());
}

#[tokio::test]
async fn test_list_pagination_link_and_echo() {
    let (client, mock) = setup();
    let link = concat!(
        "<https://git.code.tencent.com/api/v3/groups?page=2&per_page=30>; rel=\"next\", ",
        "<https://git.code.tencent.com/api/v3/groups?page=1&per_page=30>; rel=\"prev\", ",
        "<https://git.code.tencent.com/api/v3/groups?page=1&per_page=30>; rel=\"first\", ",
        "<https://git.code.tencent.com/api/v3/groups?page=5&per_page=30>; rel=\"last\""
    );
    mock.on(Method::GET, "api/v3/groups", MockResponse::ok("[]").with_header("Link", link))
        .on(
            Method::GET,
            "api/v3/groups",
            MockResponse::ok("[]")
                .with_header("X-Total-Pages", "4")
                .with_header("X-Next-Page", "3")
                .with_header("X-Prev-Page", "1"),
        );
    let ctx = Context::background();

    let (_, res) = client.organizations().list(&ctx, ListOptions::new(1, 30)).await.unwrap();
    assert_eq!((res.page.next, res.page.prev, res.page.first, res.page.last), (2, 1, 1, 5));
    assert_eq!(mock.last_call().unwrap().query_param("per_page"), Some("30"));

    let (_, res) = client.organizations().list(&ctx, ListOptions::new(2, 30)).await.unwrap();
    assert_eq!((res.page.next, res.page.prev, res.page.last), (3, 1, 4));
}

#[tokio::test]
async fn test_errors_from_status() {
    let (client, mock) = setup();
    mock.on(Method::GET, &route("repository/tags/v1"), MockResponse::with_error(403, "403 Forbidden"));
    let ctx = Context::background();

    let err = client.git().find_tag(&ctx, REPO, "v1").await.unwrap_err();
    assert_eq!(err.status(), Some(403));
    assert_eq!(err.to_string(), "403 Forbidden");

    let err = client.repositories().find(&ctx, "missing/repo").await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_cancelled_context_sends_nothing() {
    let (client, mock) = setup();
    let (ctx, handle) = Context::with_cancel();
    handle.cancel();

    let err = client.users().find(&ctx).await.unwrap_err();
    assert!(matches!(err, Error::Cancelled));
    assert!(mock.get_calls(None).is_empty());
}

#[tokio::test]
async fn test_create_status_resolves_project_id() {
    let (client, mock) = setup();
    mock.on(Method::GET, PROJECT_ROUTE, MockResponse::ok(&project(32732, REPO)))
        .on(
            Method::POST,
            "api/v3/projects/32732/statuses/6104942438c14ec7bd21c6cd5bd995272b3faff6",
            MockResponse::json(201, r#"{"status": "success", "name": "continuous-integration/drone", "target_url": "https://ci.example.com/1"}"#),
        );

    let input = StatusInput {
        state: State::Success,
        label: "continuous-integration/drone".to_string(),
        desc: "Build has completed successfully".to_string(),
        target: "https://ci.example.com/1".to_string(),
    };
    let (status, _) = client
        .repositories()
        .create_status(&Context::background(), REPO, "6104942438c14ec7bd21c6cd5bd995272b3faff6", &input)
        .await
        .unwrap();

    assert_eq!(status.state, State::Success);
    let call = mock.last_call().unwrap();
    assert_eq!(call.query_param("state"), Some("success"));
    assert_eq!(call.query_param("name"), Some("continuous-integration/drone"));
}

#[tokio::test]
async fn test_find_login_walks_pages() {
    let (client, mock) = setup();
    mock.on(
        Method::GET,
        "api/v3/users",
        MockResponse::ok(r#"[{"id": 1, "username": "jack2"}]"#).with_header(
            "Link",
            "<https://git.code.tencent.com/api/v3/users?page=2>; rel=\"next\", <https://git.code.tencent.com/api/v3/users?page=2>; rel=\"last\"",
        ),
    )
    .on(
        Method::GET,
        "api/v3/users",
        MockResponse::ok(r#"[{"id": 2, "username": "Jack"}]"#).with_header(
            "Link",
            "<https://git.code.tencent.com/api/v3/users?page=1>; rel=\"first\", <https://git.code.tencent.com/api/v3/users?page=2>; rel=\"last\"",
        ),
    );

    let (user, _) = client.users().find_login(&Context::background(), "jack").await.unwrap();
    assert_eq!(user.id, 2);
    assert_eq!(mock.last_call().unwrap().query_param("page"), Some("2"));
}

#[tokio::test]
async fn test_unsupported_operations() {
    let (client, mock) = setup();
    let ctx = Context::background();

    assert!(client.releases().find(&ctx, REPO, 1).await.unwrap_err().is_not_supported());
    assert!(client.releases().delete(&ctx, REPO, 1).await.unwrap_err().is_not_supported());
    assert!(client.reviews().find(&ctx, REPO, 1, 1).await.unwrap_err().is_not_supported());
    assert!(client.users().list_invitations(&ctx).await.unwrap_err().is_not_supported());
    assert!(mock.get_calls(None).is_empty());
}

#[tokio::test]
async fn test_release_find_by_tag() {
    let (client, mock) = setup();
    mock.on(
        Method::GET,
        &route("releases/v1.0.1"),
        ok_with_headers(r#"{"tag_name": "v1.0.1", "name": "", "description": "notes", "commit": {"id": "a1"}, "created_at": "2021-01-04T03:12:29+0000"}"#),
    );

    let (release, res) = client
        .releases()
        .find_by_tag(&Context::background(), REPO, "v1.0.1")
        .await
        .unwrap();
    assert_eq!(release.tag, "v1.0.1");
    assert_eq!(release.title, "v1.0.1");
    assert_eq!(release.commitish, "a1");
    assert_eq!(release.link, "https://git.code.tencent.com/xinnjie/testme/releases/v1.0.1");
    assert_eq!(res.rate.limit, 600);
}

// Webhooks

fn webhook_headers(event: &'static str, token: &'static str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert("X-Event", HeaderValue::from_static(event));
    headers.insert("X-Token", HeaderValue::from_static(token));
    headers
}

async fn parse_webhook(
    client: &Client,
    event: &'static str,
    token: &'static str,
    payload: &str,
) -> scm::Result<WebhookEvent> {
    let headers = webhook_headers(event, token);
    let mut body: &[u8] = payload.as_bytes();
    let secret = |_: &WebhookEvent| Ok::<_, Error>("topsecret".to_string());
    client
        .webhooks()
        .parse(&Context::background(), &headers, &mut body, &secret)
        .await
}

fn push_payload(kind: &str, before: &str, after: &str, reference: &str) -> String {
    serde_json::json!({
        "object_kind": kind,
        "before": before,
        "after": after,
        "ref": reference,
        "user_name": "xinnjie",
        "user_email": "xinnjie@example.com",
        "project_id": 32732,
        "commits": [
            {"id": "c1", "message": "first", "url": "https://git.code.tencent.com/xinnjie/testme/commit/c1", "author": {"name": "a", "email": "a@example.com"}},
            {"id": "c2", "message": "second", "url": "https://git.code.tencent.com/xinnjie/testme/commit/c2", "author": {"name": "b", "email": "b@example.com"}}
        ],
        "repository": {
            "name": "testme",
            "homepage": "https://git.code.tencent.com/xinnjie/testme",
            "git_http_url": "https://git.code.tencent.com/xinnjie/testme.git",
            "git_ssh_url": "git@git.code.tencent.com:xinnjie/testme.git"
        }
    })
    .to_string()
}

#[tokio::test]
async fn test_webhook_push() {
    let (client, _) = setup();
    let payload = push_payload("push", "a1", "c2", "refs/heads/master");

    let event = parse_webhook(&client, "Push Hook", "topsecret", &payload).await.unwrap();
    let WebhookEvent::Push(hook) = event else {
        panic!("expected push hook");
    };
    assert_eq!(hook.reference, "refs/heads/master");
    assert_eq!(hook.before, "a1");
    assert_eq!(hook.after, "c2");
    assert_eq!(hook.commit.sha, "c2");
    assert_eq!(hook.commit.message, "second");
    assert_eq!(hook.commit.author.login, "b");
    assert_eq!(hook.sender.login, "xinnjie");
    assert_eq!(hook.repo.id, "32732");
    assert_eq!(hook.repo.full_name, REPO);
    assert_eq!(hook.repo.clone, "https://git.code.tencent.com/xinnjie/testme.git");
}

#[tokio::test]
async fn test_webhook_ref_creation_is_push() {
    let (client, _) = setup();
    let payload = push_payload("push", EMPTY_COMMIT, "c2", "feature");

    let event = parse_webhook(&client, "Push Hook", "topsecret", &payload).await.unwrap();
    let WebhookEvent::Push(hook) = event else {
        panic!("expected push hook");
    };
    assert_eq!(hook.reference, "refs/heads/feature");
}

#[tokio::test]
async fn test_webhook_branch_and_tag_deletion() {
    let (client, _) = setup();

    let payload = push_payload("push", "a1", EMPTY_COMMIT, "refs/heads/feature");
    let event = parse_webhook(&client, "Push Hook", "topsecret", &payload).await.unwrap();
    let WebhookEvent::Branch(hook) = event else {
        panic!("expected branch hook");
    };
    assert_eq!(hook.action, Action::Delete);
    assert_eq!(hook.reference.name, "feature");
    assert_eq!(hook.reference.sha, "a1");

    let payload = push_payload("tag_push", "a1", EMPTY_COMMIT, "refs/tags/v1.0");
    let event = parse_webhook(&client, "Tag Push Hook", "topsecret", &payload).await.unwrap();
    let WebhookEvent::Tag(hook) = event else {
        panic!("expected tag hook");
    };
    assert_eq!(hook.action, Action::Delete);
    assert_eq!(hook.reference.name, "v1.0");
    assert_eq!(hook.repo.full_name, REPO);
}

#[tokio::test]
async fn test_webhook_signature() {
    let (client, _) = setup();
    let payload = push_payload("push", "a1", "c2", "refs/heads/master");

    assert!(parse_webhook(&client, "Push Hook", "topsecret", &payload).await.is_ok());

    let err = parse_webhook(&client, "Push Hook", "wrong", &payload).await.unwrap_err();
    let Some(WebhookEvent::Push(hook)) = err.webhook_event() else {
        panic!("expected push event on signature failure, got {err:?}");
    };
    assert_eq!(hook.after, "c2");

    let headers = webhook_headers("Push Hook", "");
    let mut body: &[u8] = payload.as_bytes();
    let no_secret = |_: &WebhookEvent| Ok::<_, Error>(String::new());
    let event = client
        .webhooks()
        .parse(&Context::background(), &headers, &mut body, &no_secret)
        .await;
    assert!(event.is_ok());
}

#[tokio::test]
async fn test_webhook_unknown_event() {
    let (client, _) = setup();

    for event in ["Issue Hook", "Pipeline Hook", ""] {
        let err = parse_webhook(&client, event, "topsecret", "{}").await.unwrap_err();
        match err {
            Error::UnknownWebhook { event: name } => assert_eq!(name, event),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}

#[tokio::test]
async fn test_webhook_decode_error_before_verification() {
    let (client, _) = setup();
    let err = parse_webhook(&client, "Push Hook", "wrong", "{not json").await.unwrap_err();
    assert!(matches!(err, Error::Decode(_)));
}

fn merge_request_hook(action: &str, state: &str) -> String {
    serde_json::json!({
        "object_kind": "merge_request",
        "user": {"name": "Xinnjie", "username": "xinnjie", "avatar_url": "https://example.com/a.png"},
        "object_attributes": {
            "iid": 3,
            "title": "Update README",
            "description": "typo",
            "state": state,
            "source_branch": "feature",
            "target_branch": "master",
            "source_project_id": 4,
            "target_project_id": 32732,
            "created_at": "2021-01-04T03:12:29+0000",
            "updated_at": "2021-01-05T03:12:29+0000",
            "url": "https://git.code.tencent.com/xinnjie/testme/merge_requests/3",
            "source": {"name": "testme", "namespace": "jack", "http_url": "https://git.code.tencent.com/jack/testme.git"},
            "target": {"name": "testme", "namespace": "xinnjie", "http_url": "https://git.code.tencent.com/xinnjie/testme.git"},
            "last_commit": {"id": "c9"},
            "action": action
        }
    })
    .to_string()
}

#[tokio::test]
async fn test_webhook_merge_request() {
    let (client, _) = setup();

    let payload = merge_request_hook("", "opened");
    let event = parse_webhook(&client, "Merge Request Hook", "topsecret", &payload).await.unwrap();
    let WebhookEvent::PullRequest(hook) = event else {
        panic!("expected pull request hook");
    };
    assert_eq!(hook.action, Action::Open);
    assert_eq!(hook.repo.full_name, REPO);
    assert_eq!(hook.repo.id, "32732");
    assert_eq!(hook.sender.login, "xinnjie");
    let pr = hook.pull_request;
    assert_eq!(pr.number, 3);
    assert_eq!(pr.fork, "jack/testme");
    assert_eq!(pr.reference, "refs/merge-requests/3/head");
    assert_eq!(pr.sha, "c9");
    assert_eq!(pr.head.repo.full_name, "jack/testme");
    assert_eq!(pr.base.reference, "master");
    assert!(!pr.closed);
    assert!(pr.created.is_some());

    let payload = merge_request_hook("merge", "merged");
    let event = parse_webhook(&client, "Merge Request Hook", "topsecret", &payload).await.unwrap();
    let WebhookEvent::PullRequest(hook) = event else {
        panic!("expected pull request hook");
    };
    assert_eq!(hook.action, Action::Merge);
    assert!(hook.pull_request.merged);
    assert!(hook.pull_request.closed);
    assert_eq!(hook.pull_request.state, "closed");

    let payload = merge_request_hook("approved", "opened");
    let err = parse_webhook(&client, "Merge Request Hook", "topsecret", &payload).await.unwrap_err();
    assert!(matches!(err, Error::UnknownWebhook { event } if event == "approved"));
}

fn note_hook(noteable_type: &str) -> String {
    serde_json::json!({
        "object_kind": "note",
        "user": {"name": "Xinnjie", "username": "xinnjie"},
        "project_id": 32732,
        "object_attributes": {
            "id": 1243,
            "note": "This is a comment",
            "noteable_type": noteable_type,
            "author_id": 23,
            "created_at": "2017-12-10 17:01:11 UTC",
            "updated_at": "2017-12-10 17:01:11 UTC",
            "url": "https://git.code.tencent.com/xinnjie/testme/issues/1#note_1243"
        },
        "repository": {"name": "testme", "homepage": "https://git.code.tencent.com/xinnjie/testme"},
        "issue": {"iid": 1, "title": "Add license", "description": "MIT", "author_id": 11323, "state": "closed"},
        "merge_request": {
            "author_id": 11322,
            "iid": 2,
            "title": "Update README",
            "state": "opened",
            "source_branch": "feature",
            "target_branch": "master",
            "source_project_id": 32732,
            "target_project_id": 32732,
            "created_at": "2017-12-10 17:01:11 UTC",
            "updated_at": "2017-12-10 17:01:11 UTC",
            "url": "https://git.code.tencent.com/xinnjie/testme/merge_requests/2",
            "source": {"name": "testme", "namespace": "xinnjie"},
            "target": {"name": "testme", "namespace": "xinnjie"},
            "last_commit": {"id": "d4"}
        }
    })
    .to_string()
}

#[tokio::test]
async fn test_webhook_issue_comment() {
    let (client, mock) = setup();
    mock.on(Method::GET, "api/v3/users/23", MockResponse::ok(r#"{"id": 23, "username": "commenter"}"#))
        .on(Method::GET, "api/v3/users/11323", MockResponse::ok(r#"{"id": 11323, "username": "reporter"}"#));

    let event = parse_webhook(&client, "Note Hook", "topsecret", &note_hook("Issue")).await.unwrap();
    let WebhookEvent::IssueComment(hook) = event else {
        panic!("expected issue comment hook");
    };
    assert_eq!(hook.action, Action::Create);
    assert_eq!(hook.comment.id, 1243);
    assert_eq!(hook.comment.body, "This is a comment");
    assert_eq!(hook.comment.author.login, "commenter");
    assert_eq!(hook.sender.login, "commenter");
    assert_eq!(hook.issue.author.login, "reporter");
    assert!(hook.issue.closed);
    assert_eq!(hook.repo.full_name, REPO);
    assert_eq!(
        hook.comment.created,
        Some(Utc.with_ymd_and_hms(2017, 12, 10, 17, 1, 11).unwrap())
    );
}

/// User lookups answered from a fixed list.
struct StaticUsers(Vec<User>);

#[async_trait]
impl UserService for StaticUsers {
    async fn find(&self, _: &Context) -> scm::Response<User> {
        Err(Error::NotSupported)
    }

    async fn find_login(&self, _: &Context, login: &str) -> scm::Response<User> {
        self.0
            .iter()
            .find(|u| u.login == login)
            .map(|u| (u.clone(), ResponseEnvelope::default()))
            .ok_or(Error::NotFound)
    }

    async fn find_login_by_id(&self, _: &Context, id: i64) -> scm::Response<User> {
        self.0
            .iter()
            .find(|u| u.id == id)
            .map(|u| (u.clone(), ResponseEnvelope::default()))
            .ok_or(Error::NotFound)
    }

    async fn find_email(&self, _: &Context) -> scm::Response<String> {
        Err(Error::NotSupported)
    }

    async fn create_token(&self, _: &Context, _: &str, _: &str) -> scm::Response<UserToken> {
        Err(Error::NotSupported)
    }

    async fn delete_token(&self, _: &Context, _: i64) -> scm::Result<ResponseEnvelope> {
        Err(Error::NotSupported)
    }

    async fn list_invitations(&self, _: &Context) -> scm::Response<Vec<Invitation>> {
        Err(Error::NotSupported)
    }

    async fn accept_invitation(&self, _: &Context, _: i64) -> scm::Result<ResponseEnvelope> {
        Err(Error::NotSupported)
    }
}

fn user(id: i64, login: &str) -> User {
    User {
        id,
        login: login.to_string(),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_webhook_merge_request_comment_with_user_service() {
    init_tracing();
    let parser = WebhooksClient::new(Arc::new(StaticUsers(vec![user(23, "commenter"), user(11322, "author")])));
    let headers = webhook_headers("Note Hook", "topsecret");
    let payload = note_hook("MergeRequest");
    let mut body: &[u8] = payload.as_bytes();
    let secret = |_: &WebhookEvent| Ok::<_, Error>("topsecret".to_string());

    let event = parser
        .parse(&Context::background(), &headers, &mut body, &secret)
        .await
        .unwrap();
    let WebhookEvent::PullRequestComment(hook) = event else {
        panic!("expected pull request comment hook");
    };
    assert_eq!(hook.sender.login, "commenter");
    assert_eq!(hook.pull_request.author.login, "author");
    assert_eq!(hook.pull_request.number, 2);
    assert_eq!(hook.pull_request.sha, "d4");
    assert_eq!(hook.pull_request.fork, REPO);
    assert_eq!(hook.pull_request.head.repo.id, "32732");
}

#[tokio::test]
async fn test_webhook_comment_lookup_failure() {
    init_tracing();
    let parser = WebhooksClient::new(Arc::new(StaticUsers(vec![user(23, "commenter")])));
    let headers = webhook_headers("Note Hook", "topsecret");
    let payload = note_hook("MergeRequest");
    let mut body: &[u8] = payload.as_bytes();
    let secret = |_: &WebhookEvent| Ok::<_, Error>(String::new());

    let err = parser
        .parse(&Context::background(), &headers, &mut body, &secret)
        .await
        .unwrap_err();
    match &err {
        Error::Lookup { context, .. } => assert_eq!(context, "unable to find mr author"),
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(err.is_not_found());

    let parser = WebhooksClient::new(Arc::new(StaticUsers(Vec::new())));
    let payload = note_hook("Issue");
    let mut body: &[u8] = payload.as_bytes();
    let err = parser
        .parse(&Context::background(), &headers, &mut body, &secret)
        .await
        .unwrap_err();
    assert!(err.to_string().starts_with("unable to find comment author"));
}

#[tokio::test]
async fn test_webhook_unknown_noteable_type() {
    let (client, mock) = setup();
    let err = parse_webhook(&client, "Note Hook", "topsecret", &note_hook("Commit")).await.unwrap_err();
    assert!(matches!(err, Error::UnknownWebhook { event } if event == "Commit"));
    assert!(mock.get_calls(None).is_empty());
}
