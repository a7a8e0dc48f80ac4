//! Git client: branches, tags, commits and diffs.

use std::sync::Arc;

use async_trait::async_trait;
use http::Method;
use serde::Deserialize;
use url::form_urlencoded::Serializer;

use super::util::{
    encode, encode_commit_list_options, encode_list_options, nullable, parse_opt_time, with_query,
};
use super::Api;
use crate::context::Context;
use crate::envelope::ResponseEnvelope;
use crate::error::Result;
use crate::services::{GitService, Response};
use crate::types::{Change, Commit, CommitListOptions, ListOptions, Reference, Signature};

/// Client for git operations.
#[derive(Clone)]
pub struct GitClient {
    api: Arc<Api>,
}

impl GitClient {
    /// Create a new git client.
    pub fn new(api: Arc<Api>) -> Self {
        Self { api }
    }

    fn repository_path(repo: &str, rest: &str) -> String {
        format!("api/v3/projects/{}/repository/{rest}", encode(repo))
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct WireChange {
    #[serde(deserialize_with = "nullable")]
    pub old_path: String,
    #[serde(deserialize_with = "nullable")]
    pub new_path: String,
    pub new_file: bool,
    pub renamed_file: bool,
    pub deleted_file: bool,
    #[serde(deserialize_with = "nullable")]
    pub diff: String,
}

pub(crate) fn convert_change(from: &WireChange) -> Change {
    let path = if from.new_path.is_empty() {
        from.old_path.clone()
    } else {
        from.new_path.clone()
    };
    Change {
        path,
        previous_path: from.old_path.clone(),
        added: from.new_file,
        renamed: from.renamed_file,
        deleted: from.deleted_file,
        patch: from.diff.clone(),
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WireCommit {
    #[serde(deserialize_with = "nullable")]
    id: String,
    #[serde(deserialize_with = "nullable")]
    message: String,
    #[serde(deserialize_with = "nullable")]
    author_name: String,
    #[serde(deserialize_with = "nullable")]
    author_email: String,
    authored_date: Option<String>,
    #[serde(deserialize_with = "nullable")]
    committer_name: String,
    #[serde(deserialize_with = "nullable")]
    committer_email: String,
    committed_date: Option<String>,
    #[serde(deserialize_with = "nullable")]
    web_url: String,
}

fn convert_commit(from: &WireCommit) -> Commit {
    Commit {
        sha: from.id.clone(),
        message: from.message.clone(),
        author: Signature {
            login: from.author_name.clone(),
            name: from.author_name.clone(),
            email: from.author_email.clone(),
            date: parse_opt_time(from.authored_date.as_deref()),
        },
        committer: Signature {
            login: from.committer_name.clone(),
            name: from.committer_name.clone(),
            email: from.committer_email.clone(),
            date: parse_opt_time(from.committed_date.as_deref()),
        },
        link: from.web_url.clone(),
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WireRef {
    #[serde(deserialize_with = "nullable")]
    name: String,
    #[serde(deserialize_with = "nullable")]
    commit: WireCommit,
}

fn convert_ref(from: &WireRef) -> Reference {
    Reference {
        name: crate::types::trim_ref(&from.name),
        sha: from.commit.id.clone(),
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WireCompare {
    #[serde(alias = "files", deserialize_with = "nullable")]
    diffs: Vec<WireChange>,
}

#[async_trait]
impl GitService for GitClient {
    async fn find_branch(&self, ctx: &Context, repo: &str, name: &str) -> Response<Reference> {
        let path = Self::repository_path(repo, &format!("branches/{}", encode(name)));
        let (out, res): (WireRef, _) = self.api.get(ctx, path).await?;
        Ok((convert_ref(&out), res))
    }

    async fn find_commit(&self, ctx: &Context, repo: &str, sha: &str) -> Response<Commit> {
        let path = Self::repository_path(repo, &format!("commits/{sha}"));
        let (out, res): (WireCommit, _) = self.api.get(ctx, path).await?;
        Ok((convert_commit(&out), res))
    }

    async fn find_tag(&self, ctx: &Context, repo: &str, name: &str) -> Response<Reference> {
        let path = Self::repository_path(repo, &format!("tags/{}", encode(name)));
        let (out, res): (WireRef, _) = self.api.get(ctx, path).await?;
        Ok((convert_ref(&out), res))
    }

    async fn list_branches(
        &self,
        ctx: &Context,
        repo: &str,
        opts: ListOptions,
    ) -> Response<Vec<Reference>> {
        let path = with_query(
            &Self::repository_path(repo, "branches"),
            &encode_list_options(opts),
        );
        let (out, res): (Vec<WireRef>, _) = self.api.get(ctx, path).await?;
        Ok((out.iter().map(convert_ref).collect(), res))
    }

    async fn list_commits(
        &self,
        ctx: &Context,
        repo: &str,
        opts: &CommitListOptions,
    ) -> Response<Vec<Commit>> {
        let path = with_query(
            &Self::repository_path(repo, "commits"),
            &encode_commit_list_options(opts),
        );
        let (out, res): (Vec<WireCommit>, _) = self.api.get(ctx, path).await?;
        Ok((out.iter().map(convert_commit).collect(), res))
    }

    async fn list_tags(
        &self,
        ctx: &Context,
        repo: &str,
        opts: ListOptions,
    ) -> Response<Vec<Reference>> {
        let path = with_query(
            &Self::repository_path(repo, "tags"),
            &encode_list_options(opts),
        );
        let (out, res): (Vec<WireRef>, _) = self.api.get(ctx, path).await?;
        Ok((out.iter().map(convert_ref).collect(), res))
    }

    async fn list_changes(
        &self,
        ctx: &Context,
        repo: &str,
        sha: &str,
        _opts: ListOptions,
    ) -> Response<Vec<Change>> {
        let path = Self::repository_path(repo, &format!("commits/{sha}/diff"));
        let (out, res): (Vec<WireChange>, _) = self.api.get(ctx, path).await?;
        Ok((out.iter().map(convert_change).collect(), res))
    }

    async fn compare_commits(
        &self,
        ctx: &Context,
        repo: &str,
        source: &str,
        target: &str,
        _opts: ListOptions,
    ) -> Response<Vec<Change>> {
        let query = Serializer::new(String::new())
            .append_pair("from", source)
            .append_pair("to", target)
            .finish();
        let path = format!("{}?{query}", Self::repository_path(repo, "compare"));
        let (out, res): (WireCompare, _) = self.api.get(ctx, path).await?;
        Ok((out.diffs.iter().map(convert_change).collect(), res))
    }

    async fn create_ref(
        &self,
        ctx: &Context,
        repo: &str,
        name: &str,
        sha: &str,
    ) -> Response<Reference> {
        let query = Serializer::new(String::new())
            .append_pair("branch_name", &crate::types::trim_ref(name))
            .append_pair("ref", sha)
            .finish();
        let path = format!("{}?{query}", Self::repository_path(repo, "branches"));
        let (out, res): (WireRef, _) = self.api.call(ctx, Method::POST, path).await?;
        Ok((convert_ref(&out), res))
    }

    async fn delete_ref(&self, ctx: &Context, repo: &str, name: &str) -> Result<ResponseEnvelope> {
        let branch = crate::types::trim_ref(name);
        let path = Self::repository_path(repo, &format!("branches/{}", encode(&branch)));
        self.api.empty(ctx, Method::DELETE, path).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_change_falls_back_to_old_path() {
        let deleted = convert_change(&WireChange {
            old_path: "README.md".to_string(),
            deleted_file: true,
            ..Default::default()
        });
        assert_eq!(deleted.path, "README.md");
        assert_eq!(deleted.previous_path, "README.md");
        assert!(deleted.deleted);

        let renamed = convert_change(&WireChange {
            old_path: "a.txt".to_string(),
            new_path: "b.txt".to_string(),
            renamed_file: true,
            ..Default::default()
        });
        assert_eq!(renamed.path, "b.txt");
        assert_eq!(renamed.previous_path, "a.txt");
    }

    #[test]
    fn test_convert_commit() {
        let wire: WireCommit = serde_json::from_str(
            r#"{
                "id": "7fd1a60b01f91b314f59955a4e4d4e80d8edf11d",
                "message": "Replace sanitize with escape once",
                "author_name": "Example User",
                "author_email": "user@example.com",
                "authored_date": "2012-09-20T09:06:12+0300",
                "committer_name": "Example User",
                "committer_email": "user@example.com",
                "committed_date": "2012-09-20T09:06:12+0300",
                "parent_ids": ["ae1d9fb46aa2b07ee9836d49862ec4e2c46fbbba"]
            }"#,
        )
        .unwrap();
        let commit = convert_commit(&wire);
        assert_eq!(commit.sha, "7fd1a60b01f91b314f59955a4e4d4e80d8edf11d");
        assert_eq!(commit.author.login, "Example User");
        assert!(commit.committer.date.is_some());
    }

    #[test]
    fn test_convert_ref_trims_prefix() {
        let wire: WireRef =
            serde_json::from_str(r#"{"name": "refs/tags/v0.0.1", "commit": {"id": "abc"}}"#)
                .unwrap();
        assert_eq!(
            convert_ref(&wire),
            Reference {
                name: "v0.0.1".to_string(),
                sha: "abc".to_string()
            }
        );
    }
}
