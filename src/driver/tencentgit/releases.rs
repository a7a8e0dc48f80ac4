//! Releases client.
//!
//! Releases are addressed by tag name; the id-based variants are not
//! available on this provider.

use std::sync::Arc;

use async_trait::async_trait;
use http::Method;
use serde::{Deserialize, Serialize};

use super::util::{encode, encode_list_options, nullable, parse_opt_time, with_query};
use super::Api;
use crate::context::Context;
use crate::envelope::ResponseEnvelope;
use crate::error::{Error, Result};
use crate::services::{ReleaseService, Response};
use crate::types::{ListOptions, Release, ReleaseInput, ReleaseListOptions};

/// Client for release operations.
#[derive(Clone)]
pub struct ReleasesClient {
    api: Arc<Api>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WireCommitRef {
    #[serde(deserialize_with = "nullable")]
    id: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WireRelease {
    #[serde(deserialize_with = "nullable")]
    tag_name: String,
    #[serde(deserialize_with = "nullable")]
    name: String,
    #[serde(deserialize_with = "nullable")]
    description: String,
    #[serde(deserialize_with = "nullable")]
    commit: WireCommitRef,
    created_at: Option<String>,
    released_at: Option<String>,
}

#[derive(Serialize)]
struct CreateRelease<'a> {
    tag_name: &'a str,
    name: &'a str,
    description: &'a str,
    #[serde(rename = "ref", skip_serializing_if = "str::is_empty")]
    reference: &'a str,
}

#[derive(Serialize)]
struct UpdateRelease<'a> {
    name: &'a str,
    description: &'a str,
}

impl ReleasesClient {
    /// Create a new releases client.
    pub fn new(api: Arc<Api>) -> Self {
        Self { api }
    }

    fn releases_path(repo: &str) -> String {
        format!("api/v3/projects/{}/releases", encode(repo))
    }

    fn tag_path(repo: &str, tag: &str) -> String {
        format!("{}/{}", Self::releases_path(repo), encode(tag))
    }

    fn convert(&self, repo: &str, from: &WireRelease) -> Release {
        let title = if from.name.is_empty() {
            from.tag_name.clone()
        } else {
            from.name.clone()
        };
        let link = self
            .api
            .base_url()
            .join(&format!("{repo}/releases/{}", from.tag_name))
            .map(|url| url.to_string())
            .unwrap_or_default();
        let created = parse_opt_time(from.created_at.as_deref());
        Release {
            id: 0,
            title,
            description: from.description.clone(),
            link,
            tag: from.tag_name.clone(),
            commitish: from.commit.id.clone(),
            draft: false,
            prerelease: false,
            created,
            published: parse_opt_time(from.released_at.as_deref()).or(created),
        }
    }
}

#[async_trait]
impl ReleaseService for ReleasesClient {
    async fn find(&self, _: &Context, _: &str, _: i64) -> Response<Release> {
        Err(Error::NotSupported)
    }

    async fn find_by_tag(&self, ctx: &Context, repo: &str, tag: &str) -> Response<Release> {
        let (out, res): (WireRelease, _) = self.api.get(ctx, Self::tag_path(repo, tag)).await?;
        Ok((self.convert(repo, &out), res))
    }

    async fn list(
        &self,
        ctx: &Context,
        repo: &str,
        opts: ReleaseListOptions,
    ) -> Response<Vec<Release>> {
        let path = with_query(
            &Self::releases_path(repo),
            &encode_list_options(ListOptions::new(opts.page, opts.size)),
        );
        let (out, res): (Vec<WireRelease>, _) = self.api.get(ctx, path).await?;
        Ok((out.iter().map(|r| self.convert(repo, r)).collect(), res))
    }

    async fn create(&self, ctx: &Context, repo: &str, input: &ReleaseInput) -> Response<Release> {
        let body = CreateRelease {
            tag_name: &input.tag,
            name: &input.title,
            description: &input.description,
            reference: &input.commitish,
        };
        let (out, res): (WireRelease, _) = self
            .api
            .json(ctx, Method::POST, Self::releases_path(repo), &body)
            .await?;
        Ok((self.convert(repo, &out), res))
    }

    async fn update(&self, _: &Context, _: &str, _: i64, _: &ReleaseInput) -> Response<Release> {
        Err(Error::NotSupported)
    }

    async fn update_by_tag(
        &self,
        ctx: &Context,
        repo: &str,
        tag: &str,
        input: &ReleaseInput,
    ) -> Response<Release> {
        let body = UpdateRelease {
            name: &input.title,
            description: &input.description,
        };
        let (out, res): (WireRelease, _) = self
            .api
            .json(ctx, Method::PUT, Self::tag_path(repo, tag), &body)
            .await?;
        Ok((self.convert(repo, &out), res))
    }

    async fn delete(&self, _: &Context, _: &str, _: i64) -> Result<ResponseEnvelope> {
        Err(Error::NotSupported)
    }

    async fn delete_by_tag(
        &self,
        ctx: &Context,
        repo: &str,
        tag: &str,
    ) -> Result<ResponseEnvelope> {
        self.api
            .empty(ctx, Method::DELETE, Self::tag_path(repo, tag))
            .await
    }
}
