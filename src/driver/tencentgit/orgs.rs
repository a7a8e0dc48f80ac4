//! Organizations client. Organizations are TencentGit groups.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use super::users::{convert_user, WireUser};
use super::util::{encode, encode_list_options, nullable, with_query};
use super::Api;
use crate::context::Context;
use crate::services::{OrganizationService, Response};
use crate::types::{ListOptions, Organization, User};

/// Client for organization operations.
#[derive(Clone)]
pub struct OrgsClient {
    api: Arc<Api>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WireGroup {
    id: i64,
    #[serde(deserialize_with = "nullable")]
    name: String,
    #[serde(deserialize_with = "nullable")]
    path: String,
    #[serde(deserialize_with = "nullable")]
    avatar_url: String,
    #[serde(deserialize_with = "nullable")]
    web_url: String,
}

fn convert_group(from: &WireGroup) -> Organization {
    let name = if from.path.is_empty() {
        from.name.clone()
    } else {
        from.path.clone()
    };
    Organization {
        id: from.id,
        name,
        avatar: from.avatar_url.clone(),
        link: from.web_url.clone(),
        permissions: None,
    }
}

impl OrgsClient {
    /// Create a new organizations client.
    pub fn new(api: Arc<Api>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl OrganizationService for OrgsClient {
    async fn find(&self, ctx: &Context, name: &str) -> Response<Organization> {
        let path = format!("api/v3/groups/{}", encode(name));
        let (out, res): (WireGroup, _) = self.api.get(ctx, path).await?;
        Ok((convert_group(&out), res))
    }

    async fn list(&self, ctx: &Context, opts: ListOptions) -> Response<Vec<Organization>> {
        let path = with_query("api/v3/groups", &encode_list_options(opts));
        let (out, res): (Vec<WireGroup>, _) = self.api.get(ctx, path).await?;
        Ok((out.iter().map(convert_group).collect(), res))
    }

    async fn list_members(
        &self,
        ctx: &Context,
        name: &str,
        opts: ListOptions,
    ) -> Response<Vec<User>> {
        let path = with_query(
            &format!("api/v3/groups/{}/members", encode(name)),
            &encode_list_options(opts),
        );
        let (out, res): (Vec<WireUser>, _) = self.api.get(ctx, path).await?;
        Ok((out.iter().map(convert_user).collect(), res))
    }
}
