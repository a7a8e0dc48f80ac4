//! Users client.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use url::form_urlencoded::Serializer;

use super::util::{nullable, parse_opt_time};
use super::Api;
use crate::context::Context;
use crate::envelope::ResponseEnvelope;
use crate::error::{Error, Result};
use crate::services::{Response, UserService};
use crate::types::{Invitation, User, UserToken};

/// Client for user operations.
#[derive(Clone)]
pub struct UsersClient {
    api: Arc<Api>,
}

impl UsersClient {
    /// Create a new users client.
    pub fn new(api: Arc<Api>) -> Self {
        Self { api }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct WireUser {
    pub id: i64,
    #[serde(deserialize_with = "nullable")]
    pub username: String,
    #[serde(deserialize_with = "nullable")]
    pub name: String,
    #[serde(deserialize_with = "nullable")]
    pub web_url: String,
    #[serde(deserialize_with = "nullable")]
    pub avatar_url: String,
    #[serde(deserialize_with = "nullable")]
    pub email: String,
    pub created_at: Option<String>,
    pub is_admin: bool,
}

pub(crate) fn convert_user(from: &WireUser) -> User {
    User {
        id: from.id,
        login: from.username.clone(),
        name: from.name.clone(),
        email: from.email.clone(),
        avatar: from.avatar_url.clone(),
        link: from.web_url.clone(),
        is_admin: from.is_admin,
        created: parse_opt_time(from.created_at.as_deref()),
    }
}

#[async_trait]
impl UserService for UsersClient {
    async fn find(&self, ctx: &Context) -> Response<User> {
        let (out, res): (WireUser, _) = self.api.get(ctx, "api/v3/user".to_string()).await?;
        Ok((convert_user(&out), res))
    }

    async fn find_login(&self, ctx: &Context, login: &str) -> Response<User> {
        let mut page: u32 = 1;
        loop {
            let query = Serializer::new(String::new())
                .append_pair("search", login)
                .append_pair("page", &page.to_string())
                .finish();
            let (out, res): (Vec<WireUser>, _) =
                self.api.get(ctx, format!("api/v3/users?{query}")).await?;
            if let Some(found) = out.iter().find(|u| u.username.eq_ignore_ascii_case(login)) {
                return Ok((convert_user(found), res));
            }
            page += 1;
            if page > res.page.last {
                return Err(Error::NotFound);
            }
        }
    }

    async fn find_login_by_id(&self, ctx: &Context, id: i64) -> Response<User> {
        let (out, res): (WireUser, _) = self.api.get(ctx, format!("api/v3/users/{id}")).await?;
        if res.status != 200 {
            return Err(Error::NotFound);
        }
        Ok((convert_user(&out), res))
    }

    async fn find_email(&self, ctx: &Context) -> Response<String> {
        let (user, res) = self.find(ctx).await?;
        Ok((user.email, res))
    }

    async fn create_token(&self, _: &Context, _: &str, _: &str) -> Response<UserToken> {
        Err(Error::NotSupported)
    }

    async fn delete_token(&self, _: &Context, _: i64) -> Result<ResponseEnvelope> {
        Err(Error::NotSupported)
    }

    async fn list_invitations(&self, _: &Context) -> Response<Vec<Invitation>> {
        Err(Error::NotSupported)
    }

    async fn accept_invitation(&self, _: &Context, _: i64) -> Result<ResponseEnvelope> {
        Err(Error::NotSupported)
    }
}
