//! TencentGit (工蜂) driver.
//!
//! Talks to the REST v3 API under `api/v3/`. Every client in this module
//! shares one [`Api`], which owns the request executor, the base URL and the
//! envelope rules; it holds nothing mutable, so clients are cheap to clone
//! and safe to use concurrently.

pub mod git;
pub mod issues;
pub mod milestones;
pub mod orgs;
pub mod pulls;
pub mod releases;
pub mod repos;
pub mod reviews;
pub mod users;
pub mod util;
pub mod webhooks;

use std::sync::Arc;

use http::Method;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::context::Context;
use crate::envelope::{EnvelopeBuilder, HeaderRules, PaginationStyle, ResponseEnvelope};
use crate::error::{Error, Result};
use crate::transport::{RawResponse, Request, RequestExecutor};

pub use git::GitClient;
pub use issues::IssuesClient;
pub use milestones::MilestonesClient;
pub use orgs::OrgsClient;
pub use pulls::PullsClient;
pub use releases::ReleasesClient;
pub use repos::ReposClient;
pub use reviews::ReviewsClient;
pub use users::UsersClient;
pub use webhooks::WebhooksClient;

/// Default public server.
pub const DEFAULT_SERVER: &str = "https://git.code.tencent.com/";

/// Envelope header rules for TencentGit.
#[must_use]
pub fn header_rules() -> HeaderRules {
    HeaderRules {
        pagination: vec![PaginationStyle::Link, PaginationStyle::Echo],
        ..HeaderRules::default()
    }
}

/// Shared request plumbing for the TencentGit clients.
pub struct Api {
    executor: Arc<dyn RequestExecutor>,
    base_url: Url,
    envelope: EnvelopeBuilder,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<serde_json::Value>,
    #[serde(default)]
    error: Option<String>,
}

impl Api {
    /// Create the shared API handle.
    #[must_use]
    pub fn new(executor: Arc<dyn RequestExecutor>, base_url: Url) -> Self {
        Self {
            executor,
            base_url,
            envelope: EnvelopeBuilder::new(header_rules()),
        }
    }

    /// Base URL of the server.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Send a request and return the raw body of a successful response.
    pub(crate) async fn send(
        &self,
        ctx: &Context,
        request: Request,
    ) -> Result<(Vec<u8>, ResponseEnvelope)> {
        debug!(method = %request.method, path = %request.path, "tencentgit request");
        let response = ctx.run(self.executor.execute(request)).await?;
        let envelope = self.envelope.build(response.status, &response.headers);
        debug!(status = envelope.status, request_id = %envelope.id, "tencentgit response");

        if !response.is_success() {
            return Err(error_from_response(&response));
        }
        Ok((response.body, envelope))
    }

    /// GET and decode.
    pub(crate) async fn get<T: DeserializeOwned>(
        &self,
        ctx: &Context,
        path: String,
    ) -> Result<(T, ResponseEnvelope)> {
        self.call(ctx, Method::GET, path).await
    }

    /// Body-less request with a decoded response.
    pub(crate) async fn call<T: DeserializeOwned>(
        &self,
        ctx: &Context,
        method: Method,
        path: String,
    ) -> Result<(T, ResponseEnvelope)> {
        let (body, envelope) = self.send(ctx, Request::new(method, path)).await?;
        Ok((serde_json::from_slice(&body)?, envelope))
    }

    /// JSON request with a decoded response.
    pub(crate) async fn json<T, B>(
        &self,
        ctx: &Context,
        method: Method,
        path: String,
        input: &B,
    ) -> Result<(T, ResponseEnvelope)>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized + Sync,
    {
        let request = Request::new(method, path).with_body(serde_json::to_vec(input)?);
        let (body, envelope) = self.send(ctx, request).await?;
        Ok((serde_json::from_slice(&body)?, envelope))
    }

    /// JSON request whose response body is ignored.
    pub(crate) async fn json_empty<B>(
        &self,
        ctx: &Context,
        method: Method,
        path: String,
        input: &B,
    ) -> Result<ResponseEnvelope>
    where
        B: Serialize + ?Sized + Sync,
    {
        let request = Request::new(method, path).with_body(serde_json::to_vec(input)?);
        let (_, envelope) = self.send(ctx, request).await?;
        Ok(envelope)
    }

    /// Body-less request whose response body is ignored.
    pub(crate) async fn empty(
        &self,
        ctx: &Context,
        method: Method,
        path: String,
    ) -> Result<ResponseEnvelope> {
        let (_, envelope) = self.send(ctx, Request::new(method, path)).await?;
        Ok(envelope)
    }
}

fn error_from_response(response: &RawResponse) -> Error {
    let message = serde_json::from_slice::<ErrorBody>(&response.body)
        .ok()
        .and_then(|body| match body.message {
            Some(serde_json::Value::String(text)) => Some(text),
            Some(serde_json::Value::Null) | None => body.error,
            Some(other) => Some(other.to_string()),
        });
    Error::from_status(response.status, message)
}
