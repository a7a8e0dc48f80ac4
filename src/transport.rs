//! Request executor seam and the default reqwest transport.
//!
//! Drivers never talk to the network directly. They hand a [`Request`] to a
//! [`RequestExecutor`] and get a [`RawResponse`] back; tests plug in
//! [`crate::testing::MockExecutor`] instead of [`HttpTransport`].

use std::time::Duration;

use async_trait::async_trait;
use http::{HeaderMap, Method};
use reqwest::Client;
use tracing::debug;
use url::Url;

use crate::error::{Error, Result};

/// Header carrying the access token.
pub const TOKEN_HEADER: &str = "PRIVATE-TOKEN";

/// An outbound request, relative to the executor's base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// HTTP method
    pub method: Method,
    /// Path and query, without a leading slash (e.g. `api/v3/user`)
    pub path: String,
    /// JSON body
    pub body: Option<Vec<u8>>,
}

impl Request {
    /// A request without a body.
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
        }
    }

    /// Attach a JSON body.
    #[must_use]
    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = Some(body);
        self
    }

    /// Path without its query string.
    #[must_use]
    pub fn route(&self) -> &str {
        self.path.split_once('?').map_or(&self.path, |(route, _)| route)
    }

    /// Decoded query parameters.
    #[must_use]
    pub fn query(&self) -> Vec<(String, String)> {
        match self.path.split_once('?') {
            Some((_, query)) => url::form_urlencoded::parse(query.as_bytes())
                .into_owned()
                .collect(),
            None => Vec::new(),
        }
    }
}

/// A response as received, before any decoding.
#[derive(Debug, Clone, Default)]
pub struct RawResponse {
    /// HTTP status code
    pub status: u16,
    /// Response headers
    pub headers: HeaderMap,
    /// Response body
    pub body: Vec<u8>,
}

impl RawResponse {
    /// Whether the status is in the 2xx range.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Executes requests against a provider.
#[async_trait]
pub trait RequestExecutor: Send + Sync {
    /// Send `request` and return the raw response, whatever its status.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`] when the call could not be completed.
    async fn execute(&self, request: Request) -> Result<RawResponse>;
}

/// Default executor built on `reqwest`.
pub struct HttpTransport {
    base_url: Url,
    token: Option<String>,
    client: Client,
}

impl HttpTransport {
    /// Create a new HTTP transport.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Provider root (e.g., "<https://git.code.tencent.com/>")
    /// * `token` - Access token sent in the `PRIVATE-TOKEN` header
    /// * `timeout` - Request timeout
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(base_url: Url, token: Option<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Http(e.to_string()))?;

        Ok(Self {
            base_url,
            token: token.filter(|t| !t.is_empty()),
            client,
        })
    }

    /// Base URL requests are resolved against.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }
}

#[async_trait]
impl RequestExecutor for HttpTransport {
    async fn execute(&self, request: Request) -> Result<RawResponse> {
        let url = self
            .base_url
            .join(&request.path)
            .map_err(|e| Error::Http(format!("invalid request path {}: {e}", request.path)))?;

        let mut builder = self
            .client
            .request(request.method.clone(), url)
            .header(http::header::ACCEPT, "application/json");
        if let Some(token) = &self.token {
            builder = builder.header(TOKEN_HEADER, token);
        }
        if let Some(body) = request.body {
            builder = builder
                .header(http::header::CONTENT_TYPE, "application/json")
                .body(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|e| Error::Http(format!("Failed to read response: {e}")))?
            .to_vec();
        debug!(status, bytes = body.len(), "response received");

        Ok(RawResponse {
            status,
            headers,
            body,
        })
    }
}
