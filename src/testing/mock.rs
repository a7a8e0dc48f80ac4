//! Mock request executor for testing.
//!
//! `MockExecutor` answers requests from scripted [`MockResponse`]s keyed by
//! method and route, and records every call so tests can assert on what was
//! sent and how many writes happened.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use http::header::{HeaderName, HeaderValue};
use http::{HeaderMap, Method};

use crate::error::Result;
use crate::transport::{RawResponse, Request, RequestExecutor};

/// Record of an executed request.
#[derive(Debug, Clone)]
pub struct MockCall {
    /// HTTP method
    pub method: Method,
    /// Path without the query string
    pub route: String,
    /// Decoded query parameters
    pub query: Vec<(String, String)>,
    /// Request body, if any
    pub body: Option<Vec<u8>>,
    /// Timestamp of the call
    pub timestamp: DateTime<Utc>,
}

impl MockCall {
    fn new(request: &Request) -> Self {
        Self {
            method: request.method.clone(),
            route: request.route().to_string(),
            query: request.query(),
            body: request.body.clone(),
            timestamp: Utc::now(),
        }
    }

    /// First value of a query parameter.
    #[must_use]
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Request body decoded as JSON; `Null` when absent or invalid.
    #[must_use]
    pub fn json(&self) -> serde_json::Value {
        self.body
            .as_deref()
            .and_then(|body| serde_json::from_slice(body).ok())
            .unwrap_or_default()
    }
}

/// A scripted response.
#[derive(Debug, Clone, Default)]
pub struct MockResponse {
    /// HTTP status code
    pub status: u16,
    /// Response headers
    pub headers: HeaderMap,
    /// Response body
    pub body: Vec<u8>,
}

impl MockResponse {
    /// A JSON response with the given status.
    #[must_use]
    pub fn json(status: u16, body: &str) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(
            http::header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        Self {
            status,
            headers,
            body: body.as_bytes().to_vec(),
        }
    }

    /// A `200 OK` JSON response.
    #[must_use]
    pub fn ok(body: &str) -> Self {
        Self::json(200, body)
    }

    /// An error response carrying a provider message.
    #[must_use]
    pub fn with_error(status: u16, message: &str) -> Self {
        Self::json(status, &serde_json::json!({ "message": message }).to_string())
    }

    /// Add a header. Invalid names or values are ignored.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            self.headers.append(name, value);
        }
        self
    }
}

#[derive(Default)]
struct MockState {
    routes: HashMap<(Method, String), VecDeque<MockResponse>>,
    calls: Vec<MockCall>,
}

/// Request executor answering from scripted responses.
///
/// Responses registered for the same method and route are served in order;
/// the last one keeps being served once the others are used up. Requests
/// with no scripted response get a `404 Not Found`.
#[derive(Default)]
pub struct MockExecutor {
    state: Mutex<MockState>,
}

impl MockExecutor {
    /// Create an executor with no scripted responses.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Script a response for `method` on `route` (path without query).
    pub fn on(&self, method: Method, route: &str, response: MockResponse) -> &Self {
        self.state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .routes
            .entry((method, route.to_string()))
            .or_default()
            .push_back(response);
        self
    }

    /// Check if a method and route was called.
    #[must_use]
    pub fn was_called(&self, method: &Method, route: &str) -> bool {
        self.call_count(method, route) > 0
    }

    /// Get the number of times a method and route was called.
    #[must_use]
    pub fn call_count(&self, method: &Method, route: &str) -> usize {
        self.state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .calls
            .iter()
            .filter(|c| &c.method == method && c.route == route)
            .count()
    }

    /// Number of non-GET calls.
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .calls
            .iter()
            .filter(|c| c.method != Method::GET)
            .count()
    }

    /// Get all recorded calls, optionally filtered by method.
    #[must_use]
    pub fn get_calls(&self, method: Option<&Method>) -> Vec<MockCall> {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        match method {
            Some(m) => state.calls.iter().filter(|c| &c.method == m).cloned().collect(),
            None => state.calls.clone(),
        }
    }

    /// The most recent call, if any.
    #[must_use]
    pub fn last_call(&self) -> Option<MockCall> {
        self.state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .calls
            .last()
            .cloned()
    }

    /// Reset all recorded calls. Scripted responses are kept.
    pub fn reset(&self) {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).calls.clear();
    }
}

#[async_trait]
impl RequestExecutor for MockExecutor {
    async fn execute(&self, request: Request) -> Result<RawResponse> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.calls.push(MockCall::new(&request));

        let key = (request.method.clone(), request.route().to_string());
        let response = match state.routes.get_mut(&key) {
            Some(queue) if queue.len() > 1 => queue.pop_front(),
            Some(queue) => queue.front().cloned(),
            None => None,
        }
        .unwrap_or_else(|| MockResponse::with_error(404, "404 Not Found"));

        Ok(RawResponse {
            status: response.status,
            headers: response.headers,
            body: response.body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_responses_in_order() {
        let mock = MockExecutor::new();
        mock.on(Method::GET, "api/v3/user", MockResponse::ok(r#"{"id":1}"#))
            .on(Method::GET, "api/v3/user", MockResponse::ok(r#"{"id":2}"#));

        let first = mock.execute(Request::new(Method::GET, "api/v3/user")).await.unwrap();
        let second = mock.execute(Request::new(Method::GET, "api/v3/user")).await.unwrap();
        let third = mock.execute(Request::new(Method::GET, "api/v3/user?x=1")).await.unwrap();

        assert_eq!(first.body, br#"{"id":1}"#);
        assert_eq!(second.body, br#"{"id":2}"#);
        assert_eq!(third.body, br#"{"id":2}"#);
        assert_eq!(mock.call_count(&Method::GET, "api/v3/user"), 3);
        assert_eq!(mock.write_count(), 0);
    }

    #[tokio::test]
    async fn test_unscripted_route_is_not_found() {
        let mock = MockExecutor::new();
        let response = mock
            .execute(Request::new(Method::DELETE, "api/v3/projects/1").with_body(b"{}".to_vec()))
            .await
            .unwrap();
        assert_eq!(response.status, 404);
        assert_eq!(mock.write_count(), 1);
        assert_eq!(mock.last_call().unwrap().json(), serde_json::json!({}));
    }

    #[test]
    fn test_mock_reset() {
        let mock = MockExecutor::new();
        mock.state
            .lock()
            .unwrap()
            .calls
            .push(MockCall::new(&Request::new(Method::PUT, "api/v3/x?a=b")));
        assert_eq!(mock.get_calls(Some(&Method::PUT))[0].query_param("a"), Some("b"));
        mock.reset();
        assert!(mock.get_calls(None).is_empty());
        assert!(!mock.was_called(&Method::PUT, "api/v3/x"));
    }

    #[test]
    fn test_with_header() {
        let response = MockResponse::ok("{}")
            .with_header("X-Request-Id", "abc")
            .with_header("bad header", "x");
        assert_eq!(response.headers.get("X-Request-Id").unwrap(), "abc");
        assert_eq!(response.headers.len(), 2);
    }
}
