//! Response envelope builder.
//!
//! Every driver call returns a [`ResponseEnvelope`] next to its decoded
//! payload. The envelope is derived from response headers only, through an
//! immutable [`HeaderRules`] table chosen by the driver at construction time.
//! Building an envelope never fails: missing or malformed headers leave the
//! corresponding fields at zero.

use http::HeaderMap;
use serde::{Deserialize, Serialize};
use url::Url;

/// Rate-limit snapshot. All zero when the provider does not report one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rate {
    /// Requests allowed per window
    pub limit: i64,
    /// Requests left in the current window
    pub remaining: i64,
    /// Window reset, as reported by the provider
    pub reset: i64,
}

/// Pagination cursors. All zero when the endpoint is not paginated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    /// First page
    pub first: u32,
    /// Previous page
    pub prev: u32,
    /// Next page
    pub next: u32,
    /// Last page
    pub last: u32,
}

impl Page {
    /// True when no cursor is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Uniform metadata about a provider response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    /// HTTP status code
    pub status: u16,
    /// Provider request id, empty when absent
    pub id: String,
    /// Rate-limit snapshot
    pub rate: Rate,
    /// Pagination cursors
    pub page: Page,
}

/// How a provider advertises pagination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaginationStyle {
    /// RFC 5988 `Link` header with `page` query parameters
    Link,
    /// `X-Page` / `X-Next-Page` / `X-Prev-Page` / `X-Total-Pages` headers
    Echo,
    /// No pagination headers
    None,
}

/// Header names a provider uses for envelope metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderRules {
    /// Request id header
    pub request_id: String,
    /// Rate-limit ceiling header
    pub rate_limit: String,
    /// Rate-limit remaining header
    pub rate_remaining: String,
    /// Rate-limit reset header
    pub rate_reset: String,
    /// Pagination styles, tried in order until one yields a cursor
    pub pagination: Vec<PaginationStyle>,
}

impl Default for HeaderRules {
    fn default() -> Self {
        Self {
            request_id: "X-Request-Id".to_string(),
            rate_limit: "RateLimit-Limit".to_string(),
            rate_remaining: "RateLimit-Remaining".to_string(),
            rate_reset: "RateLimit-Reset".to_string(),
            pagination: vec![PaginationStyle::Link],
        }
    }
}

/// Builds [`ResponseEnvelope`]s from status codes and headers.
#[derive(Debug, Clone)]
pub struct EnvelopeBuilder {
    rules: HeaderRules,
}

impl EnvelopeBuilder {
    /// Create a builder for the given header rules.
    #[must_use]
    pub fn new(rules: HeaderRules) -> Self {
        Self { rules }
    }

    /// The rules this builder applies.
    #[must_use]
    pub fn rules(&self) -> &HeaderRules {
        &self.rules
    }

    /// Build an envelope.
    #[must_use]
    pub fn build(&self, status: u16, headers: &HeaderMap) -> ResponseEnvelope {
        let rate = Rate {
            limit: header_number(headers, &self.rules.rate_limit).unwrap_or(0),
            remaining: header_number(headers, &self.rules.rate_remaining).unwrap_or(0),
            reset: header_number(headers, &self.rules.rate_reset).unwrap_or(0),
        };

        let page = self
            .rules
            .pagination
            .iter()
            .map(|style| match style {
                PaginationStyle::Link => link_page(headers),
                PaginationStyle::Echo => echo_page(headers),
                PaginationStyle::None => Page::default(),
            })
            .find(|page| !page.is_empty())
            .unwrap_or_default();

        ResponseEnvelope {
            status,
            id: header_str(headers, &self.rules.request_id)
                .unwrap_or_default()
                .to_string(),
            rate,
            page,
        }
    }
}

impl Default for EnvelopeBuilder {
    fn default() -> Self {
        Self::new(HeaderRules::default())
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok()).map(str::trim)
}

fn header_number<T: std::str::FromStr>(headers: &HeaderMap, name: &str) -> Option<T> {
    header_str(headers, name).and_then(|v| v.parse().ok())
}

fn link_page(headers: &HeaderMap) -> Page {
    let mut page = Page::default();
    for value in headers.get_all(http::header::LINK) {
        let Ok(value) = value.to_str() else {
            continue;
        };
        for segment in value.split(',') {
            let mut parts = segment.split(';');
            let Some(target) = parts.next() else {
                continue;
            };
            let target = target.trim().trim_start_matches('<').trim_end_matches('>');
            let Some(number) = page_param(target) else {
                continue;
            };
            for param in parts {
                let Some(rel) = param.trim().strip_prefix("rel=") else {
                    continue;
                };
                match rel.trim_matches('"') {
                    "first" => page.first = number,
                    "prev" => page.prev = number,
                    "next" => page.next = number,
                    "last" => page.last = number,
                    _ => {}
                }
            }
        }
    }
    page
}

fn page_param(target: &str) -> Option<u32> {
    let url = Url::parse(target)
        .or_else(|_| Url::parse("http://localhost/").and_then(|base| base.join(target)))
        .ok()?;
    url.query_pairs()
        .find(|(key, _)| key == "page")
        .and_then(|(_, value)| value.parse().ok())
}

fn echo_page(headers: &HeaderMap) -> Page {
    let total: u32 = header_number(headers, "X-Total-Pages").unwrap_or(0);
    Page {
        first: u32::from(total > 0),
        prev: header_number(headers, "X-Prev-Page").unwrap_or(0),
        next: header_number(headers, "X-Next-Page").unwrap_or(0),
        last: total,
    }
}
