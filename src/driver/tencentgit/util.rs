//! Query encoders, state mapping and timestamp parsing shared by the
//! TencentGit clients.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer};
use url::form_urlencoded::Serializer;

use crate::types::{
    CommitListOptions, IssueListOptions, ListOptions, MilestoneListOptions,
    PullRequestListOptions, STATE_CLOSED, STATE_OPEN,
};

/// Format of time filters sent in search queries.
pub const SEARCH_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%z";

/// Native state of an open merge request or issue.
pub const NATIVE_OPENED: &str = "opened";

/// Native state of a merged merge request.
pub const NATIVE_MERGED: &str = "merged";

/// URL-encode a `namespace/name` repository path.
#[must_use]
pub fn encode(repo: &str) -> String {
    repo.replace('/', "%2F")
}

/// Append a query string unless it is empty.
#[must_use]
pub fn with_query(path: &str, query: &str) -> String {
    if query.is_empty() {
        path.to_string()
    } else {
        format!("{path}?{query}")
    }
}

fn page_params(params: &mut Serializer<'_, String>, page: u32, size: u32) {
    if page != 0 {
        params.append_pair("page", &page.to_string());
    }
    if size != 0 {
        params.append_pair("per_page", &size.to_string());
    }
}

/// `page` / `per_page`.
#[must_use]
pub fn encode_list_options(opts: ListOptions) -> String {
    let mut params = Serializer::new(String::new());
    page_params(&mut params, opts.page, opts.size);
    params.finish()
}

/// Listing restricted to projects the caller is a member of.
#[must_use]
pub fn encode_member_list_options(opts: ListOptions) -> String {
    let mut params = Serializer::new(String::new());
    params.append_pair("membership", "true");
    page_params(&mut params, opts.page, opts.size);
    params.finish()
}

/// Commit listing, optionally from a reference.
#[must_use]
pub fn encode_commit_list_options(opts: &CommitListOptions) -> String {
    let mut params = Serializer::new(String::new());
    page_params(&mut params, opts.page, opts.size);
    if !opts.reference.is_empty() {
        params.append_pair("ref_name", &opts.reference);
    }
    params.finish()
}

fn open_closed_state(open: bool, closed: bool) -> &'static str {
    match (open, closed) {
        (true, false) => NATIVE_OPENED,
        (false, true) => "closed",
        _ => "all",
    }
}

/// Issue listing. The state filter is always sent.
#[must_use]
pub fn encode_issue_list_options(opts: IssueListOptions) -> String {
    let mut params = Serializer::new(String::new());
    page_params(&mut params, opts.page, opts.size);
    params.append_pair("state", open_closed_state(opts.open, opts.closed));
    params.finish()
}

/// Milestone listing. No filter when both or neither state is requested.
#[must_use]
pub fn encode_milestone_list_options(opts: MilestoneListOptions) -> String {
    let mut params = Serializer::new(String::new());
    page_params(&mut params, opts.page, opts.size);
    match (opts.open, opts.closed) {
        (true, false) => {
            params.append_pair("state", "active");
        }
        (false, true) => {
            params.append_pair("state", "closed");
        }
        _ => {}
    }
    params.finish()
}

/// Merge request listing. The state filter is always sent; labels are
/// filtered client side.
#[must_use]
pub fn encode_pull_request_list_options(opts: &PullRequestListOptions) -> String {
    let mut params = Serializer::new(String::new());
    page_params(&mut params, opts.page, opts.size);
    params.append_pair("state", open_closed_state(opts.open, opts.closed));
    let bounds = [
        ("created_after", opts.created_after),
        ("created_before", opts.created_before),
        ("updated_after", opts.updated_after),
        ("updated_before", opts.updated_before),
    ];
    for (name, bound) in bounds {
        if let Some(time) = bound {
            params.append_pair(name, &time.format(SEARCH_TIME_FORMAT).to_string());
        }
    }
    params.finish()
}

/// Map a native merge request or issue state to the canonical one.
///
/// Anything that is not explicitly open is treated as closed.
#[must_use]
pub fn to_canonical_state(native: &str) -> &'static str {
    if native == NATIVE_OPENED {
        STATE_OPEN
    } else {
        STATE_CLOSED
    }
}

/// Parse a provider timestamp.
///
/// Accepts RFC 3339, `2012-09-19T09:29:19+0000` and
/// `2017-12-10 17:01:11 UTC`. Returns `None` for empty or unrecognized input.
#[must_use]
pub fn parse_time(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if let Ok(time) = DateTime::parse_from_rfc3339(text) {
        return Some(time.with_timezone(&Utc));
    }
    if let Ok(time) = DateTime::parse_from_str(text, SEARCH_TIME_FORMAT) {
        return Some(time.with_timezone(&Utc));
    }
    if let Ok(time) = DateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S %z") {
        return Some(time.with_timezone(&Utc));
    }
    let naive = text
        .strip_suffix(" UTC")
        .or_else(|| text.strip_suffix(" GMT"))
        .unwrap_or(text);
    NaiveDateTime::parse_from_str(naive, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|t| t.and_utc())
}

/// Parse an optional provider timestamp.
#[must_use]
pub fn parse_opt_time(text: Option<&str>) -> Option<DateTime<Utc>> {
    text.and_then(parse_time)
}

/// Deserialize `null` as the type's default.
pub fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
