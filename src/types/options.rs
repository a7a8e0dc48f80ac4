//! List options shared by the capability services.
//!
//! Each options value is a fixed set of recognized fields; drivers encode
//! whichever of them the provider understands.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Page-number pagination.
///
/// Zero values mean "provider default".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListOptions {
    /// 1-based page number
    pub page: u32,
    /// Page size
    pub size: u32,
}

impl ListOptions {
    /// Options for a specific page and size.
    #[must_use]
    pub fn new(page: u32, size: u32) -> Self {
        Self { page, size }
    }
}

/// Options for listing pull requests.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestListOptions {
    /// 1-based page number
    pub page: u32,
    /// Page size
    pub size: u32,
    /// Include open pull requests
    pub open: bool,
    /// Include closed (and merged) pull requests
    pub closed: bool,
    /// Keep only pull requests carrying any of these labels
    pub labels: Vec<String>,
    /// Lower bound on creation time
    pub created_after: Option<DateTime<Utc>>,
    /// Upper bound on creation time
    pub created_before: Option<DateTime<Utc>>,
    /// Lower bound on update time
    pub updated_after: Option<DateTime<Utc>>,
    /// Upper bound on update time
    pub updated_before: Option<DateTime<Utc>>,
}

/// Options for listing issues.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueListOptions {
    /// 1-based page number
    pub page: u32,
    /// Page size
    pub size: u32,
    /// Include open issues
    pub open: bool,
    /// Include closed issues
    pub closed: bool,
}

/// Options for listing milestones.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MilestoneListOptions {
    /// 1-based page number
    pub page: u32,
    /// Page size
    pub size: u32,
    /// Include active milestones
    pub open: bool,
    /// Include closed milestones
    pub closed: bool,
}

/// Options for listing releases.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseListOptions {
    /// 1-based page number
    pub page: u32,
    /// Page size
    pub size: u32,
    /// Include published releases
    pub open: bool,
    /// Include drafts
    pub closed: bool,
}

/// Options for listing commits.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitListOptions {
    /// 1-based page number
    pub page: u32,
    /// Page size
    pub size: u32,
    /// Branch, tag or sha to list from
    #[serde(rename = "ref")]
    pub reference: String,
}

