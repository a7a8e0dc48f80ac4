//! Release data models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Canonical release.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    /// Release identifier, 0 when the provider keys releases by tag
    pub id: i64,
    /// Title
    pub title: String,
    /// Release notes
    pub description: String,
    /// Web link
    pub link: String,
    /// Tag the release points at
    pub tag: String,
    /// Branch or sha the tag was created from
    pub commitish: String,
    /// Unpublished
    pub draft: bool,
    /// Pre-release
    pub prerelease: bool,
    /// When the release was created
    pub created: Option<DateTime<Utc>>,
    /// When the release was published
    pub published: Option<DateTime<Utc>>,
}

/// Input for creating or updating a release.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseInput {
    /// Title
    pub title: String,
    /// Release notes
    pub description: String,
    /// Tag name
    pub tag: String,
    /// Branch or sha to create the tag from
    pub commitish: String,
    /// Unpublished
    pub draft: bool,
    /// Pre-release
    pub prerelease: bool,
}
