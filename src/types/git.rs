//! Git-related data models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A branch or tag.
///
/// `name` never carries a `refs/...` prefix; use [`expand_ref`] when the
/// fully-qualified form is needed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    /// Short reference name (e.g., "main")
    pub name: String,
    /// Target commit
    pub sha: String,
}

/// Commit author or committer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    /// Login, when known
    pub login: String,
    /// Display name
    pub name: String,
    /// Email address
    pub email: String,
    /// When the signature was made
    pub date: Option<DateTime<Utc>>,
}

/// Canonical commit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    /// Commit sha
    pub sha: String,
    /// Full message
    pub message: String,
    /// Author
    pub author: Signature,
    /// Committer
    pub committer: Signature,
    /// Web link
    pub link: String,
}

/// A single file entry of a diff.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Change {
    /// Path after the change
    pub path: String,
    /// Path before the change; equal to `path` unless renamed
    pub previous_path: String,
    /// File was added
    pub added: bool,
    /// File was renamed
    pub renamed: bool,
    /// File was deleted
    pub deleted: bool,
    /// Unified patch text
    pub patch: String,
}

/// Strip a `refs/heads/` or `refs/tags/` prefix.
#[must_use]
pub fn trim_ref(reference: &str) -> String {
    let trimmed = reference
        .strip_prefix("refs/heads/")
        .or_else(|| reference.strip_prefix("refs/tags/"))
        .unwrap_or(reference);
    trimmed.to_string()
}

/// Qualify a short reference with `prefix` unless already qualified.
#[must_use]
pub fn expand_ref(reference: &str, prefix: &str) -> String {
    if reference.starts_with("refs/") {
        return reference.to_string();
    }
    let prefix = prefix.trim_end_matches('/');
    format!("{prefix}/{reference}")
}

/// Whether a fully-qualified reference names a tag.
#[must_use]
pub fn is_tag(reference: &str) -> bool {
    reference.starts_with("refs/tags/")
}
