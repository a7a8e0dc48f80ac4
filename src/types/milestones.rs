//! Milestone data models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Canonical milestone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Milestone {
    /// Per-repository number
    pub number: i64,
    /// Global identifier
    pub id: i64,
    /// Title
    pub title: String,
    /// Description
    pub description: String,
    /// Web link
    pub link: String,
    /// Canonical state: "open" or "closed"
    pub state: String,
    /// Due date
    pub due_date: Option<DateTime<Utc>>,
}

/// Input for creating or updating a milestone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MilestoneInput {
    /// Title
    pub title: String,
    /// Description
    pub description: String,
    /// Desired state: "open" or "closed" ("close" is accepted too)
    pub state: String,
    /// Due date; only the calendar day is sent
    pub due_date: Option<DateTime<Utc>>,
}
