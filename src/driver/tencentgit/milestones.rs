//! Milestones client.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use http::Method;
use serde::{Deserialize, Serialize};

use super::util::{encode, encode_milestone_list_options, nullable, with_query};
use super::Api;
use crate::context::Context;
use crate::envelope::ResponseEnvelope;
use crate::error::Result;
use crate::services::{MilestoneService, Response};
use crate::types::{Milestone, MilestoneInput, MilestoneListOptions};

const DUE_DATE_FORMAT: &str = "%Y-%m-%d";

/// Client for milestone operations.
#[derive(Clone)]
pub struct MilestonesClient {
    api: Arc<Api>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WireMilestone {
    id: i64,
    iid: i64,
    #[serde(deserialize_with = "nullable")]
    title: String,
    #[serde(deserialize_with = "nullable")]
    description: String,
    #[serde(deserialize_with = "nullable")]
    state: String,
    due_date: Option<String>,
    #[serde(deserialize_with = "nullable")]
    web_url: String,
}

#[derive(Debug, Default, Serialize)]
struct WriteMilestone<'a> {
    title: &'a str,
    description: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    due_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    state_event: Option<&'static str>,
}

fn parse_due_date(text: Option<&str>) -> Option<DateTime<Utc>> {
    let text = text?.trim();
    let date = NaiveDate::parse_from_str(text, DUE_DATE_FORMAT).ok()?;
    Some(date.and_hms_opt(0, 0, 0)?.and_utc())
}

/// Native milestone state to its canonical name.
fn convert_state(native: &str) -> String {
    match native {
        "active" => "open".to_string(),
        other => other.to_string(),
    }
}

/// Canonical state to the provider's `state_event`.
fn state_event(state: &str) -> Option<&'static str> {
    match state {
        "close" | "closed" => Some("close"),
        "open" | "active" => Some("activate"),
        _ => None,
    }
}

fn convert_milestone(from: &WireMilestone) -> Milestone {
    Milestone {
        number: from.iid,
        id: from.id,
        title: from.title.clone(),
        description: from.description.clone(),
        link: from.web_url.clone(),
        state: convert_state(&from.state),
        due_date: parse_due_date(from.due_date.as_deref()),
    }
}

fn write_body(input: &MilestoneInput) -> WriteMilestone<'_> {
    WriteMilestone {
        title: &input.title,
        description: &input.description,
        due_date: input
            .due_date
            .map(|due| due.format(DUE_DATE_FORMAT).to_string()),
        state_event: state_event(&input.state),
    }
}

impl MilestonesClient {
    /// Create a new milestones client.
    pub fn new(api: Arc<Api>) -> Self {
        Self { api }
    }

    fn milestones_path(repo: &str) -> String {
        format!("api/v3/projects/{}/milestones", encode(repo))
    }
}

#[async_trait]
impl MilestoneService for MilestonesClient {
    async fn find(&self, ctx: &Context, repo: &str, id: i64) -> Response<Milestone> {
        let path = format!("{}/{id}", Self::milestones_path(repo));
        let (out, res): (WireMilestone, _) = self.api.get(ctx, path).await?;
        Ok((convert_milestone(&out), res))
    }

    async fn list(
        &self,
        ctx: &Context,
        repo: &str,
        opts: MilestoneListOptions,
    ) -> Response<Vec<Milestone>> {
        let path = with_query(
            &Self::milestones_path(repo),
            &encode_milestone_list_options(opts),
        );
        let (out, res): (Vec<WireMilestone>, _) = self.api.get(ctx, path).await?;
        Ok((out.iter().map(convert_milestone).collect(), res))
    }

    async fn create(
        &self,
        ctx: &Context,
        repo: &str,
        input: &MilestoneInput,
    ) -> Response<Milestone> {
        let body = write_body(input);
        let (out, res): (WireMilestone, _) = self
            .api
            .json(ctx, Method::POST, Self::milestones_path(repo), &body)
            .await?;
        Ok((convert_milestone(&out), res))
    }

    async fn update(
        &self,
        ctx: &Context,
        repo: &str,
        id: i64,
        input: &MilestoneInput,
    ) -> Response<Milestone> {
        let path = format!("{}/{id}", Self::milestones_path(repo));
        let body = write_body(input);
        let (out, res): (WireMilestone, _) =
            self.api.json(ctx, Method::PATCH, path, &body).await?;
        Ok((convert_milestone(&out), res))
    }

    async fn delete(&self, ctx: &Context, repo: &str, id: i64) -> Result<ResponseEnvelope> {
        let path = format!("{}/{id}", Self::milestones_path(repo));
        self.api.empty(ctx, Method::DELETE, path).await
    }
}
