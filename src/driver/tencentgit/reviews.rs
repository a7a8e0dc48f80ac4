//! Reviews client. TencentGit exposes no review API.

use async_trait::async_trait;

use crate::context::Context;
use crate::envelope::ResponseEnvelope;
use crate::error::{Error, Result};
use crate::services::{Response, ReviewService};
use crate::types::{ListOptions, Review, ReviewInput};

/// Review service that reports every operation as unsupported.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReviewsClient;

#[async_trait]
impl ReviewService for ReviewsClient {
    async fn find(&self, _: &Context, _: &str, _: i64, _: i64) -> Response<Review> {
        Err(Error::NotSupported)
    }

    async fn list(&self, _: &Context, _: &str, _: i64, _: ListOptions) -> Response<Vec<Review>> {
        Err(Error::NotSupported)
    }

    async fn create(&self, _: &Context, _: &str, _: i64, _: &ReviewInput) -> Response<Review> {
        Err(Error::NotSupported)
    }

    async fn delete(&self, _: &Context, _: &str, _: i64, _: i64) -> Result<ResponseEnvelope> {
        Err(Error::NotSupported)
    }
}
