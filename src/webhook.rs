//! Provider-independent webhook steps: bounded body read, header access and
//! shared-token verification.
//!
//! Classification and decoding are provider specific and live in each
//! driver's webhook module; every driver funnels its parsed event through
//! [`verify_token`] last.

use http::HeaderMap;
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::warn;

use crate::error::{Error, Result};
use crate::services::SecretFn;
use crate::types::WebhookEvent;

/// Upper bound on a webhook body, in bytes.
pub const MAX_WEBHOOK_BODY: usize = 10_000_000;

/// Read a webhook body into memory.
///
/// # Errors
///
/// Returns [`Error::Io`] on read failure and [`Error::PayloadTooLarge`] when
/// the body exceeds [`MAX_WEBHOOK_BODY`].
pub async fn read_body<R>(body: &mut R) -> Result<Vec<u8>>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let mut data = Vec::new();
    body.take(MAX_WEBHOOK_BODY as u64 + 1)
        .read_to_end(&mut data)
        .await?;
    if data.len() > MAX_WEBHOOK_BODY {
        return Err(Error::PayloadTooLarge(MAX_WEBHOOK_BODY));
    }
    Ok(data)
}

/// Header value as a string; empty when absent or not valid UTF-8.
#[must_use]
pub fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> &'a str {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

/// Compare two byte strings in time independent of where they differ.
#[must_use]
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}

/// Check the delivered token against the secret resolved for `event`.
///
/// An empty secret skips verification.
///
/// # Errors
///
/// Returns [`Error::SignatureInvalid`] carrying `event` on mismatch, or
/// [`Error::SecretUnavailable`] carrying `event` and the secret function's
/// own failure.
pub fn verify_token(event: WebhookEvent, provided: &str, secret: &SecretFn) -> Result<WebhookEvent> {
    let token = match secret(&event) {
        Ok(token) => token,
        Err(source) => {
            return Err(Error::SecretUnavailable {
                event: Box::new(event),
                source: Box::new(source),
            })
        }
    };
    if token.is_empty() {
        return Ok(event);
    }
    if !constant_time_eq(provided.as_bytes(), token.as_bytes()) {
        warn!(
            kind = event.kind(),
            repo = %event.repository().full_name,
            "webhook token mismatch"
        );
        return Err(Error::SignatureInvalid(Box::new(event)));
    }
    Ok(event)
}
