//! Error types for the SCM client.
//!
//! Every capability operation returns [`Error`]. Callers are expected to
//! branch programmatically only on [`Error::NotFound`] and
//! [`Error::NotSupported`]; everything else is log-and-abort material.

use thiserror::Error;

use crate::types::WebhookEvent;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the SCM client.
#[derive(Error, Debug)]
pub enum Error {
    /// The outbound call could not be completed
    #[error("HTTP error: {0}")]
    Http(String),

    /// The provider answered with a non-2xx status
    #[error("{message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Provider message, or the canonical reason phrase
        message: String,
    },

    /// The requested entity does not exist
    #[error("Not Found")]
    NotFound,

    /// The provider cannot perform this operation
    #[error("Not Supported")]
    NotSupported,

    /// A response or webhook body could not be decoded
    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// The webhook event name (or sub-kind) is not handled
    #[error("Unknown webhook event: {event}")]
    UnknownWebhook {
        /// Offending event name
        event: String,
    },

    /// The webhook token did not match; the parsed event is kept
    #[error("Invalid webhook signature")]
    SignatureInvalid(Box<WebhookEvent>),

    /// A dependent lookup failed while enriching a result
    #[error("{context}: {source}")]
    Lookup {
        /// Which lookup failed
        context: String,
        /// Underlying failure
        #[source]
        source: Box<Error>,
    },

    /// The webhook secret could not be resolved; the parsed event is kept
    #[error("unable to resolve webhook secret: {source}")]
    SecretUnavailable {
        /// Parsed event
        event: Box<WebhookEvent>,
        /// Failure returned by the secret function
        #[source]
        source: Box<Error>,
    },

    /// The execution context was cancelled
    #[error("Request cancelled")]
    Cancelled,

    /// Invalid client configuration
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Webhook body exceeded the read bound
    #[error("Webhook payload exceeds {0} bytes")]
    PayloadTooLarge(usize),

    /// IO error while reading a webhook body
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Wrap this error with the name of the lookup that produced it.
    #[must_use]
    pub fn context(self, context: &str) -> Self {
        Self::Lookup {
            context: context.to_string(),
            source: Box::new(self),
        }
    }

    /// Build an API error from a status code and optional provider message.
    ///
    /// A 404 always maps to [`Error::NotFound`].
    #[must_use]
    pub fn from_status(status: u16, message: Option<String>) -> Self {
        if status == 404 {
            return Self::NotFound;
        }
        let message = message.filter(|m| !m.is_empty()).unwrap_or_else(|| {
            http::StatusCode::from_u16(status)
                .ok()
                .and_then(|s| s.canonical_reason())
                .unwrap_or("Unknown Error")
                .to_string()
        });
        Self::Api { status, message }
    }

    /// True when this is, or wraps, the not-found sentinel.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound => true,
            Self::Lookup { source, .. } | Self::SecretUnavailable { source, .. } => {
                source.is_not_found()
            }
            _ => false,
        }
    }

    /// True when this is the capability-gap sentinel.
    #[must_use]
    pub fn is_not_supported(&self) -> bool {
        matches!(self, Self::NotSupported)
    }

    /// HTTP status for API errors.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::NotFound => Some(404),
            _ => None,
        }
    }

    /// The event carried by a signature or secret failure.
    #[must_use]
    pub fn webhook_event(&self) -> Option<&WebhookEvent> {
        match self {
            Self::SignatureInvalid(event) | Self::SecretUnavailable { event, .. } => Some(event),
            _ => None,
        }
    }
}
