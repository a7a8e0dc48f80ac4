//! Testing utilities.
//!
//! Provides a scripted request executor for testing code built on the SCM
//! client without a live server.

mod mock;

pub use mock::{MockCall, MockExecutor, MockResponse};
