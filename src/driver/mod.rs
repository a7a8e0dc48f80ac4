//! Provider drivers.
//!
//! Each driver implements every capability trait in [`crate::services`] for
//! one hosting platform.

pub mod tencentgit;
