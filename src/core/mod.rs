//! Core types shared across drift.
//!
//! - [`DriftError`] / [`ErrorContext`] - typed errors and their user-facing rendering
//! - [`ResourceType`] - the kinds of declarative resources drift understands

pub mod error;
pub mod resource;

pub use error::{DriftError, ErrorContext, user_friendly_error};
pub use resource::ResourceType;
