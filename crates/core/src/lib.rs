//! Pure domain types for the grading job service.
//!
//! This crate has zero internal dependencies. It holds the shared type
//! aliases, the domain error taxonomy, the rubric and evaluation payload
//! types, and the validation helpers used by both the DB and API layers.

pub mod error;
pub mod evaluation;
pub mod rubric;
pub mod submission;
pub mod types;

pub use error::CoreError;
