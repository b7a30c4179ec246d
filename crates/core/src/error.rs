use crate::types::DbId;

/// Domain-level errors shared across crates.
///
/// HTTP mapping lives in the API crate's `AppError`; this type stays
/// transport-agnostic.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// An entity lookup by id found nothing.
    #[error("{entity} with id {id} not found")]
    NotFound { entity: &'static str, id: DbId },

    /// Caller-supplied input failed validation.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The requested change conflicts with current state.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// An unexpected internal failure.
    #[error("Internal error: {0}")]
    Internal(String),
}
