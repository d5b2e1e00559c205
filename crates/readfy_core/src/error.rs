//! crates/readfy_core/src/error.rs
//!
//! The error type returned by every catalog operation.

use crate::ports::PortError;

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// One or more fields broke their contract. Every failing field is listed.
    #[error("Validation failed: {}", .0.join("; "))]
    ValidationFailed(Vec<String>),

    #[error("Not found: {0}")]
    NotFound(String),

    /// A label outside a closed vocabulary, e.g. an unknown reading status.
    #[error("Invalid value: {0}")]
    InvalidEnum(String),

    #[error("No fields to update")]
    NoFieldsToUpdate,

    #[error("Storage error: {0}")]
    Storage(PortError),
}

pub type CatalogResult<T> = Result<T, CatalogError>;

impl From<PortError> for CatalogError {
    fn from(err: PortError) -> Self {
        match err {
            PortError::NotFound(what) => CatalogError::NotFound(what),
            other => CatalogError::Storage(other),
        }
    }
}
