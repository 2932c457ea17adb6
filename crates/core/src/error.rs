use crate::types::DbId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    /// A malformed or out-of-range request parameter, named by the payload.
    #[error("Invalid parameter: {0}")]
    InvalidParam(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// Attaching `page_id` under `target_id` would make the page its own ancestor.
    #[error("Moving page {page_id} under {target_id} would create a cycle")]
    RecursiveMove { page_id: DbId, target_id: DbId },

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub fn invalid_param(name: impl Into<String>) -> Self {
        CoreError::InvalidParam(name.into())
    }
}
