use thiserror::Error;

/// Fault surfaced by a persistence adapter. Adapters live outside this
/// workspace; the engine only distinguishes "the store failed" from the
/// business failure kinds.
#[derive(Debug, Clone, Error)]
#[error("storage error: {0}")]
pub struct RepositoryError(pub String);

impl RepositoryError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}
